pub mod aggregator;
pub mod api;
pub mod blockchain;
pub mod cache;
pub mod clock;
pub mod config;
pub mod models;
pub mod price;
pub mod resolver;
pub mod state;
pub mod validation;

#[cfg(test)]
pub mod tests;

// Re-export specific items for convenience
pub use aggregator::{AggregateError, Aggregator};
pub use api::error::ApiError;
pub use api::response::ApiResponse;
pub use api::route::{create_router, GasQuery};
pub use models::{Address, AggregateResult, TransactionRecord};
pub use resolver::{IdentifierResolver, ResolveError};
pub use validation::{parse_identifier, validate_evm_address, validate_window_days};
