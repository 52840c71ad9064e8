pub mod keys;
pub mod price;
pub mod response;

pub use keys::CacheKey;
pub use price::{PriceCache, PriceCacheEntry};
pub use response::ResponseCache;
