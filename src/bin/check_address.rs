use chain_gas_service::{config::Config, state::AppState};
use std::env;
use tracing::{error, info, warn, Level};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Setup tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let identifier = env::args()
        .nth(1)
        .unwrap_or_else(|| "0x73be3b500f781234b21a348cafaaa23dfff3b1b5".to_string());
    let days: u32 = env::args().nth(2).and_then(|d| d.parse().ok()).unwrap_or(90);

    info!("Starting live aggregation check for {} over {} days...", identifier, days);

    // 1. Setup
    let config = Config::from_env();
    let state = AppState::from_config(config)?;
    let chains = state.aggregator.enabled_chains();
    info!("Enabled chains: {:?}", chains.iter().map(|c| c.id).collect::<Vec<_>>());

    // 2. Resolve
    let address = match state.resolver.resolve(&identifier).await {
        Ok(address) => {
            info!("✅ Resolved {} to {}", identifier, address);
            address
        }
        Err(e) => {
            error!("❌ Could not resolve {}: {}", identifier, e);
            return Ok(());
        }
    };

    // 3. Aggregate twice; the second run should be served from the response cache
    for run in 1..=2 {
        let started = std::time::Instant::now();
        match state.aggregator.aggregate(&address, &chains, days).await {
            Ok(result) => {
                info!("✅ Run {} finished in {:?}", run, started.elapsed());
                for total in &result.chain_totals {
                    info!(
                        "   {:<9} {:>4} txs  {:.9} {}  ${:.2}",
                        total.chain.as_str(),
                        total.tx_count,
                        total.native_amount,
                        total.token_symbol,
                        total.usd_fee.unwrap_or(0.0)
                    );
                }
                info!(
                    "   total: {} txs, ${:.2} (complete: {})",
                    result.totals.tx_count,
                    result.totals.usd_fee.unwrap_or(0.0),
                    result.totals.usd_complete
                );
                for warning in &result.warnings {
                    warn!("   {:?} on {}: {}", warning.kind, warning.chain, warning.message);
                }
            }
            Err(e) => error!("❌ Run {} failed: {}", run, e),
        }
    }

    Ok(())
}
