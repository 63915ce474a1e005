//! Check command implementation
//!
//! Validates the scenario and reports what the loss model will see.

use pricer_models::credit::LossBasket;
use tracing::{info, warn};

use crate::config::CliConfig;
use crate::Result;

/// Run the check command
pub fn run(config: &CliConfig) -> Result<()> {
    info!("Checking scenario...");
    config.validate()?;

    let (model, basket) = config.build()?;
    println!("Model");
    println!("  correlation        {}", model.correlation());
    println!("  beta               {:.6}", model.parameters().beta());
    println!("  names              {}", model.size());
    println!("Basket");
    println!("  reference date     {}", basket.reference_date());
    println!("  day count          {}", basket.day_count());
    println!(
        "  tranche            [{}, {}]",
        basket.attachment(),
        basket.detachment()
    );

    match config.queries.valuation_date {
        Some(date) => {
            let live = basket.live_names(date).len();
            println!("  live names on {}  {} / {}", date, live, basket.size());
            if live == 0 {
                warn!(%date, "No live names at the valuation date");
            }
        }
        None => warn!("No valuation date configured; `analyse` will need --date"),
    }

    info!("Scenario OK");
    Ok(())
}
