use anyhow::Result;
use tracing::info;

use tempo_uci::UciEngine;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    info!("tempo starting");
    UciEngine::new().run()?;
    Ok(())
}
