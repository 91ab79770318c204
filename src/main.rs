use anyhow::Context;
use orrery::{DemoConfig, OrreryApp};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = DemoConfig::from_env().context("invalid configuration")?;
    log::info!("Loading resources from {}", config.resources.display());

    OrreryApp::new(config)?.run()?;
    Ok(())
}
