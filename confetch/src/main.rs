//! Backup runner binary.

use log::error;

use confetch::{Orchestrator, RunConfig};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match RunConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let outcome = Orchestrator::new(config).run().await;
    std::process::exit(outcome.exit_code());
}
