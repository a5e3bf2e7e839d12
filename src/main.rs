use calagent::startup;
use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting calagent");

    // Load configuration
    let config = startup::load_config()?;

    // Run the interactive agent
    startup::run_agent(config).await
}
