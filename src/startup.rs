use crate::components::gemini::{system_instruction, GeminiClient, ModelSession};
use crate::components::google_calendar::CalendarClient;
use crate::config::Config;
use crate::error::Error;
use crate::functions::FunctionRegistry;
use crate::repl::{Repl, StdConsole};
use crate::utils::time;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and validate the application config
pub fn load_config() -> miette::Result<Config> {
    match Config::load() {
        Ok(config) => Ok(config),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Wire up the session, registry and calendar client and run the REPL
pub async fn run_agent(config: Config) -> miette::Result<()> {
    let registry = FunctionRegistry::new(&config.timezone);

    let now = time::current_datetime(&config.timezone)?;
    let model = GeminiClient::new(&config, system_instruction(&now), registry.declarations());
    let session = ModelSession::new(Arc::new(model));

    let calendar_client = CalendarClient::new(&config);
    calendar_client.verify_credentials()?;
    let calendar = Arc::new(calendar_client);

    info!(model = %config.gemini_model, calendar = %config.google_calendar_id, "Calendar agent ready");
    let mut repl = Repl::new(session, registry, calendar, StdConsole);
    repl.run().await?;
    Ok(())
}
