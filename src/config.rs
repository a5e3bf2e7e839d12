use crate::error::{env_error, AgentResult};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;

/// Default Gemini model used for function calling
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";

/// Default IANA timezone for resolving relative dates
pub const DEFAULT_TIMEZONE: &str = "Europe/London";

/// Default path for the persisted OAuth token
pub const DEFAULT_TOKEN_PATH: &str = "token.json";

/// Main configuration structure for the agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Gemini API key
    pub gemini_api_key: String,
    /// Gemini model name
    pub gemini_model: String,
    /// Google Calendar API client ID (for token refresh)
    pub google_client_id: String,
    /// Google Calendar API client secret (for token refresh)
    pub google_client_secret: String,
    /// Google Calendar ID to operate on
    pub google_calendar_id: String,
    /// Timezone for event times and relative date resolution
    pub timezone: String,
    /// Path to the persisted OAuth token file
    pub token_path: String,
}

impl Config {
    /// Load configuration from environment
    pub fn load() -> AgentResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        // Required environment variables
        let gemini_api_key =
            env::var("GEMINI_API_KEY").map_err(|_| env_error("GEMINI_API_KEY"))?;
        let google_client_id =
            env::var("GOOGLE_CLIENT_ID").map_err(|_| env_error("GOOGLE_CLIENT_ID"))?;
        let google_client_secret =
            env::var("GOOGLE_CLIENT_SECRET").map_err(|_| env_error("GOOGLE_CLIENT_SECRET"))?;

        // Optional with defaults
        let gemini_model =
            env::var("GEMINI_MODEL").unwrap_or_else(|_| String::from(DEFAULT_MODEL));
        let google_calendar_id =
            env::var("GOOGLE_CALENDAR_ID").unwrap_or_else(|_| String::from("primary"));
        let timezone = env::var("TIMEZONE").unwrap_or_else(|_| String::from(DEFAULT_TIMEZONE));
        let token_path =
            env::var("GOOGLE_TOKEN_PATH").unwrap_or_else(|_| String::from(DEFAULT_TOKEN_PATH));

        Ok(Config {
            gemini_api_key,
            gemini_model,
            google_client_id,
            google_client_secret,
            google_calendar_id,
            timezone,
            token_path,
        })
    }
}
