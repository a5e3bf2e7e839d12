use crate::config::Config;
use crate::error::{google_calendar_error, AgentResult};
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

/// Refresh tokens a minute before their recorded expiry
const EXPIRY_MARGIN_SECS: i64 = 60;

/// OAuth token as persisted in the token file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
}

impl StoredToken {
    /// Whether the access token needs refreshing at the given unix time
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at <= now + EXPIRY_MARGIN_SECS
    }
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

/// Manages the OAuth token file and refreshes expired access tokens
#[derive(Clone)]
pub struct TokenManager {
    client: Client,
    client_id: String,
    client_secret: String,
    token_path: PathBuf,
}

impl TokenManager {
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            client,
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            token_path: PathBuf::from(&config.token_path),
        }
    }

    /// Check that the token file exists and parses, without refreshing
    ///
    /// Called at startup so a missing token is a fatal diagnostic
    /// instead of a mid-conversation surprise.
    pub fn verify(&self) -> AgentResult<()> {
        self.load_token().map(|_| ())
    }

    /// Get a valid access token, refreshing and persisting it if expired
    pub async fn access_token(&self) -> AgentResult<String> {
        let token = self.load_token()?;

        if !token.is_expired(Utc::now().timestamp()) {
            debug!("Using cached access token");
            return Ok(token.access_token);
        }

        let refreshed = self.refresh_token(&token).await?;
        self.save_token(&refreshed)?;
        Ok(refreshed.access_token)
    }

    fn load_token(&self) -> AgentResult<StoredToken> {
        let content = fs::read_to_string(&self.token_path).map_err(|_| {
            google_calendar_error(&format!(
                "No token file at {}. Run the OAuth setup to create one.",
                self.token_path.display()
            ))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            google_calendar_error(&format!(
                "Invalid token file {}: {}",
                self.token_path.display(),
                e
            ))
        })
    }

    fn save_token(&self, token: &StoredToken) -> AgentResult<()> {
        let content = serde_json::to_string_pretty(token)?;
        fs::write(&self.token_path, content)?;
        Ok(())
    }

    /// Exchange the refresh token for a new access token
    async fn refresh_token(&self, token: &StoredToken) -> AgentResult<StoredToken> {
        info!("Refreshing expired Google Calendar access token");

        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", token.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post("https://oauth2.googleapis.com/token")
            .form(&params)
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to refresh token: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(google_calendar_error(&format!(
                "Failed to refresh token: HTTP {} - {}",
                status, error_body
            )));
        }

        let refreshed: RefreshResponse = response
            .json()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to parse token response: {}", e)))?;

        Ok(StoredToken {
            access_token: refreshed.access_token,
            refresh_token: token.refresh_token.clone(),
            expires_at: Utc::now().timestamp() + refreshed.expires_in,
        })
    }
}
