use super::models::{CalendarEntry, CalendarEvent, CalendarListPage, EventsPage, NewEvent};
use super::token::TokenManager;
use crate::config::Config;
use crate::error::{google_calendar_error, AgentResult};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

const API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Calendar operations the agent can perform
///
/// Each method maps to exactly one remote call. Tests substitute a
/// recording implementation.
#[async_trait]
pub trait CalendarApi: Send + Sync {
    async fn insert_event(&self, event: NewEvent) -> AgentResult<CalendarEvent>;
    async fn search_events(
        &self,
        query: Option<&str>,
        time_min: &str,
        time_max: Option<&str>,
    ) -> AgentResult<Vec<CalendarEvent>>;
    async fn delete_event(&self, event_id: &str) -> AgentResult<()>;
    async fn list_calendars(&self) -> AgentResult<Vec<CalendarEntry>>;
}

/// Google Calendar v3 client for a single configured calendar
pub struct CalendarClient {
    client: Client,
    token_manager: TokenManager,
    calendar_id: String,
}

impl CalendarClient {
    pub fn new(config: &Config) -> Self {
        let client = Client::new();
        Self {
            token_manager: TokenManager::new(config, client.clone()),
            client,
            calendar_id: config.google_calendar_id.clone(),
        }
    }

    /// Startup check that calendar credentials are usable
    pub fn verify_credentials(&self) -> AgentResult<()> {
        self.token_manager.verify()
    }

    fn events_url(&self) -> AgentResult<Url> {
        Url::parse(&format!("{}/calendars/{}/events", API_BASE, self.calendar_id))
            .map_err(|e| google_calendar_error(&format!("Failed to build events URL: {}", e)))
    }

    async fn bearer(&self) -> AgentResult<String> {
        let token = self.token_manager.access_token().await?;
        Ok(format!("Bearer {}", token))
    }

    /// Turn a non-2xx response into an error carrying the remote body verbatim
    async fn check_status(
        context: &str,
        response: reqwest::Response,
    ) -> AgentResult<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Could not read error response".to_string());
        Err(google_calendar_error(&format!(
            "{}: HTTP {} - {}",
            context, status, error_body
        )))
    }
}

#[async_trait]
impl CalendarApi for CalendarClient {
    async fn insert_event(&self, event: NewEvent) -> AgentResult<CalendarEvent> {
        let url = self.events_url()?;
        info!(summary = %event.summary, "Inserting calendar event");

        let response = self
            .client
            .post(url)
            .header("Authorization", self.bearer().await?)
            .json(&event)
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to insert event: {}", e)))?;

        let response = Self::check_status("Failed to insert event", response).await?;
        response
            .json::<CalendarEvent>()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to parse insert response: {}", e)))
    }

    async fn search_events(
        &self,
        query: Option<&str>,
        time_min: &str,
        time_max: Option<&str>,
    ) -> AgentResult<Vec<CalendarEvent>> {
        let mut url = self.events_url()?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("timeMin", time_min);
            if let Some(time_max) = time_max {
                pairs.append_pair("timeMax", time_max);
            }
            if let Some(query) = query {
                pairs.append_pair("q", query);
            }
            // Expand recurring events so time bounds apply per instance
            pairs.append_pair("singleEvents", "true");
            pairs.append_pair("orderBy", "startTime");
        }
        debug!(%url, "Searching calendar events");

        let response = self
            .client
            .get(url)
            .header("Authorization", self.bearer().await?)
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to fetch events: {}", e)))?;

        let response = Self::check_status("Failed to fetch events", response).await?;
        let page: EventsPage = response
            .json()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to parse events response: {}", e)))?;
        Ok(page.items)
    }

    async fn delete_event(&self, event_id: &str) -> AgentResult<()> {
        let url = Url::parse(&format!(
            "{}/calendars/{}/events/{}",
            API_BASE, self.calendar_id, event_id
        ))
        .map_err(|e| google_calendar_error(&format!("Failed to build delete URL: {}", e)))?;
        info!(event_id, "Deleting calendar event");

        let response = self
            .client
            .delete(url)
            .header("Authorization", self.bearer().await?)
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to delete event: {}", e)))?;

        Self::check_status("Failed to delete event", response).await?;
        Ok(())
    }

    async fn list_calendars(&self) -> AgentResult<Vec<CalendarEntry>> {
        let url = Url::parse(&format!("{}/users/me/calendarList", API_BASE))
            .map_err(|e| google_calendar_error(&format!("Failed to build calendarList URL: {}", e)))?;

        let response = self
            .client
            .get(url)
            .header("Authorization", self.bearer().await?)
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to fetch calendars: {}", e)))?;

        let response = Self::check_status("Failed to fetch calendars", response).await?;
        let page: CalendarListPage = response.json().await.map_err(|e| {
            google_calendar_error(&format!("Failed to parse calendarList response: {}", e))
        })?;
        Ok(page.items)
    }
}
