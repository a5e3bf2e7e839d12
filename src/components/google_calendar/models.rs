use serde::{Deserialize, Serialize};

/// Start or end of an event, either timed or all-day
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct EventTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventTime {
    /// Timed event boundary in the given timezone
    pub fn at(date_time: &str, time_zone: &str) -> Self {
        Self {
            date_time: Some(date_time.to_string()),
            date: None,
            time_zone: Some(time_zone.to_string()),
        }
    }

    /// Human-readable form, falling back through dateTime and date
    pub fn display(&self) -> &str {
        self.date_time
            .as_deref()
            .or(self.date.as_deref())
            .unwrap_or("unknown")
    }
}

/// Calendar event as returned by the events API
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: Option<String>,
    pub location: Option<String>,
    pub start: Option<EventTime>,
    pub end: Option<EventTime>,
    pub recurrence: Option<Vec<String>>,
    pub recurring_event_id: Option<String>,
    pub html_link: Option<String>,
}

impl CalendarEvent {
    /// Id of the recurring series master, or the event's own id
    ///
    /// Deleting the master removes the whole series, so scoped deletes
    /// collapse expanded instances onto this id.
    pub fn master_id(&self) -> &str {
        self.recurring_event_id.as_deref().unwrap_or(&self.id)
    }

    /// "start to end" line for user-facing output
    pub fn time_span(&self) -> String {
        let start = self.start.as_ref().map(EventTime::display).unwrap_or("unknown");
        let end = self.end.as_ref().map(EventTime::display).unwrap_or("unknown");
        format!("{} to {}", start, end)
    }
}

/// Body for event insertion
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Vec<String>>,
    pub reminders: Reminders,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminders {
    pub use_default: bool,
}

impl Default for Reminders {
    fn default() -> Self {
        Self { use_default: true }
    }
}

/// Response shape of the events list endpoint
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct EventsPage {
    pub items: Vec<CalendarEvent>,
}

/// Entry in the user's calendar list
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CalendarEntry {
    pub id: String,
    pub summary: Option<String>,
    pub primary: Option<bool>,
}

/// Response shape of the calendarList endpoint
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CalendarListPage {
    pub items: Vec<CalendarEntry>,
}
