mod schema;

use crate::components::gemini::FunctionDeclaration;
use crate::components::google_calendar::{CalendarApi, EventTime, NewEvent, Reminders};
use crate::error::{invalid_arguments, AgentResult, Error};
use crate::utils::time;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::info;

pub const CREATE_EVENT: &str = "create_event";
pub const FIND_AND_DELETE_EVENTS_BY_SUMMARY: &str = "find_and_delete_events_by_summary";
pub const LIST_CALENDARS: &str = "list_calendars";

/// Arguments for `create_event`
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateEventArgs {
    /// Concise title of the event (e.g. 'Supo', 'Physics Lecture')
    pub summary: String,
    /// Start date and time in YYYY-MM-DDTHH:MM:SS format
    pub start_time: String,
    /// End date and time in YYYY-MM-DDTHH:MM:SS format; defaults to one hour after the start
    #[serde(default)]
    pub end_time: Option<String>,
    /// Physical location of the event
    #[serde(default)]
    pub location: Option<String>,
    /// RRULE string for recurring events (e.g. 'RRULE:FREQ=WEEKLY;BYDAY=TH')
    #[serde(default)]
    pub recurrence_rule: Option<String>,
}

/// Arguments for `find_and_delete_events_by_summary`
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DeleteEventsArgs {
    /// Search term matched against event summaries
    #[serde(default)]
    pub summary_query: Option<String>,
    /// Lower time bound (RFC 3339 or YYYY-MM-DDTHH:MM:SS); defaults to now
    #[serde(default)]
    pub time_min: Option<String>,
    /// Upper time bound (RFC 3339 or YYYY-MM-DDTHH:MM:SS)
    #[serde(default)]
    pub time_max: Option<String>,
}

/// A validated function-call proposal
///
/// The closed set of operations the model may invoke; anything else is
/// rejected at parse time.
#[derive(Debug, Clone)]
pub enum FunctionCall {
    CreateEvent(CreateEventArgs),
    FindAndDeleteEventsBySummary(DeleteEventsArgs),
    ListCalendars,
}

impl FunctionCall {
    pub fn name(&self) -> &'static str {
        match self {
            FunctionCall::CreateEvent(_) => CREATE_EVENT,
            FunctionCall::FindAndDeleteEventsBySummary(_) => FIND_AND_DELETE_EVENTS_BY_SUMMARY,
            FunctionCall::ListCalendars => LIST_CALENDARS,
        }
    }

    /// Mutating operations require user confirmation before execution
    pub fn is_mutating(&self) -> bool {
        match self {
            FunctionCall::CreateEvent(_) | FunctionCall::FindAndDeleteEventsBySummary(_) => true,
            FunctionCall::ListCalendars => false,
        }
    }

    /// Confirmation block shown to the user for mutating operations
    pub fn confirmation_text(&self) -> Option<String> {
        match self {
            FunctionCall::CreateEvent(args) => {
                let end = args.end_time.clone().unwrap_or_else(|| {
                    time::parse_timestamp(CREATE_EVENT, "start_time", &args.start_time)
                        .map(time::default_end_time)
                        .unwrap_or_else(|_| "unknown".to_string())
                });
                Some(format!(
                    "--- CONFIRMATION REQUIRED ---\n\
                     Action: + ADD Event\n\
                     Summary: {}\n\
                     Time: {} to {}\n\
                     Location: {}\n\
                     Recurrence: {}\n\
                     ----------------------------",
                    args.summary,
                    args.start_time,
                    end,
                    args.location.as_deref().unwrap_or("None"),
                    args.recurrence_rule.as_deref().unwrap_or("None"),
                ))
            }
            FunctionCall::FindAndDeleteEventsBySummary(args) => Some(format!(
                "--- CONFIRMATION REQUIRED ---\n\
                 Action: - DELETE Events\n\
                 Matching: {}\n\
                 From: {}\n\
                 To: {}\n\
                 ----------------------------",
                args.summary_query.as_deref().unwrap_or("any summary"),
                args.time_min.as_deref().unwrap_or("now"),
                args.time_max.as_deref().unwrap_or("open-ended"),
            )),
            FunctionCall::ListCalendars => None,
        }
    }
}

/// The fixed set of operations exposed to the model
pub struct FunctionRegistry {
    timezone: String,
}

impl FunctionRegistry {
    pub fn new(timezone: &str) -> Self {
        Self {
            timezone: timezone.to_string(),
        }
    }

    /// Function declarations sent to the model with every request
    pub fn declarations(&self) -> Vec<FunctionDeclaration> {
        vec![
            FunctionDeclaration {
                name: CREATE_EVENT.to_string(),
                description: "Creates a single or recurring calendar event. All natural-language \
                              times must already be resolved to precise YYYY-MM-DDTHH:MM:SS \
                              timestamps before calling this function."
                    .to_string(),
                parameters: schema::parameters_for::<CreateEventArgs>(),
            },
            FunctionDeclaration {
                name: FIND_AND_DELETE_EVENTS_BY_SUMMARY.to_string(),
                description: "Finds all upcoming events matching a summary query and/or a time \
                              range and deletes every match. Recurring events are deleted as a \
                              whole series. At least one of summary_query, time_min or time_max \
                              must be given."
                    .to_string(),
                parameters: schema::parameters_for::<DeleteEventsArgs>(),
            },
            FunctionDeclaration {
                name: LIST_CALENDARS.to_string(),
                description: "Lists the ID and summary of all calendars accessible to the user."
                    .to_string(),
                parameters: schema::parameters_for::<EmptyArgs>(),
            },
        ]
    }

    /// Validate a model proposal against the declared operation set
    ///
    /// Unknown names and schema-invalid arguments are distinct error
    /// kinds; neither touches the calendar.
    pub fn parse(&self, name: &str, args: &Value) -> AgentResult<FunctionCall> {
        match name {
            CREATE_EVENT => {
                let args: CreateEventArgs = from_args(CREATE_EVENT, args)?;
                time::parse_timestamp(CREATE_EVENT, "start_time", &args.start_time)?;
                if let Some(end_time) = &args.end_time {
                    time::parse_timestamp(CREATE_EVENT, "end_time", end_time)?;
                }
                Ok(FunctionCall::CreateEvent(args))
            }
            FIND_AND_DELETE_EVENTS_BY_SUMMARY => {
                let args: DeleteEventsArgs = from_args(FIND_AND_DELETE_EVENTS_BY_SUMMARY, args)?;
                if args.summary_query.is_none() && args.time_min.is_none() && args.time_max.is_none()
                {
                    return Err(invalid_arguments(
                        FIND_AND_DELETE_EVENTS_BY_SUMMARY,
                        "at least one of summary_query, time_min or time_max is required",
                    ));
                }
                for (field, value) in [("time_min", &args.time_min), ("time_max", &args.time_max)] {
                    if let Some(value) = value {
                        time::rfc3339_bound(
                            FIND_AND_DELETE_EVENTS_BY_SUMMARY,
                            field,
                            value,
                            &self.timezone,
                        )?;
                    }
                }
                Ok(FunctionCall::FindAndDeleteEventsBySummary(args))
            }
            LIST_CALENDARS => {
                // The model may omit args entirely; anything else must
                // satisfy the declared empty object schema.
                if !args.is_null() {
                    from_args::<EmptyArgs>(LIST_CALENDARS, args)?;
                }
                Ok(FunctionCall::ListCalendars)
            }
            other => Err(Error::UnknownFunction(other.to_string())),
        }
    }

    /// Execute a confirmed call, one-to-one onto the Calendar Client
    ///
    /// The returned string goes back to the model as the function result.
    pub async fn execute(
        &self,
        call: &FunctionCall,
        calendar: &dyn CalendarApi,
    ) -> AgentResult<String> {
        info!(function = call.name(), "Executing function call");
        match call {
            FunctionCall::CreateEvent(args) => self.create_event(args, calendar).await,
            FunctionCall::FindAndDeleteEventsBySummary(args) => {
                self.find_and_delete(args, calendar).await
            }
            FunctionCall::ListCalendars => self.list_calendars(calendar).await,
        }
    }

    async fn create_event(
        &self,
        args: &CreateEventArgs,
        calendar: &dyn CalendarApi,
    ) -> AgentResult<String> {
        let end_time = match &args.end_time {
            Some(end_time) => end_time.clone(),
            None => {
                let start = time::parse_timestamp(CREATE_EVENT, "start_time", &args.start_time)?;
                time::default_end_time(start)
            }
        };

        let event = NewEvent {
            summary: args.summary.clone(),
            location: args.location.clone(),
            start: EventTime::at(&args.start_time, &self.timezone),
            end: EventTime::at(&end_time, &self.timezone),
            recurrence: args.recurrence_rule.clone().map(|rule| vec![rule]),
            reminders: Reminders::default(),
        };

        let created = calendar.insert_event(event).await?;
        let summary = created.summary.as_deref().unwrap_or(&args.summary);
        Ok(match created.html_link {
            Some(link) => format!("Event '{}' successfully created. Check link: {}", summary, link),
            None => format!("Event '{}' successfully created.", summary),
        })
    }

    async fn find_and_delete(
        &self,
        args: &DeleteEventsArgs,
        calendar: &dyn CalendarApi,
    ) -> AgentResult<String> {
        let time_min = match &args.time_min {
            Some(value) => time::rfc3339_bound(
                FIND_AND_DELETE_EVENTS_BY_SUMMARY,
                "time_min",
                value,
                &self.timezone,
            )?,
            None => time::now_rfc3339(&self.timezone)?,
        };
        let time_max = match &args.time_max {
            Some(value) => Some(time::rfc3339_bound(
                FIND_AND_DELETE_EVENTS_BY_SUMMARY,
                "time_max",
                value,
                &self.timezone,
            )?),
            None => None,
        };

        let matches = calendar
            .search_events(args.summary_query.as_deref(), &time_min, time_max.as_deref())
            .await?;

        if matches.is_empty() {
            return Ok(match &args.summary_query {
                Some(query) => format!("No upcoming events found matching summary '{}'.", query),
                None => "No upcoming events found in the given time range.".to_string(),
            });
        }

        // Instances of a recurring series collapse onto the master id so
        // each series is deleted exactly once.
        let mut deleted_ids = HashSet::new();
        let mut deleted_summaries = Vec::new();
        for event in &matches {
            let master_id = event.master_id();
            if deleted_ids.insert(master_id.to_string()) {
                calendar.delete_event(master_id).await?;
                deleted_summaries.push(
                    event
                        .summary
                        .clone()
                        .unwrap_or_else(|| format!("(untitled, id {})", master_id)),
                );
            }
        }

        Ok(format!(
            "Successfully deleted {} event(s) or series: {}",
            deleted_summaries.len(),
            deleted_summaries.join(", ")
        ))
    }

    async fn list_calendars(&self, calendar: &dyn CalendarApi) -> AgentResult<String> {
        let calendars = calendar.list_calendars().await?;
        if calendars.is_empty() {
            return Ok("No calendars found on the user's account.".to_string());
        }

        let mut output = String::from("Accessible Calendars:\n");
        for entry in calendars {
            let primary = if entry.primary.unwrap_or(false) {
                " (PRIMARY)"
            } else {
                ""
            };
            output.push_str(&format!(
                "- Name: {}{}\n  ID: {}\n",
                entry.summary.as_deref().unwrap_or("(unnamed)"),
                primary,
                entry.id
            ));
        }
        Ok(output)
    }
}

/// No-argument operations still declare an empty object schema
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
struct EmptyArgs {}

fn from_args<T: serde::de::DeserializeOwned>(function: &str, args: &Value) -> AgentResult<T> {
    serde_json::from_value(args.clone()).map_err(|e| invalid_arguments(function, &e.to_string()))
}
