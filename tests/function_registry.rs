use async_trait::async_trait;
use calagent::components::google_calendar::{
    CalendarApi, CalendarEntry, CalendarEvent, NewEvent,
};
use calagent::error::{AgentResult, Error};
use calagent::functions::{FunctionCall, FunctionRegistry};
use serde_json::json;
use std::sync::Mutex;

/// Recording calendar mock: stores every call, returns canned data
#[derive(Default)]
struct MockCalendar {
    inserted: Mutex<Vec<NewEvent>>,
    deleted: Mutex<Vec<String>>,
    searches: Mutex<Vec<(Option<String>, String, Option<String>)>>,
    search_results: Vec<CalendarEvent>,
    calendars: Vec<CalendarEntry>,
}

#[async_trait]
impl CalendarApi for MockCalendar {
    async fn insert_event(&self, event: NewEvent) -> AgentResult<CalendarEvent> {
        let created = CalendarEvent {
            id: "created_1".to_string(),
            summary: Some(event.summary.clone()),
            html_link: Some("https://calendar.google.com/event?eid=created_1".to_string()),
            ..Default::default()
        };
        self.inserted.lock().unwrap().push(event);
        Ok(created)
    }

    async fn search_events(
        &self,
        query: Option<&str>,
        time_min: &str,
        time_max: Option<&str>,
    ) -> AgentResult<Vec<CalendarEvent>> {
        self.searches.lock().unwrap().push((
            query.map(String::from),
            time_min.to_string(),
            time_max.map(String::from),
        ));
        Ok(self.search_results.clone())
    }

    async fn delete_event(&self, event_id: &str) -> AgentResult<()> {
        self.deleted.lock().unwrap().push(event_id.to_string());
        Ok(())
    }

    async fn list_calendars(&self) -> AgentResult<Vec<CalendarEntry>> {
        Ok(self.calendars.clone())
    }
}

fn registry() -> FunctionRegistry {
    FunctionRegistry::new("Europe/London")
}

#[test]
fn unknown_function_name_is_rejected() {
    let err = registry().parse("drop_database", &json!({})).unwrap_err();
    match err {
        Error::UnknownFunction(name) => assert_eq!(name, "drop_database"),
        other => panic!("expected UnknownFunction, got {:?}", other),
    }
}

#[test]
fn missing_required_argument_is_invalid() {
    let err = registry()
        .parse("create_event", &json!({"start_time": "2025-03-04T13:00:00"}))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArguments { .. }));
}

#[test]
fn undeclared_argument_is_invalid() {
    let err = registry()
        .parse(
            "create_event",
            &json!({
                "summary": "Supo",
                "start_time": "2025-03-04T13:00:00",
                "attendees": ["john"]
            }),
        )
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArguments { .. }));
}

#[test]
fn malformed_timestamp_is_invalid() {
    let err = registry()
        .parse(
            "create_event",
            &json!({"summary": "Supo", "start_time": "tomorrow at 1pm"}),
        )
        .unwrap_err();
    match err {
        Error::InvalidArguments { function, message } => {
            assert_eq!(function, "create_event");
            assert!(message.contains("start_time"));
        }
        other => panic!("expected InvalidArguments, got {:?}", other),
    }
}

#[test]
fn list_calendars_rejects_unexpected_arguments() {
    let err = registry()
        .parse("list_calendars", &json!({"calendar": "primary"}))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArguments { .. }));

    // Empty object and omitted args are both fine
    assert!(registry().parse("list_calendars", &json!({})).is_ok());
    assert!(registry()
        .parse("list_calendars", &serde_json::Value::Null)
        .is_ok());
}

#[test]
fn delete_requires_at_least_one_filter() {
    let err = registry()
        .parse("find_and_delete_events_by_summary", &json!({}))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArguments { .. }));

    let call = registry()
        .parse("find_and_delete_events_by_summary", &json!({"summary_query": "supo"}))
        .unwrap();
    assert!(call.is_mutating());
}

#[test]
fn declarations_cover_all_operations_with_clean_schemas() {
    let declarations = registry().declarations();
    let names: Vec<&str> = declarations.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["create_event", "find_and_delete_events_by_summary", "list_calendars"]
    );

    for declaration in &declarations {
        assert!(declaration.parameters.get("$schema").is_none());
        assert!(declaration.parameters.get("title").is_none());
        assert_eq!(declaration.parameters["type"], "object");
    }

    let create = &declarations[0];
    let required: Vec<&str> = create.parameters["required"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert!(required.contains(&"summary"));
    assert!(required.contains(&"start_time"));
    assert!(!required.contains(&"end_time"));
}

#[test]
fn mutating_calls_render_a_confirmation_block() {
    let call = registry()
        .parse(
            "create_event",
            &json!({
                "summary": "Supervision with John",
                "start_time": "2025-03-04T13:00:00",
                "recurrence_rule": "RRULE:FREQ=WEEKLY"
            }),
        )
        .unwrap();

    let text = call.confirmation_text().unwrap();
    assert!(text.contains("CONFIRMATION REQUIRED"));
    assert!(text.contains("ADD Event"));
    assert!(text.contains("Supervision with John"));
    // Default end time is start + 1 hour
    assert!(text.contains("2025-03-04T13:00:00 to 2025-03-04T14:00:00"));
    assert!(text.contains("RRULE:FREQ=WEEKLY"));

    let list = registry().parse("list_calendars", &json!({})).unwrap();
    assert!(list.confirmation_text().is_none());
    assert!(!list.is_mutating());
}

#[tokio::test]
async fn create_event_passes_arguments_through_unmodified() {
    let calendar = MockCalendar::default();
    let reg = registry();
    let call = reg
        .parse(
            "create_event",
            &json!({
                "summary": "Supo",
                "start_time": "2025-03-04T13:00:00",
                "location": "Sidney Sussex Room B6",
                "recurrence_rule": "RRULE:FREQ=WEEKLY;BYDAY=TU"
            }),
        )
        .unwrap();

    let result = reg.execute(&call, &calendar).await.unwrap();
    assert!(result.contains("successfully created"));

    let inserted = calendar.inserted.lock().unwrap();
    assert_eq!(inserted.len(), 1);
    let event = &inserted[0];
    assert_eq!(event.summary, "Supo");
    assert_eq!(event.location.as_deref(), Some("Sidney Sussex Room B6"));
    assert_eq!(event.start.date_time.as_deref(), Some("2025-03-04T13:00:00"));
    assert_eq!(event.start.time_zone.as_deref(), Some("Europe/London"));
    // Omitted end defaults to start + 1 hour
    assert_eq!(event.end.date_time.as_deref(), Some("2025-03-04T14:00:00"));
    assert_eq!(
        event.recurrence,
        Some(vec!["RRULE:FREQ=WEEKLY;BYDAY=TU".to_string()])
    );
}

#[tokio::test]
async fn scoped_delete_removes_each_series_exactly_once() {
    let calendar = MockCalendar {
        search_results: vec![
            CalendarEvent {
                id: "instance_1".to_string(),
                summary: Some("Supo".to_string()),
                recurring_event_id: Some("series_1".to_string()),
                ..Default::default()
            },
            CalendarEvent {
                id: "instance_2".to_string(),
                summary: Some("Supo".to_string()),
                recurring_event_id: Some("series_1".to_string()),
                ..Default::default()
            },
            CalendarEvent {
                id: "single_1".to_string(),
                summary: Some("Dentist".to_string()),
                ..Default::default()
            },
        ],
        ..Default::default()
    };

    let reg = registry();
    let call = reg
        .parse(
            "find_and_delete_events_by_summary",
            &json!({
                "time_min": "2025-03-05T00:00:00+00:00",
                "time_max": "2025-03-06T00:00:00+00:00"
            }),
        )
        .unwrap();

    let result = reg.execute(&call, &calendar).await.unwrap();
    assert!(result.contains("2 event(s)"));

    // Time bounds reach the search call exactly as supplied
    let searches = calendar.searches.lock().unwrap();
    assert_eq!(searches.len(), 1);
    assert_eq!(searches[0].1, "2025-03-05T00:00:00+00:00");
    assert_eq!(searches[0].2.as_deref(), Some("2025-03-06T00:00:00+00:00"));

    let deleted = calendar.deleted.lock().unwrap();
    assert_eq!(*deleted, vec!["series_1".to_string(), "single_1".to_string()]);
}

#[tokio::test]
async fn delete_with_no_matches_reports_without_deleting() {
    let calendar = MockCalendar::default();
    let reg = registry();
    let call = reg
        .parse("find_and_delete_events_by_summary", &json!({"summary_query": "supo"}))
        .unwrap();

    let result = reg.execute(&call, &calendar).await.unwrap();
    assert!(result.contains("No upcoming events found matching summary 'supo'"));
    assert!(calendar.deleted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn list_calendars_formats_entries() {
    let calendar = MockCalendar {
        calendars: vec![
            CalendarEntry {
                id: "primary_id".to_string(),
                summary: Some("Personal".to_string()),
                primary: Some(true),
            },
            CalendarEntry {
                id: "uni_id".to_string(),
                summary: Some("University".to_string()),
                primary: None,
            },
        ],
        ..Default::default()
    };

    let reg = registry();
    let call = reg.parse("list_calendars", &json!({})).unwrap();
    let result = reg.execute(&call, &calendar).await.unwrap();

    assert!(result.contains("Personal (PRIMARY)"));
    assert!(result.contains("University"));
    assert!(result.contains("uni_id"));
}

#[test]
fn rejected_proposals_never_touch_the_calendar() {
    // Parsing happens before any remote call; a rejection is proof the
    // calendar client was never involved.
    let reg = registry();
    assert!(reg.parse("nuke_everything", &json!({})).is_err());
    assert!(reg
        .parse("create_event", &json!({"summary": 42, "start_time": true}))
        .is_err());
    let _ = FunctionCall::ListCalendars;
}
