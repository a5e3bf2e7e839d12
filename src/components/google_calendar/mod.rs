mod client;
pub mod models;
pub mod token;

pub use client::{CalendarApi, CalendarClient};
pub use models::{CalendarEntry, CalendarEvent, EventTime, NewEvent, Reminders};
