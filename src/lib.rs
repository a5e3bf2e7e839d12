pub mod components;
pub mod config;
pub mod error;
pub mod functions;
pub mod repl;
pub mod startup;
pub mod utils;
