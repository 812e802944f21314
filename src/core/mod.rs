//! Core modules: the data model, its persistence and the planner session.

pub mod config;
pub mod dates;
pub mod error;
pub mod logging;
pub mod model;
pub mod output;
pub mod planner;
pub mod schema;
pub mod store;
pub mod time;
pub mod tui;
