//! Features built on the core: day editing and the calendar view.

pub mod calendar;
pub mod day;
