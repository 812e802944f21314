//! Output format shared by every command.

use crate::core::error::DaybookError;
use clap::ValueEnum;
use serde_json::Value as JsonValue;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn print_json(value: &JsonValue) -> Result<(), DaybookError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
