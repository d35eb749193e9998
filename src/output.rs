use std::io::{self, Write};

use serde::Serialize;
use tracing::info;

use crate::app::{BuildResult, ProgressEvent, ProgressSink};
use crate::domain::{InvestigationResult, ProjectRecord};

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_build(result: &BuildResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_index(records: &[ProjectRecord]) -> io::Result<()> {
        Self::print_json(&records)
    }

    pub fn print_investigation(result: &InvestigationResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_assays(assays: &[String]) -> io::Result<()> {
        Self::print_json(&assays)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

pub struct LogSink;

impl ProgressSink for LogSink {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => info!(elapsed_ms = elapsed.as_millis() as u64, "{}", event.message),
            None => info!("{}", event.message),
        }
    }
}
