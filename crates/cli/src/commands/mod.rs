//! One-shot subcommands. Each opens the data file, runs one engine
//! operation, and prints the result as text or JSON.

pub(crate) mod leads;
pub(crate) mod reports;

use leadbook_engine::LeadService;
use leadbook_storage::MemoryStorage;
use serde::Serialize;

use crate::config::Config;
use crate::error::CliError;
use crate::OutputFormat;

#[derive(Debug, Clone, Copy)]
pub(crate) struct Context {
    pub(crate) output: OutputFormat,
    pub(crate) quiet: bool,
}

impl Context {
    /// Print `value` as pretty JSON, or `text()` in text mode.
    ///
    /// `--quiet` only silences text output; JSON is the command's result.
    pub(crate) fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) {
        match self.output {
            OutputFormat::Json => {
                let pretty = serde_json::to_string_pretty(value)
                    .unwrap_or_else(|e| format!("{{\"error\": \"serialization error: {}\"}}", e));
                println!("{}", pretty);
            }
            OutputFormat::Text => {
                if !self.quiet {
                    println!("{}", text());
                }
            }
        }
    }
}

pub(crate) async fn open_service(config: &Config) -> Result<LeadService<MemoryStorage>, CliError> {
    let storage = MemoryStorage::open(&config.data_file).await?;
    Ok(LeadService::new(storage))
}
