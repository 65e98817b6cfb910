use ratebook_core::ModelSummary;
use serde::Serialize;

use crate::commands::{compile_model, load_config, CommandResult};

const COMMAND: &str = "compile";

#[derive(Debug, Serialize)]
struct CompileReport {
    command: &'static str,
    status: &'static str,
    rates_directory: String,
    summary: ModelSummary,
}

pub fn run() -> CommandResult {
    let config = match load_config() {
        Ok(config) => config,
        Err(error) => return CommandResult::from_error(COMMAND, &error),
    };

    match compile_model(&config) {
        Ok(model) => CommandResult::document(&CompileReport {
            command: COMMAND,
            status: "ok",
            rates_directory: config.rates.directory.display().to_string(),
            summary: model.summary(),
        }),
        Err(error) => CommandResult::from_error(COMMAND, &error),
    }
}
