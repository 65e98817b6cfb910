pub mod carriers;
pub mod compile;
pub mod config;
pub mod doctor;
pub mod quote;

use std::sync::Arc;

use ratebook_core::config::{AppConfig, LoadOptions};
use ratebook_core::{ApplicationError, CompiledRatingModel, FileRateSource, ModelRegistry};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    /// Successful command whose stdout is a document of its own rather than the envelope.
    pub fn document(value: &impl Serialize) -> Self {
        match serde_json::to_string_pretty(value) {
            Ok(output) => Self { exit_code: 0, output },
            Err(error) => Self::failure("unknown", "serialization", error.to_string(), 1),
        }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn from_error(command: &str, error: &ApplicationError) -> Self {
        let class = error.class();
        Self::failure(
            command,
            class.as_str(),
            format!("{} ({error})", class.user_message()),
            class.exit_code(),
        )
    }
}

pub(crate) fn load_config() -> Result<AppConfig, ApplicationError> {
    Ok(AppConfig::load(LoadOptions::default())?)
}

pub(crate) fn compile_model(
    config: &AppConfig,
) -> Result<Arc<CompiledRatingModel>, ApplicationError> {
    let registry = ModelRegistry::new(Arc::new(FileRateSource::new(&config.rates.directory)));
    Ok(registry.compile()?)
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
