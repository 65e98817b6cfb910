use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use ratebook_core::{
    ApplicationError, QuoteRequest, RatingEngine, SeededVariance, ThreadRngVariance,
    VarianceSource,
};
use tracing::info;

use crate::commands::{compile_model, load_config, CommandResult};

const COMMAND: &str = "quote";

#[derive(Clone, Debug, Default)]
pub struct QuoteArgs {
    /// Request document path, or `-` for stdin.
    pub request: PathBuf,
    pub seed: Option<u64>,
    pub no_variance: bool,
    pub explain: bool,
}

pub fn run(args: QuoteArgs) -> CommandResult {
    let raw = match read_request(&args.request) {
        Ok(raw) => raw,
        Err(error) => return CommandResult::from_error(COMMAND, &error),
    };
    run_with_input(args, &raw)
}

pub fn run_with_input(args: QuoteArgs, raw_request: &str) -> CommandResult {
    match quote(&args, raw_request) {
        Ok(output) => output,
        Err(error) => CommandResult::from_error(COMMAND, &error),
    }
}

fn quote(args: &QuoteArgs, raw_request: &str) -> Result<CommandResult, ApplicationError> {
    let config = load_config()?;
    let request = parse_request(raw_request)?;
    let model = compile_model(&config)?;

    let mut options = config.engine_options();
    options.include_breakdown = args.explain;
    if args.no_variance {
        options.variance_enabled = false;
    }

    let variance: Box<dyn VarianceSource> = match args.seed.or(config.engine.variance_seed) {
        Some(seed) => Box::new(SeededVariance::new(seed)),
        None => Box::new(ThreadRngVariance),
    };
    let engine = RatingEngine::with_variance(variance, options);
    let result = engine.generate_quotes(&model, &request);

    info!(
        event_name = "cli.quote.completed",
        request_id = %result.metadata.request_id,
        quotes = result.quotes.len(),
        cheapest = result.cheapest().map_or("none", |quote| quote.carrier_id.0.as_str()),
        "quote command completed"
    );
    Ok(CommandResult::document(&result))
}

fn read_request(path: &Path) -> Result<String, ApplicationError> {
    if path.as_os_str() == "-" {
        let mut raw = String::new();
        io::stdin()
            .read_to_string(&mut raw)
            .map_err(|error| ApplicationError::InvalidRequest(format!("stdin: {error}")))?;
        return Ok(raw);
    }

    fs::read_to_string(path).map_err(|error| {
        ApplicationError::InvalidRequest(format!("`{}`: {error}", path.display()))
    })
}

fn parse_request(raw: &str) -> Result<QuoteRequest, ApplicationError> {
    let request: QuoteRequest = serde_json::from_str(raw)
        .map_err(|error| ApplicationError::InvalidRequest(error.to_string()))?;
    if request.state_code().is_empty() {
        return Err(ApplicationError::InvalidRequest("`state` must not be blank".to_string()));
    }
    Ok(request)
}
