use serde::Serialize;

use crate::commands::{compile_model, load_config, CommandResult};

const COMMAND: &str = "carriers";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CarrierListing {
    id: String,
    name: String,
    market_share: f64,
    rating: String,
    military_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    states: Option<Vec<String>>,
    variance_range: Option<f64>,
    discounts: Vec<String>,
}

pub fn run() -> CommandResult {
    let config = match load_config() {
        Ok(config) => config,
        Err(error) => return CommandResult::from_error(COMMAND, &error),
    };
    let model = match compile_model(&config) {
        Ok(model) => model,
        Err(error) => return CommandResult::from_error(COMMAND, &error),
    };

    let listings: Vec<CarrierListing> = model
        .carriers()
        .iter()
        .map(|carrier| {
            let definition = &carrier.definition;
            CarrierListing {
                id: definition.id.0.clone(),
                name: definition.name.clone(),
                market_share: definition.market_share,
                rating: definition.rating.clone(),
                military_only: definition.is_military_only(),
                states: definition.eligibility.as_ref().and_then(|rules| rules.states.clone()),
                variance_range: definition.variance.enabled.then_some(definition.variance.range),
                discounts: definition.discounts.iter().map(|rule| rule.kind.clone()).collect(),
            }
        })
        .collect();

    CommandResult::document(&listings)
}
