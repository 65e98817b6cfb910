use std::time::Instant;

use chrono::{Datelike, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use tracing::debug;

use crate::domain::quote::{Quote, QuoteMetadata, QuoteResult};
use crate::domain::request::QuoteRequest;
use crate::rating::compiler::{CompiledCarrier, CompiledRatingModel};
use crate::rating::discounts::applicable_discounts;
use crate::rating::pipelines::{calculate, PipelineInput};
use crate::rating::variance::{variance_factor, ThreadRngVariance, VarianceSource};

const REQUEST_ID_SUFFIX_LEN: usize = 9;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineOptions {
    /// Global switch; when off, carrier variance settings are ignored.
    pub variance_enabled: bool,
    /// Year used to derive vehicle age from the model year.
    pub reference_year: i32,
    pub include_breakdown: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self { variance_enabled: true, reference_year: Utc::now().year(), include_breakdown: false }
    }
}

pub struct RatingEngine<V = ThreadRngVariance> {
    variance: V,
    options: EngineOptions,
}

impl RatingEngine<ThreadRngVariance> {
    pub fn new() -> Self {
        Self::with_variance(ThreadRngVariance, EngineOptions::default())
    }
}

impl Default for RatingEngine<ThreadRngVariance> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: VarianceSource> RatingEngine<V> {
    pub fn with_variance(variance: V, options: EngineOptions) -> Self {
        Self { variance, options }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Prices `request` against every enabled, eligible carrier in `model`.
    ///
    /// Quotes come back cheapest first. Never fails: missing request fields and unknown
    /// lookup keys price at neutral factors.
    pub fn generate_quotes(&self, model: &CompiledRatingModel, request: &QuoteRequest) -> QuoteResult {
        let started = Instant::now();
        let request_id = generate_request_id();
        let state_code = request.state_code();

        let mut quotes: Vec<Quote> = model
            .carriers()
            .iter()
            .filter(|carrier| carrier_is_eligible(carrier, &state_code, request))
            .map(|carrier| self.quote_carrier(model, carrier, request, &state_code))
            .collect();

        // `sort_by_key` is stable, so equal premiums keep market-share order.
        quotes.sort_by_key(|quote| quote.monthly_premium);
        apply_savings(&mut quotes);

        let calculation_time_ms = started.elapsed().as_secs_f64() * 1_000.0;
        debug!(
            event_name = "rating.quotes.generated",
            request_id = %request_id,
            insurance_type = %request.insurance_type,
            state = %state_code,
            quotes = quotes.len(),
            model_generation = model.generation(),
            calculation_time_ms,
            "generated quotes"
        );

        let carriers_evaluated = quotes.len();
        QuoteResult {
            quotes,
            metadata: QuoteMetadata {
                request_id,
                calculation_time_ms,
                carriers_evaluated,
                model_generation: model.generation(),
            },
        }
    }

    fn quote_carrier(
        &self,
        model: &CompiledRatingModel,
        carrier: &CompiledCarrier,
        request: &QuoteRequest,
        state_code: &str,
    ) -> Quote {
        let definition = &carrier.definition;
        let variance = if self.options.variance_enabled {
            variance_factor(&self.variance, &definition.variance)
        } else {
            Decimal::ONE
        };

        let input = PipelineInput {
            model,
            carrier,
            request,
            state_code,
            reference_year: self.options.reference_year,
            variance,
        };
        let calculation = calculate(&input, self.options.include_breakdown);
        let monthly_premium = calculation.monthly_premium;

        Quote {
            carrier_id: definition.id.clone(),
            carrier_name: definition.name.clone(),
            rating: definition.rating.clone(),
            contact: definition.contact.clone(),
            monthly_premium,
            annual_premium: monthly_premium.saturating_mul(12),
            discounts: applicable_discounts(
                &definition.discounts,
                request,
                monthly_premium,
                self.options.reference_year,
            ),
            strengths: definition.strengths.clone(),
            best_for: definition.best_for.clone(),
            savings: None,
            breakdown: calculation.steps,
        }
    }
}

fn carrier_is_eligible(carrier: &CompiledCarrier, state_code: &str, request: &QuoteRequest) -> bool {
    let definition = &carrier.definition;
    if !definition.enabled {
        return false;
    }
    if !definition.accepts(state_code, request.is_military) {
        debug!(
            event_name = "rating.carrier.ineligible",
            carrier_id = %definition.id.0,
            military_only = definition.is_military_only(),
            state = %state_code,
            "carrier excluded by eligibility rules"
        );
        return false;
    }
    true
}

/// Relative savings against the most expensive quote; only meaningful with two or more.
fn apply_savings(quotes: &mut [Quote]) {
    if quotes.len() < 2 {
        return;
    }
    let Some(max_annual) = quotes.iter().map(|quote| quote.annual_premium).max() else {
        return;
    };
    for quote in quotes.iter_mut() {
        quote.savings = Some(max_annual - quote.annual_premium);
    }
}

/// `REQ-<unix millis>-<9 base36 chars>`.
pub fn generate_request_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..REQUEST_ID_SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("REQ-{}-{suffix}", Utc::now().timestamp_millis())
}
