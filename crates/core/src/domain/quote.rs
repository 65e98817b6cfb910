use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::carrier::{CarrierContact, CarrierId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedDiscount {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: Decimal,
}

/// One multiplicative stage of a premium calculation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingStep {
    pub stage: String,
    pub factor: Decimal,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub carrier_id: CarrierId,
    pub carrier_name: String,
    pub rating: String,
    pub contact: CarrierContact,
    pub monthly_premium: i64,
    pub annual_premium: i64,
    pub discounts: Vec<AppliedDiscount>,
    pub strengths: Vec<String>,
    pub best_for: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub savings: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<Vec<RatingStep>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteMetadata {
    pub request_id: String,
    pub calculation_time_ms: f64,
    pub carriers_evaluated: usize,
    pub model_generation: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteResult {
    pub quotes: Vec<Quote>,
    pub metadata: QuoteMetadata,
}

impl QuoteResult {
    pub fn cheapest(&self) -> Option<&Quote> {
        self.quotes.first()
    }

    pub fn find(&self, carrier_id: &str) -> Option<&Quote> {
        self.quotes.iter().find(|quote| quote.carrier_id.0 == carrier_id)
    }
}
