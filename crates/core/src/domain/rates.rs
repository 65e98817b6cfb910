//! Declarative rate documents as authored on disk.
//!
//! These are read-only inputs to the compiler. Keys are kept as strings here; the
//! compiler resolves them into typed lookups.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::carrier::CarrierDefinition;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseRatesDocument {
    /// Annual auto base rate by state code.
    #[serde(default)]
    pub auto: HashMap<String, Decimal>,
    #[serde(default)]
    pub home: HashMap<String, Decimal>,
    #[serde(default)]
    pub renters: HashMap<String, Decimal>,
    /// Coverage-level multipliers by vertical name, then level name.
    #[serde(default)]
    pub coverage_multipliers: HashMap<String, HashMap<String, Decimal>>,
    /// Deductible multipliers keyed by the deductible amount in whole units.
    #[serde(default)]
    pub deductible_multipliers: HashMap<String, Decimal>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeBracket {
    pub min: u32,
    pub max: u32,
    pub multiplier: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeFactorsDocument {
    pub brackets: Vec<AgeBracket>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditFactorsDocument {
    pub tiers: HashMap<String, Decimal>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleFactorsDocument {
    #[serde(default)]
    pub vehicle_types: HashMap<String, Decimal>,
    #[serde(default)]
    pub vehicle_age: HashMap<String, Decimal>,
    #[serde(default)]
    pub safety_ratings: HashMap<String, Decimal>,
    #[serde(default)]
    pub theft_ratings: HashMap<String, Decimal>,
    #[serde(default)]
    pub annual_mileage: HashMap<String, Decimal>,
    #[serde(default)]
    pub violations: HashMap<String, Decimal>,
}

/// One consistent snapshot of every rate document plus the enabled carrier roster.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RateConfiguration {
    pub base_rates: BaseRatesDocument,
    pub age_factors: AgeFactorsDocument,
    pub credit_factors: CreditFactorsDocument,
    pub vehicle_factors: VehicleFactorsDocument,
    pub carriers: Vec<CarrierDefinition>,
}
