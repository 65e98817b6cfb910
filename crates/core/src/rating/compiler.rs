//! Compiles declarative rate documents into an immutable lookup model.
//!
//! Age factors become a dense array indexed by `age - 16`; every other discrete factor
//! becomes a hash map. Carrier adjustments are resolved into fixed-size arrays so the
//! request path never scans configuration.

use std::collections::HashMap;
use std::mem::size_of;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::carrier::{sort_by_market_share, CarrierDefinition};
use crate::domain::rates::{AgeBracket, RateConfiguration, VehicleFactorsDocument};
use crate::domain::vertical::InsuranceType;
use crate::rating::buckets::{parse_bucket, MileageBand, VehicleAgeBracket, ViolationBucket};
use crate::rating::profile::ProfileType;
use crate::rating::region::{region_table, Region, FALLBACK_REGION};
use crate::rating::source::{RateSource, RateSourceError};

pub const MIN_RATED_AGE: u32 = 16;
pub const MAX_RATED_AGE: u32 = 120;
pub const AGE_SLOTS: usize = (MAX_RATED_AGE - MIN_RATED_AGE + 1) as usize;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Source(#[from] RateSourceError),
    #[error("deductible key `{key}` is not a whole amount")]
    InvalidDeductibleKey { key: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub generation: u64,
    pub carriers: usize,
    pub indexed_rates: usize,
    pub estimated_bytes: usize,
    pub compiled_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeTableDiagnostics {
    /// Pairs of bracket positions whose ranges intersect; the later bracket wins.
    pub overlapping_brackets: Vec<(usize, usize)>,
    /// Rated ages with no bracket, priced at the neutral multiplier.
    pub uncovered_ages: Vec<u32>,
    /// Brackets with bounds outside the rated range or `min > max`.
    pub out_of_range_brackets: Vec<usize>,
}

impl AgeTableDiagnostics {
    pub fn is_clean(&self) -> bool {
        self.overlapping_brackets.is_empty()
            && self.uncovered_ages.is_empty()
            && self.out_of_range_brackets.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct CompiledCarrier {
    pub definition: CarrierDefinition,
    region_factors: [Decimal; 4],
    profile_factors: [Decimal; 6],
}

impl CompiledCarrier {
    fn new(definition: CarrierDefinition) -> Self {
        let mut region_factors = [Decimal::ONE; 4];
        for (name, factor) in &definition.adjustments.regions {
            match Region::from_key(name) {
                Some(region) => region_factors[region.index()] = *factor,
                None => warn!(
                    event_name = "rating.compile.unknown_region",
                    carrier_id = %definition.id.0,
                    region = %name,
                    "ignoring adjustment for unknown region"
                ),
            }
        }

        let mut profile_factors = [Decimal::ONE; 6];
        for (name, factor) in &definition.adjustments.profile_types {
            match ProfileType::from_key(name) {
                Some(profile) => profile_factors[profile.index()] = *factor,
                None => warn!(
                    event_name = "rating.compile.unknown_profile_type",
                    carrier_id = %definition.id.0,
                    profile_type = %name,
                    "ignoring adjustment for unknown profile type"
                ),
            }
        }

        Self { definition, region_factors, profile_factors }
    }

    pub fn id(&self) -> &str {
        &self.definition.id.0
    }

    pub fn region_factor(&self, region: Region) -> Decimal {
        self.region_factors[region.index()]
    }

    pub fn profile_factor(&self, profile: ProfileType) -> Decimal {
        self.profile_factors[profile.index()]
    }
}

#[derive(Clone, Debug)]
pub struct CompiledRatingModel {
    generation: u64,
    compiled_at: DateTime<Utc>,
    base_rates: HashMap<InsuranceType, HashMap<String, Decimal>>,
    coverage_multipliers: HashMap<InsuranceType, HashMap<String, Decimal>>,
    deductible_multipliers: HashMap<u32, Decimal>,
    age_multipliers: [Decimal; AGE_SLOTS],
    age_brackets: Vec<AgeBracket>,
    credit_tiers: HashMap<String, Decimal>,
    vehicle_types: HashMap<String, Decimal>,
    vehicle_age: HashMap<VehicleAgeBracket, Decimal>,
    safety_ratings: HashMap<String, Decimal>,
    theft_ratings: HashMap<String, Decimal>,
    annual_mileage: HashMap<MileageBand, Decimal>,
    violations: HashMap<ViolationBucket, Decimal>,
    regions: HashMap<&'static str, Region>,
    carriers: Vec<CompiledCarrier>,
    carrier_index: HashMap<String, usize>,
}

/// Loads every fragment from `source` and compiles it as generation 1.
pub fn compile(source: &dyn RateSource) -> Result<CompiledRatingModel, CompileError> {
    compile_generation(source, 1)
}

pub fn compile_generation(
    source: &dyn RateSource,
    generation: u64,
) -> Result<CompiledRatingModel, CompileError> {
    let configuration = source.load_configuration()?;
    let model = CompiledRatingModel::from_configuration(configuration, generation)?;

    let summary = model.summary();
    info!(
        event_name = "rating.model.compiled",
        source = %source.describe(),
        generation = summary.generation,
        carriers = summary.carriers,
        indexed_rates = summary.indexed_rates,
        estimated_bytes = summary.estimated_bytes,
        "rating model compiled"
    );
    Ok(model)
}

impl CompiledRatingModel {
    pub fn from_configuration(
        configuration: RateConfiguration,
        generation: u64,
    ) -> Result<Self, CompileError> {
        let RateConfiguration {
            base_rates,
            age_factors,
            credit_factors,
            vehicle_factors,
            mut carriers,
        } = configuration;
        sort_by_market_share(&mut carriers);

        let mut compiled_base_rates = HashMap::new();
        for (vertical, rates) in [
            (InsuranceType::Auto, base_rates.auto),
            (InsuranceType::Home, base_rates.home),
            (InsuranceType::Renters, base_rates.renters),
        ] {
            compiled_base_rates.insert(vertical, upper_keys(rates));
        }

        let mut coverage_multipliers = HashMap::new();
        for (vertical, levels) in base_rates.coverage_multipliers {
            match vertical.parse::<InsuranceType>() {
                Ok(vertical) => {
                    coverage_multipliers.insert(vertical, lower_keys(levels));
                }
                Err(error) => warn!(
                    event_name = "rating.compile.unknown_vertical",
                    error = %error,
                    "ignoring coverage multipliers for unknown vertical"
                ),
            }
        }

        let mut deductible_multipliers = HashMap::new();
        for (key, factor) in base_rates.deductible_multipliers {
            let amount = key
                .trim()
                .parse::<u32>()
                .map_err(|_| CompileError::InvalidDeductibleKey { key: key.clone() })?;
            deductible_multipliers.insert(amount, factor);
        }

        let age_multipliers = build_age_array(&age_factors.brackets);

        let VehicleFactorsDocument {
            vehicle_types,
            vehicle_age,
            safety_ratings,
            theft_ratings,
            annual_mileage,
            violations,
        } = vehicle_factors;

        let carriers: Vec<CompiledCarrier> = carriers.into_iter().map(CompiledCarrier::new).collect();
        let carrier_index = carriers
            .iter()
            .enumerate()
            .map(|(position, carrier)| (carrier.id().to_string(), position))
            .collect();

        Ok(Self {
            generation,
            compiled_at: Utc::now(),
            base_rates: compiled_base_rates,
            coverage_multipliers,
            deductible_multipliers,
            age_multipliers,
            age_brackets: age_factors.brackets,
            credit_tiers: lower_keys(credit_factors.tiers),
            vehicle_types: lower_keys(vehicle_types),
            vehicle_age: bucket_keys(vehicle_age, &VehicleAgeBracket::ALL, VehicleAgeBracket::key),
            safety_ratings: lower_keys(safety_ratings),
            theft_ratings: lower_keys(theft_ratings),
            annual_mileage: bucket_keys(annual_mileage, &MileageBand::ALL, MileageBand::key),
            violations: bucket_keys(violations, &ViolationBucket::ALL, ViolationBucket::key),
            regions: region_table(),
            carriers,
            carrier_index,
        })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn compiled_at(&self) -> DateTime<Utc> {
        self.compiled_at
    }

    pub fn base_rate(&self, vertical: InsuranceType, state_code: &str) -> Option<Decimal> {
        self.base_rates.get(&vertical).and_then(|rates| rates.get(state_code)).copied()
    }

    pub fn coverage_multiplier(&self, vertical: InsuranceType, level: &str) -> Decimal {
        self.coverage_multipliers
            .get(&vertical)
            .map_or(Decimal::ONE, |levels| lookup(levels, Some(level)))
    }

    /// Direct index into the dense age array; ages outside 16..=120 clamp to the ends.
    pub fn age_multiplier(&self, age: u32) -> Decimal {
        let index = age.saturating_sub(MIN_RATED_AGE).min(MAX_RATED_AGE - MIN_RATED_AGE);
        self.age_multipliers[index as usize]
    }

    pub fn credit_multiplier(&self, tier: Option<&str>) -> Decimal {
        lookup(&self.credit_tiers, tier)
    }

    pub fn vehicle_type_multiplier(&self, vehicle_type: Option<&str>) -> Decimal {
        lookup(&self.vehicle_types, vehicle_type)
    }

    pub fn vehicle_age_multiplier(&self, bracket: VehicleAgeBracket) -> Decimal {
        self.vehicle_age.get(&bracket).copied().unwrap_or(Decimal::ONE)
    }

    pub fn safety_multiplier(&self, rating: Option<&str>) -> Decimal {
        lookup(&self.safety_ratings, rating)
    }

    pub fn theft_multiplier(&self, rating: Option<&str>) -> Decimal {
        lookup(&self.theft_ratings, rating)
    }

    pub fn mileage_multiplier(&self, band: MileageBand) -> Decimal {
        self.annual_mileage.get(&band).copied().unwrap_or(Decimal::ONE)
    }

    pub fn violation_multiplier(&self, bucket: ViolationBucket) -> Decimal {
        self.violations.get(&bucket).copied().unwrap_or(Decimal::ONE)
    }

    pub fn deductible_multiplier(&self, deductible: u32) -> Decimal {
        self.deductible_multipliers.get(&deductible).copied().unwrap_or(Decimal::ONE)
    }

    pub fn region_for(&self, state_code: &str) -> Region {
        self.regions.get(state_code).copied().unwrap_or(FALLBACK_REGION)
    }

    /// Carriers in descending market-share order, ties by id.
    pub fn carriers(&self) -> &[CompiledCarrier] {
        &self.carriers
    }

    pub fn carrier(&self, id: &str) -> Option<&CompiledCarrier> {
        self.carrier_index.get(id).map(|position| &self.carriers[*position])
    }

    pub fn summary(&self) -> ModelSummary {
        let string_keyed = [
            &self.credit_tiers,
            &self.vehicle_types,
            &self.safety_ratings,
            &self.theft_ratings,
        ]
        .into_iter()
        .chain(self.base_rates.values())
        .chain(self.coverage_multipliers.values());

        let mut indexed_rates = AGE_SLOTS;
        let mut estimated_bytes = size_of::<Self>();
        for table in string_keyed {
            indexed_rates += table.len();
            estimated_bytes += table
                .keys()
                .map(|key| size_of::<String>() + key.len() + size_of::<Decimal>())
                .sum::<usize>();
        }

        let enum_keyed = self.deductible_multipliers.len()
            + self.vehicle_age.len()
            + self.annual_mileage.len()
            + self.violations.len();
        indexed_rates += enum_keyed;
        estimated_bytes += enum_keyed * (size_of::<u32>() + size_of::<Decimal>());
        estimated_bytes += self.regions.len() * (size_of::<&str>() + size_of::<Region>());
        estimated_bytes += self.carriers.len() * (size_of::<CompiledCarrier>() + size_of::<usize>());

        ModelSummary {
            generation: self.generation,
            carriers: self.carriers.len(),
            indexed_rates,
            estimated_bytes,
            compiled_at: self.compiled_at,
        }
    }

    pub fn age_table_diagnostics(&self) -> AgeTableDiagnostics {
        let mut diagnostics = AgeTableDiagnostics::default();
        let mut covered = [false; AGE_SLOTS];

        for (position, bracket) in self.age_brackets.iter().enumerate() {
            if bracket.min > bracket.max
                || bracket.min < MIN_RATED_AGE
                || bracket.max > MAX_RATED_AGE
            {
                diagnostics.out_of_range_brackets.push(position);
            }
            for age in bracket.min.max(MIN_RATED_AGE)..=bracket.max.min(MAX_RATED_AGE) {
                covered[(age - MIN_RATED_AGE) as usize] = true;
            }
            for (other_position, other) in self.age_brackets.iter().enumerate().skip(position + 1) {
                if bracket.min <= other.max && other.min <= bracket.max {
                    diagnostics.overlapping_brackets.push((position, other_position));
                }
            }
        }

        diagnostics.uncovered_ages = covered
            .iter()
            .enumerate()
            .filter(|(_, is_covered)| !**is_covered)
            .map(|(index, _)| index as u32 + MIN_RATED_AGE)
            .collect();
        diagnostics
    }
}

fn build_age_array(brackets: &[AgeBracket]) -> [Decimal; AGE_SLOTS] {
    let mut ages = [Decimal::ONE; AGE_SLOTS];
    for bracket in brackets {
        let first = bracket.min.max(MIN_RATED_AGE);
        let last = bracket.max.min(MAX_RATED_AGE);
        for age in first..=last {
            ages[(age - MIN_RATED_AGE) as usize] = bracket.multiplier;
        }
    }
    ages
}

fn lookup(table: &HashMap<String, Decimal>, key: Option<&str>) -> Decimal {
    let Some(key) = key.map(str::trim) else {
        return Decimal::ONE;
    };

    table
        .get(key)
        .or_else(|| table.get(&key.to_ascii_lowercase()))
        .copied()
        .unwrap_or(Decimal::ONE)
}

fn lower_keys(table: HashMap<String, Decimal>) -> HashMap<String, Decimal> {
    table.into_iter().map(|(key, value)| (key.trim().to_ascii_lowercase(), value)).collect()
}

fn upper_keys(table: HashMap<String, Decimal>) -> HashMap<String, Decimal> {
    table.into_iter().map(|(key, value)| (key.trim().to_ascii_uppercase(), value)).collect()
}

fn bucket_keys<T>(
    table: HashMap<String, Decimal>,
    all: &[T],
    key_of: fn(T) -> &'static str,
) -> HashMap<T, Decimal>
where
    T: Copy + Eq + std::hash::Hash,
{
    let mut compiled = HashMap::new();
    for (key, factor) in table {
        match parse_bucket(all, key_of, &key) {
            Some(bucket) => {
                compiled.insert(bucket, factor);
            }
            None => warn!(
                event_name = "rating.compile.unknown_bucket",
                key = %key,
                "ignoring factor for unknown bucket key"
            ),
        }
    }
    compiled
}
