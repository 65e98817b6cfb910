//! Per-vertical premium pipelines.
//!
//! Each pipeline stacks multipliers onto a starting amount in a fixed order and returns
//! a monthly premium in whole currency units. Missing request fields and unknown keys
//! contribute a neutral factor at their stage.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::quote::RatingStep;
use crate::domain::request::QuoteRequest;
use crate::domain::vertical::InsuranceType;
use crate::rating::buckets::{MileageBand, VehicleAgeBracket, ViolationBucket};
use crate::rating::compiler::{CompiledCarrier, CompiledRatingModel};
use crate::rating::profile::ProfileType;

pub const DEFAULT_AUTO_BASE_RATE: Decimal = Decimal::from_parts(1_500, 0, 0, false, 0);
pub const DEFAULT_HOME_BASE_RATE: Decimal = Decimal::from_parts(1_200, 0, 0, false, 0);
pub const DEFAULT_RENTERS_BASE_RATE: Decimal = Decimal::from_parts(180, 0, 0, false, 0);
pub const DEFAULT_COVERAGE_LEVEL: &str = "standard";
pub const BUNDLE_FACTOR: Decimal = Decimal::from_parts(88, 0, 0, false, 2);

const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

const LIFE_TERM_MONTHLY: Decimal = Decimal::from_parts(25, 0, 0, false, 0);
const LIFE_WHOLE_MONTHLY: Decimal = Decimal::from_parts(150, 0, 0, false, 0);
const LIFE_UNIVERSAL_MONTHLY: Decimal = Decimal::from_parts(110, 0, 0, false, 0);
const DISABILITY_MONTHLY: Decimal = Decimal::from_parts(45, 0, 0, false, 0);

/// `(exclusive upper age, multiplier)`; ages past the last bound use the final multiplier.
type AgeBands = ([(u32, Decimal); 4], Decimal);

const LIFE_AGE_BANDS: AgeBands = (
    [
        (30, Decimal::from_parts(8, 0, 0, false, 1)),
        (40, Decimal::ONE),
        (50, Decimal::from_parts(16, 0, 0, false, 1)),
        (60, Decimal::from_parts(28, 0, 0, false, 1)),
    ],
    Decimal::from_parts(45, 0, 0, false, 1),
);

const DISABILITY_AGE_BANDS: AgeBands = (
    [
        (30, Decimal::from_parts(85, 0, 0, false, 2)),
        (40, Decimal::ONE),
        (50, Decimal::from_parts(13, 0, 0, false, 1)),
        (60, Decimal::from_parts(17, 0, 0, false, 1)),
    ],
    Decimal::from_parts(22, 0, 0, false, 1),
);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifePolicy {
    Term,
    Whole,
    Universal,
}

impl LifePolicy {
    /// Unknown or absent sub-types price as term life.
    pub fn from_request(value: Option<&str>) -> Self {
        match value.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
            Some("whole") => Self::Whole,
            Some("universal") => Self::Universal,
            _ => Self::Term,
        }
    }

    pub fn monthly_base(self) -> Decimal {
        match self {
            Self::Term => LIFE_TERM_MONTHLY,
            Self::Whole => LIFE_WHOLE_MONTHLY,
            Self::Universal => LIFE_UNIVERSAL_MONTHLY,
        }
    }
}

/// Everything a pipeline needs for one carrier.
#[derive(Clone, Copy)]
pub struct PipelineInput<'a> {
    pub model: &'a CompiledRatingModel,
    pub carrier: &'a CompiledCarrier,
    pub request: &'a QuoteRequest,
    pub state_code: &'a str,
    pub reference_year: i32,
    /// Already drawn by the engine; exactly 1 when variance is off.
    pub variance: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PremiumCalculation {
    pub monthly_premium: i64,
    pub steps: Option<Vec<RatingStep>>,
}

/// Running amount plus an optional audit trail of each stage.
#[derive(Debug)]
struct Worksheet {
    amount: Decimal,
    steps: Option<Vec<RatingStep>>,
}

impl Worksheet {
    fn start(stage: &str, amount: Decimal, record: bool) -> Self {
        let steps = record.then(|| vec![step(stage, Decimal::ONE, amount)]);
        Self { amount, steps }
    }

    fn apply(&mut self, stage: &str, factor: Decimal) {
        self.amount *= factor;
        if let Some(steps) = self.steps.as_mut() {
            steps.push(step(stage, factor, self.amount));
        }
    }

    fn divide(&mut self, stage: &str, divisor: Decimal) {
        self.amount /= divisor;
        if let Some(steps) = self.steps.as_mut() {
            steps.push(step(stage, Decimal::ONE / divisor, self.amount));
        }
    }

    fn finish(self) -> PremiumCalculation {
        PremiumCalculation { monthly_premium: whole_units(self.amount), steps: self.steps }
    }
}

fn step(stage: &str, factor: Decimal, amount: Decimal) -> RatingStep {
    RatingStep { stage: stage.to_string(), factor: factor.normalize(), amount: amount.round_dp(4) }
}

/// Rounds half away from zero to whole currency units.
pub fn whole_units(amount: Decimal) -> i64 {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    rounded.to_i64().unwrap_or(if rounded.is_sign_negative() { i64::MIN } else { i64::MAX })
}

pub fn calculate(input: &PipelineInput<'_>, record_steps: bool) -> PremiumCalculation {
    match input.request.insurance_type {
        InsuranceType::Auto => auto_premium(input, record_steps),
        InsuranceType::Home => {
            property_premium(input, InsuranceType::Home, DEFAULT_HOME_BASE_RATE, record_steps)
        }
        InsuranceType::Renters => {
            property_premium(input, InsuranceType::Renters, DEFAULT_RENTERS_BASE_RATE, record_steps)
        }
        InsuranceType::Life => {
            let policy = LifePolicy::from_request(input.request.life_insurance_type.as_deref());
            banded_premium(input, policy.monthly_base(), &LIFE_AGE_BANDS, record_steps)
        }
        InsuranceType::Disability => {
            banded_premium(input, DISABILITY_MONTHLY, &DISABILITY_AGE_BANDS, record_steps)
        }
    }
}

fn auto_premium(input: &PipelineInput<'_>, record_steps: bool) -> PremiumCalculation {
    let PipelineInput { model, carrier, request, state_code, reference_year, variance } = *input;

    let base = model.base_rate(InsuranceType::Auto, state_code).unwrap_or(DEFAULT_AUTO_BASE_RATE);
    let mut sheet = Worksheet::start("base_rate", base, record_steps);

    let coverage = request.coverage_level.as_deref().unwrap_or(DEFAULT_COVERAGE_LEVEL);
    sheet.apply("coverage_level", model.coverage_multiplier(InsuranceType::Auto, coverage));
    sheet.apply("age", request.age.map_or(Decimal::ONE, |age| model.age_multiplier(age)));
    sheet.apply("credit_tier", model.credit_multiplier(request.credit_tier.as_deref()));
    sheet.apply("vehicle_type", model.vehicle_type_multiplier(request.vehicle_type.as_deref()));
    sheet.apply(
        "vehicle_age",
        request.vehicle_age(reference_year).map_or(Decimal::ONE, |years| {
            model.vehicle_age_multiplier(VehicleAgeBracket::for_age(years))
        }),
    );
    sheet.apply(
        "annual_mileage",
        request
            .annual_mileage
            .map_or(Decimal::ONE, |miles| model.mileage_multiplier(MileageBand::for_miles(miles))),
    );
    sheet.apply(
        "violations",
        request.violations.map_or(Decimal::ONE, |count| {
            model.violation_multiplier(ViolationBucket::for_count(count))
        }),
    );
    sheet.apply(
        "deductible",
        request.deductible.map_or(Decimal::ONE, |amount| model.deductible_multiplier(amount)),
    );
    sheet.apply("region", carrier.region_factor(model.region_for(state_code)));
    sheet.apply("profile", carrier.profile_factor(ProfileType::classify(request)));
    if request.bundle_home {
        sheet.apply("bundle", BUNDLE_FACTOR);
    }
    sheet.apply("variance", variance);
    sheet.divide("monthly", MONTHS_PER_YEAR);
    sheet.finish()
}

fn property_premium(
    input: &PipelineInput<'_>,
    vertical: InsuranceType,
    default_base: Decimal,
    record_steps: bool,
) -> PremiumCalculation {
    let PipelineInput { model, carrier, request, state_code, variance, .. } = *input;

    let base = model.base_rate(vertical, state_code).unwrap_or(default_base);
    let mut sheet = Worksheet::start("base_rate", base, record_steps);

    if vertical == InsuranceType::Home {
        let coverage = request.coverage_level.as_deref().unwrap_or(DEFAULT_COVERAGE_LEVEL);
        sheet.apply("coverage_level", model.coverage_multiplier(vertical, coverage));
    }
    sheet.apply("credit_tier", model.credit_multiplier(request.credit_tier.as_deref()));
    sheet.apply("region", carrier.region_factor(model.region_for(state_code)));
    sheet.apply("variance", variance);
    sheet.divide("monthly", MONTHS_PER_YEAR);
    sheet.finish()
}

fn banded_premium(
    input: &PipelineInput<'_>,
    monthly_base: Decimal,
    bands: &AgeBands,
    record_steps: bool,
) -> PremiumCalculation {
    let mut sheet = Worksheet::start("base_rate", monthly_base, record_steps);
    sheet.apply("age", input.request.age.map_or(Decimal::ONE, |age| band_multiplier(bands, age)));
    sheet.apply("variance", input.variance);
    sheet.finish()
}

fn band_multiplier((bands, otherwise): &AgeBands, age: u32) -> Decimal {
    bands
        .iter()
        .find(|(upper, _)| age < *upper)
        .map_or(*otherwise, |(_, multiplier)| *multiplier)
}
