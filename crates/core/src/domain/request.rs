use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::vertical::InsuranceType;

/// A fully-formed rating request.
///
/// Only `state` and `insurance_type` are required. Every other field is optional and
/// contributes a neutral multiplier when absent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub state: String,
    pub insurance_type: InsuranceType,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub credit_tier: Option<String>,
    #[serde(default)]
    pub vehicle_type: Option<String>,
    #[serde(default)]
    pub vehicle_year: Option<i32>,
    #[serde(default)]
    pub coverage_level: Option<String>,
    #[serde(default)]
    pub deductible: Option<u32>,
    #[serde(default)]
    pub violations: Option<u32>,
    #[serde(default)]
    pub annual_mileage: Option<u32>,
    #[serde(default)]
    pub home_value: Option<Decimal>,
    #[serde(default)]
    pub life_insurance_type: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub income: Option<Decimal>,
    #[serde(default)]
    pub is_military: bool,
    #[serde(default)]
    pub is_homeowner: bool,
    #[serde(default)]
    pub bundle_home: bool,
}

impl QuoteRequest {
    pub fn new(state: impl Into<String>, insurance_type: InsuranceType) -> Self {
        Self {
            state: state.into(),
            insurance_type,
            age: None,
            credit_tier: None,
            vehicle_type: None,
            vehicle_year: None,
            coverage_level: None,
            deductible: None,
            violations: None,
            annual_mileage: None,
            home_value: None,
            life_insurance_type: None,
            occupation: None,
            income: None,
            is_military: false,
            is_homeowner: false,
            bundle_home: false,
        }
    }

    /// Two-letter state code, trimmed and upper-cased.
    pub fn state_code(&self) -> String {
        self.state.trim().to_ascii_uppercase()
    }

    /// Unspecified violations count as a clean record.
    pub fn has_clean_record(&self) -> bool {
        self.violations.unwrap_or(0) == 0
    }

    pub fn credit_tier_is(&self, tier: &str) -> bool {
        self.credit_tier.as_deref().is_some_and(|value| value.trim().eq_ignore_ascii_case(tier))
    }

    /// Vehicle age in whole years as of `reference_year`; future model years count as new.
    pub fn vehicle_age(&self, reference_year: i32) -> Option<u32> {
        self.vehicle_year.map(|year| {
            let years = i64::from(reference_year) - i64::from(year);
            u32::try_from(years.max(0)).unwrap_or(u32::MAX)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::vertical::InsuranceType;

    use super::QuoteRequest;

    #[test]
    fn deserializes_minimal_request_with_defaults() {
        let request: QuoteRequest =
            serde_json::from_str(r#"{"state":"tx","insuranceType":"home"}"#).expect("parse");

        assert_eq!(request.state_code(), "TX");
        assert_eq!(request.insurance_type, InsuranceType::Home);
        assert!(request.age.is_none());
        assert!(!request.is_military);
        assert!(request.has_clean_record());
    }

    #[test]
    fn vehicle_age_clamps_future_model_years_to_zero() {
        let request =
            QuoteRequest { vehicle_year: Some(2027), ..QuoteRequest::new("CA", InsuranceType::Auto) };
        assert_eq!(request.vehicle_age(2026), Some(0));

        let older =
            QuoteRequest { vehicle_year: Some(2015), ..QuoteRequest::new("CA", InsuranceType::Auto) };
        assert_eq!(older.vehicle_age(2026), Some(11));
    }

    #[test]
    fn vehicle_age_saturates_for_extreme_model_years() {
        let ancient: QuoteRequest = serde_json::from_str(
            r#"{"state":"CA","insuranceType":"auto","vehicleYear":-2147483648}"#,
        )
        .expect("parse");
        assert_eq!(ancient.vehicle_age(2026), Some(2_147_485_674));
        assert_eq!(ancient.vehicle_age(i32::MAX), Some(u32::MAX));

        let far_future =
            QuoteRequest { vehicle_year: Some(i32::MAX), ..QuoteRequest::new("CA", InsuranceType::Auto) };
        assert_eq!(far_future.vehicle_age(2026), Some(0));
        assert_eq!(far_future.vehicle_age(i32::MIN), Some(0));
    }

    #[test]
    fn credit_tier_comparison_ignores_case() {
        let request = QuoteRequest {
            credit_tier: Some("Excellent".to_string()),
            ..QuoteRequest::new("NY", InsuranceType::Auto)
        };
        assert!(request.credit_tier_is("excellent"));
        assert!(!request.credit_tier_is("good"));
    }
}
