//! Discount eligibility.
//!
//! Known discount types map to a fixed predicate over the request. Any other type is an
//! opt-in discount whose eligibility is exactly its `requirements` block. Amounts are
//! informational and never reduce the premium.

use rust_decimal::Decimal;

use crate::domain::carrier::{DiscountRequirements, DiscountRule, DiscountValueType};
use crate::domain::quote::AppliedDiscount;
use crate::domain::request::QuoteRequest;
use crate::rating::pipelines::whole_units;

const GOOD_STUDENT_MAX_AGE: u32 = 25;
const MATURE_DRIVER_MIN_AGE: u32 = 55;
const LOW_MILEAGE_LIMIT: u32 = 7_500;
const NEW_VEHICLE_MAX_AGE: u32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiscountKind {
    MultiPolicy,
    Military,
    GoodDriver,
    Homeowner,
    GoodStudent,
    MatureDriver,
    LowMileage,
    NewVehicle,
    OptIn,
}

impl DiscountKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim() {
            "multiPolicy" => Self::MultiPolicy,
            "militaryDiscount" => Self::Military,
            "goodDriver" => Self::GoodDriver,
            "homeownerDiscount" => Self::Homeowner,
            "goodStudent" => Self::GoodStudent,
            "matureDriver" => Self::MatureDriver,
            "lowMileage" => Self::LowMileage,
            "newVehicle" => Self::NewVehicle,
            _ => Self::OptIn,
        }
    }

    fn is_eligible(self, request: &QuoteRequest, reference_year: i32) -> bool {
        match self {
            Self::MultiPolicy => request.bundle_home,
            Self::Military => request.is_military,
            Self::GoodDriver => request.has_clean_record(),
            Self::Homeowner => request.is_homeowner,
            Self::GoodStudent => request.age.is_some_and(|age| age < GOOD_STUDENT_MAX_AGE),
            Self::MatureDriver => request.age.is_some_and(|age| age >= MATURE_DRIVER_MIN_AGE),
            Self::LowMileage => request.annual_mileage.is_some_and(|miles| miles <= LOW_MILEAGE_LIMIT),
            Self::NewVehicle => {
                request.vehicle_age(reference_year).is_some_and(|years| years <= NEW_VEHICLE_MAX_AGE)
            }
            Self::OptIn => true,
        }
    }
}

impl DiscountRequirements {
    pub fn is_satisfied_by(&self, request: &QuoteRequest) -> bool {
        if let Some(min_age) = self.min_age {
            if !request.age.is_some_and(|age| age >= min_age) {
                return false;
            }
        }
        if let Some(max_age) = self.max_age {
            if !request.age.is_some_and(|age| age <= max_age) {
                return false;
            }
        }
        if let Some(max_violations) = self.max_violations {
            if request.violations.unwrap_or(0) > max_violations {
                return false;
            }
        }
        if !self.credit_tiers.is_empty()
            && !self.credit_tiers.iter().any(|tier| request.credit_tier_is(tier))
        {
            return false;
        }

        (!self.requires_homeowner || request.is_homeowner)
            && (!self.requires_military || request.is_military)
            && (!self.requires_bundle || request.bundle_home)
    }
}

pub fn is_eligible(rule: &DiscountRule, request: &QuoteRequest, reference_year: i32) -> bool {
    rule.applies_to(request.insurance_type)
        && DiscountKind::from_tag(&rule.kind).is_eligible(request, reference_year)
        && rule.requirements.as_ref().map_or(true, |requirements| requirements.is_satisfied_by(request))
}

/// Whole-unit amount a discount is worth against `monthly_premium`.
pub fn discount_amount(rule: &DiscountRule, monthly_premium: i64) -> Decimal {
    match rule.value_type {
        DiscountValueType::Percentage => {
            Decimal::from(whole_units(Decimal::from(monthly_premium) * rule.value / Decimal::ONE_HUNDRED))
        }
        DiscountValueType::Flat => rule.value,
    }
}

pub fn applicable_discounts(
    rules: &[DiscountRule],
    request: &QuoteRequest,
    monthly_premium: i64,
    reference_year: i32,
) -> Vec<AppliedDiscount> {
    rules
        .iter()
        .filter(|rule| is_eligible(rule, request, reference_year))
        .map(|rule| AppliedDiscount {
            name: rule.description.clone(),
            kind: rule.kind.clone(),
            amount: discount_amount(rule, monthly_premium),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{applicable_discounts, discount_amount, is_eligible, DiscountKind};
    use crate::domain::carrier::{DiscountRequirements, DiscountRule, DiscountValueType};
    use crate::domain::request::QuoteRequest;
    use crate::domain::vertical::InsuranceType;
    use crate::rating::test_support::dec;

    const REFERENCE_YEAR: i32 = 2025;

    fn rule(kind: &str, value: &str) -> DiscountRule {
        DiscountRule {
            kind: kind.to_string(),
            value: dec(value),
            value_type: DiscountValueType::Percentage,
            description: format!("{kind} discount"),
            applicable_to: vec![InsuranceType::Auto, InsuranceType::Home],
            requirements: None,
        }
    }

    fn auto_request() -> QuoteRequest {
        QuoteRequest::new("CA", InsuranceType::Auto)
    }

    #[test]
    fn known_types_follow_request_flags() {
        let mut request = auto_request();
        request.violations = Some(2);

        assert!(!is_eligible(&rule("multiPolicy", "10"), &request, REFERENCE_YEAR));
        assert!(!is_eligible(&rule("militaryDiscount", "10"), &request, REFERENCE_YEAR));
        assert!(!is_eligible(&rule("goodDriver", "10"), &request, REFERENCE_YEAR));
        assert!(!is_eligible(&rule("homeownerDiscount", "10"), &request, REFERENCE_YEAR));

        request.bundle_home = true;
        request.is_military = true;
        request.violations = None;
        request.is_homeowner = true;

        assert!(is_eligible(&rule("multiPolicy", "10"), &request, REFERENCE_YEAR));
        assert!(is_eligible(&rule("militaryDiscount", "10"), &request, REFERENCE_YEAR));
        assert!(is_eligible(&rule("goodDriver", "10"), &request, REFERENCE_YEAR));
        assert!(is_eligible(&rule("homeownerDiscount", "10"), &request, REFERENCE_YEAR));
    }

    #[test]
    fn supplemented_types_use_request_values() {
        let mut request = auto_request();
        request.age = Some(22);
        request.annual_mileage = Some(7_500);
        request.vehicle_year = Some(2023);

        assert!(is_eligible(&rule("goodStudent", "5"), &request, REFERENCE_YEAR));
        assert!(!is_eligible(&rule("matureDriver", "5"), &request, REFERENCE_YEAR));
        assert!(is_eligible(&rule("lowMileage", "5"), &request, REFERENCE_YEAR));
        assert!(is_eligible(&rule("newVehicle", "5"), &request, REFERENCE_YEAR));

        request.age = None;
        request.annual_mileage = Some(7_501);
        request.vehicle_year = Some(2020);
        assert!(!is_eligible(&rule("goodStudent", "5"), &request, REFERENCE_YEAR));
        assert!(!is_eligible(&rule("lowMileage", "5"), &request, REFERENCE_YEAR));
        assert!(!is_eligible(&rule("newVehicle", "5"), &request, REFERENCE_YEAR));
    }

    #[test]
    fn new_vehicle_handles_extreme_model_years() {
        let mut request = auto_request();
        request.vehicle_year = Some(i32::MIN);
        assert!(!is_eligible(&rule("newVehicle", "5"), &request, REFERENCE_YEAR));

        request.vehicle_year = Some(i32::MAX);
        assert!(is_eligible(&rule("newVehicle", "5"), &request, REFERENCE_YEAR));
    }

    #[test]
    fn unknown_types_are_opt_in_through_requirements() {
        let request = auto_request();
        let mut paperless = rule("paperless", "3");
        assert_eq!(DiscountKind::from_tag("paperless"), DiscountKind::OptIn);
        assert!(is_eligible(&paperless, &request, REFERENCE_YEAR));

        paperless.requirements =
            Some(DiscountRequirements { requires_homeowner: true, ..DiscountRequirements::default() });
        assert!(!is_eligible(&paperless, &request, REFERENCE_YEAR));
    }

    #[test]
    fn requirements_restrict_known_types() {
        let mut request = auto_request();
        request.violations = Some(0);
        request.credit_tier = Some("Fair".to_string());
        let mut good_driver = rule("goodDriver", "10");
        good_driver.requirements = Some(DiscountRequirements {
            min_age: Some(21),
            credit_tiers: vec!["excellent".to_string(), "good".to_string()],
            ..DiscountRequirements::default()
        });

        assert!(!is_eligible(&good_driver, &request, REFERENCE_YEAR));

        request.age = Some(30);
        request.credit_tier = Some("GOOD".to_string());
        assert!(is_eligible(&good_driver, &request, REFERENCE_YEAR));
    }

    #[test]
    fn max_violations_counts_unspecified_as_zero() {
        let request = auto_request();
        let mut loyalty = rule("loyalty", "4");
        loyalty.requirements =
            Some(DiscountRequirements { max_violations: Some(0), ..DiscountRequirements::default() });

        assert!(is_eligible(&loyalty, &request, REFERENCE_YEAR));
    }

    #[test]
    fn rules_for_other_verticals_are_ignored() {
        let mut request = QuoteRequest::new("CA", InsuranceType::Life);
        request.is_military = true;

        assert!(!is_eligible(&rule("militaryDiscount", "10"), &request, REFERENCE_YEAR));
    }

    #[test]
    fn percentage_amounts_round_to_whole_units_and_flat_amounts_pass_through() {
        assert_eq!(discount_amount(&rule("goodDriver", "15"), 123), dec("18"));
        assert_eq!(discount_amount(&rule("goodDriver", "12.5"), 100), dec("13"));

        let mut flat = rule("autoPay", "5");
        flat.value_type = DiscountValueType::Flat;
        assert_eq!(discount_amount(&flat, 123), dec("5"));
    }

    #[test]
    fn applicable_discounts_report_name_type_and_amount() {
        let mut request = auto_request();
        request.bundle_home = true;
        let rules = vec![rule("multiPolicy", "10"), rule("militaryDiscount", "10")];

        let applied = applicable_discounts(&rules, &request, 200, REFERENCE_YEAR);
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].kind, "multiPolicy");
        assert_eq!(applied[0].name, "multiPolicy discount");
        assert_eq!(applied[0].amount, Decimal::from(20));
    }

    #[test]
    fn eligibility_is_deterministic() {
        let mut request = auto_request();
        request.age = Some(40);
        let rules = vec![rule("paperless", "2"), rule("goodDriver", "10"), rule("matureDriver", "5")];

        let first = applicable_discounts(&rules, &request, 150, REFERENCE_YEAR);
        for _ in 0..50 {
            assert_eq!(applicable_discounts(&rules, &request, 150, REFERENCE_YEAR), first);
        }
    }
}
