use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::vertical::InsuranceType;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CarrierId(pub String);

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarrierContact {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Carrier-specific multipliers keyed by profile-type and region name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarrierAdjustments {
    #[serde(default)]
    pub profile_types: HashMap<String, Decimal>,
    #[serde(default)]
    pub regions: HashMap<String, Decimal>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiscountValueType {
    #[default]
    Percentage,
    Flat,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountRequirements {
    #[serde(default)]
    pub min_age: Option<u32>,
    #[serde(default)]
    pub max_age: Option<u32>,
    #[serde(default)]
    pub max_violations: Option<u32>,
    #[serde(default)]
    pub credit_tiers: Vec<String>,
    #[serde(default)]
    pub requires_homeowner: bool,
    #[serde(default)]
    pub requires_military: bool,
    #[serde(default)]
    pub requires_bundle: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountRule {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: Decimal,
    #[serde(default)]
    pub value_type: DiscountValueType,
    pub description: String,
    pub applicable_to: Vec<InsuranceType>,
    #[serde(default)]
    pub requirements: Option<DiscountRequirements>,
}

impl DiscountRule {
    pub fn applies_to(&self, vertical: InsuranceType) -> bool {
        self.applicable_to.contains(&vertical)
    }
}

/// Simulated market noise: premiums move by up to `range` (a fraction) either way.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VarianceSpec {
    pub enabled: bool,
    pub range: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarrierEligibility {
    #[serde(default)]
    pub military_only: bool,
    /// When present, the carrier only writes policies in these states.
    #[serde(default)]
    pub states: Option<Vec<String>>,
}

impl CarrierEligibility {
    pub fn accepts(&self, state_code: &str, is_military: bool) -> bool {
        if self.military_only && !is_military {
            return false;
        }

        match &self.states {
            Some(states) => states.iter().any(|state| state.trim().eq_ignore_ascii_case(state_code)),
            None => true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarrierDefinition {
    pub id: CarrierId,
    pub name: String,
    pub market_share: f64,
    pub rating: String,
    pub enabled: bool,
    pub contact: CarrierContact,
    pub adjustments: CarrierAdjustments,
    pub discounts: Vec<DiscountRule>,
    pub variance: VarianceSpec,
    #[serde(default)]
    pub eligibility: Option<CarrierEligibility>,
    pub strengths: Vec<String>,
    pub best_for: Vec<String>,
}

impl CarrierDefinition {
    pub fn accepts(&self, state_code: &str, is_military: bool) -> bool {
        self.eligibility.as_ref().map_or(true, |rules| rules.accepts(state_code, is_military))
    }

    pub fn is_military_only(&self) -> bool {
        self.eligibility.as_ref().is_some_and(|rules| rules.military_only)
    }
}

/// Orders carriers by descending market share; ties fall back to the id so directory
/// iteration order never leaks into results.
pub fn sort_by_market_share(carriers: &mut [CarrierDefinition]) {
    carriers.sort_by(|left, right| {
        right.market_share.total_cmp(&left.market_share).then_with(|| left.id.cmp(&right.id))
    });
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{sort_by_market_share, CarrierDefinition, CarrierEligibility, DiscountValueType};
    use crate::domain::vertical::InsuranceType;

    fn carrier_json(id: &str, share: f64) -> serde_json::Value {
        json!({
            "id": id,
            "name": format!("{id} Insurance"),
            "marketShare": share,
            "rating": "A",
            "enabled": true,
            "contact": { "phone": "1-800-555-0100" },
            "adjustments": { "profileTypes": { "youngDriver": 1.2 }, "regions": { "west": 1.05 } },
            "discounts": [{
                "type": "multiPolicy",
                "value": 15,
                "description": "Bundle home and auto",
                "applicableTo": ["auto", "home"]
            }],
            "variance": { "enabled": false, "range": 0.0 },
            "strengths": ["Claims handling"],
            "bestFor": ["Families"]
        })
    }

    #[test]
    fn parses_carrier_document() {
        let carrier: CarrierDefinition =
            serde_json::from_value(carrier_json("acme", 12.5)).expect("parse carrier");

        assert_eq!(carrier.id.0, "acme");
        assert!(carrier.eligibility.is_none());
        assert_eq!(carrier.discounts[0].value_type, DiscountValueType::Percentage);
        assert!(carrier.discounts[0].applies_to(InsuranceType::Home));
        assert!(!carrier.discounts[0].applies_to(InsuranceType::Life));
        assert!(carrier.accepts("CA", false));
    }

    #[test]
    fn rejects_carrier_document_without_required_fields() {
        let mut document = carrier_json("acme", 1.0);
        document.as_object_mut().expect("object").remove("rating");
        assert!(serde_json::from_value::<CarrierDefinition>(document).is_err());
    }

    #[test]
    fn eligibility_checks_military_flag_and_state_allow_list() {
        let rules = CarrierEligibility {
            military_only: true,
            states: Some(vec!["TX".to_string(), "va".to_string()]),
        };

        assert!(!rules.accepts("TX", false));
        assert!(rules.accepts("TX", true));
        assert!(rules.accepts("VA", true));
        assert!(!rules.accepts("CA", true));
    }

    #[test]
    fn sorts_by_market_share_descending_with_stable_tie_break() {
        let mut carriers: Vec<CarrierDefinition> = [("b", 5.0), ("c", 9.0), ("a", 5.0)]
            .into_iter()
            .map(|(id, share)| serde_json::from_value(carrier_json(id, share)).expect("parse"))
            .collect();

        sort_by_market_share(&mut carriers);

        let ids: Vec<&str> = carriers.iter().map(|carrier| carrier.id.0.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }
}
