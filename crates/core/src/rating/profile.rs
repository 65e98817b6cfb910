use std::fmt;

use crate::domain::request::QuoteRequest;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProfileType {
    YoungDriver,
    SeniorDriver,
    GoodCredit,
    Bundled,
    CleanRecord,
    Standard,
}

type ProfileRule = (ProfileType, fn(&QuoteRequest) -> bool);

/// Evaluated top to bottom; the first matching rule decides the profile.
const PROFILE_RULES: [ProfileRule; 5] = [
    (ProfileType::YoungDriver, is_young_driver),
    (ProfileType::SeniorDriver, is_senior_driver),
    (ProfileType::GoodCredit, has_excellent_credit),
    (ProfileType::Bundled, is_bundled),
    (ProfileType::CleanRecord, has_clean_record),
];

fn is_young_driver(request: &QuoteRequest) -> bool {
    request.age.is_some_and(|age| age < 25)
}

fn is_senior_driver(request: &QuoteRequest) -> bool {
    request.age.is_some_and(|age| age > 65)
}

fn has_excellent_credit(request: &QuoteRequest) -> bool {
    request.credit_tier_is("excellent")
}

fn is_bundled(request: &QuoteRequest) -> bool {
    request.bundle_home
}

fn has_clean_record(request: &QuoteRequest) -> bool {
    request.has_clean_record()
}

impl ProfileType {
    pub const ALL: [ProfileType; 6] = [
        Self::YoungDriver,
        Self::SeniorDriver,
        Self::GoodCredit,
        Self::Bundled,
        Self::CleanRecord,
        Self::Standard,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::YoungDriver => "youngDriver",
            Self::SeniorDriver => "seniorDriver",
            Self::GoodCredit => "goodCredit",
            Self::Bundled => "bundled",
            Self::CleanRecord => "cleanRecord",
            Self::Standard => "standard",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::YoungDriver => 0,
            Self::SeniorDriver => 1,
            Self::GoodCredit => 2,
            Self::Bundled => 3,
            Self::CleanRecord => 4,
            Self::Standard => 5,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|profile| profile.key() == key.trim())
    }

    pub fn classify(request: &QuoteRequest) -> Self {
        PROFILE_RULES
            .iter()
            .find(|(_, matches)| matches(request))
            .map_or(Self::Standard, |(profile, _)| *profile)
    }
}

impl fmt::Display for ProfileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::ProfileType;
    use crate::domain::request::QuoteRequest;
    use crate::domain::vertical::InsuranceType;

    fn request() -> QuoteRequest {
        QuoteRequest { violations: Some(1), ..QuoteRequest::new("OH", InsuranceType::Auto) }
    }

    #[test]
    fn age_rules_take_precedence_over_credit_and_bundle() {
        let young = QuoteRequest {
            age: Some(22),
            credit_tier: Some("excellent".to_string()),
            bundle_home: true,
            ..request()
        };
        assert_eq!(ProfileType::classify(&young), ProfileType::YoungDriver);

        let senior = QuoteRequest { age: Some(70), bundle_home: true, ..request() };
        assert_eq!(ProfileType::classify(&senior), ProfileType::SeniorDriver);
    }

    #[test]
    fn boundary_ages_fall_through_to_later_rules() {
        let twenty_five = QuoteRequest { age: Some(25), ..request() };
        assert_eq!(ProfileType::classify(&twenty_five), ProfileType::Standard);

        let sixty_five = QuoteRequest { age: Some(65), bundle_home: true, ..request() };
        assert_eq!(ProfileType::classify(&sixty_five), ProfileType::Bundled);
    }

    #[test]
    fn credit_beats_bundle_and_clean_record_is_last_specific_rule() {
        let credit = QuoteRequest {
            age: Some(40),
            credit_tier: Some("Excellent".to_string()),
            bundle_home: true,
            ..request()
        };
        assert_eq!(ProfileType::classify(&credit), ProfileType::GoodCredit);

        let clean = QuoteRequest { age: Some(40), violations: Some(0), ..request() };
        assert_eq!(ProfileType::classify(&clean), ProfileType::CleanRecord);

        let unspecified = QuoteRequest::new("OH", InsuranceType::Auto);
        assert_eq!(ProfileType::classify(&unspecified), ProfileType::CleanRecord);
    }

    #[test]
    fn falls_back_to_standard() {
        let request = QuoteRequest { age: Some(40), violations: Some(2), ..request() };
        assert_eq!(ProfileType::classify(&request), ProfileType::Standard);
    }
}
