use std::collections::HashMap;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Region {
    Northeast,
    Midwest,
    South,
    West,
}

/// Region used when a state code is not in any group.
pub const FALLBACK_REGION: Region = Region::South;

const REGION_STATES: [(Region, &[&str]); 4] = [
    (Region::Northeast, &["CT", "ME", "MA", "NH", "RI", "VT", "NJ", "NY", "PA"]),
    (Region::Midwest, &["IL", "IN", "MI", "OH", "WI", "IA", "KS", "MN", "MO", "NE", "ND", "SD"]),
    (
        Region::South,
        &[
            "DE", "FL", "GA", "MD", "NC", "SC", "VA", "DC", "WV", "AL", "KY", "MS", "TN", "AR",
            "LA", "OK", "TX",
        ],
    ),
    (
        Region::West,
        &["AZ", "CO", "ID", "MT", "NV", "NM", "UT", "WY", "AK", "CA", "HI", "OR", "WA"],
    ),
];

impl Region {
    pub const ALL: [Region; 4] = [Self::Northeast, Self::Midwest, Self::South, Self::West];

    pub fn key(self) -> &'static str {
        match self {
            Self::Northeast => "northeast",
            Self::Midwest => "midwest",
            Self::South => "south",
            Self::West => "west",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::Northeast => 0,
            Self::Midwest => 1,
            Self::South => 2,
            Self::West => 3,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|region| region.key().eq_ignore_ascii_case(key.trim()))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// State code to region, built once per compiled model.
pub fn region_table() -> HashMap<&'static str, Region> {
    REGION_STATES
        .iter()
        .flat_map(|(region, states)| states.iter().map(move |state| (*state, *region)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{region_table, Region};

    #[test]
    fn table_covers_fifty_states_and_dc_exactly_once() {
        let table = region_table();
        assert_eq!(table.len(), 51);
        assert_eq!(table.get("CA"), Some(&Region::West));
        assert_eq!(table.get("NY"), Some(&Region::Northeast));
        assert_eq!(table.get("OH"), Some(&Region::Midwest));
        assert_eq!(table.get("TX"), Some(&Region::South));
        assert_eq!(table.get("PR"), None);
    }

    #[test]
    fn region_keys_round_trip() {
        for region in Region::ALL {
            assert_eq!(Region::from_key(region.key()), Some(region));
        }
        assert_eq!(Region::from_key("Pacific"), None);
    }
}
