//! Fixed bucketing of continuous request values into discrete factor keys.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VehicleAgeBracket {
    New,
    Recent,
    Established,
    Older,
}

impl VehicleAgeBracket {
    pub const ALL: [VehicleAgeBracket; 4] = [Self::New, Self::Recent, Self::Established, Self::Older];

    pub fn for_age(years: u32) -> Self {
        match years {
            0..=1 => Self::New,
            2..=5 => Self::Recent,
            6..=10 => Self::Established,
            _ => Self::Older,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::New => "0-1",
            Self::Recent => "2-5",
            Self::Established => "6-10",
            Self::Older => "11+",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MileageBand {
    UpTo5k,
    UpTo10k,
    UpTo15k,
    UpTo20k,
    Over20k,
}

impl MileageBand {
    pub const ALL: [MileageBand; 5] =
        [Self::UpTo5k, Self::UpTo10k, Self::UpTo15k, Self::UpTo20k, Self::Over20k];

    pub fn for_miles(miles: u32) -> Self {
        match miles {
            0..=5_000 => Self::UpTo5k,
            5_001..=10_000 => Self::UpTo10k,
            10_001..=15_000 => Self::UpTo15k,
            15_001..=20_000 => Self::UpTo20k,
            _ => Self::Over20k,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::UpTo5k => "0-5000",
            Self::UpTo10k => "5001-10000",
            Self::UpTo15k => "10001-15000",
            Self::UpTo20k => "15001-20000",
            Self::Over20k => "20001+",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ViolationBucket {
    None,
    One,
    Two,
    ThreeOrMore,
}

impl ViolationBucket {
    pub const ALL: [ViolationBucket; 4] = [Self::None, Self::One, Self::Two, Self::ThreeOrMore];

    pub fn for_count(count: u32) -> Self {
        match count {
            0 => Self::None,
            1 => Self::One,
            2 => Self::Two,
            _ => Self::ThreeOrMore,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::None => "0",
            Self::One => "1",
            Self::Two => "2",
            Self::ThreeOrMore => "3+",
        }
    }
}

/// Resolves a configured key against a bucket's canonical keys.
pub fn parse_bucket<T: Copy>(all: &[T], key_of: fn(T) -> &'static str, key: &str) -> Option<T> {
    let key = key.trim();
    all.iter().copied().find(|bucket| key_of(*bucket) == key)
}
