//! Configuration source for rate documents.
//!
//! Documents are addressed by logical key (`base-rates`, `carriers/acme`) and cached
//! after the first read. `invalidate` clears the cache; recompiling is the registry's job.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, trace};

use crate::domain::carrier::{sort_by_market_share, CarrierDefinition};
use crate::domain::rates::{
    AgeFactorsDocument, BaseRatesDocument, CreditFactorsDocument, RateConfiguration,
    VehicleFactorsDocument,
};

pub const CARRIER_DIRECTORY: &str = "carriers";

#[derive(Debug, Error)]
pub enum RateSourceError {
    #[error("rate document `{key}` was not found at `{location}`")]
    NotFound { key: String, location: String },
    #[error("could not read rate document `{location}`: {source}")]
    Read { location: String, source: io::Error },
    #[error("could not parse rate document `{key}`: {source}")]
    Parse { key: String, source: serde_json::Error },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RateCategory {
    BaseRates,
    AgeFactors,
    CreditFactors,
    VehicleFactors,
}

impl RateCategory {
    pub const ALL: [RateCategory; 4] =
        [Self::BaseRates, Self::AgeFactors, Self::CreditFactors, Self::VehicleFactors];

    pub fn key(self) -> &'static str {
        match self {
            Self::BaseRates => "base-rates",
            Self::AgeFactors => "age-factors",
            Self::CreditFactors => "credit-factors",
            Self::VehicleFactors => "vehicle-factors",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RateFragment {
    BaseRates(BaseRatesDocument),
    AgeFactors(AgeFactorsDocument),
    CreditFactors(CreditFactorsDocument),
    VehicleFactors(VehicleFactorsDocument),
}

pub fn carrier_key(id: &str) -> String {
    format!("{CARRIER_DIRECTORY}/{id}")
}

pub trait RateSource: Send + Sync {
    /// Raw JSON document for a logical key.
    fn load_document(&self, key: &str) -> Result<Value, RateSourceError>;

    /// Ids of every carrier document, enabled or not, in a stable order.
    fn carrier_ids(&self) -> Result<Vec<String>, RateSourceError>;

    fn invalidate(&self);

    fn describe(&self) -> String;

    fn load_category(&self, category: RateCategory) -> Result<RateFragment, RateSourceError> {
        let document = self.load_document(category.key())?;
        let key = category.key();
        Ok(match category {
            RateCategory::BaseRates => RateFragment::BaseRates(decode(key, document)?),
            RateCategory::AgeFactors => RateFragment::AgeFactors(decode(key, document)?),
            RateCategory::CreditFactors => RateFragment::CreditFactors(decode(key, document)?),
            RateCategory::VehicleFactors => RateFragment::VehicleFactors(decode(key, document)?),
        })
    }

    fn load_carrier(&self, id: &str) -> Result<CarrierDefinition, RateSourceError> {
        let key = carrier_key(id);
        let document = self.load_document(&key)?;
        decode(&key, document)
    }

    /// Enabled carriers, highest market share first.
    fn load_all_carriers(&self) -> Result<Vec<CarrierDefinition>, RateSourceError> {
        let mut carriers = Vec::new();
        for id in self.carrier_ids()? {
            let carrier = self.load_carrier(&id)?;
            if carrier.enabled {
                carriers.push(carrier);
            } else {
                debug!(
                    event_name = "rating.source.carrier_disabled",
                    carrier_id = %carrier.id.0,
                    "skipping disabled carrier definition"
                );
            }
        }

        sort_by_market_share(&mut carriers);
        Ok(carriers)
    }

    fn load_configuration(&self) -> Result<RateConfiguration, RateSourceError> {
        let mut configuration = RateConfiguration::default();
        for category in RateCategory::ALL {
            match self.load_category(category)? {
                RateFragment::BaseRates(document) => configuration.base_rates = document,
                RateFragment::AgeFactors(document) => configuration.age_factors = document,
                RateFragment::CreditFactors(document) => configuration.credit_factors = document,
                RateFragment::VehicleFactors(document) => configuration.vehicle_factors = document,
            }
        }
        configuration.carriers = self.load_all_carriers()?;
        Ok(configuration)
    }
}

fn decode<T: DeserializeOwned>(key: &str, document: Value) -> Result<T, RateSourceError> {
    serde_json::from_value(document)
        .map_err(|source| RateSourceError::Parse { key: key.to_string(), source })
}

/// Rate documents stored as `<root>/<key>.json`.
#[derive(Debug)]
pub struct FileRateSource {
    root: PathBuf,
    cache: RwLock<HashMap<String, Value>>,
}

impl FileRateSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), cache: RwLock::new(HashMap::new()) }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cached_documents(&self) -> usize {
        self.cache.read().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    fn read_from_disk(&self, key: &str) -> Result<Value, RateSourceError> {
        let path = self.path_for(key);
        let location = path.display().to_string();
        let raw = fs::read_to_string(&path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                RateSourceError::NotFound { key: key.to_string(), location: location.clone() }
            } else {
                RateSourceError::Read { location: location.clone(), source }
            }
        })?;

        debug!(event_name = "rating.source.document_loaded", key, location = %location, "loaded rate document");
        serde_json::from_str(&raw)
            .map_err(|source| RateSourceError::Parse { key: key.to_string(), source })
    }
}

impl RateSource for FileRateSource {
    fn load_document(&self, key: &str) -> Result<Value, RateSourceError> {
        {
            let cache = self.cache.read().unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(document) = cache.get(key) {
                trace!(event_name = "rating.source.cache_hit", key, "rate document cache hit");
                return Ok(document.clone());
            }
        }

        let document = self.read_from_disk(key)?;
        let mut cache = self.cache.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        cache.insert(key.to_string(), document.clone());
        Ok(document)
    }

    fn carrier_ids(&self) -> Result<Vec<String>, RateSourceError> {
        let directory = self.root.join(CARRIER_DIRECTORY);
        let location = directory.display().to_string();
        let entries = fs::read_dir(&directory).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                RateSourceError::NotFound {
                    key: CARRIER_DIRECTORY.to_string(),
                    location: location.clone(),
                }
            } else {
                RateSourceError::Read { location: location.clone(), source }
            }
        })?;

        let mut ids = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|source| RateSourceError::Read { location: location.clone(), source })?
                .path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                ids.push(stem.to_string());
            }
        }

        ids.sort();
        Ok(ids)
    }

    fn invalidate(&self) {
        let mut cache = self.cache.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        let dropped = cache.len();
        cache.clear();
        debug!(event_name = "rating.source.invalidated", dropped, "rate document cache cleared");
    }

    fn describe(&self) -> String {
        format!("files ({})", self.root.display())
    }
}

/// Rate documents held in memory. Nothing is cached, so `invalidate` is a no-op.
#[derive(Debug, Default)]
pub struct InMemoryRateSource {
    documents: RwLock<HashMap<String, Value>>,
    loads: AtomicUsize,
}

impl InMemoryRateSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_configuration(
        configuration: &RateConfiguration,
    ) -> Result<Self, serde_json::Error> {
        let source = Self::new();
        source.insert(RateCategory::BaseRates.key(), serde_json::to_value(&configuration.base_rates)?);
        source.insert(RateCategory::AgeFactors.key(), serde_json::to_value(&configuration.age_factors)?);
        source.insert(
            RateCategory::CreditFactors.key(),
            serde_json::to_value(&configuration.credit_factors)?,
        );
        source.insert(
            RateCategory::VehicleFactors.key(),
            serde_json::to_value(&configuration.vehicle_factors)?,
        );
        for carrier in &configuration.carriers {
            source.insert(&carrier_key(&carrier.id.0), serde_json::to_value(carrier)?);
        }
        Ok(source)
    }

    pub fn insert(&self, key: &str, document: Value) {
        let mut documents = self.documents.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        documents.insert(key.to_string(), document);
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        let mut documents = self.documents.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        documents.remove(key)
    }

    /// Number of document reads served so far.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }
}

impl RateSource for InMemoryRateSource {
    fn load_document(&self, key: &str) -> Result<Value, RateSourceError> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        let documents = self.documents.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        documents.get(key).cloned().ok_or_else(|| RateSourceError::NotFound {
            key: key.to_string(),
            location: "memory".to_string(),
        })
    }

    fn carrier_ids(&self) -> Result<Vec<String>, RateSourceError> {
        let documents = self.documents.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        let prefix = format!("{CARRIER_DIRECTORY}/");
        let mut ids: Vec<String> = documents
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix).map(str::to_string))
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn invalidate(&self) {}

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
