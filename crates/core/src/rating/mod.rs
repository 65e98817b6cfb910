//! Rate configuration, compilation and quoting.

pub mod buckets;
pub mod compiler;
pub mod discounts;
pub mod engine;
pub mod pipelines;
pub mod profile;
pub mod region;
pub mod registry;
pub mod source;
pub mod variance;

pub use compiler::{compile, CompileError, CompiledRatingModel, ModelSummary};
pub use engine::{EngineOptions, RatingEngine};
pub use registry::ModelRegistry;
pub use source::{FileRateSource, InMemoryRateSource, RateSource, RateSourceError};
pub use variance::{NoVariance, SeededVariance, ThreadRngVariance, VarianceSource};
