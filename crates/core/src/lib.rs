pub mod config;
pub mod domain;
pub mod errors;
pub mod rating;

pub use domain::carrier::{CarrierDefinition, CarrierId};
pub use domain::quote::{AppliedDiscount, Quote, QuoteMetadata, QuoteResult, RatingStep};
pub use domain::request::QuoteRequest;
pub use domain::vertical::InsuranceType;
pub use errors::{ApplicationError, ErrorClass};
pub use rating::{
    CompileError, CompiledRatingModel, EngineOptions, FileRateSource, InMemoryRateSource,
    ModelRegistry, ModelSummary, NoVariance, RateSource, RateSourceError, RatingEngine,
    SeededVariance, ThreadRngVariance, VarianceSource,
};
