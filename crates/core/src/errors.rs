use thiserror::Error;

use crate::config::ConfigError;
use crate::rating::compiler::CompileError;
use crate::rating::source::RateSourceError;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    #[error(transparent)]
    RateData(#[from] CompileError),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<RateSourceError> for ApplicationError {
    fn from(value: RateSourceError) -> Self {
        Self::RateData(CompileError::Source(value))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    ConfigValidation,
    RateData,
    InvalidRequest,
}

impl ErrorClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConfigValidation => "config_validation",
            Self::RateData => "rate_data",
            Self::InvalidRequest => "invalid_request",
        }
    }

    pub fn exit_code(self) -> u8 {
        match self {
            Self::ConfigValidation => 2,
            Self::RateData => 3,
            Self::InvalidRequest => 4,
        }
    }

    pub fn user_message(self) -> &'static str {
        match self {
            Self::ConfigValidation => {
                "The application configuration is invalid. Fix it and try again."
            }
            Self::RateData => {
                "Rate files could not be compiled. No quotes were produced from partial data."
            }
            Self::InvalidRequest => "The quote request could not be read. Check inputs and retry.",
        }
    }
}

impl ApplicationError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Configuration(_) => ErrorClass::ConfigValidation,
            Self::RateData(_) => ErrorClass::RateData,
            Self::InvalidRequest(_) => ErrorClass::InvalidRequest,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ConfigError;
    use crate::errors::{ApplicationError, ErrorClass};
    use crate::rating::source::RateSourceError;

    #[test]
    fn config_error_maps_to_config_validation_class() {
        let error = ApplicationError::from(ConfigError::Validation("bad level".to_owned()));

        assert_eq!(error.class(), ErrorClass::ConfigValidation);
        assert_eq!(error.class().exit_code(), 2);
        assert_eq!(error.class().as_str(), "config_validation");
    }

    #[test]
    fn missing_rate_file_maps_to_rate_data_class() {
        let error = ApplicationError::from(RateSourceError::NotFound {
            key: "base-rates".to_owned(),
            location: "/tmp/rates/base-rates.json".to_owned(),
        });

        assert_eq!(error.class(), ErrorClass::RateData);
        assert!(error.to_string().contains("base-rates"));
        assert_eq!(
            error.class().user_message(),
            "Rate files could not be compiled. No quotes were produced from partial data."
        );
    }

    #[test]
    fn invalid_request_has_user_safe_message() {
        let error = ApplicationError::InvalidRequest("missing field `state`".to_owned());

        assert_eq!(error.class().exit_code(), 4);
        assert_eq!(
            error.class().user_message(),
            "The quote request could not be read. Check inputs and retry."
        );
    }
}
