//! Pricing error types.

use thiserror::Error;

/// Errors that can occur while loading catalogs or pricing resources.
#[derive(Debug, Error)]
pub enum PricingError {
    #[error("failed to read price catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse price catalog: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid price catalog: {0}")]
    InvalidCatalog(String),
}

pub type PricingResult<T> = Result<T, PricingError>;
