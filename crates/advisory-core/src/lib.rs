pub mod amortization;
pub mod currency;
pub mod debt;
pub mod dscr;
pub mod error;
pub mod financials;
pub mod loan;
pub mod types;

#[cfg(feature = "records")]
pub mod record;

#[cfg(feature = "records")]
pub mod report;

#[cfg(feature = "records")]
pub mod store;

pub use error::AdvisoryError;
pub use types::*;

/// Standard result type for all advisory operations
pub type AdvisoryResult<T> = Result<T, AdvisoryError>;
