pub mod reconstruct;
pub mod shape;

pub use reconstruct::{load_record, reconstruct_record, NormalizedRecord};
pub use shape::{DebtEntries, DebtListShape, StoredDebtSummary};
