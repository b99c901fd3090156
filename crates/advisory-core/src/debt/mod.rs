pub mod category;
pub mod summary;

pub use category::{CategoryTag, DebtCategory, DebtRecord};
pub use summary::{analyze_debts, summarize_debts, CategorySubtotal, DebtAnalysisInput, DebtSummary};
