use clap::Args;
use serde_json::Value;
use std::path::PathBuf;

use advisory_core::record::{load_record, reconstruct_record, NormalizedRecord};
use advisory_core::report::build_report;
use advisory_core::store::JsonDirStore;

use crate::config::AdvisorConfig;
use crate::input;

/// Arguments for record reconstruction
#[derive(Args)]
pub struct RecordArgs {
    /// Record identifier
    #[arg(long)]
    pub id: String,

    /// Directory holding `<id>.json` records
    #[arg(long, env = "ADVISOR_STORE_DIR")]
    pub store_dir: Option<PathBuf>,

    /// Normalize this raw record file instead of reading the store
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for report payload generation
#[derive(Args)]
pub struct ReportArgs {
    #[command(flatten)]
    pub record: RecordArgs,
}

fn resolve(
    args: &RecordArgs,
    config: &AdvisorConfig,
) -> Result<Option<NormalizedRecord>, Box<dyn std::error::Error>> {
    if let Some(path) = args.input.as_deref() {
        let raw = input::file::read_json_value(path)?;
        return Ok(Some(reconstruct_record(&args.id, &raw, &config.loan_defaults)));
    }

    let store = JsonDirStore::new(config.resolve_store_dir(args.store_dir.as_deref())?);
    let found = load_record(&store, &args.id, &config.loan_defaults)?;
    if found.is_none() {
        tracing::warn!(record_id = %args.id, store = %store.root().display(), "record not found");
    }
    Ok(found)
}

/// A missing record is `null`, not an error.
pub fn run_reconstruct(
    args: RecordArgs,
    config: &AdvisorConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    match resolve(&args, config)? {
        Some(record) => Ok(serde_json::to_value(record)?),
        None => Ok(Value::Null),
    }
}

pub fn run_report(args: ReportArgs, config: &AdvisorConfig) -> Result<Value, Box<dyn std::error::Error>> {
    match resolve(&args.record, config)? {
        Some(record) => Ok(serde_json::to_value(build_report(&record))?),
        None => Ok(Value::Null),
    }
}
