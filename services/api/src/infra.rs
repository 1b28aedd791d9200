use ctam_scoring::error::AppError;
use ctam_scoring::snapshot::{ScoringSnapshot, SnapshotImporter};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Loads the configured snapshot, or serves an empty record set when none is
/// configured.
pub(crate) fn load_snapshot(dir: Option<&Path>) -> Result<ScoringSnapshot, AppError> {
    match dir {
        Some(dir) => Ok(SnapshotImporter::from_dir(dir)?),
        None => {
            warn!("CTAM_SNAPSHOT_DIR is not set; serving an empty record set");
            Ok(ScoringSnapshot::default())
        }
    }
}

pub(crate) fn parse_fiscal_year(raw: &str) -> Result<i32, String> {
    match raw.trim().parse::<i32>() {
        Ok(year) if year > 0 => Ok(year),
        Ok(year) => Err(format!("fiscal year must be positive, got {year}")),
        Err(err) => Err(format!("failed to parse '{raw}' as a fiscal year ({err})")),
    }
}
