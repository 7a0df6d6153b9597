use crate::account::Summary;
use crate::clients::PolymarketClient;
use crate::error::DumpError;
use crate::output::{write_output, DumpData};
use crate::summary::compute_summary;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct DumpAccountInput {
    pub target: String,
    pub days: u32,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct DumpAccountResult {
    pub output_path: PathBuf,
    pub address: String,
    pub summary: Summary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DumpStage {
    Resolve,
    Activity,
    Positions,
    Profile,
    Markets,
    Summary,
    Writing,
}

impl DumpStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            DumpStage::Resolve => "resolve",
            DumpStage::Activity => "activity",
            DumpStage::Positions => "positions",
            DumpStage::Profile => "profile",
            DumpStage::Markets => "markets",
            DumpStage::Summary => "summary",
            DumpStage::Writing => "writing",
        }
    }

    /// Human label for progress display.
    pub fn label(&self) -> &'static str {
        match self {
            DumpStage::Resolve => "Resolving address",
            DumpStage::Activity => "Fetching activity",
            DumpStage::Positions => "Fetching positions",
            DumpStage::Profile => "Extracting profile",
            DumpStage::Markets => "Fetching markets",
            DumpStage::Summary => "Computing summary",
            DumpStage::Writing => "Writing files",
        }
    }
}

impl fmt::Display for DumpStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DumpProgress {
    pub stage: DumpStage,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

impl DumpProgress {
    fn new(stage: DumpStage) -> Self {
        Self {
            stage,
            message: format!("{}...", stage.label()),
            current: None,
            total: None,
        }
    }

    fn counted(stage: DumpStage, current: usize, total: usize) -> Self {
        Self {
            current: Some(current),
            total: Some(total),
            ..Self::new(stage)
        }
    }
}

/// Collects an account's activity, positions and traded markets, summarizes them and
/// writes everything under `output_dir`.
pub async fn dump_account<F>(
    client: &PolymarketClient,
    input: &DumpAccountInput,
    mut on_progress: F,
) -> Result<DumpAccountResult, DumpError>
where
    F: FnMut(DumpProgress) + Send,
{
    on_progress(DumpProgress::new(DumpStage::Resolve));
    let address = client
        .resolve_address(&input.target)
        .map_err(|e| DumpError::api(DumpStage::Resolve, e))?;

    on_progress(DumpProgress::new(DumpStage::Activity));
    let activity = client
        .fetch_activity(&address, input.days, |current, total| {
            on_progress(DumpProgress::counted(DumpStage::Activity, current, total))
        })
        .await
        .map_err(|e| DumpError::api(DumpStage::Activity, e))?;

    on_progress(DumpProgress::new(DumpStage::Positions));
    let positions = client
        .fetch_positions(&address)
        .await
        .map_err(|e| DumpError::api(DumpStage::Positions, e))?;

    on_progress(DumpProgress::new(DumpStage::Profile));
    let profile = client.extract_profile(&address, &activity);

    on_progress(DumpProgress::new(DumpStage::Markets));
    let condition_ids: Vec<String> = activity.iter().map(|a| a.condition_id.clone()).collect();
    let markets = client
        .fetch_markets(&condition_ids, |current, total| {
            on_progress(DumpProgress::counted(DumpStage::Markets, current, total))
        })
        .await;

    on_progress(DumpProgress::new(DumpStage::Summary));
    let now = Utc::now();
    let summary = compute_summary(&activity, &positions, now);

    on_progress(DumpProgress::new(DumpStage::Writing));
    let data = DumpData {
        activity,
        positions,
        profile,
        markets,
        summary,
    };
    let output_path = write_output(&input.output_dir, &address, &data, input.days, now).await?;

    info!(
        address = %address,
        trades = data.summary.total_trades,
        path = %output_path.display(),
        "Account dumped"
    );

    Ok(DumpAccountResult {
        output_path,
        address,
        summary: data.summary,
    })
}
