use crate::account::{Activity, DumpMeta, MarketInfo, Position, Profile, Summary};
use chrono::{DateTime, SecondsFormat, Utc};
use futures::future::try_join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Everything collected for one account.
#[derive(Debug, Clone)]
pub struct DumpData {
    pub activity: Vec<Activity>,
    pub positions: Vec<Position>,
    pub profile: Profile,
    pub markets: BTreeMap<String, MarketInfo>,
    pub summary: Summary,
}

/// `{base}/accounts/{lowercase address}/{YYYY-MM-DD}`
pub fn dump_dir(base_dir: &Path, address: &str, now: DateTime<Utc>) -> PathBuf {
    base_dir
        .join("accounts")
        .join(address.to_lowercase())
        .join(now.format("%Y-%m-%d").to_string())
}

fn pretty<T: Serialize + ?Sized>(value: &T) -> io::Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(value)?)
}

/// Writes one JSON file per data category plus `meta.json`; returns the directory.
pub async fn write_output(
    base_dir: &Path,
    address: &str,
    data: &DumpData,
    days: u32,
    now: DateTime<Utc>,
) -> io::Result<PathBuf> {
    let output_dir = dump_dir(base_dir, address, now);
    tokio::fs::create_dir_all(&output_dir).await?;

    let meta = DumpMeta {
        address: address.to_string(),
        username: Some(data.profile.name.clone()).filter(|name| !name.is_empty()),
        dumped_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        days,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let files = vec![
        ("activity.json", pretty(&data.activity)?),
        ("positions.json", pretty(&data.positions)?),
        ("profile.json", pretty(&data.profile)?),
        ("markets.json", pretty(&data.markets)?),
        ("summary.json", pretty(&data.summary)?),
        ("meta.json", pretty(&meta)?),
    ];

    try_join_all(files.into_iter().map(|(name, contents)| {
        let path = output_dir.join(name);
        async move {
            debug!(path = %path.display(), bytes = contents.len(), "Writing dump file");
            tokio::fs::write(path, contents).await
        }
    }))
    .await?;

    Ok(output_dir)
}
