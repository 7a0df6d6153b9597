use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "poly";

/// Layered settings: built-in defaults, then `poly.toml` (or an explicit file),
/// then `POLY_*` environment variables (`POLY_SCAN__THRESHOLD=0.97`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    pub scan: ScanSettings,
    pub dump: DumpSettings,
    pub edge: EdgeSettings,
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        Self::layered(file, env_source())
    }

    fn layered<F>(file: F, env: Environment) -> Result<Self, ConfigError>
    where
        F: config::Source + Send + Sync + 'static,
    {
        Config::builder()
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()
    }
}

/// `POLY_<SECTION>__<KEY>`: one underscore after the prefix, two between section and key.
fn env_source() -> Environment {
    Environment::with_prefix("POLY")
        .prefix_separator("_")
        .separator("__")
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub data_url: String,
    pub gamma_url: String,
    pub clob_url: String,
    pub page_size: usize,
    pub rate_limit_ms: u64,
    pub request_timeout_secs: Option<u64>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            data_url: "https://data-api.polymarket.com".to_string(),
            gamma_url: "https://gamma-api.polymarket.com".to_string(),
            clob_url: "https://clob.polymarket.com".to_string(),
            page_size: 100,
            rate_limit_ms: 100,
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    pub threshold: f64,
    pub min_outcomes: usize,
    pub min_volume: f64,
    pub min_depth: f64,
    /// Slack added to the threshold for the indicative-price pre-filter.
    pub prefilter_margin: f64,
    /// Price assumed for a market that carries no indicative ask.
    pub missing_indicative_price: f64,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            threshold: 0.98,
            min_outcomes: 3,
            min_volume: 10_000.0,
            min_depth: 100.0,
            prefilter_margin: 0.05,
            missing_indicative_price: 1.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DumpSettings {
    pub days: u32,
    pub output_dir: PathBuf,
    pub watch_interval_hours: u64,
}

impl Default for DumpSettings {
    fn default() -> Self {
        Self {
            days: 90,
            output_dir: PathBuf::from("./data"),
            watch_interval_hours: 6,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EdgeSettings {
    pub odds_url: String,
    pub odds_api_key: Option<String>,
    pub bookmaker: String,
    pub edge_threshold: f64,
    pub match_similarity: f64,
}

impl Default for EdgeSettings {
    fn default() -> Self {
        Self {
            odds_url: "https://api.the-odds-api.com".to_string(),
            odds_api_key: None,
            bookmaker: "draftkings".to_string(),
            edge_threshold: 0.03,
            match_similarity: 0.92,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.api.rate_limit_ms, 100);
        assert_eq!(settings.api.page_size, 100);
        assert_eq!(settings.scan.prefilter_margin, 0.05);
        assert_eq!(settings.scan.missing_indicative_price, 1.0);
        assert_eq!(settings.dump.days, 90);
        assert!(settings.edge.odds_api_key.is_none());
    }

    #[test]
    fn test_file_overrides_only_given_keys() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[scan]\nthreshold = 0.95\nmin_outcomes = 5\n\n[api]\nrate_limit_ms = 250"
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.scan.threshold, 0.95);
        assert_eq!(settings.scan.min_outcomes, 5);
        assert_eq!(settings.scan.min_depth, 100.0);
        assert_eq!(settings.api.rate_limit_ms, 250);
        assert_eq!(settings.api.gamma_url, "https://gamma-api.polymarket.com");
    }

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<config::Map<String, String>>();
        env_source().source(Some(map))
    }

    #[test]
    fn test_env_overrides_use_single_underscore_after_prefix() {
        let settings = Settings::layered(
            File::with_name("/nonexistent/poly").required(false),
            env(&[
                ("POLY_SCAN__THRESHOLD", "0.91"),
                ("POLY_EDGE__BOOKMAKER", "fanduel"),
                ("POLY__SCAN__MIN_DEPTH", "777"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.scan.threshold, 0.91);
        assert_eq!(settings.edge.bookmaker, "fanduel");
        assert_eq!(settings.scan.min_depth, 100.0);
    }

    #[test]
    fn test_env_beats_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[scan]\nthreshold = 0.95\nmin_outcomes = 5").unwrap();

        let settings = Settings::layered(
            File::from(file.path()).required(true),
            env(&[("POLY_SCAN__THRESHOLD", "0.9")]),
        )
        .unwrap();

        assert_eq!(settings.scan.threshold, 0.9);
        assert_eq!(settings.scan.min_outcomes, 5);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(Settings::load(Some(Path::new("/nonexistent/poly.toml"))).is_err());
    }
}
