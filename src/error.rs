use crate::dump::DumpStage;
use crate::scanner::ScanStage;
use thiserror::Error;

/// Failure of a single gateway call.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP {status}: {url}")]
    Status { status: u16, url: String },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{0}")]
    UnsupportedTarget(String),
}

impl ApiError {
    /// HTTP status code, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Fatal scan failure, tagged with the stage it happened in.
#[derive(Debug, Error)]
#[error("scan failed during {stage}: {source}")]
pub struct ScanError {
    pub stage: ScanStage,
    #[source]
    pub source: ApiError,
}

impl ScanError {
    pub fn new(stage: ScanStage, source: ApiError) -> Self {
        Self { stage, source }
    }

    pub fn stage(&self) -> ScanStage {
        self.stage
    }
}

/// Fatal account dump failure.
#[derive(Debug, Error)]
pub enum DumpError {
    #[error("dump failed during {stage}: {source}")]
    Api {
        stage: DumpStage,
        #[source]
        source: ApiError,
    },

    #[error("dump failed during writing: {0}")]
    Write(#[from] std::io::Error),
}

impl DumpError {
    pub fn api(stage: DumpStage, source: ApiError) -> Self {
        DumpError::Api { stage, source }
    }

    pub fn stage(&self) -> DumpStage {
        match self {
            DumpError::Api { stage, .. } => *stage,
            DumpError::Write(_) => DumpStage::Writing,
        }
    }
}
