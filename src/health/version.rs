use serde::Serialize;
use std::num::ParseIntError;
use std::time::{Duration, SystemTime};

const UNKNOWN: &str = "unknown";

#[derive(thiserror::Error, Debug)]
pub enum VersionError {
    #[error("build time {value:?} is not a unix timestamp: {source}")]
    BuildTime {
        value: String,
        source: ParseIntError,
    },
}

/// Build metadata reported by the health endpoint.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub build_time: String,
    pub git_commit: String,
    pub language: &'static str,
    pub version: String,
}

impl VersionInfo {
    /// `build_time` is seconds since the unix epoch.
    pub fn new(
        build_time: Option<&str>,
        git_commit: Option<&str>,
        version: &str,
    ) -> Result<Self, VersionError> {
        let build_time = match build_time.filter(|t| !t.is_empty()) {
            Some(value) => {
                let secs = value.parse::<u64>().map_err(|source| VersionError::BuildTime {
                    value: value.to_string(),
                    source,
                })?;
                let time = SystemTime::UNIX_EPOCH + Duration::from_secs(secs);
                humantime::format_rfc3339_seconds(time).to_string()
            }
            None => UNKNOWN.to_string(),
        };
        let git_commit = git_commit
            .filter(|c| !c.is_empty())
            .unwrap_or(UNKNOWN)
            .to_string();

        Ok(Self {
            build_time,
            git_commit,
            language: "rust",
            version: version.to_string(),
        })
    }

    /// Reads `BUILD_TIME` and `GIT_COMMIT` from the environment the crate was compiled in.
    pub fn from_build_env() -> Result<Self, VersionError> {
        Self::new(
            option_env!("BUILD_TIME"),
            option_env!("GIT_COMMIT"),
            env!("CARGO_PKG_VERSION"),
        )
    }
}
