// SPDX-License-Identifier: MIT

//! Environment-driven platform settings

use chrono::Duration;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::engine::error::DossierError;

pub const DEFAULT_REPORTS_DIR: &str = "reports";
pub const DEFAULT_OUTPUT_DIR: &str = "outputs";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 120;
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Directory scanned for report plugins
    pub reports_dir: PathBuf,
    /// Where generated documents and metadata go
    pub output_dir: PathBuf,
    pub port: u16,
    /// Age after which an HTTP session is discarded
    pub session_ttl: Duration,
    /// Open HTTP sessions allowed at once
    pub max_sessions: usize,
}

impl PlatformConfig {
    pub fn new(reports_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
            output_dir: output_dir.into(),
            port: DEFAULT_PORT,
            session_ttl: Duration::minutes(DEFAULT_SESSION_TTL_MINUTES),
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }

    /// Read `DOSSIER_REPORTS_DIR`, `DOSSIER_OUTPUT_DIR`, `DOSSIER_PORT`,
    /// `DOSSIER_SESSION_TTL_MINUTES` and `DOSSIER_MAX_SESSIONS`.
    ///
    /// Call `dotenv().ok()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, DossierError> {
        let reports_dir = env::var("DOSSIER_REPORTS_DIR")
            .unwrap_or_else(|_| DEFAULT_REPORTS_DIR.to_string());
        let output_dir =
            env::var("DOSSIER_OUTPUT_DIR").unwrap_or_else(|_| DEFAULT_OUTPUT_DIR.to_string());
        let port = match env::var("DOSSIER_PORT") {
            Ok(raw) => parse_port(&raw)?,
            Err(_) => DEFAULT_PORT,
        };
        let session_ttl = match env::var("DOSSIER_SESSION_TTL_MINUTES") {
            Ok(raw) => parse_ttl(&raw)?,
            Err(_) => Duration::minutes(DEFAULT_SESSION_TTL_MINUTES),
        };
        let max_sessions = match env::var("DOSSIER_MAX_SESSIONS") {
            Ok(raw) => parse_setting("DOSSIER_MAX_SESSIONS", &raw)?,
            Err(_) => DEFAULT_MAX_SESSIONS,
        };

        Ok(Self {
            reports_dir: reports_dir.into(),
            output_dir: output_dir.into(),
            port,
            session_ttl,
            max_sessions,
        })
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_sessions(mut self, session_ttl: Duration, max_sessions: usize) -> Self {
        self.session_ttl = session_ttl;
        self.max_sessions = max_sessions;
        self
    }

    /// Output directory, created if missing
    pub fn output_dir(&self) -> Result<&Path, DossierError> {
        ensure_directory(&self.output_dir)?;
        Ok(&self.output_dir)
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self::new(DEFAULT_REPORTS_DIR, DEFAULT_OUTPUT_DIR)
    }
}

fn parse_setting<T: FromStr>(name: &str, raw: &str) -> Result<T, DossierError> {
    raw.trim()
        .parse()
        .map_err(|_| DossierError::config(format!("{} is not valid: '{}'", name, raw)))
}

fn parse_port(raw: &str) -> Result<u16, DossierError> {
    parse_setting("DOSSIER_PORT", raw)
}

fn parse_ttl(raw: &str) -> Result<Duration, DossierError> {
    let minutes: i64 = parse_setting("DOSSIER_SESSION_TTL_MINUTES", raw)?;
    if minutes <= 0 {
        return Err(DossierError::config(format!(
            "DOSSIER_SESSION_TTL_MINUTES must be positive: '{}'",
            raw
        )));
    }
    Duration::try_minutes(minutes).ok_or_else(|| {
        DossierError::config(format!("DOSSIER_SESSION_TTL_MINUTES is too large: '{}'", raw))
    })
}

/// Create `dir` and its parents if needed
pub fn ensure_directory(dir: &Path) -> Result<(), DossierError> {
    fs::create_dir_all(dir).map_err(|e| {
        log::error!("Could not create directory {}: {}", dir.display(), e);
        DossierError::config(format!("cannot create {}: {}", dir.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PlatformConfig::default();
        assert_eq!(config.reports_dir, PathBuf::from("reports"));
        assert_eq!(config.output_dir, PathBuf::from("outputs"));
        assert_eq!(config.port, 3000);
        assert_eq!(config.session_ttl, Duration::hours(2));
        assert_eq!(config.max_sessions, 1000);
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port(" 8080 ").unwrap(), 8080);
        assert!(matches!(parse_port("http"), Err(DossierError::Config(_))));
        assert!(parse_port("70000").is_err());
    }

    #[test]
    fn test_parse_ttl() {
        assert_eq!(parse_ttl("30").unwrap(), Duration::minutes(30));
        assert!(matches!(parse_ttl("0"), Err(DossierError::Config(_))));
        assert!(parse_ttl("-5").is_err());
        assert!(parse_ttl("media hora").is_err());
        assert!(parse_ttl(&i64::MAX.to_string()).is_err());
    }

    #[test]
    fn test_output_dir_is_created() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("a").join("b");
        let config = PlatformConfig::new(tmp.path(), &target);

        assert!(!target.exists());
        assert_eq!(config.output_dir().unwrap(), target.as_path());
        assert!(target.is_dir());
    }
}
