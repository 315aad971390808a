use std::env;

use anyhow::{Context, Result};
use chrono::NaiveTime;
use dotenvy::dotenv;

use crate::reconcile::classifier::{self, Classifier, DEFAULT_CUTOFF};

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,
    pub api_prefix: String,
    pub log_dir: String,

    /// Arrivals after this wall-clock minute are late.
    pub late_cutoff: NaiveTime,
    /// Content type announced in attachment data URIs.
    pub attachment_content_type: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://attendance.db".to_string(),
            server_addr: "127.0.0.1:8080".to_string(),
            api_prefix: "/api".to_string(),
            log_dir: "logs".to_string(),
            late_cutoff: Classifier::default().cutoff(),
            attachment_content_type: "image/jpeg".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let defaults = Self::default();
        let var = |key: &str, default: String| env::var(key).unwrap_or(default);

        let cutoff = var("LATE_CUTOFF", DEFAULT_CUTOFF.to_string());
        let late_cutoff = classifier::parse_clock(&cutoff)
            .with_context(|| format!("LATE_CUTOFF must be HH:MM, got '{cutoff}'"))?;

        let api_prefix = var("API_PREFIX", defaults.api_prefix);
        if !api_prefix.starts_with('/') {
            anyhow::bail!("API_PREFIX must start with '/', got '{api_prefix}'");
        }

        Ok(Self {
            database_url: var("DATABASE_URL", defaults.database_url),
            server_addr: var("SERVER_ADDR", defaults.server_addr),
            api_prefix,
            log_dir: var("LOG_DIR", defaults.log_dir),
            late_cutoff,
            attachment_content_type: var(
                "ATTACHMENT_CONTENT_TYPE",
                defaults.attachment_content_type,
            ),
        })
    }

    pub fn classifier(&self) -> Classifier {
        Classifier::new(self.late_cutoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_the_standard_cutoff() {
        let config = Config::default();
        assert_eq!(config.late_cutoff, NaiveTime::from_hms_opt(9, 17, 0).unwrap());
        assert_eq!(config.classifier(), Classifier::default());
        assert_eq!(config.api_prefix, "/api");
    }
}
