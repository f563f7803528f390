use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::lifecycle::DEFAULT_SESSION_COST;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub credits: CreditsConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file, created on first start
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/exportpitch.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CreditsConfig {
    /// Credits deducted when a practice session starts
    pub session_cost: i64,
}

impl Default for CreditsConfig {
    fn default() -> Self {
        Self {
            session_cost: DEFAULT_SESSION_COST,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Base URL of an OpenAI-compatible API (without `/chat/completions`)
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Upper bound for one scoring call, in seconds
    pub timeout_secs: u64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// When false, emails are logged instead of sent
    pub enabled: bool,
    pub base_url: String,
    pub api_key: String,
    pub from: String,
    /// Public URL of the web app, used for links in emails
    pub app_url: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://api.resend.com".to_string(),
            api_key: String::new(),
            from: "ExportPitch AI <notifications@exportpitch.ai>".to_string(),
            app_url: "http://localhost:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub nats_url: String,
    /// Assistant profile the voice channel should run
    pub assistant_name: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            nats_url: "nats://localhost:4222".to_string(),
            assistant_name: "Pitcher".to_string(),
        }
    }
}

impl Config {
    /// Load the config file at `path` (extension optional), then apply
    /// `EXPORTPITCH__SECTION__KEY` environment overrides.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("EXPORTPITCH").separator("__"))
            .build()
            .with_context(|| format!("Failed to read config from {}", path))?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.credits.session_cost <= 0 {
            bail!(
                "credits.session_cost must be positive, got {}",
                self.credits.session_cost
            );
        }
        if self.scoring.timeout_secs == 0 {
            bail!("scoring.timeout_secs must be at least 1");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn load_with(extra: &str) -> Result<Config> {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
        writeln!(
            file,
            "[service]\nname = \"exportpitch\"\n\n[service.http]\nbind = \"127.0.0.1\"\nport = 8080\n\n{}",
            extra
        )?;

        Config::load(&file.path().to_string_lossy())
    }

    #[test]
    fn test_defaults_apply_to_missing_sections() {
        let config = load_with("").unwrap();
        assert_eq!(config.credits.session_cost, DEFAULT_SESSION_COST);
        assert_eq!(config.scoring.timeout_secs, 60);
        assert!(!config.email.enabled);
    }

    #[test]
    fn test_non_positive_session_cost_is_rejected() {
        assert!(load_with("[credits]\nsession_cost = 0").is_err());
        assert!(load_with("[credits]\nsession_cost = -10").is_err());
        assert_eq!(
            load_with("[credits]\nsession_cost = 3").unwrap().credits.session_cost,
            3
        );
    }

    #[test]
    fn test_zero_scoring_timeout_is_rejected() {
        assert!(load_with("[scoring]\ntimeout_secs = 0").is_err());
    }
}
