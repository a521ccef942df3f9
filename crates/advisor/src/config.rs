//! Service configuration
//!
//! Read from `ADVISOR_*` environment variables, on top of an optional
//! TOML or JSON file named by `ADVISOR_CONFIG` whose `[engine]` table
//! holds engine policy overrides.

use advisor_lib::{EngineConfig, FixStrategy, PlanOptions};
use anyhow::{Context, Result};
use serde::Deserialize;

/// Advisor service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AdvisorConfig {
    /// Port for the HTTP API
    #[serde(default = "default_port")]
    pub port: u16,

    /// Budget applied when a request does not carry one, 0 for none
    #[serde(default)]
    pub budget_target_usd: f64,

    /// Auto-approve flag applied when a request does not carry one
    #[serde(default)]
    pub auto_approve: bool,

    /// Overrides `engine.fixes.strategy`
    #[serde(default)]
    pub fix_strategy: Option<FixStrategy>,

    #[serde(default)]
    pub engine: EngineConfig,
}

fn default_port() -> u16 {
    8080
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            budget_target_usd: 0.0,
            auto_approve: false,
            fix_strategy: None,
            engine: EngineConfig::default(),
        }
    }
}

impl AdvisorConfig {
    /// Load configuration from the environment and the optional config file
    pub fn load() -> Result<Self> {
        let file = std::env::var("ADVISOR_CONFIG").ok();
        Self::load_from(file.as_deref())
    }

    pub fn load_from(file: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::with_name(path));
        }
        let raw = builder
            .add_source(config::Environment::with_prefix("ADVISOR").try_parsing(true))
            .build()
            .context("failed to read advisor configuration")?;

        let mut cfg: AdvisorConfig = raw
            .try_deserialize()
            .context("invalid advisor configuration")?;
        if let Some(strategy) = cfg.fix_strategy {
            cfg.engine.fixes.strategy = strategy;
        }
        cfg.engine.validate()?;
        Ok(cfg)
    }

    pub fn plan_defaults(&self) -> PlanOptions {
        PlanOptions {
            budget_target_usd: self.budget_target_usd,
            auto_approve: self.auto_approve,
        }
    }
}
