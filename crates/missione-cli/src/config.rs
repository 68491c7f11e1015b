// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use missione_app::{Checklist, RateTable, RateTier};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const APP_NAME: &str = "missione";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub checklist: ChecklistSource,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub calculator: Calculator,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            checklist: ChecklistSource::default(),
            ui: Ui::default(),
            calculator: Calculator::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChecklistSource {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub start_expanded: Option<bool>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            start_expanded: Some(false),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Calculator {
    pub tiers: Option<Vec<RateTier>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub path: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            path: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("MISSIONE_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set MISSIONE_CONFIG_PATH to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version; add `version = 1` at the top",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(checklist) = &self.checklist.path
            && checklist.trim().is_empty()
        {
            bail!(
                "checklist.path in {} is empty; remove it to use the built-in checklist",
                path.display()
            );
        }

        self.rate_table()
            .with_context(|| format!("invalid [calculator] tiers in {}", path.display()))?;

        if let Some(level) = &self.log.level
            && tracing::Level::from_str(level).is_err()
        {
            bail!(
                "log.level in {} must be one of trace, debug, info, warn, error; got {:?}",
                path.display(),
                level
            );
        }

        Ok(())
    }

    pub fn checklist_path(&self) -> Option<PathBuf> {
        self.checklist.path.as_deref().map(PathBuf::from)
    }

    pub fn load_checklist(&self, override_path: Option<&Path>) -> Result<Checklist> {
        match override_path.map(Path::to_path_buf).or_else(|| self.checklist_path()) {
            Some(path) => Checklist::load(&path),
            None => Ok(Checklist::mission()),
        }
    }

    pub fn rate_table(&self) -> Result<RateTable> {
        match &self.calculator.tiers {
            Some(tiers) => RateTable::new(tiers.clone()),
            None => Ok(RateTable::standard()),
        }
    }

    pub fn start_expanded(&self) -> bool {
        self.ui.start_expanded.unwrap_or(false)
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.log.path {
            return Ok(PathBuf::from(path));
        }
        let data_root = dirs::data_local_dir().ok_or_else(|| {
            anyhow!("cannot resolve data directory; set [log].path in the config")
        })?;
        Ok(data_root.join(APP_NAME).join("missione.log"))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# missione config\n# Place this file at: {}\n\nversion = 1\n\n[checklist]\n# Optional. Default is the built-in first-mission checklist.\n# path = \"/absolute/path/to/checklist.toml\"\n\n[ui]\nstart_expanded = false\n\n[calculator]\n# Optional. Default: 0.20 EUR/km up to 150 km, 0.25 up to 300 km, 0.30 beyond.\n# tiers = [\n#   {{ up_to_km = 150, cents_per_km = 20 }},\n#   {{ up_to_km = 300, cents_per_km = 25 }},\n#   {{ cents_per_km = 30 }},\n# ]\n\n[log]\nlevel = \"{}\"\n# path = \"/absolute/path/to/missione.log\"\n",
            path.display(),
            DEFAULT_LOG_LEVEL,
        )
    }
}
