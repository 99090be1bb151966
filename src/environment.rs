// src/environment.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::filter::Pagination;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub url: String,
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub storage: StorageConfig,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    local: AppConfig,
    production: AppConfig,
}

fn default_bucket() -> String {
    "company-logo".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_page_size() -> usize {
    Pagination::DEFAULT_PAGE_SIZE
}

impl AppConfig {
    /// Load `config_path` for the current environment
    pub fn load(config_path: &Path) -> Result<Self> {
        let environment = Self::get_environment();
        info!("Loading configuration for environment: {}", environment);

        if !config_path.exists() {
            anyhow::bail!(
                "{} not found. Cannot start without configuration.",
                config_path.display()
            );
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config = Self::from_yaml_str(&content, &environment)?;

        Ok(Self {
            database_path: Self::resolve_path(&config.database_path)?,
            ..config
        })
    }

    pub fn get_environment() -> String {
        std::env::var("JOBBOARD_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .or_else(|_| std::env::var("ENV"))
            .unwrap_or_else(|_| "local".to_string())
    }

    /// Parse the YAML document and pick the section for `environment`
    pub fn from_yaml_str(content: &str, environment: &str) -> Result<Self> {
        let config_file: ConfigFile =
            serde_yaml::from_str(content).context("Failed to parse configuration")?;

        let config = match environment {
            "production" => config_file.production,
            _ => config_file.local,
        };

        if config.page_size == 0 {
            anyhow::bail!("page_size must be greater than zero");
        }

        Ok(config)
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::with_page_size(self.page_size).unwrap_or_default()
    }

    fn resolve_path(path: &Path) -> Result<PathBuf> {
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            let current_dir = std::env::current_dir().context("Failed to get current directory")?;
            Ok(current_dir.join(path))
        }
    }
}
