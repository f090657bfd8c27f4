use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scraping::{
    self, cascade::Strategy, extractor::PoliteDelay, synth::DEFAULT_DATE_WINDOW_DAYS,
    validate::TitlePolicy, EventSource, SourceConfig,
};
use crate::utils;

pub const DEFAULT_USER_AGENT: &str = "MovieScrape/0.1 (+cinema promotional event feed)";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("unknown source id: {0}")]
    UnknownSource(String),
}

/// Per-source replacements for the built-in defaults. Unset fields keep the
/// source's own values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceOverrides {
    pub enabled: bool,
    pub listing_urls: Option<Vec<String>>,
    pub strategies: Option<Vec<Strategy>>,
    pub candidate_cap: Option<usize>,
    pub floor: Option<usize>,
}

impl Default for SourceOverrides {
    fn default() -> Self {
        Self {
            enabled: true,
            listing_urls: None,
            strategies: None,
            candidate_cap: None,
            floor: None,
        }
    }
}

impl SourceOverrides {
    fn apply(&self, config: &mut SourceConfig) {
        if let Some(urls) = &self.listing_urls {
            config.listing_urls = urls.clone();
        }
        if let Some(strategies) = &self.strategies {
            config.strategies = strategies.clone();
        }
        if let Some(cap) = self.candidate_cap {
            config.candidate_cap = cap;
        }
        if let Some(floor) = self.floor {
            config.floor = floor;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CrawlConfig {
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub run_deadline_secs: u64,
    pub polite_delay_ms: PoliteDelay,
    pub title_policy: TitlePolicy,
    pub date_window_days: u32,
    pub seed: Option<u64>,
    pub output_dir: PathBuf,
    pub write_csv: bool,
    pub sources: BTreeMap<String, SourceOverrides>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: 10,
            run_deadline_secs: 60,
            polite_delay_ms: PoliteDelay::default(),
            title_policy: TitlePolicy::default(),
            date_window_days: DEFAULT_DATE_WINDOW_DAYS,
            seed: None,
            output_dir: PathBuf::from("public/data"),
            write_csv: true,
            sources: BTreeMap::new(),
        }
    }
}

impl CrawlConfig {
    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(&utils::config_path())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn run_deadline(&self) -> Duration {
        Duration::from_secs(self.run_deadline_secs)
    }

    /// Sources to crawl, in output order, with overrides applied. A non-empty
    /// `only` restricts the run to those ids; disabled sources are dropped
    /// unless named there.
    pub fn resolve_sources(
        &self,
        only: &[String],
    ) -> Result<Vec<(Arc<dyn EventSource>, SourceConfig)>, ConfigError> {
        let known = scraping::active_sources();
        for id in self.sources.keys().chain(only.iter()) {
            if !known.iter().any(|source| source.id() == id) {
                return Err(ConfigError::UnknownSource(id.clone()));
            }
        }

        let mut resolved = Vec::new();
        for source in known {
            let overrides = self.sources.get(source.id()).cloned().unwrap_or_default();
            let selected = if only.is_empty() {
                overrides.enabled
            } else {
                only.iter().any(|id| id == source.id())
            };
            if !selected {
                continue;
            }
            let mut config = source.defaults();
            overrides.apply(&mut config);
            resolved.push((source, config));
        }
        Ok(resolved)
    }
}
