use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::engine::ExecutionMode;
use crate::scanner::{ScanPolicy, DEFAULT_EDITABLE_CONTAINERS, DEFAULT_IGNORED_CONTAINERS};

pub const SETTINGS_VERSION: &str = "1";

/// Per-host override of the global `enabled` flag
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SiteRule {
    Allow,
    Block,
    #[default]
    Default,
}

/// User preferences read once at bootstrap
/// WHY: every field has a default so partial or older files still load
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub enabled: bool,
    /// When false the pipeline only detects and never rewrites
    pub convert_to_unicode: bool,
    pub per_site: HashMap<String, SiteRule>,
    pub ignored_containers: Vec<String>,
    pub editable_containers: Vec<String>,
    pub debounce_ms: u64,
    pub batch_size: usize,
    pub detection_threshold: f64,
    pub model_path: Option<PathBuf>,
    pub execution: ExecutionMode,
    pub debug: bool,
    /// Missing on files written before versioning; those load as "" and get migrated
    #[serde(default)]
    pub version: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            convert_to_unicode: true,
            per_site: HashMap::new(),
            ignored_containers: DEFAULT_IGNORED_CONTAINERS.iter().map(|t| t.to_string()).collect(),
            editable_containers: DEFAULT_EDITABLE_CONTAINERS.iter().map(|t| t.to_string()).collect(),
            debounce_ms: 150,
            batch_size: 256,
            detection_threshold: 0.95,
            model_path: None,
            execution: ExecutionMode::Worker,
            debug: false,
            version: SETTINGS_VERSION.to_string(),
        }
    }
}

impl Settings {
    /// Load settings, falling back to defaults when the file is missing or unreadable
    /// WHY: a broken preferences file must never stop conversion from running
    pub async fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(_) => {
                debug!("No settings at {}, using defaults", path.display());
                return Self::default();
            }
        };

        let mut settings: Self = match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring unparsable settings file {}: {}", path.display(), e);
                return Self::default();
            }
        };

        if settings.version != SETTINGS_VERSION {
            info!(
                "Migrating settings {} from version {:?} to {}",
                path.display(),
                settings.version,
                SETTINGS_VERSION
            );
            settings.version = SETTINGS_VERSION.to_string();
            if let Err(e) = settings.save(path).await {
                warn!("Could not persist migrated settings: {:#}", e);
            }
        }
        settings
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;
        Ok(())
    }

    pub fn site_rule_for(&self, host: &str) -> SiteRule {
        self.per_site
            .get(&host.to_ascii_lowercase())
            .copied()
            .unwrap_or_default()
    }

    /// Whether the pipeline should start for `host`; no host means a local document.
    /// The global flag wins over any site rule.
    pub fn should_run_on(&self, host: Option<&str>) -> bool {
        if !self.enabled {
            return false;
        }
        host.map(|h| self.site_rule_for(h)) != Some(SiteRule::Block)
    }

    pub fn set_site_rule(&mut self, host: &str, rule: SiteRule) {
        let host = host.to_ascii_lowercase();
        if rule == SiteRule::Default {
            self.per_site.remove(&host);
        } else {
            self.per_site.insert(host, rule);
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size.max(1)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn scan_policy(&self) -> ScanPolicy {
        ScanPolicy::new(&self.ignored_containers, &self.editable_containers)
    }
}
