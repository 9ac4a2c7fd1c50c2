//! Configuration loading and management.
//!
//! Provides types for the TOML-based configuration file and for finding
//! suppression rules stored in `.skill-check-ignore` files.
//!
//! # Configuration file
//!
//! The default configuration file is `skill-check.toml` in the current
//! working directory. Use [`Config::load`] to read it:
//!
//! ```rust,no_run
//! use skill_check::config::Config;
//! use skill_check::finding::LayerKind;
//!
//! let config = Config::load(None).expect("failed to load config");
//! assert!(config.is_layer_enabled(LayerKind::Injection));
//! ```
//!
//! # Suppression files
//!
//! Place a `.skill-check-ignore` file next to an analysed `SKILL.md` to
//! suppress specific findings. See [`Suppression`] for the format and
//! [`load_suppressions`] for loading.

use crate::finding::LayerKind;
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "skill-check.toml";

/// Name of the suppression file looked up next to an analysed document.
pub const IGNORE_FILE: &str = ".skill-check-ignore";

/// Main configuration for the analysis engine.
///
/// All fields carry defaults so the config file can be omitted entirely.
#[derive(Debug, Clone, Default, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Config {
    /// Hosts treated as first-party by the `external-url` rule.
    pub allowlist: AllowlistConfig,
    /// When strict mode is enabled, SUSPICIOUS reports fail the process too.
    pub strict: StrictConfig,
    /// Per-layer on/off toggles.
    pub layers: LayersConfig,
    /// Content acquisition limits.
    pub limits: LimitsConfig,
}

/// Hosts that links may point at without an `external-url` finding.
///
/// A link host matches an entry when it is equal to it or is a subdomain of
/// it. Entries are lowercased at load time by [`AllowlistConfig::normalize`].
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct AllowlistConfig {
    pub domains: Vec<String>,
}

#[derive(Debug, Clone, Default, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct StrictConfig {
    pub enabled: bool,
}

/// Per-layer on/off toggles.
///
/// Every layer defaults to **enabled**.
///
/// ```toml
/// [layers]
/// coherence = false
/// ```
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct LayersConfig {
    pub unicode: bool,
    pub structure: bool,
    pub injection: bool,
    pub coherence: bool,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Largest document, in bytes, that will be read or fetched.
    pub max_bytes: u64,
}

impl AllowlistConfig {
    pub fn normalize(&mut self) {
        for d in &mut self.domains {
            *d = d.trim().to_lowercase();
        }
    }

    /// Returns `true` when `host` equals an allowlisted domain or is one of
    /// its subdomains. `host` must already be lowercase.
    pub fn allows_host(&self, host: &str) -> bool {
        self.domains.iter().any(|d| {
            host == d
                || host
                    .strip_suffix(d.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}

impl Default for AllowlistConfig {
    fn default() -> Self {
        AllowlistConfig {
            domains: vec!["github.com".to_string()],
        }
    }
}

impl Default for LayersConfig {
    fn default() -> Self {
        LayersConfig {
            unicode: true,
            structure: true,
            injection: true,
            coherence: true,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        LimitsConfig {
            max_bytes: 1024 * 1024,
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// Resolution order:
    /// 1. If `path` is `Some`, load from that file (error if missing).
    /// 2. If `path` is `None`, try `skill-check.toml` in the current directory.
    /// 3. If that file does not exist either, return [`Config::default()`].
    ///
    /// # Errors
    ///
    /// Returns `Err(String)` when the explicit path does not exist, the file
    /// cannot be read, or the TOML content fails to parse.
    pub fn load(path: Option<&Path>) -> Result<Config, String> {
        let config_path = if let Some(p) = path {
            if p.exists() {
                Some(p.to_path_buf())
            } else {
                return Err(format!("Config file not found: {}", p.display()));
            }
        } else {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                Some(default_path.to_path_buf())
            } else {
                None
            }
        };

        match config_path {
            Some(path) => {
                let content = std::fs::read_to_string(&path)
                    .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;
                let config = Config::from_toml(&content)
                    .map_err(|e| format!("Failed to parse config {}: {}", path.display(), e))?;
                tracing::debug!(path = %path.display(), "loaded configuration");
                Ok(config)
            }
            None => Ok(Config::default()),
        }
    }

    /// Parses configuration from TOML text and normalizes the allowlist.
    pub fn from_toml(content: &str) -> Result<Config, toml::de::Error> {
        let mut config: Config = toml::from_str(content)?;
        config.allowlist.normalize();
        Ok(config)
    }

    /// Returns `true` if the given detection layer is enabled.
    ///
    /// ```
    /// use skill_check::config::Config;
    /// use skill_check::finding::LayerKind;
    ///
    /// assert!(Config::default().is_layer_enabled(LayerKind::Unicode));
    /// ```
    pub fn is_layer_enabled(&self, layer: LayerKind) -> bool {
        match layer {
            LayerKind::Unicode => self.layers.unicode,
            LayerKind::Structure => self.layers.structure,
            LayerKind::Injection => self.layers.injection,
            LayerKind::Coherence => self.layers.coherence,
        }
    }
}

/// Root structure of a `.skill-check-ignore` TOML file.
///
/// ```toml
/// [[suppress]]
/// rule = "external-url"
/// file = "SKILL.md"
/// lines = "10-20"
/// reason = "Links to our own docs site"
/// ```
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct SuppressionFile {
    pub suppress: Vec<Suppression>,
}

/// A rule that silences a specific finding.
///
/// A suppression matches a [`Finding`](crate::finding::Finding) when:
/// - `rule` equals the finding's rule id.
/// - `file` is empty, or is a path suffix of the report's source label.
/// - `lines` (if set) contains the finding's 1-based line number.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct Suppression {
    pub rule: String,
    #[serde(default)]
    pub file: String,
    /// Optional line range (`"10-20"`) or single line (`"15"`).
    pub lines: Option<String>,
    pub reason: String,
    /// Optional issue-tracker reference.
    pub ticket: Option<String>,
}

/// Loads suppression rules from the `.skill-check-ignore` file in `dir`.
///
/// Returns an empty vector when the file is absent or unreadable; a parse
/// failure is logged and also yields no suppressions.
pub fn load_suppressions(dir: &Path) -> Vec<Suppression> {
    let ignore_path = dir.join(IGNORE_FILE);
    if !ignore_path.exists() {
        return vec![];
    }

    let content = match std::fs::read_to_string(&ignore_path) {
        Ok(c) => c,
        Err(_) => return vec![],
    };

    match toml::from_str::<SuppressionFile>(&content) {
        Ok(file) => file.suppress,
        Err(e) => {
            tracing::warn!(path = %ignore_path.display(), "failed to parse {IGNORE_FILE}: {e}");
            vec![]
        }
    }
}
