//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Settings file: `--settings FILE`, else `$XDG_CONFIG_HOME/bootscrub/bootscrub.toml`
//! 3. Environment variables: `BOOTSCRUB_*` prefix
//! 4. CLI flags (applied by the caller)

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::policy::{DEFAULT_HW_ID_LEAF, DEFAULT_INTERFACES_PATH, DEFAULT_KEEP_INTERFACE};
use crate::domain::{ConfigPath, SanitizePolicy};

pub const ENV_PREFIX: &str = "BOOTSCRUB";

/// Unified configuration for bootscrub.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Boot configuration document to sanitize
    pub config_path: PathBuf,
    /// Interface kept for first boot connectivity
    pub keep_interface: String,
    /// Container of interface subtrees, `/` or space separated
    pub interfaces_path: String,
    /// Leaf stripped from the kept interface
    pub hw_id_leaf: String,
    /// Copy the document to `<file>.bak` before overwriting
    pub backup: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("/config/config.boot"),
            keep_interface: DEFAULT_KEEP_INTERFACE.to_string(),
            interfaces_path: DEFAULT_INTERFACES_PATH.join(" "),
            hw_id_leaf: DEFAULT_HW_ID_LEAF.to_string(),
            backup: false,
        }
    }
}

/// Raw settings for intermediate parsing (`None` = not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct RawSettings {
    pub config_path: Option<PathBuf>,
    pub keep_interface: Option<String>,
    pub interfaces_path: Option<String>,
    pub hw_id_leaf: Option<String>,
    pub backup: Option<bool>,
}

/// Get the XDG config directory for bootscrub.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "bootscrub").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("bootscrub.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Expand `~`, `$VAR` and `${VAR}`, leaving the input alone on failure.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

impl Settings {
    /// Cleanup policy described by these settings.
    pub fn policy(&self) -> SanitizePolicy {
        let interfaces_path = self
            .interfaces_path
            .parse::<ConfigPath>()
            .unwrap_or_else(|never| match never {});
        SanitizePolicy::new(interfaces_path, &self.keep_interface, &self.hw_id_leaf)
    }

    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.config_path.to_string_lossy().as_ref());
        self.config_path = PathBuf::from(expanded);
    }

    /// Scalar options: overlay wins if Some, otherwise keep base.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            config_path: overlay
                .config_path
                .clone()
                .unwrap_or_else(|| self.config_path.clone()),
            keep_interface: overlay
                .keep_interface
                .clone()
                .unwrap_or_else(|| self.keep_interface.clone()),
            interfaces_path: overlay
                .interfaces_path
                .clone()
                .unwrap_or_else(|| self.interfaces_path.clone()),
            hw_id_leaf: overlay
                .hw_id_leaf
                .clone()
                .unwrap_or_else(|| self.hw_id_leaf.clone()),
            backup: overlay.backup.unwrap_or(self.backup),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `settings_file` - Explicit settings file; must exist when given.
    ///   Without it the global XDG file is used if present.
    pub fn load(settings_file: Option<&Path>) -> Result<Self, ApplicationError> {
        let env = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__");
        Self::load_with_env(settings_file, env)
    }

    /// Like [`Settings::load`] with an explicit environment source.
    pub fn load_with_env(
        settings_file: Option<&Path>,
        env: Environment,
    ) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Settings file
        match settings_file {
            Some(path) => {
                let raw = load_raw_settings(path)?;
                current = current.merge_with(&raw);
            }
            None => {
                if let Some(global_path) = global_config_path() {
                    if global_path.exists() {
                        let raw = load_raw_settings(&global_path)?;
                        current = current.merge_with(&raw);
                    }
                }
            }
        }

        // 3. Environment variables (explicit override)
        current = Self::apply_env_overrides(current, env)?;

        current.expand_paths();
        current.validate()?;

        Ok(current)
    }

    /// Reject settings that would let the policy touch nodes outside the
    /// interface container.
    fn validate(&self) -> Result<(), ApplicationError> {
        if self.policy().interfaces_path.is_root() {
            return Err(ApplicationError::Config {
                message: format!(
                    "interfaces_path must name a container below the root, got {:?}",
                    self.interfaces_path
                ),
            });
        }
        if self.keep_interface.trim().is_empty() {
            return Err(ApplicationError::Config {
                message: "keep_interface must not be empty".to_string(),
            });
        }
        if self.hw_id_leaf.trim().is_empty() {
            return Err(ApplicationError::Config {
                message: "hw_id_leaf must not be empty".to_string(),
            });
        }
        Ok(())
    }

    fn apply_env_overrides(mut settings: Self, env: Environment) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(env)
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("config_path") {
            settings.config_path = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("keep_interface") {
            settings.keep_interface = val;
        }
        if let Ok(val) = config.get_string("interfaces_path") {
            settings.interfaces_path = val;
        }
        if let Ok(val) = config.get_string("hw_id_leaf") {
            settings.hw_id_leaf = val;
        }
        if let Ok(val) = config.get_bool("backup") {
            settings.backup = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# bootscrub configuration
#
# Locations (by precedence, lowest to highest):
#   File: ~/.config/bootscrub/bootscrub.toml (or --settings FILE)
#   Env:  BOOTSCRUB_* environment variables
#   CLI flags

# Boot configuration document to sanitize
# config_path = "/config/config.boot"

# Interface kept for first boot connectivity (only its hw-id is removed)
# keep_interface = "eth0"

# Container holding the interface definitions
# interfaces_path = "interfaces ethernet"

# Leaf binding an interface to its hardware
# hw_id_leaf = "hw-id"

# Copy the document to <file>.bak before overwriting
# backup = false
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn env_from(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .source(Some(map))
    }

    #[test]
    fn given_no_config_when_loading_then_uses_defaults() {
        let settings = Settings::load_with_env(None, env_from(&[])).expect("load defaults");
        if global_config_path().map_or(true, |p| !p.exists()) {
            assert_eq!(settings, Settings::default());
        }
    }

    #[test]
    fn given_default_settings_when_building_policy_then_targets_ethernet() {
        let policy = Settings::default().policy();
        assert_eq!(policy, SanitizePolicy::default());
    }

    #[test]
    fn given_env_vars_when_loading_then_env_overrides_defaults() {
        let env = env_from(&[
            ("BOOTSCRUB_KEEP_INTERFACE", "eth1"),
            ("BOOTSCRUB_BACKUP", "true"),
            ("BOOTSCRUB_INTERFACES_PATH", "interfaces/bonding"),
        ]);

        let settings = Settings::load_with_env(None, env).unwrap();

        assert_eq!(settings.keep_interface, "eth1");
        assert!(settings.backup);
        assert_eq!(
            settings.policy().interfaces_path,
            ConfigPath::from(["interfaces", "bonding"])
        );
    }

    #[rstest]
    #[case::empty_container("BOOTSCRUB_INTERFACES_PATH", "")]
    #[case::slash_only_container("BOOTSCRUB_INTERFACES_PATH", " / ")]
    #[case::empty_keep_interface("BOOTSCRUB_KEEP_INTERFACE", "")]
    #[case::blank_hw_id_leaf("BOOTSCRUB_HW_ID_LEAF", "  ")]
    fn given_unusable_env_value_when_loading_then_config_error(
        #[case] key: &str,
        #[case] value: &str,
    ) {
        let result = Settings::load_with_env(None, env_from(&[(key, value)]));

        assert!(
            matches!(result, Err(ApplicationError::Config { .. })),
            "got {result:?}"
        );
    }

    #[test]
    fn given_tilde_in_config_path_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            config_path: PathBuf::from("~/config.boot"),
            ..Settings::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        assert!(settings.config_path.to_string_lossy().starts_with(&home));
    }

    #[test]
    fn given_partial_overlay_when_merging_then_unspecified_fields_kept() {
        let overlay = RawSettings {
            keep_interface: Some("eth2".into()),
            ..RawSettings::default()
        };

        let merged = Settings::default().merge_with(&overlay);

        assert_eq!(merged.keep_interface, "eth2");
        assert_eq!(merged.hw_id_leaf, "hw-id");
        assert_eq!(merged.config_path, PathBuf::from("/config/config.boot"));
    }

    #[test]
    fn given_template_when_parsed_then_is_valid_toml() {
        let raw: RawSettings = toml::from_str(&Settings::template()).unwrap();
        assert!(raw.keep_interface.is_none());
    }
}
