use dui_editor::Mode;
use dui_validator::ValidationLimits;
use dui_workspace::{ServiceOptions, DEFAULT_SURFACE_ID};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "dui.config.json";

/// dui configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Revision store file, relative to the config directory
    #[serde(default = "default_state_file")]
    pub state_file: String,

    /// Surface used when a command gets no `--surface`
    #[serde(default = "default_surface")]
    pub default_surface: String,

    /// Mode patch plans are proposed under
    #[serde(default)]
    pub mode: Mode,

    #[serde(default)]
    pub enforce_cross_surface_theme: bool,

    #[serde(default)]
    pub limits: ValidationLimits,
}

fn default_state_file() -> String {
    ".dui/state.json".to_string()
}

fn default_surface() -> String {
    DEFAULT_SURFACE_ID.to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &Path) -> anyhow::Result<Self> {
        let config_path = cwd.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn state_path(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.state_file)
    }

    /// `surface` if given, else the configured default
    pub fn surface<'a>(&'a self, surface: Option<&'a str>) -> &'a str {
        surface.unwrap_or(&self.default_surface)
    }

    pub fn service_options(&self) -> ServiceOptions {
        ServiceOptions {
            limits: self.limits,
            enforce_cross_surface_theme: self.enforce_cross_surface_theme,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
            default_surface: default_surface(),
            mode: Mode::default(),
            enforce_cross_surface_theme: false,
            limits: ValidationLimits::default(),
        }
    }
}
