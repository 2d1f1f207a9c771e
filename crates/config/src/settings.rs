// Comparison settings
// Loaded from ~/.config/celldelta/settings.toml

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::{ConfigError, Rgb};

/// Fill colors for the exported diff, as `RRGGBB` hex strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightSettings {
    /// Data cells whose value changed (light pink)
    pub changed: String,

    /// Headers of the generated `Comments` / `_% Change` columns (light blue)
    pub synthetic_header: String,
}

impl Default for HighlightSettings {
    fn default() -> Self {
        Self {
            changed: "FFB6C1".to_string(),
            synthetic_header: "ADD8E6".to_string(),
        }
    }
}

/// Output file naming and summary behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Last word of the default diff file name: `<labels> Differences.xlsx`
    pub suffix: String,

    /// Last word of the default summary file name
    pub summary_suffix: String,

    /// Print each sheet's summary table after comparing
    pub print_summary: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            suffix: "Differences".to_string(),
            summary_suffix: "Summary".to_string(),
            print_summary: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// 1-indexed row holding the column headers
    pub header_row: usize,

    pub highlight: HighlightSettings,

    pub output: OutputSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            header_row: 2,
            highlight: HighlightSettings::default(),
            output: OutputSettings::default(),
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("celldelta");
        config_dir.join("settings.toml")
    }

    /// Load from the default location; defaults when no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        if !path.exists() {
            log::debug!("no settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load from an explicit file, which must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        let settings = Self::from_toml(&contents)?;
        log::debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.header_row == 0 {
            return Err(ConfigError::Validation("header_row is 1-indexed and must be at least 1".into()));
        }
        self.changed_color()?;
        self.synthetic_header_color()?;
        if self.output.suffix.trim().is_empty() {
            return Err(ConfigError::Validation("output.suffix must not be empty".into()));
        }
        if self.output.summary_suffix.trim().is_empty() {
            return Err(ConfigError::Validation("output.summary_suffix must not be empty".into()));
        }
        Ok(())
    }

    pub fn changed_color(&self) -> Result<Rgb, ConfigError> {
        Rgb::from_hex_str(&self.highlight.changed)
    }

    pub fn synthetic_header_color(&self) -> Result<Rgb, ConfigError> {
        Rgb::from_hex_str(&self.highlight.synthetic_header)
    }

    /// Write the defaults to the settings path, keeping any existing file.
    pub fn create_default_file() -> Result<PathBuf, ConfigError> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Read {
                path: parent.to_path_buf(),
                detail: e.to_string(),
            })?;
        }
        fs::write(&path, DEFAULT_SETTINGS).map_err(|e| ConfigError::Read {
            path: path.clone(),
            detail: e.to_string(),
        })?;
        Ok(path)
    }
}

const DEFAULT_SETTINGS: &str = r#"# celldelta settings

# Row (1-indexed) holding the column headers in both workbooks
header_row = 2

[highlight]
# Fill for changed data cells
changed = "FFB6C1"
# Fill for the Comments / _% Change headers
synthetic_header = "ADD8E6"

[output]
suffix = "Differences"
summary_suffix = "Summary"
print_summary = true
"#;
