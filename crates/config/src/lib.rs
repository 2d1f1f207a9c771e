// Configuration loading

pub mod settings;

use std::fmt;
use std::path::PathBuf;

pub use settings::Settings;

/// Fill color as `0xRRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u32);

impl Rgb {
    /// Parse `RRGGBB` with an optional leading `#`.
    pub fn from_hex_str(s: &str) -> Result<Self, ConfigError> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ConfigError::Validation(format!("invalid color '{s}', expected RRGGBB hex")));
        }
        u32::from_str_radix(hex, 16)
            .map(Rgb)
            .map_err(|e| ConfigError::Validation(format!("invalid color '{s}': {e}")))
    }
}

#[derive(Debug)]
pub enum ConfigError {
    /// Settings file could not be read or created.
    Read { path: PathBuf, detail: String },
    /// TOML parse / deserialization error.
    Parse(String),
    /// Value out of range or malformed.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, detail } => write!(f, "cannot read settings {}: {detail}", path.display()),
            Self::Parse(msg) => write!(f, "settings parse error: {msg}"),
            Self::Validation(msg) => write!(f, "settings validation error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
