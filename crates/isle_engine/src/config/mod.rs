//! Configuration system

pub use serde::{Deserialize, Serialize};

/// Configuration trait
///
/// Blanket load/save support for config structs, with the file format
/// picked by extension (`.toml` or `.ron`).
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        // Reject unknown extensions before touching the filesystem
        if !path.ends_with(".toml") && !path.ends_with(".ron") {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        }

        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Renderer configuration
///
/// Tunables for the frame pipeline. Defaults match the shipped demo:
/// blur off until toggled, frustum culling present but disabled, a
/// 2048x2048 shadow map and ten blur passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendererConfig {
    /// Run the blur post-process and present passes
    pub blur_enabled: bool,

    /// Cull non-animated nodes against the view frustum during
    /// classification
    pub frustum_culling: bool,

    /// Side length of the square shadow depth target, in texels
    pub shadow_map_size: u32,

    /// Number of ping-pong blur passes (each is one horizontal plus one
    /// vertical draw)
    pub post_process_passes: u32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            blur_enabled: false,
            frustum_culling: false,
            shadow_map_size: 2048,
            post_process_passes: 10,
        }
    }
}

impl Config for RendererConfig {}
