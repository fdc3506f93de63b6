//! Configuration system
//!
//! Bridge settings load from TOML or RON, picked by file extension. Every
//! field has a default so a partial file (or no file at all) is valid.

use serde::{Deserialize, Serialize};

use crate::feature::FeatureSettings;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::parse(path, &contents)
    }

    /// Parse configuration text, using `path` only to pick the format
    fn parse(path: &str, contents: &str) -> Result<Self, ConfigError> {
        if path.ends_with(".toml") {
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
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

/// Mesh renderer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Name published to the GUI library as the backend renderer
    pub backend_name: String,
    /// Debug name given to the dynamic mesh
    pub mesh_name: String,
    /// Shader property the font/image texture is bound to
    pub texture_property: String,
    /// Shader keyword toggling soft clip-rect evaluation
    pub clip_rect_keyword: String,
    /// Label of the profiling scope wrapped around the frame's commands
    pub profiling_label: Option<String>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            backend_name: "Mesh".to_string(),
            mesh_name: "DearImGui Mesh".to_string(),
            texture_property: "_Texture".to_string(),
            clip_rect_keyword: "_CLIP_RECT".to_string(),
            profiling_label: Some("DearImGui.ExecuteDrawCommands".to_string()),
        }
    }
}

/// Top-level bridge configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Mesh renderer settings
    pub renderer: RendererConfig,
    /// Render pipeline feature settings
    pub feature: FeatureSettings,
    /// Capacity reserved for each frame context's command list
    pub initial_command_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            renderer: RendererConfig::default(),
            feature: FeatureSettings::default(),
            initial_command_capacity: 32,
        }
    }
}

impl Config for BridgeConfig {}
