use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("history depth must be at least 1")]
    ZeroHistoryDepth,
    #[error("table grid size {grid} exceeds maximum dimension {max}")]
    GridTooLarge { grid: usize, max: usize },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Host-provided editor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub initial_content: String,
    pub is_full_screen: bool,
    pub document_title: String,
    pub history_depth: usize,
    pub typing_merge_ms: u64,
    pub max_image_bytes: u64,
    pub table_grid_size: usize,
    pub max_table_dimension: usize,
    pub default_font_size: String,
    pub print_delay_ms: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            initial_content: String::new(),
            is_full_screen: false,
            document_title: "Untitled post".to_string(),
            history_depth: 100,
            typing_merge_ms: 400,
            max_image_bytes: 10 * 1024 * 1024,
            table_grid_size: 10,
            max_table_dimension: 20,
            default_font_size: crate::DEFAULT_FONT_SIZE.to_string(),
            print_delay_ms: 250,
        }
    }
}

impl EditorConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_depth == 0 {
            return Err(ConfigError::ZeroHistoryDepth);
        }
        if self.max_image_bytes == 0 {
            return Err(ConfigError::Zero("max_image_bytes"));
        }
        if self.max_table_dimension == 0 {
            return Err(ConfigError::Zero("max_table_dimension"));
        }
        if self.table_grid_size == 0 {
            return Err(ConfigError::Zero("table_grid_size"));
        }
        if self.table_grid_size > self.max_table_dimension {
            return Err(ConfigError::GridTooLarge { grid: self.table_grid_size, max: self.max_table_dimension });
        }
        Ok(())
    }
}
