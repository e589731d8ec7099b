//! Configuration

use serde::Deserialize;
use tilewall_display::DisplayError;
use tilewall_image::{Color, TileLayout};

use crate::CompositeMode;

/// Display wall grid as written in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TileLayoutConfig {
    pub columns: u32,
    pub rows: u32,
}

impl From<TileLayoutConfig> for TileLayout {
    fn from(config: TileLayoutConfig) -> Self {
        TileLayout::new(config.columns, config.rows)
    }
}

/// TileWall configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Window width in pixels (per display in tile mode)
    pub width: u32,
    /// Window height in pixels (per display in tile mode)
    pub height: u32,
    /// RGBA the window is cleared to
    pub background: [u8; 4],
    /// Drive a tiled display wall instead of a single display
    pub tile_layout: Option<TileLayoutConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            background: [0, 0, 0, 255],
            tile_layout: None,
        }
    }
}

impl Config {
    /// Parse from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if let Some(layout) = self.tile_layout {
            if layout.columns == 0 || layout.rows == 0 {
                return Err(ConfigError::Invalid(format!(
                    "tile layout must be non-empty, got {}x{}",
                    layout.columns, layout.rows
                )));
            }
        }
        Ok(())
    }

    pub fn background_color(&self) -> Color {
        Color::from_array(self.background)
    }

    /// Composite mode implied by `tile_layout`
    pub fn composite_mode(&self) -> CompositeMode {
        match self.tile_layout {
            Some(layout) => CompositeMode::TileDisplay(layout.into()),
            None => CompositeMode::SingleDisplay,
        }
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Cannot create render window: {0}")]
    Display(#[from] DisplayError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!((config.width, config.height), (800, 600));
        assert_eq!(config.background_color(), Color::BLACK);
        assert_eq!(config.composite_mode(), CompositeMode::SingleDisplay);
    }

    #[test]
    fn test_partial_json() {
        let config = Config::from_json(r#"{ "width": 64, "tile_layout": { "columns": 2, "rows": 1 } }"#).unwrap();
        assert_eq!((config.width, config.height), (64, 600));
        assert_eq!(config.composite_mode(), CompositeMode::TileDisplay(TileLayout::new(2, 1)));
    }

    #[test]
    fn test_rejects_zero_sizes() {
        assert!(matches!(Config::from_json(r#"{ "height": 0 }"#), Err(ConfigError::Invalid(_))));
        assert!(matches!(
            Config::from_json(r#"{ "tile_layout": { "columns": 0, "rows": 2 } }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(Config::from_json("{ width: 1 }"), Err(ConfigError::Parse(_))));
    }
}
