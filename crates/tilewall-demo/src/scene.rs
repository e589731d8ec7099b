//! Scene files
//!
//! A scene is a window configuration plus a list of views, each filling
//! its viewport with one color. The `current` view is rendered last.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tilewall::{Color, Config, Viewport};

/// One logical view
#[derive(Debug, Clone, Deserialize)]
pub struct SceneView {
    pub name: String,
    /// `[xmin, ymin, xmax, ymax]`
    pub viewport: [f64; 4],
    pub color: [u8; 4],
}

impl SceneView {
    pub fn viewport(&self) -> Viewport {
        Viewport::from_array(self.viewport)
    }

    pub fn color(&self) -> Color {
        Color::from_array(self.color)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scene {
    #[serde(flatten)]
    pub config: Config,
    #[serde(default = "default_ranks")]
    pub ranks: usize,
    pub views: Vec<SceneView>,
    #[serde(default)]
    pub current: Option<String>,
}

fn default_ranks() -> usize {
    1
}

impl Default for Scene {
    /// Two overlapping views; `B` is current and ends up on top
    fn default() -> Self {
        Self {
            config: Config {
                width: 200,
                height: 100,
                ..Config::default()
            },
            ranks: 1,
            views: vec![
                SceneView {
                    name: "A".into(),
                    viewport: [0.0, 0.0, 0.5, 1.0],
                    color: [255, 0, 0, 255],
                },
                SceneView {
                    name: "B".into(),
                    viewport: [0.4, 0.0, 1.0, 1.0],
                    color: [0, 0, 255, 255],
                },
            ],
            current: Some("B".into()),
        }
    }
}

impl Scene {
    pub fn from_json(json: &str) -> Result<Self> {
        let scene: Scene = serde_json::from_str(json).context("parsing scene")?;
        scene.validate()?;
        Ok(scene)
    }

    pub fn validate(&self) -> Result<()> {
        self.config.validate()?;
        if self.ranks == 0 {
            bail!("scene needs at least one rank");
        }
        if let Some(layout) = self.config.tile_layout {
            let tiles = layout.columns as usize * layout.rows as usize;
            if tiles != self.ranks {
                bail!("tile layout has {} tiles but the scene has {} ranks", tiles, self.ranks);
            }
        }
        if let Some(current) = &self.current {
            if !self.views.iter().any(|view| &view.name == current) {
                bail!("current view {:?} is not defined", current);
            }
        }
        Ok(())
    }

    /// Views in render order, current view last
    pub fn render_order(&self) -> Vec<&SceneView> {
        let is_current = |view: &&SceneView| Some(&view.name) == self.current.as_ref();
        let (current, mut others): (Vec<_>, Vec<_>) = self.views.iter().partition(is_current);
        others.extend(current);
        others
    }
}
