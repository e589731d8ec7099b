//! TileWall Demo - Main Entry Point
//!
//! Usage: `tilewall-demo [scene.json] [out.png]`
//!
//! Without a scene file two overlapping views are rendered. With more than
//! one rank every rank runs on its own thread; in tile mode each rank
//! writes its own display as `<out>-<rank>.png`.

mod scene;

use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{anyhow, Context, Result};
use tilewall::{
    GatherCompositor, LocalController, ParallelRenderDriver, PassThroughCompositor, PixelRect,
    ThreadController, ThreadGroup, TileWall,
};
use tracing_subscriber::EnvFilter;

use scene::{Scene, SceneView};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("Starting TileWall demo v{}", tilewall::VERSION);

    let mut args = std::env::args().skip(1);
    let scene = match args.next() {
        Some(path) => {
            let json = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;
            Scene::from_json(&json)?
        }
        None => Scene::default(),
    };
    let out = PathBuf::from(args.next().unwrap_or_else(|| "tilewall.png".to_string()));

    if scene.ranks == 1 && scene.config.tile_layout.is_none() {
        render_local(&scene, &out)
    } else {
        render_threaded(&scene, &out)
    }
}

/// Fill this rank's horizontal band of the image with the view's color
fn add_view(driver: &mut ParallelRenderDriver, view: &SceneView) {
    let color = view.color();
    driver.set_draw_callback(move |ctx| {
        let (width, height) = ctx.size();
        let ranks = ctx.num_processes() as u32;
        let rank = ctx.rank() as u32;
        let top = height * rank / ranks;
        let bottom = height * (rank + 1) / ranks;
        ctx.fill_rect(PixelRect::new(0, top, width, bottom - top), color);
    });
}

fn render_local(scene: &Scene, out: &Path) -> Result<()> {
    let wall = TileWall::new(scene.config.clone())?;

    let mut drivers = Vec::new();
    for view in scene.render_order() {
        let mut driver = wall.driver(view.viewport(), Box::new(LocalController), Box::new(PassThroughCompositor));
        add_view(&mut driver, view);
        drivers.push((view.name.as_str(), driver));
    }

    for (name, driver) in drivers.iter_mut() {
        let outcome = driver.render()?;
        tracing::info!("Rendered view {}: {} tiles pushed", name, outcome.flush.pushed);
    }

    wall.present().save_png(out)?;
    tracing::info!("Wrote {}", out.display());
    Ok(())
}

fn render_threaded(scene: &Scene, out: &Path) -> Result<()> {
    let views: Vec<SceneView> = scene.render_order().into_iter().cloned().collect();

    // One rank group per view, then regroup per rank
    let mut per_rank: Vec<Vec<ThreadController>> = (0..scene.ranks).map(|_| Vec::new()).collect();
    for _ in &views {
        for (rank, controller) in ThreadGroup::new(scene.ranks).into_iter().enumerate() {
            per_rank[rank].push(controller);
        }
    }

    let tiled = scene.config.tile_layout.is_some();
    let handles: Vec<_> = per_rank
        .into_iter()
        .enumerate()
        .map(|(rank, controllers)| {
            let config = scene.config.clone();
            let views = views.clone();
            let out = if tiled { rank_path(out, rank) } else { out.to_path_buf() };
            thread::spawn(move || -> Result<()> {
                let wall = TileWall::new(config)?;
                let mut drivers: Vec<_> = views
                    .iter()
                    .zip(controllers)
                    .map(|(view, controller)| {
                        let mut driver = wall.driver(view.viewport(), Box::new(controller), Box::new(GatherCompositor));
                        add_view(&mut driver, view);
                        driver
                    })
                    .collect();

                // Every rank renders the views in the same order
                for driver in drivers.iter_mut() {
                    driver.render()?;
                }

                if tiled || rank == 0 {
                    wall.present().save_png(&out)?;
                    tracing::info!("Rank {} wrote {}", rank, out.display());
                }
                Ok(())
            })
        })
        .collect();

    for handle in handles {
        handle.join().map_err(|_| anyhow!("render thread panicked"))??;
    }
    Ok(())
}

fn rank_path(out: &Path, rank: usize) -> PathBuf {
    let stem = out.file_stem().and_then(|s| s.to_str()).unwrap_or("tilewall");
    out.with_file_name(format!("{}-{}.png", stem, rank))
}
