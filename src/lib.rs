#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel World
//!
//! A chunked voxel world core: dense chunk storage, face-culled meshing, seeded
//! terrain generation, byte-exact chunk persistence and a streamer that keeps the
//! chunks around a moving observer in memory without blocking the caller.
//!
//! ## Key Modules
//!
//! * `config` - World and terrain parameters, loaded from JSON
//! * `core` - Shared-ownership containers used across threads
//! * `error` - Error types for voxel, persistence and configuration failures
//! * `world_state` - The streamer, voxel data, meshing and task management
//!
//! ## Architecture
//!
//! The crate draws a hard line between the foreground, which owns the chunk registry
//! and every decision about it, and worker threads, which only run self-contained
//! production and eviction tasks. Geometry leaves the crate through the
//! `RenderSink` trait; how it is drawn is up to the host.
//!
//! ## Usage
//!
//! ```no_run
//! fn main() {
//!     voxel_world::run();
//! }
//! ```

use std::sync::Arc;

use cgmath::Point3;
use log::{error, info};
use web_time::Instant;

use config::WorldConfig;
use error::WorldError;
use world_state::rendering::RecordingRenderSink;
use world_state::voxels::block::block_type::BlockType;
use world_state::voxels::storage::FileChunkStore;
use world_state::WorldStreamer;

pub mod config;
pub mod core;
pub mod error;
pub mod world_state;

/// Environment variable naming a JSON world configuration file.
pub const CONFIG_PATH_ENV: &str = "VOXEL_WORLD_CONFIG";

/// Runs a headless walk through the world.
///
/// The observer walks east across the world one block at a time, streaming chunks
/// in and out as it goes, places a block where it stops and saves everything still
/// in memory. Configuration comes from the file named by `VOXEL_WORLD_CONFIG`, or
/// the defaults if it is unset.
pub fn run() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");

    if let Err(e) = walk() {
        error!("World walk failed: {}", e);
    }
}

fn load_config() -> Result<WorldConfig, WorldError> {
    match std::env::var_os(CONFIG_PATH_ENV) {
        Some(path) => {
            info!("Loading world configuration from {:?}", path);
            Ok(WorldConfig::from_json_file(path)?)
        }
        None => Ok(WorldConfig::default()),
    }
}

fn walk() -> Result<(), WorldError> {
    let start = Instant::now();
    let config = load_config()?;
    let store = Arc::new(FileChunkStore::create(
        &config.save_directory,
        config.chunk_size,
    )?);
    let render_sink = RecordingRenderSink::new();

    let chunk_size = config.chunk_size as f32;
    let walk_length = (2 * config.render_radius + 1) as f32 * chunk_size;
    let mut streamer = WorldStreamer::new(config, store, Box::new(render_sink.clone()))?;

    let mut observer = Point3::new(0.5, chunk_size - 0.5, 0.5);
    while observer.x < walk_length {
        streamer.update_observer(observer);
        streamer.process_tasks();
        observer.x += 1.0;
    }
    streamer.wait_until_idle();

    let marker = Point3::new(observer.x, 0.0, observer.z);
    streamer.set_block_world(marker, BlockType::GRASS.code())?;

    let stats = streamer.stats();
    info!(
        "Walk finished in {:?}: {} active, {} failed, {} meshes published",
        start.elapsed(),
        stats.world.active,
        stats.world.failed,
        render_sink.len()
    );

    streamer.save_all()?;
    Ok(())
}
