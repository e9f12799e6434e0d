//! # Voxel World Entry Point
//!
//! Runs the library's headless world walk.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info VOXEL_WORLD_CONFIG=world.json cargo run --release
//! ```

fn main() {
    voxel_world::run();
}
