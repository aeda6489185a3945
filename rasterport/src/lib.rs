//! rasterport - X-Plane 12 raster layers for Ortho4XP and AutoOrtho tiles
//!
//! Ortho4XP and AutoOrtho generate DSF tiles without the raster layers
//! X-Plane 12 uses for seasons, soundscape and elevation. This library
//! copies those layers over from the matching X-Plane 12 global scenery
//! tile, using `DSFTool` to move between binary and text form and `7z` to
//! repack the result.
//!
//! # Components
//!
//! - [`discovery`] finds tiles in `Custom Scenery` and fills the queue
//! - [`pool`] runs a fixed number of workers over the queue
//! - [`tile`] holds the per-tile state and conversion protocol
//! - [`tool`] runs the external tools
//! - [`config`] and [`coord`] describe what a run converts

pub mod config;
pub mod coord;
pub mod discovery;
pub mod logging;
pub mod pool;
pub mod tile;
pub mod tool;
