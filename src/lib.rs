//! # WL Playground
//!
//! A minimal Wayland client: one xdg toplevel whose background fades
//! between black and white, one grayscale step per frame callback.
//!
//! ## Architecture
//!
//! - `shm`: anonymous POSIX shared memory segments
//! - `buffer`: per-frame `wl_buffer` construction and pixel fill
//! - `animation`: the bouncing grayscale level
//! - `frame`: configure / frame-callback state machine
//! - `input`: pointer button policy (drag to move, right click to close)
//! - `session`: the `SurfaceBackend` seam and the state every handler shares
//! - `wayland`: registry binding, `Dispatch` impls and the dispatch loop
//! - `config`: configuration parsing and management
//!
//! ## Usage
//!
//! ```rust,no_run
//! use wl_playground::{wayland, PlaygroundConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = PlaygroundConfig::default();
//!     wayland::run(&config)?;
//!     Ok(())
//! }
//! ```

pub mod animation;
pub mod buffer;
pub mod config;
pub mod frame;
pub mod input;
pub mod session;
pub mod shm;
pub mod wayland;

// Re-export main types for easy access
pub use animation::{Direction, Grayscale};
pub use buffer::{BufferBuilder, BufferLayout, BufferSlot};
pub use config::PlaygroundConfig;
pub use frame::{FramePhase, FrameScheduler, FrameStats};
pub use input::{ButtonState, PointerAction};
pub use session::{Session, SurfaceBackend};
pub use shm::{SharedMemory, ShmAllocator, ShmError};

// Re-export common error types
pub use anyhow::{Context, Error, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
