//! Frame callback driven animation
//!
//! The first `xdg_surface.configure` maps the window with an initial
//! buffer. From then on every `wl_surface.frame` callback re-arms itself
//! before drawing the next grayscale step, so the loop keeps running until
//! the session closes.

use crate::animation::Grayscale;
use crate::buffer::BufferBuilder;
use crate::session::SurfaceBackend;
use log::{debug, info, trace, warn};

/// Where the scheduler is in the configure/frame cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    /// Surface created, no configure acknowledged yet
    AwaitingConfigure,
    /// A frame callback is outstanding
    Armed,
    /// Inside a frame callback, before the next one is requested
    Fired,
    /// Window torn down; callbacks are ignored
    Closed,
}

/// Counters for the animation loop
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Buffers built and committed
    pub frames_drawn: u64,
    /// Frames dropped because a buffer could not be built
    pub frames_skipped: u64,
    /// Frame callbacks received
    pub callbacks: u64,
    /// Timestamp (ms) of the last handled frame callback
    pub last_frame: Option<u32>,
}

#[derive(Debug)]
pub struct FrameScheduler {
    builder: BufferBuilder,
    shade: Grayscale,
    phase: FramePhase,
    stats: FrameStats,
}

impl FrameScheduler {
    pub fn new(builder: BufferBuilder, shade: Grayscale) -> Self {
        Self {
            builder,
            shade,
            phase: FramePhase::AwaitingConfigure,
            stats: FrameStats::default(),
        }
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    pub fn shade(&self) -> Grayscale {
        self.shade
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn on_configure<B: SurfaceBackend>(&mut self, backend: &mut B, serial: u32) {
        if self.phase == FramePhase::Closed {
            return;
        }
        debug!("Configure serial {}", serial);
        backend.ack_configure(serial);

        if self.phase == FramePhase::AwaitingConfigure {
            info!("🪟 First configure, mapping surface");
            self.phase = FramePhase::Armed;
        }
        self.present(backend);
    }

    pub fn on_frame_done<B: SurfaceBackend>(&mut self, backend: &mut B, time: u32) {
        self.stats.callbacks += 1;
        match self.phase {
            FramePhase::Closed => {
                trace!("Frame callback after close, dropping");
                return;
            }
            FramePhase::AwaitingConfigure => {
                // Attaching before the first ack is a protocol error
                backend.request_frame();
                return;
            }
            FramePhase::Armed | FramePhase::Fired => {}
        }

        trace!("Frame callback at {}ms", time);
        self.phase = FramePhase::Fired;
        backend.request_frame();
        self.phase = FramePhase::Armed;

        if self.stats.last_frame.is_some() {
            self.shade.step();
        }

        self.present(backend);
        self.stats.last_frame = Some(time);
    }

    /// Draw the current level and commit it. On failure nothing is attached,
    /// but the surface is still committed so the re-armed callback applies.
    fn present<B: SurfaceBackend>(&mut self, backend: &mut B) {
        match self.builder.build(backend, self.shade.level()) {
            Ok(buffer) => {
                backend.attach(&buffer);
                backend.damage_all();
                backend.commit();
                self.stats.frames_drawn += 1;
            }
            Err(e) => {
                warn!("Skipping frame: {:#}", e);
                // A pending frame request only takes effect on commit
                backend.commit();
                self.stats.frames_skipped += 1;
            }
        }
    }

    pub fn close(&mut self) {
        self.phase = FramePhase::Closed;
    }
}
