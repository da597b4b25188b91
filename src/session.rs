//! Session state shared by every event handler
//!
//! `SurfaceBackend` is the seam between the client logic and the protocol
//! objects. The Wayland implementation lives in [`crate::wayland`]; tests
//! drive the same `Session` through a recording backend.

use crate::buffer::{BufferBuilder, BufferSlot};
use crate::config::PlaygroundConfig;
use crate::frame::{FramePhase, FrameScheduler, FrameStats};
use crate::input::{ButtonState, InputHandler, PointerAction};
use crate::shm::{SharedMemory, ShmAllocator};
use anyhow::Result;
use log::info;

/// Requests the client issues against the compositor
pub trait SurfaceBackend {
    /// Handle for a described `wl_buffer`
    type Buffer;

    /// Acknowledge an `xdg_surface.configure`
    fn ack_configure(&mut self, serial: u32);

    /// Register `shm` as a pool, carve out `slot`, and drop the pool
    fn create_buffer(
        &mut self,
        shm: &SharedMemory,
        pool_size: i32,
        slot: &BufferSlot,
    ) -> Result<Self::Buffer>;

    fn attach(&mut self, buffer: &Self::Buffer);

    /// Damage the full surface extent
    fn damage_all(&mut self);

    fn commit(&mut self);

    /// Ask for a one-shot `wl_surface.frame` callback
    fn request_frame(&mut self);

    /// Start an interactive move of the toplevel
    fn start_move(&mut self, serial: u32);

    fn destroy_toplevel(&mut self);
    fn destroy_xdg_surface(&mut self);
    fn destroy_wm_base(&mut self);
    fn destroy_surface(&mut self);
}

/// Everything the client knows for the lifetime of one connection
#[derive(Debug)]
pub struct Session<B: SurfaceBackend> {
    backend: B,
    frames: FrameScheduler,
    input: InputHandler,
    closed: bool,
}

impl<B: SurfaceBackend> Session<B> {
    pub fn new(backend: B, frames: FrameScheduler) -> Self {
        Self {
            backend,
            frames,
            input: InputHandler::default(),
            closed: false,
        }
    }

    /// Session wired up from configuration
    pub fn from_config(backend: B, config: &PlaygroundConfig) -> Self {
        let builder = BufferBuilder::new(
            ShmAllocator::new(config.shm.name_prefix.clone()),
            config.window.layout(),
        );
        Self::new(backend, FrameScheduler::new(builder, config.animation.initial_shade()))
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn phase(&self) -> FramePhase {
        self.frames.phase()
    }

    pub fn stats(&self) -> &FrameStats {
        self.frames.stats()
    }

    pub fn level(&self) -> u8 {
        self.frames.shade().level()
    }

    pub fn on_configure(&mut self, serial: u32) {
        if self.closed {
            return;
        }
        self.frames.on_configure(&mut self.backend, serial);
    }

    pub fn on_frame_done(&mut self, time: u32) {
        self.frames.on_frame_done(&mut self.backend, time);
    }

    pub fn on_pointer_button(
        &mut self,
        serial: u32,
        button: u32,
        state: ButtonState,
    ) -> PointerAction {
        if self.closed {
            return PointerAction::Ignore;
        }
        let action = self.input.on_button(serial, button, state);
        match action {
            PointerAction::Move { serial } => self.backend.start_move(serial),
            PointerAction::Close => self.close(),
            PointerAction::Ignore => {}
        }
        action
    }

    /// Tear the window down, children before parents. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        info!("👋 Closing window");
        self.backend.destroy_toplevel();
        self.backend.destroy_xdg_surface();
        self.backend.destroy_wm_base();
        self.backend.destroy_surface();
        self.frames.close();
        self.closed = true;
    }
}
