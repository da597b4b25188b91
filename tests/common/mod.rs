// Shared helpers for session integration tests
//
// `RecordingBackend` stands in for the compositor: it logs every request in
// order and keeps a duplicate of each shm descriptor so tests can inspect
// the pixels that were drawn.

#![allow(dead_code)]

use std::fs::File;
use std::os::unix::fs::FileExt;

use wl_playground::{
    BufferBuilder, BufferLayout, BufferSlot, FrameScheduler, Grayscale, Session, SharedMemory,
    ShmAllocator, SurfaceBackend,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    AckConfigure(u32),
    CreateBuffer { pool_size: i32, slot: BufferSlot },
    Attach(usize),
    DamageAll,
    Commit,
    RequestFrame,
    StartMove(u32),
    DestroyToplevel,
    DestroyXdgSurface,
    DestroyWmBase,
    DestroySurface,
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub calls: Vec<Call>,
    pub segments: Vec<File>,
}

impl RecordingBackend {
    pub fn count(&self, call: &Call) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    pub fn buffers_created(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::CreateBuffer { .. }))
            .count()
    }

    pub fn position(&self, call: &Call) -> Option<usize> {
        self.calls.iter().position(|c| c == call)
    }

    /// Bytes of slot 0 of buffer `index`
    pub fn pixels(&self, index: usize, layout: BufferLayout) -> Vec<u8> {
        let mut bytes = vec![0u8; layout.frame_size()];
        self.segments[index]
            .read_exact_at(&mut bytes, layout.slot_offset(0) as u64)
            .unwrap();
        bytes
    }
}

impl SurfaceBackend for RecordingBackend {
    type Buffer = usize;

    fn ack_configure(&mut self, serial: u32) {
        self.calls.push(Call::AckConfigure(serial));
    }

    fn create_buffer(
        &mut self,
        shm: &SharedMemory,
        pool_size: i32,
        slot: &BufferSlot,
    ) -> anyhow::Result<usize> {
        self.segments.push(shm.try_clone_file()?);
        self.calls.push(Call::CreateBuffer {
            pool_size,
            slot: *slot,
        });
        Ok(self.segments.len() - 1)
    }

    fn attach(&mut self, buffer: &usize) {
        self.calls.push(Call::Attach(*buffer));
    }

    fn damage_all(&mut self) {
        self.calls.push(Call::DamageAll);
    }

    fn commit(&mut self) {
        self.calls.push(Call::Commit);
    }

    fn request_frame(&mut self) {
        self.calls.push(Call::RequestFrame);
    }

    fn start_move(&mut self, serial: u32) {
        self.calls.push(Call::StartMove(serial));
    }

    fn destroy_toplevel(&mut self) {
        self.calls.push(Call::DestroyToplevel);
    }

    fn destroy_xdg_surface(&mut self) {
        self.calls.push(Call::DestroyXdgSurface);
    }

    fn destroy_wm_base(&mut self) {
        self.calls.push(Call::DestroyWmBase);
    }

    fn destroy_surface(&mut self) {
        self.calls.push(Call::DestroySurface);
    }
}

/// Small layout so long animation runs stay cheap
pub fn small_layout() -> BufferLayout {
    BufferLayout::new(8, 4)
}

pub fn session_with(allocator: ShmAllocator, layout: BufferLayout) -> Session<RecordingBackend> {
    let builder = BufferBuilder::new(allocator, layout);
    Session::new(
        RecordingBackend::default(),
        FrameScheduler::new(builder, Grayscale::default()),
    )
}

pub fn small_session() -> Session<RecordingBackend> {
    session_with(ShmAllocator::new("/wl_playground_it"), small_layout())
}

/// Session that has already been configured once
pub fn configured_session() -> Session<RecordingBackend> {
    let mut session = small_session();
    session.on_configure(1);
    session.backend_mut().calls.clear();
    session
}
