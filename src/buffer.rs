//! Per-frame shared memory buffers
//!
//! Each frame gets a fresh segment: allocate, map, describe it to the
//! compositor as a `wl_buffer`, fill it with the current grayscale level,
//! then unmap. The compositor keeps the segment alive through the
//! descriptor it received and tells us when to destroy the buffer.

use crate::session::SurfaceBackend;
use crate::shm::ShmAllocator;
use anyhow::{Context, Result};
use log::{debug, trace};
use memmap2::MmapOptions;

/// XRGB8888: 4 bytes per pixel, high byte unused
pub const BYTES_PER_PIXEL: u32 = 4;

/// Slots reserved in every pool. Only slot 0 is ever drawn into.
pub const SLOT_COUNT: u32 = 2;

/// Geometry of the pixel buffers for one window size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferLayout {
    pub width: u32,
    pub height: u32,
}

/// Region of a pool handed to `wl_shm_pool.create_buffer`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferSlot {
    pub offset: i32,
    pub width: i32,
    pub height: i32,
    pub stride: i32,
}

impl BufferLayout {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn stride(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL as usize
    }

    /// Bytes covered by one frame
    pub fn frame_size(&self) -> usize {
        self.stride() * self.height as usize
    }

    /// Bytes reserved for the whole pool
    pub fn pool_size(&self) -> usize {
        self.frame_size() * SLOT_COUNT as usize
    }

    pub fn slot_offset(&self, index: u32) -> usize {
        self.frame_size() * index as usize
    }

    /// Protocol-sized description of slot `index`
    pub fn slot(&self, index: u32) -> Result<BufferSlot> {
        Ok(BufferSlot {
            offset: i32::try_from(self.slot_offset(index)).context("buffer offset exceeds i32")?,
            width: i32::try_from(self.width).context("buffer width exceeds i32")?,
            height: i32::try_from(self.height).context("buffer height exceeds i32")?,
            stride: i32::try_from(self.stride()).context("buffer stride exceeds i32")?,
        })
    }
}

impl Default for BufferLayout {
    fn default() -> Self {
        Self::new(640, 480)
    }
}

/// Write `level` into every byte of a frame
pub fn fill_grayscale(pixels: &mut [u8], level: u8) {
    pixels.fill(level);
}

/// Builds one fully drawn buffer per call
#[derive(Debug, Clone)]
pub struct BufferBuilder {
    allocator: ShmAllocator,
    layout: BufferLayout,
}

impl BufferBuilder {
    pub fn new(allocator: ShmAllocator, layout: BufferLayout) -> Self {
        Self { allocator, layout }
    }

    /// Allocate, describe and fill a buffer showing `level`.
    ///
    /// Nothing touches the memory after this returns.
    pub fn build<B: SurfaceBackend>(&self, backend: &mut B, level: u8) -> Result<B::Buffer> {
        let pool_size = self.layout.pool_size();
        let index = 0;
        let slot = self.layout.slot(index)?;
        let pool_len = i32::try_from(pool_size).context("pool size exceeds i32")?;

        trace!("Allocating {} byte pool", pool_size);
        let shm = self
            .allocator
            .allocate(pool_size)
            .context("Failed to allocate shared memory for buffer")?;

        let file = shm.try_clone_file().context("Failed to duplicate shm descriptor")?;
        // SAFETY: the segment is unlinked and only this process writes to it,
        // and only until the mapping is dropped below.
        let mut map = unsafe { MmapOptions::new().len(pool_size).map_mut(&file) }
            .context("Failed to map shared memory")?;

        let buffer = backend
            .create_buffer(&shm, pool_len, &slot)
            .context("Failed to create wl_buffer")?;

        let start = self.layout.slot_offset(index);
        let end = start + self.layout.frame_size();
        debug!("Drawing grayscale {} into {}", level, shm.name());
        fill_grayscale(&mut map[start..end], level);

        drop(map);
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_matches_window() {
        let layout = BufferLayout::default();
        assert_eq!(layout.stride(), 640 * 4);
        assert_eq!(layout.frame_size(), 640 * 480 * 4);
        assert_eq!(layout.pool_size(), 640 * 480 * 4 * 2);
    }

    #[test]
    fn test_slot_offsets() {
        let layout = BufferLayout::new(10, 5);
        assert_eq!(layout.slot_offset(0), 0);
        assert_eq!(layout.slot_offset(1), 200);

        let slot = layout.slot(0).unwrap();
        assert_eq!(
            slot,
            BufferSlot {
                offset: 0,
                width: 10,
                height: 5,
                stride: 40
            }
        );
    }

    #[test]
    fn test_oversized_slot_is_an_error() {
        let layout = BufferLayout::new(u32::MAX, 1);
        assert!(layout.slot(0).is_err());
    }

    #[test]
    fn test_fill_writes_every_byte() {
        let mut pixels = vec![0u8; 64];
        fill_grayscale(&mut pixels, 0x80);
        assert!(pixels.iter().all(|&b| b == 0x80));
    }
}
