//! FusedFrame and its shared double buffer

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::{FrameError, Result};

/// One fused output frame: color and depth visualization, both RGBA8
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FusedFrame {
    pub width: u32,
    pub height: u32,
    pub color_rgba: Vec<u8>,
    pub depth_vis_rgba: Vec<u8>,
    pub timestamp: f64,
}

impl FusedFrame {
    /// Bytes in each RGBA buffer
    #[inline]
    pub fn rgba_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// Metadata returned by [`FrameBuffer::copy_out`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    pub width: u32,
    pub height: u32,
    pub timestamp: f64,
    pub generation: u64,
}

/// Consumer-facing frame buffer
///
/// The fusion side builds a frame in its own scratch buffers and copies it in
/// under the lock; consumers copy it out the same way. The lock never covers
/// reprojection or conversion work.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    frame: Mutex<FusedFrame>,
    ready: AtomicBool,
    generation: AtomicU64,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy a finished frame in; reuses the shared buffers' capacity
    pub(crate) fn publish(
        &self,
        width: u32,
        height: u32,
        timestamp: f64,
        color_rgba: &[u8],
        depth_vis_rgba: &[u8],
    ) -> u64 {
        let mut frame = self.frame.lock();
        frame.width = width;
        frame.height = height;
        frame.timestamp = timestamp;
        frame.color_rgba.clear();
        frame.color_rgba.extend_from_slice(color_rgba);
        frame.depth_vis_rgba.clear();
        frame.depth_vis_rgba.extend_from_slice(depth_vis_rgba);
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.ready.store(true, Ordering::Release);
        generation
    }

    /// At least one frame has been produced
    #[inline]
    pub fn is_buffer_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// `(width, height)` of the current frame, `(0, 0)` before the first one
    pub fn image_size(&self) -> (u32, u32) {
        let frame = self.frame.lock();
        (frame.width, frame.height)
    }

    /// Number of frames published so far
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Copy both RGBA buffers into caller storage
    ///
    /// Each destination must hold at least `4 * width * height` bytes; only
    /// that prefix is written.
    pub fn copy_out(&self, color_dst: &mut [u8], depth_dst: &mut [u8]) -> Result<FrameInfo> {
        if !self.is_buffer_ready() {
            return Err(FrameError::NotReady);
        }
        let frame = self.frame.lock();
        let len = frame.rgba_len();
        check_len("color", len, color_dst.len())?;
        check_len("depth", len, depth_dst.len())?;

        color_dst[..len].copy_from_slice(&frame.color_rgba);
        depth_dst[..len].copy_from_slice(&frame.depth_vis_rgba);
        Ok(FrameInfo {
            width: frame.width,
            height: frame.height,
            timestamp: frame.timestamp,
            generation: self.generation(),
        })
    }

    /// Owned copy of the current frame
    pub fn snapshot(&self) -> Option<FusedFrame> {
        self.is_buffer_ready().then(|| self.frame.lock().clone())
    }
}

fn check_len(buffer: &'static str, needed: usize, available: usize) -> Result<()> {
    if available < needed {
        return Err(FrameError::BufferTooSmall {
            buffer,
            needed,
            available,
        });
    }
    Ok(())
}
