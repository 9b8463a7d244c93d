// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The output image the active workload renders into.
//!
//! Pixels are BGRA, one byte per channel, rows packed top to bottom with no
//! padding. A fresh buffer is opaque black. Each viewport change replaces the
//! buffer wholesale; observers holding the previous `Arc<PixelBuffer>` keep a
//! valid (stale) image.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::errors::EngineError;

pub const BYTES_PER_PIXEL: usize = 4;

/// A fixed-size BGRA pixel buffer shared between the worker and observers.
///
/// The worker writes into it during a render; anyone may read a consistent
/// copy at any time.
#[derive(Debug)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Mutex<Box<[u8]>>,
}

impl PixelBuffer {
    /// Allocate a `width × height` buffer filled with opaque black.
    pub fn opaque_black(width: u32, height: u32) -> Result<Self, EngineError> {
        let invalid = || EngineError::InvalidViewport { width, height };
        if width == 0 || height == 0 {
            return Err(invalid());
        }

        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(BYTES_PER_PIXEL))
            .ok_or_else(invalid)?;

        let mut pixels = Vec::new();
        pixels.try_reserve_exact(len).map_err(|_| invalid())?;
        pixels.resize(len, 0u8);
        let mut pixels = pixels.into_boxed_slice();
        for pixel in pixels.chunks_exact_mut(BYTES_PER_PIXEL) {
            pixel[3] = 0xFF;
        }

        Ok(Self {
            width,
            height,
            pixels: Mutex::new(pixels),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize * BYTES_PER_PIXEL
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A copy of the current contents.
    pub fn snapshot(&self) -> Vec<u8> {
        self.lock().to_vec()
    }

    /// Read the pixels in place without copying.
    pub fn with_pixels<R>(&self, read: impl FnOnce(&[u8]) -> R) -> R {
        read(&self.lock())
    }

    /// BGRA bytes of the pixel at `(x, y)`, if it is inside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let pixels = self.lock();
        let mut bgra = [0u8; 4];
        bgra.copy_from_slice(&pixels[offset..offset + BYTES_PER_PIXEL]);
        Some(bgra)
    }

    pub(crate) fn write<R>(&self, render: impl FnOnce(&mut [u8]) -> R) -> R {
        render(&mut self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Box<[u8]>> {
        // A panicking render may poison the lock; the bytes are still valid pixels.
        self.pixels.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Current output dimensions and the buffer backing them.
#[derive(Debug, Clone)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub buffer: Arc<PixelBuffer>,
}

/// Owns the current viewport. Lives on the engine worker.
#[derive(Debug, Default)]
pub struct ImageSurface {
    current: Option<Viewport>,
}

impl ImageSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the viewport with a fresh opaque-black buffer.
    ///
    /// On error the previous viewport stays in place.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<Viewport, EngineError> {
        let buffer = Arc::new(PixelBuffer::opaque_black(width, height)?);
        let viewport = Viewport {
            width,
            height,
            buffer,
        };
        self.current = Some(viewport.clone());
        Ok(viewport)
    }

    pub fn current(&self) -> Option<&Viewport> {
        self.current.as_ref()
    }

    pub fn release(&mut self) {
        self.current = None;
    }
}
