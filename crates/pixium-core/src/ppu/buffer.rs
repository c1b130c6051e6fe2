//! Double-buffered output of the picture unit.
//!
//! The unit writes the **back** plane while a frame is being produced; the
//! host reads the **front** plane, which holds the last completed frame.
//! Each plane carries two byte arrays of `SCREEN_WIDTH * SCREEN_HEIGHT`:
//!
//! - the pixel plane: a 6-bit color index tagged with the emphasis class in
//!   the top two bits (see [`compositor`](super::compositor)),
//! - the emphasis plane: the raw three emphasis bits of each pixel.
//!
//! Converting indices to RGB is the host palette's job.

use crate::memory::ppu::{SCREEN_HEIGHT, SCREEN_WIDTH};

const PLANE_LEN: usize = SCREEN_WIDTH * SCREEN_HEIGHT;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Plane {
    pixels: Box<[u8]>,
    emphasis: Box<[u8]>,
}

impl Plane {
    fn new() -> Self {
        Self {
            pixels: vec![0; PLANE_LEN].into_boxed_slice(),
            emphasis: vec![0; PLANE_LEN].into_boxed_slice(),
        }
    }

    fn fill(&mut self, pixel: u8, emphasis: u8) {
        self.pixels.fill(pixel);
        self.emphasis.fill(emphasis);
    }
}

/// A double-buffered framebuffer of tagged palette indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    /// Index of the **back/write** plane.
    active_index: usize,
    planes: [Plane; 2],
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            active_index: 0,
            planes: [Plane::new(), Plane::new()],
        }
    }

    /// Tagged color indices of the last completed frame, row-major.
    pub fn render(&self) -> &[u8] {
        &self.planes[1 - self.active_index].pixels
    }

    /// Emphasis bits of the last completed frame, row-major.
    pub fn emphasis(&self) -> &[u8] {
        &self.planes[1 - self.active_index].emphasis
    }

    /// One row of the last completed frame.
    pub fn row(&self, y: usize) -> &[u8] {
        &self.render()[y * SCREEN_WIDTH..(y + 1) * SCREEN_WIDTH]
    }

    /// Writes one pixel of the back plane.
    #[inline]
    pub(crate) fn write_pixel(&mut self, x: usize, y: usize, pixel: u8, emphasis: u8) {
        let index = y * SCREEN_WIDTH + x;
        let plane = &mut self.planes[self.active_index];
        plane.pixels[index] = pixel;
        plane.emphasis[index] = emphasis;
    }

    /// Fills the back plane with a single value.
    pub(crate) fn fill(&mut self, pixel: u8, emphasis: u8) {
        self.planes[self.active_index].fill(pixel, emphasis);
    }

    /// Presents the back plane as the new front plane.
    pub(crate) fn swap(&mut self) {
        self.active_index = 1 - self.active_index;
        self.planes[self.active_index].fill(0, 0);
    }

    /// Clears both planes to zero.
    pub(crate) fn clear(&mut self) {
        for plane in &mut self.planes {
            plane.fill(0, 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_become_visible_after_swap() {
        let mut fb = FrameBuffer::new();
        for (i, pixel) in (1..=8).enumerate() {
            fb.write_pixel(8 + i, 2, pixel, 0b101);
        }
        assert!(fb.render().iter().all(|&p| p == 0));
        fb.swap();
        assert_eq!(&fb.row(2)[8..16], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(fb.emphasis()[2 * SCREEN_WIDTH + 15], 0b101);
        assert_eq!(fb.emphasis()[2 * SCREEN_WIDTH + 16], 0);
    }

    #[test]
    fn fill_covers_the_back_plane_only() {
        let mut fb = FrameBuffer::new();
        fb.fill(0x8F, 0);
        fb.swap();
        assert!(fb.render().iter().all(|&p| p == 0x8F));
        fb.fill(0x80, 0);
        assert!(fb.render().iter().all(|&p| p == 0x8F));
    }
}
