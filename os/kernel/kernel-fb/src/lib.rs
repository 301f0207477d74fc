//! # Kernel Framebuffer drawing
//!
//! Straightforward rasterization against a linear 32-bit framebuffer: pixel
//! writes, Bresenham lines, rectangle outlines and solid fills. There is no
//! shared state and no concurrency; the pixel store is a caller-provided
//! mutable slice (the memory-mapped framebuffer on hardware, an ordinary
//! buffer in tests).
//!
//! Out-of-bounds coordinates are clipped at the pixel level, so callers can
//! draw shapes that partially leave the screen without pre-clipping.
//! Colors are masked to 24-bit RGB (`0x00RR_GGBB`).

#![cfg_attr(not(any(test, doctest)), no_std)]

use kernel_info::boot::FramebufferInfo;

/// Mask applied to every color before it is written.
const COLOR_MASK: u32 = 0x00FF_FFFF;

/// A linear 32-bit-per-pixel framebuffer.
///
/// `stride` is the number of pixel cells per scanline and may exceed
/// `width` due to padding.
pub struct Framebuffer<'a> {
    pixels: &'a mut [u32],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a> Framebuffer<'a> {
    /// Wrap a pixel store of `stride * height` cells.
    ///
    /// # Panics
    /// Panics if `stride < width` or if `pixels` is too small for the
    /// declared geometry.
    #[must_use]
    pub fn new(pixels: &'a mut [u32], width: usize, height: usize, stride: usize) -> Self {
        assert!(stride >= width, "stride must cover the visible width");
        assert!(
            pixels.len() >= stride * height,
            "pixel store too small: {} cells provided, {} required",
            pixels.len(),
            stride * height,
        );
        Self {
            pixels,
            width,
            height,
            stride,
        }
    }

    /// Wrap the linear framebuffer described by the bootloader handoff.
    ///
    /// Returns `None` for depths other than 32 bpp, which this driver cannot
    /// draw to.
    ///
    /// # Safety
    /// - `info` must describe a valid, CPU-addressable linear framebuffer
    ///   that stays mapped for the `'static` lifetime.
    /// - The framebuffer memory must not be written through any other path
    ///   while this wrapper is alive.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub unsafe fn from_boot_info(info: &FramebufferInfo) -> Option<Framebuffer<'static>> {
        if info.framebuffer_bpp != 32 {
            return None;
        }
        let ptr = info.framebuffer_ptr as usize as *mut u32;
        let len = info.pixel_count() as usize;
        // SAFETY: per this function's contract the range is valid, exclusive
        // and lives forever.
        let pixels = unsafe { core::slice::from_raw_parts_mut(ptr, len) };
        Some(Framebuffer::new(
            pixels,
            info.framebuffer_width as usize,
            info.framebuffer_height as usize,
            info.framebuffer_stride as usize,
        ))
    }

    /// Visible width in pixels.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Visible height in pixels.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Write one pixel. Coordinates outside the visible area are ignored.
    #[allow(clippy::cast_sign_loss)]
    pub fn pixel(&mut self, x: i32, y: i32, color: u32) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return;
        }
        self.pixels[x + y * self.stride] = color & COLOR_MASK;
    }

    /// Read one pixel; `None` outside the visible area.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn get(&self, x: i32, y: i32) -> Option<u32> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[x + y * self.stride])
    }

    /// Fill the whole visible area with one color.
    pub fn fill(&mut self, color: u32) {
        let color = color & COLOR_MASK;
        for row in self.pixels.chunks_mut(self.stride).take(self.height) {
            row[..self.width].fill(color);
        }
    }

    /// Fill the rectangle with corner `(x, y)` and size `w x h`, clipped to
    /// the visible area.
    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32) {
        for yy in y..y.saturating_add(h) {
            for xx in x..x.saturating_add(w) {
                self.pixel(xx, yy, color);
            }
        }
    }

    /// Draw the line segment from `(x0, y0)` to `(x1, y1)`, endpoints
    /// inclusive.
    ///
    /// Integer Bresenham over all octants in a single iterative loop. A
    /// right-to-left segment is normalized by swapping its endpoints first,
    /// so the loop always walks in ascending x; the y direction is handled
    /// by a signed step.
    pub fn line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
        let (x0, y0, x1, y1) = if x0 > x1 {
            (x1, y1, x0, y0)
        } else {
            (x0, y0, x1, y1)
        };

        let dx = x1 - x0;
        let dy = -(y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };

        let mut x = x0;
        let mut y = y0;
        let mut err = dx + dy;
        loop {
            self.pixel(x, y, color);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += 1;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Draw the outline of the rectangle with corner `(x, y)` and size
    /// `w x h` as four line segments.
    pub fn rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32) {
        self.line(x, y, x + w, y, color);
        self.line(x, y + h, x + w, y + h, color);
        self.line(x, y, x, y + h, color);
        self.line(x + w, y, x + w, y + h, color);
    }
}
