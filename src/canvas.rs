//! RGB render target
//!
//! [`Canvas`] owns the pixel buffer of a single render call. It implements the
//! `embedded-graphics` [`DrawTarget`] trait so every primitive in the crate can
//! draw onto it, and exposes the underlying [`RgbImage`] for TrueType text and
//! PNG encoding.

use crate::error::RenderError;
use embedded_graphics::{
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{PointsIter, Rectangle},
};
use image::{codecs::png::PngEncoder, ColorType, ImageEncoder, Rgb, RgbImage};
use std::convert::Infallible;

/// Pixel buffer for one rendered image.
pub struct Canvas {
    image: RgbImage,
}

impl Canvas {
    /// Allocate a canvas filled with `background`.
    ///
    /// Allocation is fallible: a zero-sized or oversized request yields
    /// [`RenderError::Canvas`] instead of aborting the process.
    pub fn new(size: Size, background: Rgb888) -> Result<Self, RenderError> {
        let pixels = (size.width as usize)
            .checked_mul(size.height as usize)
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                RenderError::Canvas(format!("invalid size {}x{}", size.width, size.height))
            })?;
        let bytes = pixels
            .checked_mul(3)
            .ok_or_else(|| RenderError::Canvas("pixel count overflow".to_string()))?;

        let mut data = Vec::new();
        data.try_reserve_exact(bytes)
            .map_err(|e| RenderError::Canvas(e.to_string()))?;
        let rgb = [background.r(), background.g(), background.b()];
        for _ in 0..pixels {
            data.extend_from_slice(&rgb);
        }

        let image = RgbImage::from_raw(size.width, size.height, data)
            .ok_or_else(|| RenderError::Canvas("buffer does not match size".to_string()))?;
        Ok(Self { image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Color at `(x, y)`, or `None` outside the canvas.
    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgb888> {
        if x < 0 || y < 0 || x as u32 >= self.width() || y as u32 >= self.height() {
            return None;
        }
        let Rgb([r, g, b]) = *self.image.get_pixel(x as u32, y as u32);
        Some(Rgb888::new(r, g, b))
    }

    /// Set a pixel; coordinates outside the canvas are ignored.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgb888) {
        if x < 0 || y < 0 || x as u32 >= self.width() || y as u32 >= self.height() {
            return;
        }
        self.image
            .put_pixel(x as u32, y as u32, Rgb([color.r(), color.g(), color.b()]));
    }

    /// Number of pixels that have exactly `color`.
    pub fn count_color(&self, color: Rgb888) -> usize {
        let target = Rgb([color.r(), color.g(), color.b()]);
        self.image.pixels().filter(|p| **p == target).count()
    }

    pub fn image_mut(&mut self) -> &mut RgbImage {
        &mut self.image
    }

    /// Encode the canvas as an 8-bit RGB PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, RenderError> {
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes).write_image(
            self.image.as_raw(),
            self.width(),
            self.height(),
            ColorType::Rgb8,
        )?;
        Ok(bytes)
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }
}

impl DrawTarget for Canvas {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set_pixel(point.x, point.y, color);
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        let rgb = Rgb([color.r(), color.g(), color.b()]);
        for point in area.points() {
            self.image.put_pixel(point.x as u32, point.y as u32, rgb);
        }
        Ok(())
    }
}
