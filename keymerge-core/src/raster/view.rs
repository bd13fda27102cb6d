use std::ops::Deref;

use image::{DynamicImage, GenericImageView, ImageBuffer, Pixel, Rgba};

use crate::foundation::color::Rgba16;

/// Owned buffer of working pixels.
pub type WorkingBuffer<P> = ImageBuffer<P, Vec<<P as Pixel>::Subpixel>>;

/// Working buffer type: straight RGBA, 16 bits per channel.
pub type Rgba16Buffer = WorkingBuffer<Rgba<u16>>;

/// Read-only pixel grid that answers the 16-bit normalized RGBA query.
///
/// Callers only ask for coordinates inside [`Raster::dimensions`].
pub trait Raster {
    /// `(width, height)` in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Pixel at `(x, y)` as straight RGBA on the `0..=0xffff` scale.
    fn rgba16(&self, x: u32, y: u32) -> Rgba16;
}

/// Subpixel types that can be widened onto the 16-bit scale.
pub trait Channel16: Copy {
    /// Map the channel value onto `0..=0xffff`.
    fn to_u16(self) -> u16;
}

impl Channel16 for u8 {
    fn to_u16(self) -> u16 {
        u16::from(self) * 257
    }
}

impl Channel16 for u16 {
    fn to_u16(self) -> u16 {
        self
    }
}

impl Channel16 for f32 {
    fn to_u16(self) -> u16 {
        // NaN clamps to NaN and casts to 0.
        (self.clamp(0.0, 1.0) * 65535.0).round() as u16
    }
}

/// Pixel type a merge can accumulate into.
///
/// Values always pass through the 16-bit scale, so matching does not depend on
/// the buffer's depth.
pub trait WorkingPixel: Pixel {
    /// Store a 16-bit value. Must be exact for values this buffer can represent.
    fn from_rgba16(px: Rgba16) -> Self;

    /// Read the stored value on the 16-bit scale.
    fn to_rgba16(&self) -> Rgba16;
}

impl WorkingPixel for Rgba<u8> {
    fn from_rgba16(px: Rgba16) -> Self {
        // Exact for 8-bit sources, whose values are multiples of 257.
        Rgba(px.0.map(|c| (c / 257) as u8))
    }

    fn to_rgba16(&self) -> Rgba16 {
        Rgba(self.0.map(Channel16::to_u16))
    }
}

impl WorkingPixel for Rgba<u16> {
    fn from_rgba16(px: Rgba16) -> Self {
        px
    }

    fn to_rgba16(&self) -> Rgba16 {
        *self
    }
}

impl<P, C> Raster for ImageBuffer<P, C>
where
    P: Pixel,
    P::Subpixel: Channel16,
    C: Deref<Target = [P::Subpixel]>,
{
    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    fn rgba16(&self, x: u32, y: u32) -> Rgba16 {
        Rgba(self.get_pixel(x, y).to_rgba().0.map(Channel16::to_u16))
    }
}

impl Raster for DynamicImage {
    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    fn rgba16(&self, x: u32, y: u32) -> Rgba16 {
        match self {
            DynamicImage::ImageLuma8(b) => b.rgba16(x, y),
            DynamicImage::ImageLumaA8(b) => b.rgba16(x, y),
            DynamicImage::ImageRgb8(b) => b.rgba16(x, y),
            DynamicImage::ImageRgba8(b) => b.rgba16(x, y),
            DynamicImage::ImageLuma16(b) => b.rgba16(x, y),
            DynamicImage::ImageLumaA16(b) => b.rgba16(x, y),
            DynamicImage::ImageRgb16(b) => b.rgba16(x, y),
            DynamicImage::ImageRgba16(b) => b.rgba16(x, y),
            DynamicImage::ImageRgb32F(b) => b.rgba16(x, y),
            DynamicImage::ImageRgba32F(b) => b.rgba16(x, y),
            other => Rgba(other.get_pixel(x, y).0.map(Channel16::to_u16)),
        }
    }
}

impl<R: Raster + ?Sized> Raster for &R {
    fn dimensions(&self) -> (u32, u32) {
        (**self).dimensions()
    }

    fn rgba16(&self, x: u32, y: u32) -> Rgba16 {
        (**self).rgba16(x, y)
    }
}

/// Copy `src` into a fresh working buffer with identical bounds and alpha.
pub fn to_working_buffer<P, R>(src: &R) -> WorkingBuffer<P>
where
    P: WorkingPixel,
    R: Raster + ?Sized,
{
    let (width, height) = src.dimensions();
    ImageBuffer::from_fn(width, height, |x, y| P::from_rgba16(src.rgba16(x, y)))
}

/// True when `img` stores at most 8 bits per channel.
pub fn fits_in_8_bits(img: &DynamicImage) -> bool {
    let color = img.color();
    color.bytes_per_pixel() <= color.channel_count()
}

#[cfg(test)]
#[path = "../../tests/unit/raster/view.rs"]
mod tests;
