//! Image primitives and utilities.
//!
//! Screen captures are held in a lightweight owned RGB image (`OwnedImage`).
//! Analysis code mostly borrows a rectangular view (`Image<'a>`) instead of
//! copying pixels, and converts to an owned image only when a pipeline needs
//! to mutate (OCR preprocessing, enhancement, debug snapshots).

use anyhow::{Context, Result};

/// Owned RGB image (no alpha).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedImage {
    width: u32,
    height: u32,
    data: Vec<Color>,
}

impl OwnedImage {
    /// Build an `OwnedImage` from RGBA bytes (alpha is discarded).
    ///
    /// The buffer is expected to be tightly packed: `width * height * 4` bytes.
    pub fn from_rgba(width: usize, bytes: &[u8]) -> Self {
        let height = if width == 0 { 0 } else { bytes.len() / width / 4 };
        let data = bytes
            .chunks_exact(4)
            .take(width * height)
            .map(|v| Color::new(v[0], v[1], v[2]))
            .collect::<Vec<_>>();

        Self {
            width: width as u32,
            height: height as u32,
            data,
        }
    }

    /// Build an image by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> Color) -> Self {
        let mut data = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self { width, height, data }
    }

    /// Single-color image.
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        Self {
            width,
            height,
            data: vec![color; (width * height) as usize],
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get((x + y * self.width) as usize).copied()
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, color: Color) {
        if x < self.width && y < self.height {
            self.data[(x + y * self.width) as usize] = color;
        }
    }

    pub fn pixels(&self) -> impl Iterator<Item = &Color> {
        self.data.iter()
    }

    /// Pixels with their coordinates, row-major.
    pub fn enumerate_pixels(&self) -> impl Iterator<Item = (u32, u32, Color)> + '_ {
        let w = self.width.max(1);
        self.data
            .iter()
            .enumerate()
            .map(move |(i, c)| (i as u32 % w, i as u32 / w, *c))
    }

    /// One-pixel wide vertical line at column `x`.
    pub fn column(&self, x: u32) -> OwnedImage {
        self.as_image().sub_image(x, 0, 1, self.height).to_owned_image()
    }

    /// Rows `top..=bottom` (inclusive, clamped to the image).
    pub fn rows(&self, top: u32, bottom: u32) -> OwnedImage {
        if top > bottom || top >= self.height {
            return OwnedImage::filled(self.width, 0, Color::BLACK);
        }
        let bottom = bottom.min(self.height - 1);
        self.as_image()
            .sub_image(0, top, self.width, bottom - top + 1)
            .to_owned_image()
    }

    /// Resize this image to the given height (preserving aspect ratio).
    ///
    /// Uses `fast_image_resize` (SIMD-optimized) and keeps output in `Vec<Color>`.
    pub fn resize_h(&mut self, height: u32) -> Result<()> {
        if self.height == height || self.is_empty() {
            return Ok(());
        }

        let height = height.max(1);
        let width = ((self.width as u64 * height as u64 / self.height.max(1) as u64) as u32).max(1);

        let src_bytes = self.as_image().get_bytes();
        let src = fast_image_resize::images::ImageRef::new(
            self.width,
            self.height,
            &src_bytes,
            fast_image_resize::PixelType::U8x3,
        )
        .context("fast_image_resize: ImageRef::new failed")?;

        let mut dst = fast_image_resize::images::Image::new(width, height, fast_image_resize::PixelType::U8x3);

        let mut resizer = fast_image_resize::Resizer::new();
        let options = fast_image_resize::ResizeOptions::new().resize_alg(
            fast_image_resize::ResizeAlg::Interpolation(fast_image_resize::FilterType::CatmullRom),
        );

        resizer
            .resize(&src, &mut dst, &Some(options))
            .context("fast_image_resize: resize failed")?;

        let bytes: Vec<u8> = dst.into_vec();
        self.data = bytes
            .chunks_exact(3)
            .map(|px| Color::new(px[0], px[1], px[2]))
            .collect();
        self.width = width;
        self.height = height;
        Ok(())
    }

    pub fn map_pixels(&mut self, f: impl Fn(&mut Color)) {
        for v in &mut self.data {
            f(v);
        }
    }

    /// Brightness and contrast enhancement.
    ///
    /// `brightness` scales every channel. `contrast` scales each channel's
    /// distance from the mean luma of the (brightened) image. A factor of 1.0
    /// leaves the image unchanged.
    pub fn enhanced(&self, brightness: f32, contrast: f32) -> OwnedImage {
        let mut out = self.clone();
        out.map_pixels(|c| {
            *c = Color::new(
                clamp_channel(c.r as f32 * brightness),
                clamp_channel(c.g as f32 * brightness),
                clamp_channel(c.b as f32 * brightness),
            );
        });

        if out.is_empty() {
            return out;
        }
        let mean = out.pixels().map(|c| c.luma() as f32).sum::<f32>() / out.data.len() as f32;
        out.map_pixels(|c| {
            *c = Color::new(
                clamp_channel(mean + (c.r as f32 - mean) * contrast),
                clamp_channel(mean + (c.g as f32 - mean) * contrast),
                clamp_channel(mean + (c.b as f32 - mean) * contrast),
            );
        });
        out
    }

    /// Create a borrowed view of this entire image.
    pub fn as_image<'a>(&'a self) -> Image<'a> {
        Image {
            x1: 0,
            y1: 0,
            x2: self.width,
            y2: self.height,
            true_width: self.width,
            data: &self.data,
        }
    }

    /// Convert to a grayscale `GrayImage` (luma).
    pub fn to_gray_image(&self) -> image::GrayImage {
        use image::{GrayImage, Luma};
        let mut out = GrayImage::new(self.width, self.height);
        for (x, y, c) in self.enumerate_pixels() {
            out.put_pixel(x, y, Luma([c.luma()]));
        }
        out
    }

    /// Create an RGB `OwnedImage` from a grayscale image (each pixel repeated into RGB).
    pub fn from_gray_as_rgb(gray: &image::GrayImage) -> Self {
        let (w, h) = gray.dimensions();
        let data = gray
            .pixels()
            .map(|p| Color::new(p.0[0], p.0[0], p.0[0]))
            .collect();
        Self {
            width: w,
            height: h,
            data,
        }
    }
}

#[inline]
fn clamp_channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

// ----------

/// Borrowed image view into an `OwnedImage`.
#[derive(Clone, Copy)]
pub struct Image<'a> {
    x1: u32,
    y1: u32,
    x2: u32,
    y2: u32,
    true_width: u32,
    data: &'a [Color],
}

impl<'a> Image<'a> {
    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    #[inline(always)]
    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    #[inline(always)]
    fn pixel(&self, x: u32, y: u32) -> &Color {
        &self.data[(x + y * self.true_width) as usize]
    }

    pub fn to_owned_image(self) -> OwnedImage {
        let mut data = Vec::with_capacity((self.width() * self.height()) as usize);
        for y in self.y1..self.y2 {
            for x in self.x1..self.x2 {
                data.push(*self.pixel(x, y));
            }
        }

        OwnedImage {
            width: self.width(),
            height: self.height(),
            data,
        }
    }

    /// Tightly packed RGB bytes.
    pub fn get_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity((self.width() * self.height() * 3) as usize);
        for y in self.y1..self.y2 {
            for x in self.x1..self.x2 {
                let clr = self.pixel(x, y);
                bytes.extend_from_slice(&[clr.r, clr.g, clr.b]);
            }
        }
        bytes
    }

    fn to_rgb_image(self) -> Result<image::RgbImage> {
        image::RgbImage::from_raw(self.width(), self.height(), self.get_bytes())
            .context("RgbImage::from_raw failed")
    }

    /// Encode the view as PNG in memory.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut out = std::io::Cursor::new(Vec::new());
        self.to_rgb_image()?
            .write_to(&mut out, image::ImageFormat::Png)
            .context("encode png")?;
        Ok(out.into_inner())
    }

    pub fn save_png<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_png_bytes()?).with_context(|| format!("write {}", path.display()))
    }

    /// Gets a subimage with the same height and provided width aligned to the right with the left side trimmed.
    pub fn trimmed_right(&self, width: u32) -> Self {
        let size = width.min(self.width());

        Self {
            x1: self.x2 - size,
            ..*self
        }
    }

    /// Create an arbitrary subimage (relative coordinates).
    pub fn sub_image(&self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let x = x.min(self.width());
        let y = y.min(self.height());
        let width = width.min(self.width() - x);
        let height = height.min(self.height() - y);

        Self {
            x1: self.x1 + x,
            y1: self.y1 + y,
            x2: self.x1 + x + width,
            y2: self.y1 + y + height,
            true_width: self.true_width,
            data: self.data,
        }
    }

    /// Average color of the view, or `None` if it has no pixels.
    pub fn average_color(&self) -> Option<Color> {
        let count = self.width() * self.height();
        if count == 0 {
            return None;
        }

        let mut r = 0u64;
        let mut g = 0u64;
        let mut b = 0u64;
        for y in self.y1..self.y2 {
            for x in self.x1..self.x2 {
                let clr = self.pixel(x, y);
                r += clr.r as u64;
                g += clr.g as u64;
                b += clr.b as u64;
            }
        }

        let count = count as u64;
        Some(Color {
            r: (r / count) as u8,
            g: (g / count) as u8,
            b: (b / count) as u8,
        })
    }

    /// Extract text using OCR with preprocessing (grayscale, thresholding, upscale).
    ///
    /// Tries an adaptive threshold and a global Otsu threshold and keeps the
    /// more plausible result.
    pub fn get_text(&self, ocr: &crate::ocr::Ocr) -> String {
        use imageproc::contrast::{adaptive_threshold, equalize_histogram, otsu_level, threshold, ThresholdType};

        if self.width() == 0 || self.height() == 0 {
            return String::new();
        }

        // Upscale small crops, OCR performs better on larger glyphs.
        let mut base = self.to_owned_image();
        const MIN_H: u32 = 80;
        if base.height < MIN_H {
            if let Err(err) = base.resize_h(MIN_H) {
                tracing::debug!(error = %err, "ocr upscale failed; using original crop");
            }
        }

        let adaptive = {
            let gray = equalize_histogram(&base.to_gray_image());
            let bin = adaptive_threshold(&gray, 7, 10);
            OwnedImage::from_gray_as_rgb(&ensure_dark_text_on_light(bin))
        };

        let otsu = {
            let gray = equalize_histogram(&base.to_gray_image());
            let level = otsu_level(&gray);
            let bin = threshold(&gray, level, ThresholdType::Binary);
            OwnedImage::from_gray_as_rgb(&ensure_dark_text_on_light(bin))
        };

        let mut best = String::new();
        let mut best_score = i64::MIN;

        for cand in [base, adaptive, otsu] {
            let text = ocr.get_text(cand.as_image());
            let score = score_ocr_text(&text);
            if score > best_score {
                best_score = score;
                best = text;
            }
        }

        best
    }
}

fn ensure_dark_text_on_light(mut bin: image::GrayImage) -> image::GrayImage {
    // Mostly black means light text on dark background: invert.
    let mut white = 0u64;
    let mut black = 0u64;
    for p in bin.pixels() {
        if p.0[0] > 0 {
            white += 1;
        } else {
            black += 1;
        }
    }
    if black > white {
        for p in bin.pixels_mut() {
            p.0[0] = 255u8.saturating_sub(p.0[0]);
        }
    }
    bin
}

fn score_ocr_text(text: &str) -> i64 {
    // Prefer strings with more alphanumerics (less noise) and slightly longer length.
    let mut score = 0i64;
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            score += 3;
        } else if !ch.is_whitespace() {
            score += 1;
        }
    }
    score + text.len() as i64
}

// ----------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    #[inline]
    pub const fn from_array([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }

    /// Per-channel tolerance check: every channel differs by at most `tol`.
    #[inline]
    pub fn matches(&self, other: Color, tol: u8) -> bool {
        self.r.abs_diff(other.r) <= tol && self.g.abs_diff(other.g) <= tol && self.b.abs_diff(other.b) <= tol
    }

    /// Cubic distance: `1.0` at a mean channel difference of 5%, `8.0` at 10%.
    pub fn deviation(&self, other: Color) -> f32 {
        let mean = (self.r.abs_diff(other.r) as f32 + self.g.abs_diff(other.g) as f32 + self.b.abs_diff(other.b) as f32)
            / 255.0
            / 3.0;
        (mean / 0.05).powi(3)
    }

    /// Compute luma (grayscale intensity).
    pub fn luma(&self) -> u8 {
        let r = self.r as u32;
        let g = self.g as u32;
        let b = self.b as u32;
        ((299 * r + 587 * g + 114 * b) / 1000) as u8
    }

    /// HSV with hue in `0.0..180.0` and saturation/value in `0.0..=255.0`.
    pub fn to_hsv(&self) -> (f32, f32, f32) {
        let r = self.r as f32;
        let g = self.g as f32;
        let b = self.b as f32;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let s = if max == 0.0 { 0.0 } else { delta / max * 255.0 };
        let mut h = if delta == 0.0 {
            0.0
        } else if max == r {
            60.0 * (g - b) / delta
        } else if max == g {
            120.0 + 60.0 * (b - r) / delta
        } else {
            240.0 + 60.0 * (r - g) / delta
        };
        if h < 0.0 {
            h += 360.0;
        }
        (h / 2.0, s, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgba_drops_alpha() {
        let img = OwnedImage::from_rgba(2, &[1, 2, 3, 255, 4, 5, 6, 0]);
        assert_eq!(img.width(), 2);
        assert_eq!(img.height(), 1);
        assert_eq!(img.pixel(1, 0), Some(Color::new(4, 5, 6)));
        assert_eq!(img.pixel(2, 0), None);
    }

    #[test]
    fn rows_is_inclusive_and_clamped() {
        let img = OwnedImage::from_fn(3, 10, |_, y| Color::new(y as u8, 0, 0));
        let section = img.rows(2, 4);
        assert_eq!(section.height(), 3);
        assert_eq!(section.pixel(0, 0), Some(Color::new(2, 0, 0)));
        assert_eq!(img.rows(8, 50).height(), 2);
        assert!(img.rows(5, 3).is_empty());
    }

    #[test]
    fn column_extracts_vertical_line() {
        let img = OwnedImage::from_fn(4, 3, |x, y| Color::new(x as u8, y as u8, 0));
        let col = img.column(2);
        assert_eq!(col.width(), 1);
        assert_eq!(col.height(), 3);
        assert_eq!(col.pixel(0, 1), Some(Color::new(2, 1, 0)));
    }

    #[test]
    fn average_color_of_empty_view_is_none() {
        let img = OwnedImage::filled(0, 0, Color::WHITE);
        assert_eq!(img.as_image().average_color(), None);
        let img = OwnedImage::filled(2, 2, Color::new(10, 20, 30));
        assert_eq!(img.as_image().average_color(), Some(Color::new(10, 20, 30)));
    }

    #[test]
    fn enhanced_identity_and_brightness() {
        let img = OwnedImage::from_fn(2, 2, |x, _| Color::new(100 + x as u8 * 50, 80, 40));
        assert_eq!(img.enhanced(1.0, 1.0), img);

        let bright = OwnedImage::filled(1, 1, Color::new(100, 200, 250)).enhanced(1.25, 1.0);
        assert_eq!(bright.pixel(0, 0), Some(Color::new(125, 250, 255)));
    }

    #[test]
    fn png_bytes_decode_back() {
        let img = OwnedImage::from_fn(3, 2, |x, y| Color::new(x as u8 * 80, y as u8 * 120, 7));
        let bytes = img.as_image().to_png_bytes().unwrap();
        assert!(bytes.starts_with(b"\x89PNG\r\n\x1a\n"));
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(2, 1).0, [160, 120, 7]);
    }

    #[test]
    fn save_png_writes_the_encoded_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");
        let img = OwnedImage::filled(4, 4, Color::new(1, 2, 3));
        img.as_image().save_png(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), img.as_image().to_png_bytes().unwrap());
    }

    #[test]
    fn deviation_grows_cubically() {
        let base = Color::new(100, 100, 100);
        assert_eq!(base.deviation(base), 0.0);
        // Channel differences summing to 38 and 76 are a mean of about 5% and 10%.
        assert!((base.deviation(Color::new(112, 113, 113)) - 1.0).abs() < 0.05);
        assert!((Color::BLACK.deviation(Color::new(26, 25, 25)) - 8.0).abs() < 0.2);
        assert_eq!(Color::WHITE.deviation(Color::BLACK), Color::BLACK.deviation(Color::WHITE));
    }

    #[test]
    fn color_matches_is_per_channel() {
        let a = Color::new(85, 170, 255);
        assert!(a.matches(Color::new(95, 160, 245), 10));
        assert!(!a.matches(Color::new(96, 170, 255), 10));
    }

    #[test]
    fn hsv_of_primaries() {
        let (h, s, v) = Color::new(255, 0, 0).to_hsv();
        assert_eq!((h, s, v), (0.0, 255.0, 255.0));
        let (h, _, _) = Color::new(0, 0, 255).to_hsv();
        assert_eq!(h, 120.0);
        let (_, s, _) = Color::new(128, 128, 128).to_hsv();
        assert_eq!(s, 0.0);
    }
}
