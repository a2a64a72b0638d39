//! CPU composition of the quote frames.
//!
//! Each source image is dimmed, optionally resized, and stamped with the
//! centered watermark once; per generated item the logo is pasted into a
//! corner before the quote text goes on top. All blending is plain
//! straight-alpha `over` in integer math.

use std::path::Path;

use anyhow::Context as _;
use image::RgbaImage;
use image::imageops::FilterType;

use crate::error::QuotepressResult;
use crate::model::{LogoCorner, PixelSize};

/// Gap in pixels between a pasted logo and the image edge.
pub const CORNER_INSET: u32 = 10;

/// Brightness multiplier applied to every source image before overlays.
pub const DIM_FACTOR: f32 = 0.8;

pub fn load_rgba(path: &Path) -> QuotepressResult<RgbaImage> {
    let img = image::open(path)
        .with_context(|| format!("open image '{}'", path.display()))?
        .to_rgba8();
    Ok(img)
}

pub fn resize(img: &RgbaImage, size: PixelSize) -> RgbaImage {
    image::imageops::resize(img, size.width, size.height, FilterType::Triangle)
}

/// Scale RGB channels by `factor`, leaving alpha untouched.
pub fn dim(img: &mut RgbaImage, factor: f32) {
    let factor = factor.clamp(0.0, 1.0);
    for px in img.pixels_mut() {
        for c in 0..3 {
            px.0[c] = (f32::from(px.0[c]) * factor).round() as u8;
        }
    }
}

/// Straight-alpha `over` paste of `overlay` onto `base` at (x, y), clipped
/// to the base bounds.
pub fn alpha_paste(base: &mut RgbaImage, overlay: &RgbaImage, x: u32, y: u32) {
    for oy in 0..overlay.height() {
        let by = y + oy;
        if by >= base.height() {
            break;
        }
        for ox in 0..overlay.width() {
            let bx = x + ox;
            if bx >= base.width() {
                break;
            }
            let src = overlay.get_pixel(ox, oy).0;
            let dst = base.get_pixel_mut(bx, by);
            dst.0 = over_straight(dst.0, src);
        }
    }
}

fn over_straight(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    let sa = u16::from(src[3]);
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }
    let inv = 255 - sa;
    let mut out = [0u8; 4];
    for i in 0..3 {
        out[i] =
            mul_div255(u16::from(src[i]), sa).saturating_add(mul_div255(u16::from(dst[i]), inv));
    }
    out[3] = (sa as u8).saturating_add(mul_div255(u16::from(dst[3]), inv));
    out
}

fn mul_div255(a: u16, b: u16) -> u8 {
    (((a * b) + 127) / 255) as u8
}

/// Paste `overlay` centered on `base`.
pub fn paste_centered(base: &mut RgbaImage, overlay: &RgbaImage) {
    let x = (base.width() / 2).saturating_sub(overlay.width() / 2);
    let y = (base.height() / 2).saturating_sub(overlay.height() / 2);
    alpha_paste(base, overlay, x, y);
}

/// Resolve the corner a logo lands in. `Shuffle` hashes the seed and item
/// index so a rerun with the same job file reproduces the same frames.
pub fn resolve_corner(corner: LogoCorner, seed: u64, item_index: u64) -> LogoCorner {
    match corner {
        LogoCorner::Shuffle => {
            let mut h = seed ^ item_index.wrapping_mul(0x9E37_79B9_7F4A_7C15);
            h ^= h >> 33;
            h = h.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
            h ^= h >> 33;
            match h % 4 {
                0 => LogoCorner::TopLeft,
                1 => LogoCorner::TopRight,
                2 => LogoCorner::BottomLeft,
                _ => LogoCorner::BottomRight,
            }
        }
        fixed => fixed,
    }
}

/// Top-left paste position for a logo in the given corner.
pub fn corner_position(base: &RgbaImage, logo: &RgbaImage, corner: LogoCorner) -> (u32, u32) {
    let right = base.width().saturating_sub(logo.width() + CORNER_INSET);
    let bottom = base.height().saturating_sub(logo.height() + CORNER_INSET);
    match corner {
        LogoCorner::TopLeft => (CORNER_INSET, CORNER_INSET),
        LogoCorner::TopRight => (right, CORNER_INSET),
        LogoCorner::BottomLeft => (CORNER_INSET, bottom),
        LogoCorner::BottomRight | LogoCorner::Shuffle => (right, bottom),
    }
}

/// Dim, resize, and watermark one source image. The result is cloned per
/// quote, so this runs once per source image.
pub fn prepare_base(
    mut img: RgbaImage,
    size: Option<PixelSize>,
    watermark: &RgbaImage,
) -> RgbaImage {
    dim(&mut img, DIM_FACTOR);
    if let Some(size) = size {
        img = resize(&img, size);
    }
    paste_centered(&mut img, watermark);
    img
}

/// Paste the logo into its resolved corner.
pub fn paste_logo(
    base: &mut RgbaImage,
    logo: &RgbaImage,
    corner: LogoCorner,
    seed: u64,
    item_index: u64,
) {
    let resolved = resolve_corner(corner, seed, item_index);
    let (x, y) = corner_position(base, logo, resolved);
    alpha_paste(base, logo, x, y);
}
