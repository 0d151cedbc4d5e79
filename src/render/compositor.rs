//! Frame Compositor: draws one image onto a frame, cover-fitted, with a Ken Burns offset/scale.

use rayon::prelude::*;

use crate::assets::image::ImageAsset;
use crate::foundation::core::{Affine, Canvas, Point, Rect, Vec2};
use crate::render::blend::over;
use crate::render::frame::FrameRGBA;

/// Placement of one image layer on the canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawParams {
    /// Translation in canvas pixels, applied before the uniform scale about the canvas center.
    pub offset: Vec2,
    /// Extra uniform scale about the canvas center (1.0 = plain cover fit).
    pub scale: f64,
    /// Layer opacity in `[0, 1]`.
    pub opacity: f32,
}

impl DrawParams {
    /// Fully opaque layer.
    pub fn opaque(offset: Vec2, scale: f64) -> Self {
        Self {
            offset,
            scale,
            opacity: 1.0,
        }
    }
}

/// Size of the image after the plain cover fit (before offset and extra scale).
///
/// The image is scaled up along whichever axis is the tighter constraint so that it covers the
/// whole canvas while keeping its aspect ratio; the excess is cropped.
pub fn cover_size(canvas: Canvas, image_w: u32, image_h: u32) -> (f64, f64) {
    let w = f64::from(canvas.width);
    let h = f64::from(canvas.height);
    let img_ratio = f64::from(image_w) / f64::from(image_h);
    if img_ratio > canvas.aspect() {
        (h * img_ratio, h)
    } else {
        (w, w / img_ratio)
    }
}

/// Image-space to canvas-space transform for one layer.
pub fn cover_transform(canvas: Canvas, image_w: u32, image_h: u32, offset: Vec2, scale: f64) -> Affine {
    let (render_w, render_h) = cover_size(canvas, image_w, image_h);
    let c = canvas.center().to_vec2();
    let origin = Vec2::new(c.x - render_w / 2.0, c.y - render_h / 2.0) + offset;

    Affine::translate(c)
        * Affine::scale(scale)
        * Affine::translate(-c)
        * Affine::translate(origin)
        * Affine::scale_non_uniform(
            render_w / f64::from(image_w),
            render_h / f64::from(image_h),
        )
}

/// Canvas-space bounding box of a drawn layer.
pub fn cover_rect(canvas: Canvas, image: &ImageAsset, offset: Vec2, scale: f64) -> Rect {
    let tr = cover_transform(canvas, image.width(), image.height(), offset, scale);
    tr.transform_rect_bbox(Rect::new(
        0.0,
        0.0,
        f64::from(image.width()),
        f64::from(image.height()),
    ))
}

/// Draw `image` onto `target`, source-over.
///
/// The caller clears `target` to an opaque background before the first layer of a frame.
/// Pixels are bilinearly sampled at pixel centers; canvas pixels whose center falls outside the
/// transformed image are left untouched.
pub fn draw(target: &mut FrameRGBA, image: &ImageAsset, params: DrawParams) {
    assert!(
        image.width() > 0 && image.height() > 0,
        "degenerate image {}x{}",
        image.width(),
        image.height()
    );
    if params.opacity <= 0.0 || params.scale <= 0.0 {
        return;
    }

    let canvas = target.canvas();
    let inv = cover_transform(
        canvas,
        image.width(),
        image.height(),
        params.offset,
        params.scale,
    )
    .inverse();
    let stride = target.stride();

    target
        .data
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            let py = y as f64 + 0.5;
            for (x, d) in row.chunks_exact_mut(4).enumerate() {
                let src = inv * Point::new(x as f64 + 0.5, py);
                let Some(px) = sample_bilinear(image, src.x - 0.5, src.y - 0.5) else {
                    continue;
                };
                let out = over([d[0], d[1], d[2], d[3]], px, params.opacity);
                d.copy_from_slice(&out);
            }
        });
}

/// Bilinear sample at continuous pixel coordinates (pixel centers at integers).
///
/// Returns `None` outside the image; taps past the edge clamp to the border pixel.
fn sample_bilinear(image: &ImageAsset, sx: f64, sy: f64) -> Option<[u8; 4]> {
    let w = f64::from(image.width());
    let h = f64::from(image.height());
    if !(sx >= -0.5 && sy >= -0.5 && sx < w - 0.5 && sy < h - 0.5) {
        return None;
    }

    let max_x = image.width() - 1;
    let max_y = image.height() - 1;
    let x0f = sx.floor();
    let y0f = sy.floor();
    let fx = (sx - x0f) as f32;
    let fy = (sy - y0f) as f32;
    let x0 = x0f.max(0.0) as u32;
    let y0 = y0f.max(0.0) as u32;
    let x1 = if x0f < 0.0 { 0 } else { (x0 + 1).min(max_x) };
    let y1 = if y0f < 0.0 { 0 } else { (y0 + 1).min(max_y) };

    let p00 = image.pixel(x0.min(max_x), y0.min(max_y));
    let p10 = image.pixel(x1, y0.min(max_y));
    let p01 = image.pixel(x0.min(max_x), y1);
    let p11 = image.pixel(x1, y1);

    let mut out = [0u8; 4];
    for c in 0..4 {
        let top = f32::from(p00[c]) + (f32::from(p10[c]) - f32::from(p00[c])) * fx;
        let bot = f32::from(p01[c]) + (f32::from(p11[c]) - f32::from(p01[c])) * fx;
        out[c] = (top + (bot - top) * fy).round().clamp(0.0, 255.0) as u8;
    }
    Some(out)
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
