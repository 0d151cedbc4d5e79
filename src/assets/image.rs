use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;

use crate::foundation::error::{KenBurnsError, KenBurnsResult};
use crate::foundation::math::premultiply_rgba8_in_place;

/// Opaque caller-assigned image identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct AssetId(pub u64);

/// An already-decoded still image.
///
/// Pixels are stored as premultiplied RGBA8, tightly packed, row-major. The pixel buffer is shared
/// behind an `Arc`, so cloning an asset is cheap and never copies pixels.
#[derive(Clone, Debug)]
pub struct ImageAsset {
    id: AssetId,
    width: u32,
    height: u32,
    rgba8_premul: Arc<Vec<u8>>,
}

impl ImageAsset {
    /// Build an asset from straight-alpha RGBA8 pixels.
    pub fn from_rgba8(id: AssetId, width: u32, height: u32, mut rgba: Vec<u8>) -> KenBurnsResult<Self> {
        validate_dims(width, height, rgba.len())?;
        premultiply_rgba8_in_place(&mut rgba);
        Ok(Self {
            id,
            width,
            height,
            rgba8_premul: Arc::new(rgba),
        })
    }

    /// Decode encoded image bytes (PNG, JPEG, WebP, ...).
    pub fn decode(id: AssetId, bytes: &[u8]) -> KenBurnsResult<Self> {
        let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
        let rgba = dyn_img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba8(id, width, height, rgba.into_raw())
    }

    /// Read and decode an image file.
    pub fn from_path(id: AssetId, path: &Path) -> KenBurnsResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read image '{}'", path.display()))?;
        Self::decode(id, &bytes).map_err(|e| match e {
            KenBurnsError::Other(err) => {
                KenBurnsError::Other(err.context(format!("image '{}'", path.display())))
            }
            other => other,
        })
    }

    /// Caller-assigned identifier.
    pub fn id(&self) -> AssetId {
        self.id
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width over height.
    pub fn aspect(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }

    /// Premultiplied RGBA8 pixels.
    pub fn pixels(&self) -> &[u8] {
        &self.rgba8_premul
    }

    pub(crate) fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let p = &self.rgba8_premul[idx..idx + 4];
        [p[0], p[1], p[2], p[3]]
    }
}

fn validate_dims(width: u32, height: u32, len: usize) -> KenBurnsResult<()> {
    if width == 0 || height == 0 {
        return Err(KenBurnsError::validation(format!(
            "image dimensions must be non-zero (got {width}x{height})"
        )));
    }
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| KenBurnsError::validation("image byte size overflow"))?;
    if len != expected {
        return Err(KenBurnsError::validation(format!(
            "image byte length {len} does not match {width}x{height}x4"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/image.rs"]
mod tests;
