use crate::foundation::core::Canvas;
use crate::foundation::math::mul_div255_u8;

/// Opaque black, the fill every frame starts from.
pub const BACKGROUND_RGBA: [u8; 4] = [0, 0, 0, 255];

/// A composited frame as RGBA8 pixels.
///
/// Frames are **premultiplied alpha**. The `premultiplied` flag is kept to make this explicit at
/// the encoder boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Allocate a fully transparent frame covering `canvas`.
    pub fn new(canvas: Canvas) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            data: vec![0u8; (canvas.width as usize) * (canvas.height as usize) * 4],
            premultiplied: true,
        }
    }

    /// Canvas this frame covers.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Fill every pixel with a straight-alpha RGBA8 color.
    pub fn clear(&mut self, rgba: [u8; 4]) {
        let px = premul_rgba8(rgba);
        for d in self.data.chunks_exact_mut(4) {
            d.copy_from_slice(&px);
        }
    }

    /// Premultiplied pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let p = &self.data[idx..idx + 4];
        [p[0], p[1], p[2], p[3]]
    }

    /// Row stride in bytes.
    pub(crate) fn stride(&self) -> usize {
        (self.width as usize) * 4
    }
}

fn premul_rgba8(rgba: [u8; 4]) -> [u8; 4] {
    let [r, g, b, a] = rgba;
    let a16 = u16::from(a);
    [
        mul_div255_u8(u16::from(r), a16),
        mul_div255_u8(u16::from(g), a16),
        mul_div255_u8(u16::from(b), a16),
        a,
    ]
}
