//! Pixel tone transform: luminance grayscale + contrast/brightness.
//!
//! Applied independently per pixel over an RGBA buffer:
//!
//! 1. `luminance = 0.299·R + 0.587·G + 0.114·B` (ITU-R BT.601 luma weights)
//! 2. contrast, pivoting around mid-gray (127.5)
//! 3. brightness, as a straight multiplier
//! 4. clamp to [0, 255], round, write back as `R = G = B`
//!
//! Alpha passes through unchanged. Contrast is applied strictly before
//! brightness; reversing the order changes results for any non-mid-gray
//! pixel and must not be done. The transform is stateless and
//! order-independent across pixels, so callers are free to run it on many
//! pages concurrently — each invocation owns its buffer and shares nothing.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// Contrast and brightness factors for [`apply_tone`].
///
/// Both are multiplicative; `1.0` means "no change". The configuration
/// builder clamps user values to `[0.0, 2.0]` (the range the exposed
/// controls cover), but the transform itself accepts any finite factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneOptions {
    /// Contrast factor, pivoting on mid-gray.
    pub contrast: f32,
    /// Brightness factor, applied after contrast.
    pub brightness: f32,
}

impl Default for ToneOptions {
    fn default() -> Self {
        Self {
            contrast: 1.0,
            brightness: 1.0,
        }
    }
}

impl ToneOptions {
    /// True when the transform reduces to plain BT.601 grayscale.
    pub fn is_identity(&self) -> bool {
        self.contrast == 1.0 && self.brightness == 1.0
    }
}

/// Tone a single channel triple, returning the shared gray value.
///
/// Split out of the pixel loop so the arithmetic is testable without
/// constructing image buffers.
#[inline]
pub fn tone_value(r: u8, g: u8, b: u8, options: &ToneOptions) -> u8 {
    let luminance = 0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b);
    let mut toned = ((luminance / 255.0 - 0.5) * options.contrast + 0.5) * 255.0;
    toned *= options.brightness;
    toned.clamp(0.0, 255.0).round() as u8
}

/// Apply the tone transform to every pixel of `image`, returning a new
/// buffer. Alpha is preserved exactly; output channel values are always in
/// [0, 255] by construction.
pub fn apply_tone(image: &RgbaImage, options: &ToneOptions) -> RgbaImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let Rgba([r, g, b, a]) = *pixel;
        let v = tone_value(r, g, b, options);
        *pixel = Rgba([v, v, v, a]);
    }
    out
}
