//! Texture resources.

use crate::error::{Error, Result};

/// CPU-side RGBA8 texture data
#[derive(Debug, Clone, Default)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 pixels, `width * height * 4` bytes
    pub data: Vec<u8>,
}

impl Texture {
    /// Create a texture, validating the pixel data
    ///
    /// # Errors
    ///
    /// `InvalidResource` if the data length does not match an RGBA8 image
    /// of the given dimensions.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(Error::InvalidResource(format!(
                "texture data is {} bytes, expected {} for {}x{} RGBA8",
                data.len(),
                expected,
                width,
                height
            )));
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Single-colour texture, useful as a fallback and in tests
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self {
            width,
            height,
            data: rgba
                .iter()
                .copied()
                .cycle()
                .take(width as usize * height as usize * 4)
                .collect(),
        }
    }
}
