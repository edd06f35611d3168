use crate::error::InputValidationError;

/// Bytes per RGBA pixel.
pub const RGBA_CHANNELS: usize = 4;

/// Borrowed, immutable RGBA8 image.
///
/// The only way to obtain one is [`ImageRgba8::new`], which guarantees
/// `data.len() == w * h * 4` and non-zero dimensions.
#[derive(Clone, Copy, Debug)]
pub struct ImageRgba8<'a> {
    w: usize,
    h: usize,
    data: &'a [u8],
}

impl<'a> ImageRgba8<'a> {
    /// Validate dimensions against the buffer length and wrap the pixels.
    pub fn new(w: usize, h: usize, data: &'a [u8]) -> Result<Self, InputValidationError> {
        if w == 0 || h == 0 {
            return Err(InputValidationError::EmptyDimensions {
                width: w,
                height: h,
            });
        }
        let expected = w
            .checked_mul(h)
            .and_then(|px| px.checked_mul(RGBA_CHANNELS))
            .ok_or(InputValidationError::DimensionOverflow {
                width: w,
                height: h,
            })?;
        if data.len() != expected {
            return Err(InputValidationError::BufferLength {
                width: w,
                height: h,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { w, h, data })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.w
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.h
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.w * self.h
    }

    /// Raw RGBA bytes, row-major without padding.
    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }
}
