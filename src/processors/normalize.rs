//! Image normalization for model input.
//!
//! This module converts raw encoded image bytes into the tensor the model
//! expects: decode (JPEG/PNG), stretch-resize to the model's fixed input
//! resolution, strip any alpha channel, and scale byte values into the
//! `[0.0, 1.0]` range with an NHWC layout and a leading batch axis of 1.

use crate::core::{ClassifierError, Tensor4D};
use image::imageops::FilterType;

/// Byte-to-float scaling applied to every channel value.
const SCALE: f32 = 1.0 / 255.0;

/// The resampling filter used for resizing.
///
/// Pinned to bilinear rather than the image crate's default: the model's
/// accuracy depends on preprocessing staying consistent between training and
/// inference, so the filter must not drift with library defaults.
const RESIZE_FILTER: FilterType = FilterType::Triangle;

/// Normalizes encoded images into model input tensors.
///
/// The resize is a direct stretch to the target resolution regardless of the
/// source aspect ratio; no cropping or letterboxing is performed. This
/// mirrors the preprocessing the model was trained with.
#[derive(Debug, Clone)]
pub struct ImageNormalizer {
    /// Target width in pixels.
    width: u32,
    /// Target height in pixels.
    height: u32,
}

impl ImageNormalizer {
    /// Creates a new normalizer targeting the given resolution.
    ///
    /// # Arguments
    ///
    /// * `width` - Target width in pixels, must be non-zero.
    /// * `height` - Target height in pixels, must be non-zero.
    ///
    /// # Returns
    ///
    /// A Result containing the normalizer or a ClassifierError if either
    /// dimension is zero.
    pub fn new(width: u32, height: u32) -> Result<Self, ClassifierError> {
        if width == 0 || height == 0 {
            return Err(crate::core::ConfigError::InvalidConfig {
                message: format!("normalizer dimensions must be non-zero, got {width}x{height}"),
            }
            .into());
        }
        Ok(Self { width, height })
    }

    /// Creates a normalizer targeting the reference model's 224x224 input.
    pub fn with_default_shape() -> Self {
        Self {
            width: 224,
            height: 224,
        }
    }

    /// The target resolution as (width, height).
    pub fn target_shape(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Converts encoded image bytes into a normalized input tensor.
    ///
    /// # Arguments
    ///
    /// * `bytes` - The encoded image (JPEG or PNG).
    ///
    /// # Returns
    ///
    /// A Result containing a tensor of shape (1, height, width, 3) with each
    /// element in `[0.0, 1.0]`, or a ClassifierError.
    ///
    /// # Errors
    ///
    /// Returns `Decode` if the bytes are not a well-formed image in a
    /// supported container format.
    pub fn normalize(&self, bytes: &[u8]) -> Result<Tensor4D, ClassifierError> {
        let img = image::load_from_memory(bytes).map_err(ClassifierError::Decode)?;

        // Stretch-resize, then drop any alpha channel. resize_exact is
        // deterministic for a fixed filter, so repeated calls on the same
        // bytes produce bit-identical tensors.
        let rgb = img
            .resize_exact(self.width, self.height, RESIZE_FILTER)
            .to_rgb8();

        // The raw buffer is already HWC row-major RGB; scaling it in order
        // yields the NHWC layout directly.
        let data: Vec<f32> = rgb.into_raw().into_iter().map(|v| v as f32 * SCALE).collect();
        let tensor = Tensor4D::from_shape_vec(
            (1, self.height as usize, self.width as usize, 3),
            data,
        )?;
        Ok(tensor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encode_png(img: DynamicImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn encode_jpeg(img: DynamicImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Jpeg)
            .unwrap();
        bytes
    }

    fn solid_rgb(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
    }

    #[test]
    fn produces_expected_shape_and_range_for_any_resolution() {
        let normalizer = ImageNormalizer::new(224, 224).unwrap();
        for (w, h) in [(31, 17), (224, 224), (640, 480), (1, 1)] {
            let bytes = encode_png(solid_rgb(w, h, [120, 64, 200]));
            let tensor = normalizer.normalize(&bytes).unwrap();
            assert_eq!(tensor.shape(), &[1, 224, 224, 3]);
            assert!(tensor.iter().all(|&v| (0.0..=1.0).contains(&v)));
        }
    }

    #[test]
    fn accepts_jpeg_as_well_as_png() {
        let normalizer = ImageNormalizer::new(224, 224).unwrap();
        let bytes = encode_jpeg(solid_rgb(100, 50, [200, 150, 100]));
        let tensor = normalizer.normalize(&bytes).unwrap();
        assert_eq!(tensor.shape(), &[1, 224, 224, 3]);
    }

    #[test]
    fn scales_channel_bytes_by_255() {
        let normalizer = ImageNormalizer::new(8, 8).unwrap();
        let bytes = encode_png(solid_rgb(32, 32, [255, 0, 51]));
        let tensor = normalizer.normalize(&bytes).unwrap();
        // Solid color survives bilinear resampling exactly.
        let pixel = [tensor[[0, 3, 4, 0]], tensor[[0, 3, 4, 1]], tensor[[0, 3, 4, 2]]];
        assert_eq!(pixel, [1.0, 0.0, 51.0 / 255.0]);
    }

    #[test]
    fn strips_alpha_channel() {
        let normalizer = ImageNormalizer::new(16, 16).unwrap();
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            24,
            24,
            Rgba([10, 20, 30, 128]),
        ));
        let tensor = normalizer.normalize(&encode_png(rgba)).unwrap();
        assert_eq!(tensor.shape(), &[1, 16, 16, 3]);
        assert!((tensor[[0, 0, 0, 0]] - 10.0 / 255.0).abs() < f32::EPSILON);
    }

    #[test]
    fn is_deterministic_across_repeated_calls() {
        let normalizer = ImageNormalizer::new(224, 224).unwrap();
        let mut img = RgbImage::new(90, 60);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8]);
        }
        let bytes = encode_png(DynamicImage::ImageRgb8(img));
        let first = normalizer.normalize(&bytes).unwrap();
        let second = normalizer.normalize(&bytes).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_non_image_bytes() {
        let normalizer = ImageNormalizer::new(224, 224).unwrap();
        let result = normalizer.normalize(b"definitely not an image");
        assert!(matches!(result, Err(ClassifierError::Decode(_))));
    }

    #[test]
    fn rejects_truncated_png() {
        let normalizer = ImageNormalizer::new(224, 224).unwrap();
        let mut bytes = encode_png(solid_rgb(64, 64, [1, 2, 3]));
        bytes.truncate(bytes.len() / 2);
        let result = normalizer.normalize(&bytes);
        assert!(matches!(result, Err(ClassifierError::Decode(_))));
    }

    #[test]
    fn rejects_zero_dimensions() {
        assert!(ImageNormalizer::new(0, 224).is_err());
        assert!(ImageNormalizer::new(224, 0).is_err());
    }
}
