//! Image processing for the classification pipeline.
//!
//! * [`normalize`] - Decoding and tensor normalization of encoded images

pub mod normalize;

pub use normalize::ImageNormalizer;
