//! Image → feature vector.
//!
//! Resize to 150×150 (bicubic), force 3-channel RGB, collapse to one channel
//! with Rec. 601 luma weights and scale to [0, 1]. Output is row-major, so
//! pixel (x, y) lands at index `y * 150 + x`.

use std::path::Path;

use image::imageops::FilterType;
use image::RgbImage;

use super::InferenceError;

/// Width and height every image is resized to.
pub const IMAGE_SIDE: u32 = 150;

/// Length of the vector fed to the classifier.
pub const VECTOR_LEN: usize = (IMAGE_SIDE * IMAGE_SIDE) as usize;

const LUMA_R: f32 = 0.299;
const LUMA_G: f32 = 0.587;
const LUMA_B: f32 = 0.114;

/// Read and decode the file at `path`, then build its feature vector.
pub fn image_to_vector(path: &Path) -> Result<Vec<f32>, InferenceError> {
    let bytes = std::fs::read(path)?;
    bytes_to_vector(&bytes)
}

/// Decode encoded image bytes and build the feature vector.
pub fn bytes_to_vector(bytes: &[u8]) -> Result<Vec<f32>, InferenceError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| InferenceError::Decode(e.to_string()))?;
    let rgb = img.to_rgb8();
    let resized = image::imageops::resize(&rgb, IMAGE_SIDE, IMAGE_SIDE, FilterType::CatmullRom);
    Ok(luma_vector(&resized))
}

/// Weighted channel sum per pixel, divided by 255.
pub fn luma_vector(img: &RgbImage) -> Vec<f32> {
    // RgbImage pixels iterate row by row
    img.pixels()
        .map(|p| {
            let [r, g, b] = p.0;
            (LUMA_R * f32::from(r) + LUMA_G * f32::from(g) + LUMA_B * f32::from(b)) / 255.0
        })
        .collect()
}
