//! Image decoding and tensor preparation

use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::Array4;
use notecheck_types::{Error, Result};

/// Square input resolution the classifier was trained on
pub const INPUT_SIZE: u32 = 224;

/// Decode raw upload bytes
pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    if bytes.is_empty() {
        return Err(Error::InvalidImage("empty image data".to_string()));
    }
    image::load_from_memory(bytes).map_err(|e| Error::InvalidImage(e.to_string()))
}

/// Resize to `size`×`size` RGB and scale intensities to [0, 1].
///
/// Layout is NHWC with a batch of one: `[1, size, size, 3]`.
pub fn to_input_tensor(img: &DynamicImage, size: u32) -> Array4<f32> {
    let rgb = img.resize_exact(size, size, FilterType::Nearest).to_rgb8();
    let side = size as usize;
    Array4::from_shape_fn((1, side, side, 3), |(_, y, x, c)| {
        rgb.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
    })
}
