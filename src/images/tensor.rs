use std::path::Path;

use image::{ImageFormat, RgbImage};

use crate::error::{Error, Result};

/// Height × width × 3 RGB tensor, row-major, channels interleaved, values in
/// [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f64>,
}

impl ImageTensor {
    pub fn new(width: u32, height: u32, data: Vec<f64>) -> ImageTensor {
        assert_eq!(
            data.len(),
            (width * height * 3) as usize,
            "tensor data does not match {}x{}x3",
            width,
            height
        );
        ImageTensor { width, height, data }
    }

    pub fn from_rgb(img: &RgbImage) -> ImageTensor {
        let data = img.pixels()
            .flat_map(|p| p.0.iter().map(|&c| c as f64 / 255.0))
            .collect();
        ImageTensor { width: img.width(), height: img.height(), data }
    }

    /// Quantizes back to 8-bit RGB, clamping to [0, 1] first.
    pub fn to_rgb(&self) -> RgbImage {
        let bytes: Vec<u8> = self.data.iter()
            .map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect();
        RgbImage::from_raw(self.width, self.height, bytes)
            .unwrap_or_else(|| RgbImage::new(self.width, self.height))
    }

    pub fn save_jpeg(&self, path: &Path) -> Result<()> {
        self.to_rgb()
            .save_with_format(path, ImageFormat::Jpeg)
            .map_err(|source| Error::Image { path: path.to_path_buf(), source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_round_trip_is_exact_for_8bit_values() {
        let img = RgbImage::from_fn(3, 2, |x, y| image::Rgb([x as u8 * 80, y as u8 * 200, 7]));
        let tensor = ImageTensor::from_rgb(&img);
        assert_eq!(tensor.data.len(), 18);
        assert!(tensor.data.iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert_eq!(tensor.to_rgb(), img);
    }

    #[test]
    fn to_rgb_clamps_out_of_range_values() {
        let tensor = ImageTensor::new(1, 1, vec![-0.5, 0.5, 1.5]);
        assert_eq!(tensor.to_rgb().get_pixel(0, 0).0, [0, 128, 255]);
    }
}
