//! Image decoding for manifest-based datasets.
//!
//! Images (PNG/JPEG/BMP/GIF) are decoded, resized to the network's input
//! dimensions, converted to grayscale and normalized to [0, 1]. Masks go
//! through the same pipeline and are then binarized, since resampling can
//! smear a binary mask's edges into intermediate gray levels.

use std::path::Path;

use crate::data::dataset::Sample;
use crate::data::manifest::ManifestEntry;
use crate::error::{Error, Result};

/// Decodes one image file into a flat grayscale vector of length
/// `width * height`, pixels normalized to [0, 1].
pub fn load_grayscale<P: AsRef<Path>>(path: P, width: u32, height: u32) -> Result<Vec<f64>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let img = image::load_from_memory(&bytes)
        .map_err(|e| Error::Dataset(format!("{}: {}", path.display(), e)))?;
    let resized = img.resize_exact(width, height, image::imageops::FilterType::Lanczos3);
    let gray = resized.to_luma8();
    Ok(gray.pixels().map(|p| p.0[0] as f64 / 255.0).collect())
}

/// Decodes one mask file and binarizes it at 0.5.
pub fn load_mask<P: AsRef<Path>>(path: P, width: u32, height: u32) -> Result<Vec<f64>> {
    let gray = load_grayscale(path, width, height)?;
    Ok(gray
        .into_iter()
        .map(|v| if v > 0.5 { 1.0 } else { 0.0 })
        .collect())
}

/// Loads every manifest entry into memory, resolving paths against `root`.
pub fn load_samples<P: AsRef<Path>>(
    root: P,
    entries: &[ManifestEntry],
    width: u32,
    height: u32,
) -> Result<Vec<Sample>> {
    let root = root.as_ref();
    entries
        .iter()
        .map(|entry| {
            Ok(Sample {
                image: load_grayscale(root.join(&entry.image), width, height)?,
                mask: load_mask(root.join(&entry.mask), width, height)?,
                label: entry.label,
                intensity: entry.intensity,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn temp_png(name: &str, pixels: &[u8], side: u32) -> std::path::PathBuf {
        let mut img = GrayImage::new(side, side);
        for (i, &v) in pixels.iter().enumerate() {
            img.put_pixel(i as u32 % side, i as u32 / side, Luma([v]));
        }
        let path = std::env::temp_dir().join(format!(
            "ferrite-mtl-{}-{}",
            std::process::id(),
            name
        ));
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn grayscale_pixels_are_normalized() {
        let path = temp_png("gray.png", &[0, 255, 128, 64], 2);
        let loaded = load_grayscale(&path, 2, 2).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.len(), 4);
        assert!(loaded.iter().all(|&v| (0.0..=1.0).contains(&v)));
        // Resampling may move values by a rounding step, no more.
        assert!(loaded[0] < 0.02);
        assert!(loaded[1] > 0.98);
    }

    #[test]
    fn masks_come_out_strictly_binary() {
        let path = temp_png("mask.png", &[0, 255, 200, 30], 2);
        let mask = load_mask(&path, 2, 2).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(mask, vec![0.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let missing = std::env::temp_dir().join("ferrite-mtl-definitely-missing.png");
        assert!(load_grayscale(&missing, 2, 2).is_err());
    }
}
