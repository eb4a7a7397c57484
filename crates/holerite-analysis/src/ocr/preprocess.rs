//! Page image preprocessing before recognition.

use std::path::{Path, PathBuf};

use image::GrayImage;

use super::backend::OcrError;

/// Convert to grayscale and stretch contrast to the full 0..=255 range.
///
/// Writes `prepared.png` into `output_dir` and returns its path.
pub fn preprocess_image(image_path: &Path, output_dir: &Path) -> Result<PathBuf, OcrError> {
    let img = image::open(image_path).map_err(|e| OcrError::ImageError(e.to_string()))?;
    let mut gray = img.to_luma8();
    stretch_contrast(&mut gray);

    let out = output_dir.join("prepared.png");
    gray.save(&out)
        .map_err(|e| OcrError::ImageError(e.to_string()))?;
    Ok(out)
}

fn stretch_contrast(gray: &mut GrayImage) {
    let (lo, hi) = gray
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p.0[0]), hi.max(p.0[0])));
    if hi <= lo {
        return;
    }
    let range = u32::from(hi - lo);
    for p in gray.pixels_mut() {
        p.0[0] = (u32::from(p.0[0] - lo) * 255 / range) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use tempfile::TempDir;

    #[test]
    fn test_contrast_is_stretched() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("page.png");
        let img = GrayImage::from_fn(4, 4, |x, y| Luma([100 + (x * 4 + y) as u8 * 3]));
        img.save(&source).unwrap();

        let prepared = preprocess_image(&source, temp.path()).unwrap();
        let out = image::open(prepared).unwrap().to_luma8();
        let values: Vec<u8> = out.pixels().map(|p| p.0[0]).collect();
        assert_eq!(values.iter().min(), Some(&0));
        assert_eq!(values.iter().max(), Some(&255));
    }

    #[test]
    fn test_flat_image_unchanged() {
        let mut img = GrayImage::from_pixel(3, 3, Luma([128]));
        stretch_contrast(&mut img);
        assert!(img.pixels().all(|p| p.0[0] == 128));
    }

    #[test]
    fn test_not_an_image() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("page.png");
        std::fs::write(&source, b"not a png").unwrap();
        assert!(matches!(
            preprocess_image(&source, temp.path()),
            Err(OcrError::ImageError(_))
        ));
    }
}
