//! Image discovery and preprocessing.
//!
//! Files are decoded (format guessed from content), resized to a fixed square
//! resolution and normalized to [0, 1]. A file that fails to decode is
//! reported as a `LoadOutcome::Failed` and never aborts the batch.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::io::Reader as ImageReader;
use log::{debug, warn};

use crate::error::{Error, Result};
use crate::images::tensor::ImageTensor;

/// Side length every image is resized to.
pub const IMAGE_SIZE: u32 = 224;

/// Extensions (lower case) the loader picks up.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// A decoded image and the identifier derived from its file name.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    pub id: String,
    pub tensor: ImageTensor,
}

/// Per-file result of a directory load.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(ImageRecord),
    Failed { path: PathBuf, reason: String },
}

/// Successful records plus the number of files that were skipped.
#[derive(Debug, Default)]
pub struct LoadedImages {
    pub records: Vec<ImageRecord>,
    pub skipped: usize,
}

/// Returns `true` for `.png`, `.jpg` and `.jpeg`, in any letter case.
pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.iter().any(|ext| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// File name with its final extension removed.
pub fn image_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Lists candidate image files in `dir`, sorted by file name.
///
/// Failing to read the directory itself is an error; entries that cannot be
/// inspected are ignored.
pub fn scan_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;
    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|e| e.path())
        .filter(|p| has_image_extension(p))
        .collect();
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

/// Decodes image bytes, resizes to `size × size`, and flattens as R, G, B, ...
/// normalized to [0, 1].
pub fn decode_bytes(bytes: &[u8], size: u32) -> std::result::Result<ImageTensor, String> {
    let img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| e.to_string())?
        .decode()
        .map_err(|e| e.to_string())?;
    let resized = img.resize_exact(size, size, FilterType::Lanczos3);
    Ok(ImageTensor::from_rgb(&resized.to_rgb8()))
}

/// Reads and decodes a single file.
pub fn load_image(path: &Path, size: u32) -> LoadOutcome {
    let decoded = std::fs::read(path)
        .map_err(|e| e.to_string())
        .and_then(|bytes| decode_bytes(&bytes, size));
    match decoded {
        Ok(tensor) => LoadOutcome::Loaded(ImageRecord { id: image_id(path), tensor }),
        Err(reason) => LoadOutcome::Failed { path: path.to_path_buf(), reason },
    }
}

/// Loads every candidate image in `dir`, one outcome per file.
pub fn load_dir(dir: &Path, size: u32) -> Result<Vec<LoadOutcome>> {
    let paths = scan_dir(dir)?;
    debug!("found {} candidate image(s) in {}", paths.len(), dir.display());
    Ok(paths.iter().map(|p| load_image(p, size)).collect())
}

/// Splits outcomes into records, logging each failure.
pub fn collect_loaded(outcomes: Vec<LoadOutcome>) -> LoadedImages {
    let mut loaded = LoadedImages::default();
    for outcome in outcomes {
        match outcome {
            LoadOutcome::Loaded(record) => loaded.records.push(record),
            LoadOutcome::Failed { path, reason } => {
                warn!("Error processing {}: {}. Skipping {}", path.display(), reason, path.display());
                loaded.skipped += 1;
            }
        }
    }
    loaded
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_png(dir: &Path, name: &str) {
        RgbImage::from_pixel(8, 6, Rgb([10, 20, 30])).save(dir.join(name)).unwrap();
    }

    #[test]
    fn extension_match_ignores_case() {
        assert!(has_image_extension(Path::new("a/B.JPG")));
        assert!(has_image_extension(Path::new("c.Jpeg")));
        assert!(has_image_extension(Path::new("d.png")));
        assert!(!has_image_extension(Path::new("e.gif")));
        assert!(!has_image_extension(Path::new("png")));
    }

    #[test]
    fn id_strips_only_the_last_extension() {
        assert_eq!(image_id(Path::new("dir/cat.jpg")), "cat");
        assert_eq!(image_id(Path::new("x.y.png")), "x.y");
    }

    #[test]
    fn loads_resizes_and_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "b.png");
        write_png(dir.path(), "a.PNG");
        std::fs::write(dir.path().join("broken.jpg"), b"not an image").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

        let loaded = collect_loaded(load_dir(dir.path(), 16).unwrap());
        let ids: Vec<&str> = loaded.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(loaded.skipped, 1);

        let tensor = &loaded.records[0].tensor;
        assert_eq!((tensor.width, tensor.height), (16, 16));
        assert_eq!(tensor.data.len(), 16 * 16 * 3);
        assert!(tensor.data.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_dir(&dir.path().join("nope"), IMAGE_SIZE).is_err());
    }
}
