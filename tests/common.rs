//! Common test utilities and constants for the cbz2pdf crate.
//!
//! Provides functions for setting up test directories, encoding dummy page images, and
//! building comic archives on the fly.

use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use rand::{Rng, distributions::Alphanumeric};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use zip::write::SimpleFileOptions;

#[allow(dead_code)]
pub const TEST_TMP_DIR: &str = "tests/tmp";
/// Stored (uncompressed) RAR 4 archive with two PNG pages and a text file
#[allow(dead_code)]
pub const CBR_FIXTURE: &str = "tests/fixtures/two_pages.cbr";
#[allow(dead_code)]
pub const TEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Paths of a freshly created test directory.
#[allow(dead_code)]
pub struct TestDirs {
    pub base_dir: PathBuf,
    /// Where test archives are written
    pub input_dir: PathBuf,
    /// Where PDFs are written
    pub output_dir: PathBuf,
    /// Root for extraction workspaces, so cleanup can be verified
    pub workspace_dir: PathBuf,
}

/// Creates a clean, uniquely named test directory with input, output and workspace
/// subdirectories.
#[allow(dead_code)]
pub async fn setup_test_dirs(sub_path: &str) -> TestDirs {
    let rand_string: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    let base_dir = PathBuf::from(TEST_TMP_DIR).join(format!("{}-{}", sub_path, rand_string));
    if base_dir.exists() {
        fs::remove_dir_all(&base_dir).await.unwrap();
    }

    let dirs = TestDirs {
        input_dir: base_dir.join("input"),
        output_dir: base_dir.join("output"),
        workspace_dir: base_dir.join("workspaces"),
        base_dir,
    };
    fs::create_dir_all(&dirs.input_dir).await.unwrap();
    fs::create_dir_all(&dirs.output_dir).await.unwrap();
    fs::create_dir_all(&dirs.workspace_dir).await.unwrap();
    dirs
}

/// Removes a test directory created by [`setup_test_dirs`].
#[allow(dead_code)]
pub async fn cleanup_test_dir(dirs: TestDirs) {
    let _ = fs::remove_dir_all(&dirs.base_dir).await;
}

/// Encodes a solid-colour RGB image in the given format.
#[allow(dead_code)]
pub fn solid_image_bytes(width: u32, height: u32, color: Rgb<u8>, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, color);
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, format).unwrap();
    bytes.into_inner()
}

/// A small red PNG page.
#[allow(dead_code)]
pub fn png_page() -> Vec<u8> {
    solid_image_bytes(40, 60, Rgb([255, 0, 0]), ImageFormat::Png)
}

/// A small grey JPEG page.
#[allow(dead_code)]
pub fn jpeg_page() -> Vec<u8> {
    solid_image_bytes(40, 60, Rgb([128, 128, 128]), ImageFormat::Jpeg)
}

/// A fully transparent RGBA PNG whose hidden colour is black.
#[allow(dead_code)]
pub fn transparent_png_page() -> Vec<u8> {
    let img = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 0]));
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, ImageFormat::Png).unwrap();
    bytes.into_inner()
}

/// Bytes carrying an image extension but no decodable content.
#[allow(dead_code)]
pub fn corrupted_page() -> Vec<u8> {
    b"\x89PNG\r\n\x1a\nthis is not really a png".to_vec()
}

/// Writes a CBZ archive containing the given `(entry name, bytes)` pairs.
///
/// Entry names ending in `/` are written as directories.
#[allow(dead_code)]
pub fn create_cbz(path: &Path, entries: &[(&str, Vec<u8>)]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    for (name, bytes) in entries {
        if name.ends_with('/') {
            zip.add_directory(*name, options).unwrap();
        } else {
            zip.start_file(*name, options).unwrap();
            zip.write_all(bytes).unwrap();
        }
    }
    zip.finish().unwrap();
}

/// Writes a file that has a `.cbz` extension but is not a ZIP archive.
#[allow(dead_code)]
pub fn create_invalid_cbz(path: &Path) {
    std::fs::write(path, b"definitely not a zip archive").unwrap();
}

/// Number of pages in the PDF at `path`.
#[allow(dead_code)]
pub fn pdf_page_count(path: &Path) -> usize {
    let doc = lopdf::Document::load(path).unwrap();
    doc.get_pages().len()
}

/// `MediaBox` width and height of the first page.
#[allow(dead_code)]
pub fn first_page_size(path: &Path) -> (f32, f32) {
    let doc = lopdf::Document::load(path).unwrap();
    let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
    let page = doc.get_dictionary(page_id).unwrap();
    let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
    let number = |obj: &lopdf::Object| match obj {
        lopdf::Object::Integer(i) => *i as f32,
        lopdf::Object::Real(r) => *r as f32,
        other => panic!("unexpected MediaBox value {:?}", other),
    };
    (number(&media_box[2]), number(&media_box[3]))
}

/// Whether a directory exists and has no entries.
#[allow(dead_code)]
pub fn dir_is_empty(path: &Path) -> bool {
    std::fs::read_dir(path).unwrap().next().is_none()
}
