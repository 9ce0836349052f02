use crate::error::{Error, Result};
use crate::generator::{Generator, PageOptions};
use crate::path_utils::path_to_string_lossy;
use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageReader, Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tokio::task::spawn_blocking;

const POINTS_PER_INCH: f32 = 72.0;
const PAGE_IMAGE_NAME: &[u8] = b"Im0";

/// One page ready to be embedded: the JPEG stream plus its geometry.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub source: PathBuf,
    pub width_px: u32,
    pub height_px: u32,
    pub jpeg: Vec<u8>,
}

impl RenderedPage {
    /// Page size in PDF points at the given resolution.
    pub fn size_in_points(&self, dpi: f32) -> (f32, f32) {
        (
            self.width_px as f32 * POINTS_PER_INCH / dpi,
            self.height_px as f32 * POINTS_PER_INCH / dpi,
        )
    }
}

/// A generator for PDF documents with one full-bleed image per page.
///
/// Pages are decoded and encoded as they are added; the `lopdf` object tree is only built
/// when the document is saved.
#[derive(Debug)]
pub struct PdfGenerator {
    output_path: PathBuf,
    options: PageOptions,
    pages: Vec<RenderedPage>,
    attempted: usize,
}

impl PdfGenerator {
    /// Number of `add_page` calls, successful or not.
    pub fn attempted(&self) -> usize {
        self.attempted
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Decodes one image and turns it into an embeddable page. Blocking.
    pub fn render_page(image_path: &Path, options: PageOptions) -> Result<RenderedPage> {
        let image = ImageReader::open(image_path)?
            .with_guessed_format()?
            .decode()?;
        let (width_px, height_px) = image.dimensions();
        if width_px == 0 || height_px == 0 {
            return Err(Error::Other("Image has no pixels".to_string()));
        }

        let rgb = normalize_to_rgb(image, options.alpha_background);
        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, options.jpeg_quality).encode_image(&rgb)?;

        Ok(RenderedPage {
            source: image_path.to_path_buf(),
            width_px,
            height_px,
            jpeg,
        })
    }

    /// Builds the PDF object tree for `pages`, in order.
    pub fn build_document(pages: Vec<RenderedPage>, dpi: f32) -> Result<Document> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids = Vec::with_capacity(pages.len());

        for page in pages {
            let (width_pt, height_pt) = page.size_in_points(dpi);

            let image_dict = Dictionary::from_iter([
                ("Type", Object::Name(b"XObject".to_vec())),
                ("Subtype", Object::Name(b"Image".to_vec())),
                ("Width", Object::Integer(i64::from(page.width_px))),
                ("Height", Object::Integer(i64::from(page.height_px))),
                ("ColorSpace", Object::Name(b"DeviceRGB".to_vec())),
                ("BitsPerComponent", Object::Integer(8)),
                ("Filter", Object::Name(b"DCTDecode".to_vec())),
            ]);
            // Already DCT-encoded; must not be flate-compressed on top
            let image_id =
                doc.add_object(Stream::new(image_dict, page.jpeg).with_compression(false));

            let content = Content {
                operations: vec![
                    Operation::new("q", vec![]),
                    Operation::new(
                        "cm",
                        vec![
                            width_pt.into(),
                            Object::Integer(0),
                            Object::Integer(0),
                            height_pt.into(),
                            Object::Integer(0),
                            Object::Integer(0),
                        ],
                    ),
                    Operation::new("Do", vec![Object::Name(PAGE_IMAGE_NAME.to_vec())]),
                    Operation::new("Q", vec![]),
                ],
            };
            let content_bytes = content.encode()?;
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content_bytes));

            let resources = Dictionary::from_iter([(
                "XObject",
                Object::Dictionary(Dictionary::from_iter([(
                    PAGE_IMAGE_NAME.to_vec(),
                    Object::Reference(image_id),
                )])),
            )]);

            let page_id = doc.add_object(Dictionary::from_iter([
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                (
                    "MediaBox",
                    Object::Array(vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        width_pt.into(),
                        height_pt.into(),
                    ]),
                ),
                ("Contents", Object::Reference(content_id)),
                ("Resources", Object::Dictionary(resources)),
            ]));
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(Dictionary::from_iter([
                ("Type", Object::Name(b"Pages".to_vec())),
                ("Kids", Object::Array(kids)),
                ("Count", Object::Integer(count)),
            ])),
        );

        let catalog_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        doc.trailer.set("Root", Object::Reference(catalog_id));
        doc.compress();

        Ok(doc)
    }

    /// Serializes `doc` to `output` and checks the result is a non-empty file.
    ///
    /// A failed write removes whatever was partially written.
    fn write_document(mut doc: Document, output: &Path) -> Result<u64> {
        let write_error = |reason: String| Error::AssemblyWriteError {
            output: output.to_path_buf(),
            reason,
        };

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| write_error(format!("Cannot create {:?}: {}", parent, e)))?;
            }
        }

        let written = File::create(output)
            .map_err(|e| write_error(e.to_string()))
            .and_then(|file| {
                let mut writer = BufWriter::new(file);
                doc.save_to(&mut writer)
                    .map_err(|e| write_error(e.to_string()))?;
                writer.flush().map_err(|e| write_error(e.to_string()))
            });
        if let Err(e) = written {
            let _ = fs::remove_file(output);
            return Err(e);
        }

        match fs::metadata(output) {
            Ok(meta) if meta.len() > 0 => Ok(meta.len()),
            Ok(_) => {
                let _ = fs::remove_file(output);
                Err(write_error("Written file is empty".to_string()))
            }
            Err(e) => Err(write_error(format!(
                "Written file cannot be read back: {}",
                e
            ))),
        }
    }
}

#[async_trait]
impl Generator for PdfGenerator {
    fn new(output_path: &Path, options: PageOptions) -> Result<Self> {
        if !(options.dpi.is_finite() && options.dpi > 0.0) {
            return Err(Error::Other(format!("Invalid page resolution: {}", options.dpi)));
        }
        Ok(PdfGenerator {
            output_path: output_path.to_path_buf(),
            options: PageOptions {
                jpeg_quality: options.jpeg_quality.clamp(1, 100),
                ..options
            },
            pages: Vec::new(),
            attempted: 0,
        })
    }

    async fn add_page(&mut self, image_path: &Path) -> Result<&mut Self> {
        self.attempted += 1;
        let owned_path = image_path.to_path_buf();
        let options = self.options;

        let rendered = spawn_blocking(move || Self::render_page(&owned_path, options))
            .await
            .map_err(|e| Error::PageRenderError {
                image: image_path.to_path_buf(),
                reason: e.to_string(),
            })?
            .map_err(|e| Error::PageRenderError {
                image: image_path.to_path_buf(),
                reason: e.to_string(),
            })?;

        log::debug!(
            "Rendered page {} from '{}' ({}x{} px)",
            self.pages.len() + 1,
            path_to_string_lossy(image_path),
            rendered.width_px,
            rendered.height_px
        );
        self.pages.push(rendered);
        Ok(self)
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    async fn save(self) -> Result<u64> {
        if self.pages.is_empty() {
            return Err(Error::NoPagesRendered {
                attempted: self.attempted,
            });
        }

        let output = self.output_path;
        let target = output.clone();
        let dpi = self.options.dpi;
        let pages = self.pages;

        spawn_blocking(move || {
            let doc = Self::build_document(pages, dpi).map_err(|e| Error::AssemblyWriteError {
                output: target.clone(),
                reason: format!("Failed to build document: {}", e),
            })?;
            Self::write_document(doc, &target)
        })
        .await
        .map_err(|e| Error::AssemblyWriteError {
            output,
            reason: e.to_string(),
        })?
    }
}

/// Converts any decoded image to plain 8-bit RGB.
///
/// Without a background the alpha channel is simply dropped, keeping whatever colour the
/// decoder stored under transparent pixels. With a background, pixels are alpha-blended
/// over it first.
pub fn normalize_to_rgb(image: DynamicImage, background: Option<[u8; 3]>) -> RgbImage {
    match (image, background) {
        (DynamicImage::ImageRgb8(rgb), _) => rgb,
        (image, Some(background)) if image.color().has_alpha() => {
            let rgba = image.to_rgba8();
            let mut rgb = RgbImage::new(rgba.width(), rgba.height());
            for (x, y, pixel) in rgba.enumerate_pixels() {
                let [r, g, b, a] = pixel.0;
                rgb.put_pixel(
                    x,
                    y,
                    Rgb([
                        blend(r, background[0], a),
                        blend(g, background[1], a),
                        blend(b, background[2], a),
                    ]),
                );
            }
            rgb
        }
        (image, _) => image.to_rgb8(),
    }
}

fn blend(foreground: u8, background: u8, alpha: u8) -> u8 {
    let fg = foreground as u16 * alpha as u16;
    let bg = background as u16 * (255 - alpha) as u16;
    ((fg + bg + 127) / 255) as u8
}
