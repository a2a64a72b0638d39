//! End-to-end run: generate frames, upload them, distribute the links.
//!
//! Generation order is the grouping invariant the sequencer relies on:
//! the outer loop walks quotes, the inner loop walks source images, so the
//! flat list is laid out as quote blocks of `images.len()` items.

use std::collections::HashSet;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use image::RgbaImage;
use tracing::{debug, info, warn};

use crate::compose;
use crate::distribute::{self, FragmentRenderer};
use crate::error::{QuotepressError, QuotepressResult};
use crate::model::{DEFAULT_LOGO_SIZE, JobSpec, MediaItem, VarianceMode};
use crate::sequence;
use crate::text::QuoteOverlay;
use crate::wp::ContentBackend;

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Counts reported after a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    pub generated: usize,
    pub uploaded: usize,
    pub failed_uploads: usize,
}

/// Recursively collect image files under `dir`, in traversal order.
pub fn collect_images(dir: &Path) -> QuotepressResult<Vec<PathBuf>> {
    let mut out = Vec::new();
    collect_images_into(dir, &mut out)?;
    Ok(out)
}

fn collect_images_into(dir: &Path, out: &mut Vec<PathBuf>) -> QuotepressResult<()> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("read dir '{}'", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("read dir entry in '{}'", dir.display()))?;
        let path = entry.path();
        if path.is_dir() {
            collect_images_into(&path, out)?;
            continue;
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        if let Some(ext) = ext
            && IMAGE_EXTENSIONS.contains(&ext.as_str())
        {
            out.push(path);
        }
    }
    Ok(())
}

/// Derives unique upload names by rotating through the keyword list,
/// appending further keywords on collision.
pub struct UploadNamer {
    base: String,
    keywords: Vec<String>,
    seed: u64,
    taken: HashSet<String>,
}

impl UploadNamer {
    pub fn new(base: impl Into<String>, keywords: Vec<String>, seed: u64) -> Self {
        Self {
            base: base.into(),
            keywords,
            seed,
            taken: HashSet::new(),
        }
    }

    pub fn next(&mut self, item_index: u64) -> String {
        let len = self.keywords.len() as u64;
        let mut k = (self.seed.wrapping_add(item_index) % len) as usize;
        let mut name = format!("{}_{}", self.base, self.keywords[k]);
        let mut appended = 0usize;
        while self.taken.contains(&name) {
            if appended > self.keywords.len() {
                name = format!("{}_{}", name, self.taken.len());
                break;
            }
            k = (k + 1) % self.keywords.len();
            name.push('_');
            name.push_str(&self.keywords[k]);
            appended += 1;
        }
        self.taken.insert(name.clone());
        name
    }
}

fn encode_png(frame: &RgbaImage) -> QuotepressResult<Vec<u8>> {
    let mut buf = Vec::new();
    frame
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(buf)
}

/// Run one job end to end.
///
/// The quote overlay is injected so callers own font loading; the CLI
/// builds a [`crate::text::QuoteTypesetter`] from the job's font file.
#[tracing::instrument(skip_all, fields(page_id = %spec.page_id))]
pub fn run_job(
    spec: &JobSpec,
    backend: &dyn ContentBackend,
    renderer: &dyn FragmentRenderer,
    overlay: &mut dyn QuoteOverlay,
) -> QuotepressResult<RunReport> {
    spec.validate()?;

    let image_paths = collect_images(Path::new(&spec.image_folder))?;
    if image_paths.is_empty() {
        return Err(QuotepressError::validation(format!(
            "no images found under '{}'",
            spec.image_folder
        )));
    }
    info!(
        images = image_paths.len(),
        quotes = spec.quotes.len(),
        total = image_paths.len() * spec.quotes.len(),
        "starting generation"
    );

    let logo_size = spec.logo_size.unwrap_or(DEFAULT_LOGO_SIZE);
    let logo = compose::resize(&compose::load_rgba(Path::new(&spec.logo_file))?, logo_size);
    let watermark = compose::load_rgba(Path::new(&spec.watermark_file))?;

    let bases: Vec<RgbaImage> = image_paths
        .iter()
        .map(|p| {
            compose::load_rgba(p).map(|img| compose::prepare_base(img, spec.image_size, &watermark))
        })
        .collect::<QuotepressResult<_>>()?;

    std::fs::create_dir_all(&spec.output_folder)
        .with_context(|| format!("create output dir '{}'", spec.output_folder))?;

    let mut namer = UploadNamer::new(&spec.image_name, spec.keywords.clone(), spec.seed);
    let mut items: Vec<MediaItem> = Vec::with_capacity(bases.len() * spec.quotes.len());
    let mut report = RunReport::default();

    for quote in &spec.quotes {
        for base in &bases {
            let index = report.generated as u64;
            report.generated += 1;

            let mut frame = base.clone();
            compose::paste_logo(&mut frame, &logo, spec.logo_corner, spec.seed, index);
            overlay.overlay_quote(&mut frame, quote)?;

            let file_name = format!("{}.png", namer.next(index));
            let bytes = encode_png(&frame)?;

            let out_path = Path::new(&spec.output_folder).join(&file_name);
            std::fs::write(&out_path, &bytes)
                .with_context(|| format!("write '{}'", out_path.display()))?;

            match backend.upload_media(&bytes, &file_name, &file_name) {
                Ok(upload) => {
                    debug!(file = %file_name, link = %upload.link, "uploaded");
                    report.uploaded += 1;
                    items.push(MediaItem::new(file_name, upload.link));
                }
                Err(e) => {
                    // Failed uploads are excluded from distribution rather
                    // than carried with an empty link.
                    warn!(file = %file_name, error = %e, "upload failed, item skipped");
                    report.failed_uploads += 1;
                }
            }
        }
    }

    let items = if report.failed_uploads == 0 {
        sequence::apply_variance(spec.variance, items, bases.len())?
    } else {
        if spec.variance == VarianceMode::DifferentQuote {
            warn!(
                failed = report.failed_uploads,
                "failed uploads broke the quote grouping; keeping generation order"
            );
        }
        items
    };

    let page_html = backend.get_content(&spec.page_id)?;
    let updated = distribute::distribute(
        &page_html,
        &spec.insertion_id,
        &items,
        &spec.count_attribute,
        renderer,
    )?;
    backend.update_content(&spec.page_id, &updated)?;

    info!(
        uploaded = report.uploaded,
        failed = report.failed_uploads,
        "page updated"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "quotepress_{name}_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ))
    }

    #[test]
    fn collect_images_filters_and_recurses() {
        let tmp = temp_dir("collect");
        std::fs::create_dir_all(tmp.join("sub")).unwrap();
        std::fs::write(tmp.join("a.png"), b"x").unwrap();
        std::fs::write(tmp.join("b.txt"), b"x").unwrap();
        std::fs::write(tmp.join("sub").join("c.JPG"), b"x").unwrap();

        let found = collect_images(&tmp).unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|p| {
            let ext = p.extension().unwrap().to_str().unwrap().to_lowercase();
            ext == "png" || ext == "jpg"
        }));

        std::fs::remove_dir_all(&tmp).ok();
    }

    #[test]
    fn collect_images_missing_dir_errors() {
        assert!(collect_images(Path::new("/definitely/not/here")).is_err());
    }

    #[test]
    fn namer_is_deterministic() {
        let keywords = vec!["calm".to_string(), "focus".to_string()];
        let mut a = UploadNamer::new("daily", keywords.clone(), 3);
        let mut b = UploadNamer::new("daily", keywords, 3);
        assert_eq!(a.next(0), b.next(0));
        assert_eq!(a.next(1), b.next(1));
    }

    #[test]
    fn namer_never_repeats() {
        let keywords = vec!["k".to_string()];
        let mut namer = UploadNamer::new("img", keywords, 0);
        let mut seen = HashSet::new();
        for i in 0..20 {
            assert!(seen.insert(namer.next(i)), "duplicate name at {i}");
        }
    }

    #[test]
    fn namer_rotates_keywords() {
        let keywords = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let mut namer = UploadNamer::new("img", keywords, 0);
        assert_eq!(namer.next(0), "img_a");
        assert_eq!(namer.next(1), "img_b");
        assert_eq!(namer.next(2), "img_c");
    }

    #[test]
    fn encode_png_roundtrips() {
        let frame = RgbaImage::from_pixel(2, 2, image::Rgba([1, 2, 3, 255]));
        let bytes = encode_png(&frame).unwrap();
        let back = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(back.dimensions(), (2, 2));
        assert_eq!(back.get_pixel(0, 0).0, [1, 2, 3, 255]);
    }
}
