// src/pipeline/images.rs

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::ImageFormat;
use tracing::{debug, info};

use crate::pipeline::cache::{hash_file, ContentCache};
use crate::pipeline::{util, BuildContext};

/// Cache file for image content hashes, relative to the project root.
const IMAGE_CACHE_PATH: &str = ".sitebuild/images.cache";

/// Optimize images into the final output root.
///
/// PNG and JPEG inputs are re-encoded; other formats are copied through.
/// A content-hash cache skips inputs that have not changed since the last
/// run, so a watch session only pays for the file that was edited.
pub fn run(ctx: &BuildContext) -> Result<()> {
    let src_root = ctx.source_root();
    let include = util::build_globset(&ctx.cfg.images.watch)?;
    let files = util::collect_matching_files(&src_root, &include, None)?;

    let out_dir = ctx.final_out().join(&ctx.cfg.images.dest);
    let mut cache = ContentCache::load(ctx.root.join(IMAGE_CACHE_PATH));

    let mut processed = 0usize;
    let mut skipped = 0usize;

    for file in &files {
        let rel = file.strip_prefix(&src_root).unwrap_or(file);
        let key = rel.to_string_lossy().replace('\\', "/");
        let dest = out_dir.join(util::strip_top_component(rel));

        let hash = hash_file(file)?;
        if cache.unchanged(&key, &hash) && dest.is_file() {
            debug!(image = %key, "content unchanged; skipping");
            skipped += 1;
            continue;
        }

        util::ensure_parent_dir(&dest)?;
        process_image(file, &dest, ctx.cfg.images.jpeg_quality)
            .with_context(|| format!("optimizing image {:?}", file))?;
        cache.insert(&key, hash);
        processed += 1;
    }

    cache.save()?;
    info!(processed, skipped, dest = ?out_dir, "images finished");
    Ok(())
}

fn process_image(src: &Path, dest: &Path, jpeg_quality: u8) -> Result<()> {
    let ext = src
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "png" => {
            let img = image::open(src).with_context(|| format!("decoding {:?}", src))?;
            img.save_with_format(dest, ImageFormat::Png)
                .with_context(|| format!("encoding {:?}", dest))?;
        }
        "jpg" | "jpeg" => {
            let img = image::open(src).with_context(|| format!("decoding {:?}", src))?;
            let file = File::create(dest).with_context(|| format!("creating {:?}", dest))?;
            let mut writer = BufWriter::new(file);
            let encoder = JpegEncoder::new_with_quality(&mut writer, jpeg_quality);
            img.write_with_encoder(encoder)
                .with_context(|| format!("encoding {:?}", dest))?;
        }
        _ => {
            fs::copy(src, dest)
                .with_context(|| format!("copying {:?} to {:?}", src, dest))?;
        }
    }

    Ok(())
}
