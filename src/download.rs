//! Gallery scraping and poster downloads
//!
//! Files are named by a protocol the keeper selector depends on:
//! `{title}.{number}.{ext}` when a title has several candidates and
//! `{title}.{ext}` when it has exactly one. `number` is the 1-based
//! position of the image on the gallery page.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::extract::{candidate_images, PageExtractor};
use crate::fetch::Fetch;
use crate::thumbnail::{known_extension, sniffed_extension, thumbnail_to_file};
use crate::types::{report_skips, ResolvedTitle, SkipReason, Skipped};
use crate::utils::{display_path, display_url};

/// Used when neither the URL nor the bytes name a writable format
const FALLBACK_EXTENSION: &str = "png";

/// Everything the download phase wrote or gave up on
#[derive(Debug, Default)]
pub struct DownloadSummary {
    pub saved: Vec<PathBuf>,
    pub skipped: Vec<Skipped>,
}

/// File name for one poster candidate
///
/// `number` is `None` when the title has a single candidate.
pub fn poster_filename(title: &str, number: Option<usize>, extension: &str) -> String {
    match number {
        Some(n) => format!("{}.{}.{}", title, n, extension),
        None => format!("{}.{}", title, extension),
    }
}

/// Suffix after the final `.` of the URL's last path segment
pub fn url_extension(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path.rsplit('/').next().unwrap_or(path);
    segment
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
}

fn choose_extension(url: &str, bytes: &[u8]) -> String {
    if let Some(ext) = url_extension(url).and_then(known_extension) {
        return ext;
    }
    let sniffed = sniffed_extension(bytes).unwrap_or(FALLBACK_EXTENSION);
    log::info!("no usable extension in {}, saving as .{}", url, sniffed);
    sniffed.to_string()
}

fn download_image(
    client: &dyn Fetch,
    config: &Config,
    url: &str,
    title: &str,
    number: Option<usize>,
) -> Result<PathBuf, SkipReason> {
    let bytes = client.fetch_binary(url).map_err(|source| SkipReason::Fetch {
        url: url.to_string(),
        source,
    })?;

    let extension = choose_extension(url, &bytes);
    let path = config
        .posters_dir
        .join(poster_filename(title, number, &extension));

    thumbnail_to_file(&bytes, config.bounds(), &path)?;
    Ok(path)
}

/// Download every candidate poster for one title
///
/// Only a failed gallery fetch fails the title. A failed image is recorded
/// in `summary` and the remaining images are still attempted.
pub fn download_title(
    client: &dyn Fetch,
    extractor: &dyn PageExtractor,
    config: &Config,
    resolved: &ResolvedTitle,
    summary: &mut DownloadSummary,
) -> Result<(), SkipReason> {
    let html = client
        .fetch_text(&resolved.gallery_url)
        .map_err(|source| SkipReason::Fetch {
            url: resolved.gallery_url.clone(),
            source,
        })?;

    let images = candidate_images(extractor, &html);
    log::debug!(
        "{} candidate images for {} ({}, from {})",
        images.len(),
        resolved.title,
        resolved.code,
        resolved.detail_url
    );
    if images.is_empty() {
        eprintln!("\tNo images found for {}", resolved.title);
    }

    let numbered = images.len() > 1;
    for (i, url) in images.iter().enumerate() {
        if !config.quiet {
            println!("\t\tDownloading image {}", display_url(url, config.plain));
        }

        let number = numbered.then_some(i + 1);
        match download_image(client, config, url, &resolved.title, number) {
            Ok(path) => {
                if !config.quiet {
                    println!("\t\tSaved {}", display_path(&path, config.plain));
                }
                summary.saved.push(path);
            }
            Err(reason) => {
                eprintln!("\t\tSkipping image {}: {}", url, reason);
                summary.skipped.push(Skipped::new(url.as_str(), reason));
            }
        }
    }

    Ok(())
}

/// Download posters for every resolved title into the posters directory
///
/// The directory must already exist.
pub fn download_all(
    client: &dyn Fetch,
    extractor: &dyn PageExtractor,
    config: &Config,
    titles: &[ResolvedTitle],
) -> DownloadSummary {
    let total = titles.len();
    let mut summary = DownloadSummary::default();

    for (i, resolved) in titles.iter().enumerate() {
        if !config.quiet {
            println!(
                "({} / {}) Downloading posters for {} at {}",
                i + 1,
                total,
                resolved.title,
                display_url(&resolved.gallery_url, config.plain)
            );
        }

        if let Err(reason) = download_title(client, extractor, config, resolved, &mut summary) {
            eprintln!("\tSkipping {}: {}", resolved.title, reason);
            summary
                .skipped
                .push(Skipped::new(resolved.gallery_url.as_str(), reason));
        }
    }

    if !config.quiet {
        println!(
            "Saved {} posters to {}",
            summary.saved.len(),
            display_path(&config.posters_dir, config.plain)
        );
    }
    report_skips("Download", &summary.skipped);

    summary
}

/// Check the posters directory exists before anything is fetched
pub fn ensure_posters_dir(dir: &Path) -> anyhow::Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("Posters directory {} does not exist", dir.display());
    }
    Ok(())
}
