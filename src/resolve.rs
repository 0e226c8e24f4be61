use crate::config::Config;
use crate::extract::{sanitize_title, PageExtractor};
use crate::fetch::Fetch;
use crate::types::{report_skips, ResolvedTitle, SkipReason, Skipped};
use crate::utils::display_url;

/// Resolve one identifier to its display title and gallery page
pub fn resolve_title(
    client: &dyn Fetch,
    extractor: &dyn PageExtractor,
    config: &Config,
    code: &str,
) -> Result<ResolvedTitle, SkipReason> {
    let detail_url = config.detail_url(code);

    let html = client
        .fetch_text(&detail_url)
        .map_err(|source| SkipReason::Fetch {
            url: detail_url.clone(),
            source,
        })?;

    let (raw_title, fragment) = extractor.detail_fields(&html);
    let raw_title = raw_title.ok_or(SkipReason::MissingTitle)?;
    let title = sanitize_title(&raw_title);
    if title.is_empty() {
        return Err(SkipReason::EmptyTitle(raw_title));
    }

    let fragment = fragment.ok_or(SkipReason::MissingGallery)?;
    let gallery_url = format!("{}{}", detail_url, fragment);

    Ok(ResolvedTitle {
        code: code.to_string(),
        detail_url,
        gallery_url,
        title,
    })
}

/// Resolve every identifier, skipping the ones that fail
pub fn resolve_all(
    client: &dyn Fetch,
    extractor: &dyn PageExtractor,
    config: &Config,
    codes: &[String],
) -> (Vec<ResolvedTitle>, Vec<Skipped>) {
    let total = codes.len();
    let mut resolved = Vec::new();
    let mut skipped = Vec::new();

    for (i, code) in codes.iter().enumerate() {
        if !config.quiet {
            let url = display_url(&config.detail_url(code), config.plain);
            println!("({} / {}) Finding media for {}", i + 1, total, url);
        }

        match resolve_title(client, extractor, config, code) {
            Ok(title) => {
                if !config.quiet {
                    println!("\tTitle: \"{}\"", title.title);
                    println!(
                        "\tMedia found at {}",
                        display_url(&title.gallery_url, config.plain)
                    );
                }
                resolved.push(title);
            }
            Err(reason) => {
                eprintln!("\tSkipping {}: {}", code, reason);
                skipped.push(Skipped::new(code.as_str(), reason));
            }
        }
    }

    if !config.quiet {
        println!("Resolved {} of {} codes", resolved.len(), total);
    }
    report_skips("Resolve", &skipped);

    (resolved, skipped)
}
