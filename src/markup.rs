//! Markup processing — stage 4 of the build pipeline.
//!
//! Minifies every top-level `.html` file in the source directory and
//! rewrites the tags that reference build artifacts:
//!
//! 1. Remove link tags referencing a legacy touch icon, a sized favicon
//!    (`favicon-NxN`), or a web manifest.
//! 2. Insert an icon link for the copied favicon immediately before the
//!    first stylesheet link.
//! 3. Replace the stylesheet link whose href names the unminified entry with
//!    one pointing at the compiled output, dropping any other attributes.
//! 4. Replace the `type="module"` script tag loading the unminified entry
//!    with a deferred script tag loading the bundle.
//!
//! Rewrites are structural, not textual: `lol_html` parses each document and
//! the handlers match elements by tag name and attribute predicates, so
//! attribute order and quoting never affect matching. The artifact names in
//! the injected tags come from [`BuildConfig`] — the same fields the earlier
//! stages wrote through.
//!
//! Files are processed one at a time, sorted by filename so the output and
//! the console report are deterministic. There is no per-file isolation: a
//! failure on any file aborts the whole build.

use crate::config::BuildConfig;
use lol_html::html_content::ContentType;
use lol_html::{element, rewrite_str, RewriteStrSettings};
use regex::Regex;
use std::cell::Cell;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarkupError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Minified markup is not valid UTF-8: {0}")]
    Encoding(String),
    #[error("Markup rewrite failed: {0}")]
    Rewrite(String),
}

/// One processed page, for reporting.
#[derive(Debug)]
pub struct PageReport {
    pub filename: String,
    pub input_bytes: usize,
    pub output_bytes: usize,
}

/// Result summary for the markup stage.
#[derive(Debug)]
pub struct MarkupReport {
    pub pages: Vec<PageReport>,
}

/// Minify and rewrite every top-level `.html` file in `source_dir`, writing
/// one output file per input under the same name in `output_dir`.
pub fn process(
    config: &BuildConfig,
    source_dir: &Path,
    output_dir: &Path,
) -> Result<MarkupReport, MarkupError> {
    fs::create_dir_all(output_dir)?;

    let mut filenames: Vec<String> = fs::read_dir(source_dir)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .filter(|e| e.path().is_file())
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| Path::new(name).extension().is_some_and(|ext| ext == "html"))
        .collect();
    filenames.sort();

    // Matches sized favicon references like favicon-32x32.png.
    let sized_favicon =
        Regex::new(r"(?i)favicon-\d+x\d+").map_err(|e| MarkupError::Rewrite(e.to_string()))?;

    let mut pages = Vec::new();
    for filename in filenames {
        let raw = fs::read_to_string(source_dir.join(&filename))?;
        let minified = minify(&raw)?;
        let rewritten = rewrite(&minified, config, &sized_favicon)?;
        fs::write(output_dir.join(&filename), &rewritten)?;
        pages.push(PageReport {
            filename,
            input_bytes: raw.len(),
            output_bytes: rewritten.len(),
        });
    }

    Ok(MarkupReport { pages })
}

/// Minify a document: collapse whitespace, strip comments, minify embedded
/// style and script content. Spec-compliant settings, so attribute quoting
/// survives for the rewrite pass.
fn minify(html: &str) -> Result<String, MarkupError> {
    let cfg = minify_html::Cfg {
        minify_css: true,
        minify_js: true,
        ..minify_html::Cfg::spec_compliant()
    };
    let out = minify_html::minify(html.as_bytes(), &cfg);
    String::from_utf8(out).map_err(|e| MarkupError::Encoding(e.to_string()))
}

/// Apply the tag rewrites. Handlers fire in document order; within one
/// element, removal is checked before injection so a removed legacy link can
/// never become the favicon anchor point.
fn rewrite(html: &str, config: &BuildConfig, sized_favicon: &Regex) -> Result<String, MarkupError> {
    let icon_link = format!(
        r#"<link rel="icon" type="image/x-icon" href="./{}">"#,
        config.favicon
    );
    let style_link = format!(r#"<link rel="stylesheet" href="./{}">"#, config.style_output);
    let script_tag = format!(r#"<script src="./{}" defer></script>"#, config.script_bundle);

    let icon_inserted = Cell::new(false);

    let handlers = vec![
        element!("link", |el| {
            let rel = el
                .get_attribute("rel")
                .unwrap_or_default()
                .to_ascii_lowercase();
            let href = el.get_attribute("href").unwrap_or_default();
            let href_lc = href.to_ascii_lowercase();

            let legacy = rel.contains("apple-touch-icon")
                || href_lc.contains("apple-touch-icon")
                || rel.split_ascii_whitespace().any(|t| t == "manifest")
                || sized_favicon.is_match(&href);
            if legacy {
                el.remove();
                return Ok(());
            }

            if rel == "stylesheet" {
                if !icon_inserted.get() {
                    el.before(&icon_link, ContentType::Html);
                    icon_inserted.set(true);
                }
                if local_name(&href) == Some(config.style_entry.as_str()) {
                    el.replace(&style_link, ContentType::Html);
                }
            }
            Ok(())
        }),
        element!("script", |el| {
            let is_module = el
                .get_attribute("type")
                .is_some_and(|t| t.eq_ignore_ascii_case("module"));
            let src = el.get_attribute("src").unwrap_or_default();
            if is_module && local_name(&src) == Some(config.script_entry.as_str()) {
                el.replace(&script_tag, ContentType::Html);
            }
            Ok(())
        }),
    ];

    // Bound before return so the settings temporary drops ahead of the
    // locals the handlers borrow.
    let rewritten = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: handlers,
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| MarkupError::Rewrite(e.to_string()));
    rewritten
}

/// Reduce an href/src to a top-level local filename: `./x`, `/x`, and `x`
/// all yield `x`. Anything remote or nested yields `None`.
fn local_name(reference: &str) -> Option<&str> {
    if reference.contains("://") || reference.starts_with("//") {
        return None;
    }
    let name = reference
        .strip_prefix("./")
        .or_else(|| reference.strip_prefix('/'))
        .unwrap_or(reference);
    if name.is_empty() || name.contains('/') {
        None
    } else {
        Some(name)
    }
}
