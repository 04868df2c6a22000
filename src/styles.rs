//! Style compilation — stage 2 of the build pipeline.
//!
//! Compiles one CSS entry point into one minified output file. The transform
//! order is fixed and matters:
//!
//! 1. **Import inlining** — the lightningcss [`Bundler`] resolves `@import`
//!    statements from the filesystem, so rules from partials take part in
//!    every later step.
//! 2. **URL rewriting** — a visitor walks every `url()` value (including
//!    those that arrived via imports), copies the referenced file into the
//!    images subdirectory of the output tree, and rewrites the reference.
//!    Filenames are preserved unless `hash_assets` is set, in which case an
//!    8-hex-digit content hash is infixed before the extension.
//! 3. **Nesting flattening + minification** — browser targets are pinned
//!    below native-nesting support, so nested selectors always compile away;
//!    the printer then emits minified CSS.
//!
//! External references (`http(s)://`, `data:`, protocol-relative, absolute
//! paths, bare fragments) are left untouched. A missing local asset is an
//! error — unlike the optional top-level asset directories, a stylesheet
//! reference is a promise the output must keep.

use crate::config::BuildConfig;
use lightningcss::{
    bundler::{Bundler, FileProvider},
    printer::PrinterOptions,
    rules::CssRule,
    stylesheet::{MinifyOptions, ParserOptions},
    targets::{Browsers, Targets},
    values::url::Url,
    visit_types,
    visitor::{Visit, VisitTypes, Visitor},
};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StyleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Style entry point not found: {0}")]
    MissingEntry(PathBuf),
    #[error("CSS error: {0}")]
    Css(String),
    #[error("Asset '{url}' referenced from {referenced_from} not found")]
    MissingAsset { url: String, referenced_from: PathBuf },
}

/// Result summary for the style stage.
#[derive(Debug)]
pub struct StyleReport {
    /// Output filename (relative to the output directory).
    pub output: String,
    /// Output filenames of `url()` assets copied into the images directory.
    pub assets: Vec<String>,
    pub output_bytes: usize,
}

/// Compile and minify the configured style entry point into
/// `<output_dir>/<style_output>`, copying `url()` assets into
/// `<output_dir>/<images_dir>`. Overwrites existing files.
pub fn compile(
    config: &BuildConfig,
    source_dir: &Path,
    output_dir: &Path,
) -> Result<StyleReport, StyleError> {
    let entry = source_dir.join(&config.style_entry);
    if !entry.exists() {
        return Err(StyleError::MissingEntry(entry));
    }

    let provider = FileProvider::new();
    let mut bundler = Bundler::new(&provider, None, ParserOptions::default());
    let mut stylesheet = bundler
        .bundle(&entry)
        .map_err(|e| StyleError::Css(e.to_string()))?;

    // Source file list is needed to resolve relative url()s back to the
    // partial that contained them, not the entry point.
    let sources = stylesheet.sources.clone();
    let mut rewriter = AssetRewriter {
        sources: &sources,
        images_dir: &config.images_dir,
        hash_assets: config.hash_assets,
        current_source: 0,
        copies: BTreeMap::new(),
    };
    stylesheet.visit(&mut rewriter)?;

    if !rewriter.copies.is_empty() {
        let assets_dir = output_dir.join(&config.images_dir);
        fs::create_dir_all(&assets_dir)?;
        for (src, name) in &rewriter.copies {
            fs::copy(src, assets_dir.join(name))?;
        }
    }

    stylesheet
        .minify(MinifyOptions {
            targets: compat_targets(),
            ..MinifyOptions::default()
        })
        .map_err(|e| StyleError::Css(e.to_string()))?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            targets: compat_targets(),
            ..PrinterOptions::default()
        })
        .map_err(|e| StyleError::Css(e.to_string()))?;

    fs::create_dir_all(output_dir)?;
    fs::write(output_dir.join(&config.style_output), result.code.as_bytes())?;

    Ok(StyleReport {
        output: config.style_output.clone(),
        assets: rewriter.copies.into_values().collect(),
        output_bytes: result.code.len(),
    })
}

/// Browser targets pinned below native CSS nesting support, so nested rules
/// are always flattened regardless of how new the author's syntax is.
fn compat_targets() -> Targets {
    Targets {
        browsers: Some(Browsers {
            chrome: Some(109 << 16),
            edge: Some(109 << 16),
            firefox: Some(109 << 16),
            safari: Some((15 << 16) | (6 << 8)),
            ios_saf: Some((15 << 16) | (6 << 8)),
            ..Browsers::default()
        }),
        ..Targets::default()
    }
}

/// Visitor that rewrites relative `url()` values to point into the images
/// directory and records which source files need copying there.
///
/// A `Url`'s own location carries no source-file information, so the visitor
/// also visits rules: every rule kind that can contain url() values records
/// its `source_index` before its children are walked, and url resolution
/// uses whichever file the enclosing rule came from. After bundling that is
/// the partial the url was written in, not the entry point.
struct AssetRewriter<'a> {
    sources: &'a [String],
    images_dir: &'a str,
    hash_assets: bool,
    /// Index into `sources` of the file that contained the rule currently
    /// being walked. 0 is the entry point.
    current_source: usize,
    /// Asset source path → output filename. BTreeMap keeps copy order stable.
    copies: BTreeMap<PathBuf, String>,
}

impl<'i> Visitor<'i> for AssetRewriter<'_> {
    type Error = StyleError;

    fn visit_types(&self) -> VisitTypes {
        visit_types!(RULES | URLS)
    }

    fn visit_rule(&mut self, rule: &mut CssRule<'i>) -> Result<(), Self::Error> {
        match rule {
            CssRule::Style(r) => self.current_source = r.loc.source_index as usize,
            CssRule::Media(r) => self.current_source = r.loc.source_index as usize,
            CssRule::Supports(r) => self.current_source = r.loc.source_index as usize,
            CssRule::FontFace(r) => self.current_source = r.loc.source_index as usize,
            CssRule::Keyframes(r) => self.current_source = r.loc.source_index as usize,
            CssRule::CounterStyle(r) => self.current_source = r.loc.source_index as usize,
            _ => {}
        }
        rule.visit_children(self)
    }

    fn visit_url(&mut self, url: &mut Url<'i>) -> Result<(), Self::Error> {
        let raw = url.url.as_ref();
        if is_external(raw) {
            return Ok(());
        }

        // Split off ?query / #fragment, carried over to the rewritten url.
        let split = raw.find(['?', '#']).unwrap_or(raw.len());
        let (path_part, suffix) = raw.split_at(split);
        let path_part = path_part.strip_prefix("./").unwrap_or(path_part);

        let referenced_from = self
            .sources
            .get(self.current_source)
            .map(PathBuf::from)
            .unwrap_or_default();
        let base = referenced_from
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let asset = base.join(path_part);
        if !asset.is_file() {
            return Err(StyleError::MissingAsset {
                url: raw.to_string(),
                referenced_from,
            });
        }

        let name = match self.copies.get(&asset) {
            Some(name) => name.clone(),
            None => {
                let name = self.output_name(&asset)?;
                self.copies.insert(asset, name.clone());
                name
            }
        };
        url.url = format!("{}/{}{}", self.images_dir, name, suffix).into();
        Ok(())
    }
}

impl AssetRewriter<'_> {
    /// Output filename for an asset: its own name, or `stem.<hash8>.ext`
    /// when content hashing is enabled.
    fn output_name(&self, asset: &Path) -> Result<String, StyleError> {
        let filename = asset
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !self.hash_assets {
            return Ok(filename);
        }
        let digest = Sha256::digest(fs::read(asset)?);
        let hash: String = format!("{digest:x}").chars().take(8).collect();
        Ok(match filename.rsplit_once('.') {
            Some((stem, ext)) => format!("{stem}.{hash}.{ext}"),
            None => format!("{filename}.{hash}"),
        })
    }
}

/// References the style stage must leave alone: remote URLs, data URIs,
/// protocol-relative and absolute paths, bare fragments.
fn is_external(url: &str) -> bool {
    url.is_empty()
        || url.starts_with('#')
        || url.starts_with('/')
        || url.starts_with("data:")
        || url.contains("://")
}
