//! # sitepack
//!
//! A minimal build pipeline for hand-written static sites. Your source
//! directory is the site: one JavaScript entry, one CSS entry, top-level
//! HTML files, and optional asset directories. sitepack turns it into a
//! deployable output tree.
//!
//! # Architecture: Four-Stage Pipeline
//!
//! sitepack runs four stages strictly in sequence, all writing into one
//! output directory:
//!
//! ```text
//! 1. scripts   index.js    →  index.min.js     (bundle + minify)
//! 2. styles    style.css   →  style.min.css    (inline @imports, flatten
//!                                               nesting, copy url() assets,
//!                                               minify)
//! 3. assets    favicon/images/json  →  copied verbatim (skipped if absent)
//! 4. markup    *.html      →  minified + rewritten to reference the
//!                             artifacts the earlier stages produced
//! ```
//!
//! No stage catches its own errors: any failure aborts the run, the binary
//! prints one diagnostic line and exits nonzero. Files already written by
//! completed stages stay on disk.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `sitepack.toml` loading and validation; single owner of all cross-stage artifact names |
//! | [`scripts`] | Stage 1 — inlines relative imports, wraps in an IIFE, minifies |
//! | [`styles`] | Stage 2 — lightningcss bundling, nesting flattening, url() asset copying, minification |
//! | [`assets`] | Stage 3 — existence-checked copies of favicon and asset directories |
//! | [`markup`] | Stage 4 — HTML minification and structural tag rewriting |
//! | [`output`] | CLI output formatting — one line per completed stage/file |
//!
//! # Design Decisions
//!
//! ## Structural Tag Rewriting
//!
//! The markup stage parses each document with `lol_html` and matches tags by
//! name and attribute predicates instead of running regular expressions over
//! raw text. A stylesheet link is a stylesheet link whether its attributes
//! are reordered, requoted, or interleaved with others — the rewrite cannot
//! silently miss it.
//!
//! ## Artifact Names Are Configuration
//!
//! The stages are coupled only through filenames: markup must reference
//! exactly what scripts and styles wrote. Those names live in one place,
//! [`config::BuildConfig`], and every stage reads them from there. No stage
//! carries a literal artifact filename.
//!
//! ## Optional Assets Skip Silently
//!
//! A site without a favicon or a JSON directory is still a valid site. The
//! asset stage checks existence explicitly and skips what is missing;
//! nothing is inferred from a failed copy.
//!
//! ## Derived Output
//!
//! The output tree is a pure function of the source tree and the config.
//! Building twice over unchanged input produces byte-identical output —
//! unless `hash_assets` is enabled, which trades that guarantee for
//! cache-busting asset names.

use thiserror::Error;

pub mod assets;
pub mod config;
pub mod markup;
pub mod output;
pub mod scripts;
pub mod styles;

/// Umbrella error for a pipeline run. Every stage error converts into this
/// unmodified; nothing below `main` catches anything.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("{0}")]
    Config(#[from] config::ConfigError),
    #[error("{0}")]
    Script(#[from] scripts::ScriptError),
    #[error("{0}")]
    Style(#[from] styles::StyleError),
    #[error("{0}")]
    Asset(#[from] assets::AssetError),
    #[error("{0}")]
    Markup(#[from] markup::MarkupError),
}
