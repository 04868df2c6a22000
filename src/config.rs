//! Build configuration module.
//!
//! Handles loading and validating `sitepack.toml`. The config is the single
//! owner of every cross-stage artifact name: the script and style stages
//! write files whose names come from here, and the markup stage rewrites
//! references through the same fields. No stage carries a literal filename
//! of its own, so the stages cannot drift apart.
//!
//! ## Config File Location
//!
//! Place `sitepack.toml` in the source directory. The file is optional —
//! every field has a default matching the conventional site layout:
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! output = "local"               # Output directory (relative to source)
//!
//! script_entry = "index.js"      # JS entry point, bundled + minified
//! script_bundle = "index.min.js" # Bundled output filename
//!
//! style_entry = "style.css"      # CSS entry point
//! style_output = "style.min.css" # Compiled output filename
//!
//! favicon = "favicon.ico"        # Copied + injected into markup if present
//! images_dir = "images"          # Copied if present; also receives url() assets
//! data_dir = "json"              # Structured-data directory, copied if present
//!
//! hash_assets = false            # Content-hash url() asset filenames
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse — override just the values you want. Unknown keys
//! are rejected to catch typos early.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Name of the optional config file looked up in the source directory.
pub const CONFIG_FILENAME: &str = "sitepack.toml";

/// Build configuration loaded from `sitepack.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Output directory, relative to the source directory.
    pub output: String,
    /// JavaScript entry point filename.
    pub script_entry: String,
    /// Filename of the bundled, minified script written to the output dir.
    pub script_bundle: String,
    /// CSS entry point filename.
    pub style_entry: String,
    /// Filename of the compiled, minified stylesheet written to the output dir.
    pub style_output: String,
    /// Favicon filename. Copied if present; always injected into markup.
    pub favicon: String,
    /// Images directory name. Copied if present; `url()` assets referenced
    /// from stylesheets are also placed here.
    pub images_dir: String,
    /// Structured-data directory name (JSON payloads etc.). Copied if present.
    pub data_dir: String,
    /// Content-hash the filenames of `url()` assets copied by the style
    /// stage. Off by default: hashed names break byte-level idempotence of
    /// the build, which plain names guarantee.
    pub hash_assets: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output: "local".to_string(),
            script_entry: "index.js".to_string(),
            script_bundle: "index.min.js".to_string(),
            style_entry: "style.css".to_string(),
            style_output: "style.min.css".to_string(),
            favicon: "favicon.ico".to_string(),
            images_dir: "images".to_string(),
            data_dir: "json".to_string(),
            hash_assets: false,
        }
    }
}

impl BuildConfig {
    /// Load config from `sitepack.toml` in `source_dir`, or defaults if the
    /// file doesn't exist. The loaded config is validated.
    pub fn load(source_dir: &Path) -> Result<Self, ConfigError> {
        let path = source_dir.join(CONFIG_FILENAME);
        let config = if path.exists() {
            let content = fs::read_to_string(&path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate config values.
    ///
    /// Filename fields must be bare names — path separators would let one
    /// stage write outside the shared output tree the others assume.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let filenames = [
            ("script_entry", &self.script_entry),
            ("script_bundle", &self.script_bundle),
            ("style_entry", &self.style_entry),
            ("style_output", &self.style_output),
            ("favicon", &self.favicon),
            ("images_dir", &self.images_dir),
            ("data_dir", &self.data_dir),
        ];
        for (key, value) in filenames {
            if value.is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
            if value.contains('/') || value.contains('\\') {
                return Err(ConfigError::Validation(format!(
                    "{key} must be a bare filename, got '{value}'"
                )));
            }
        }
        if self.output.is_empty() || self.output == "." {
            return Err(ConfigError::Validation(
                "output must name a directory distinct from the source".into(),
            ));
        }
        Ok(())
    }
}

/// Stock config file with all options documented, for `sitepack gen-config`.
pub fn stock_config_toml() -> String {
    r#"# sitepack configuration. Every option is optional; the values below
# are the defaults. Unknown keys are rejected.

# Output directory, relative to the source directory.
output = "local"

# JavaScript: entry point and the name of the bundled, minified output.
# Relative static imports of the entry are inlined into the bundle.
script_entry = "index.js"
script_bundle = "index.min.js"

# CSS: entry point and the name of the compiled, minified output.
# @imports are inlined, nested selectors flattened, url() assets copied.
style_entry = "style.css"
style_output = "style.min.css"

# Favicon filename. Copied to the output root if present in the source
# directory. Markup processing always injects a link to it.
favicon = "favicon.ico"

# Asset directories, copied recursively if present (absence is not an
# error). url() assets referenced from stylesheets also land in images_dir.
images_dir = "images"
data_dir = "json"

# Content-hash the filenames of url() assets copied by the style stage
# (cache busting). Leave off for byte-identical rebuilds.
hash_assets = false
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_no_config_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = BuildConfig::load(tmp.path()).unwrap();
        assert_eq!(config.output, "local");
        assert_eq!(config.script_bundle, "index.min.js");
        assert_eq!(config.style_output, "style.min.css");
        assert!(!config.hash_assets);
    }

    #[test]
    fn partial_config_overrides_only_named_fields() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(CONFIG_FILENAME),
            "output = \"dist\"\nhash_assets = true\n",
        )
        .unwrap();
        let config = BuildConfig::load(tmp.path()).unwrap();
        assert_eq!(config.output, "dist");
        assert!(config.hash_assets);
        // untouched fields keep defaults
        assert_eq!(config.style_entry, "style.css");
        assert_eq!(config.data_dir, "json");
    }

    #[test]
    fn unknown_keys_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILENAME), "outpt = \"dist\"\n").unwrap();
        let err = BuildConfig::load(tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn filename_with_separator_rejected() {
        let config = BuildConfig {
            favicon: "icons/favicon.ico".to_string(),
            ..BuildConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn empty_filename_rejected() {
        let config = BuildConfig {
            style_entry: String::new(),
            ..BuildConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn dot_output_rejected() {
        let config = BuildConfig {
            output: ".".to_string(),
            ..BuildConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let parsed: BuildConfig = toml::from_str(&stock_config_toml()).unwrap();
        let defaults = BuildConfig::default();
        assert_eq!(parsed.output, defaults.output);
        assert_eq!(parsed.script_entry, defaults.script_entry);
        assert_eq!(parsed.script_bundle, defaults.script_bundle);
        assert_eq!(parsed.style_entry, defaults.style_entry);
        assert_eq!(parsed.style_output, defaults.style_output);
        assert_eq!(parsed.favicon, defaults.favicon);
        assert_eq!(parsed.images_dir, defaults.images_dir);
        assert_eq!(parsed.data_dir, defaults.data_dir);
        assert_eq!(parsed.hash_assets, defaults.hash_assets);
    }
}
