//! Script bundling — stage 1 of the build pipeline.
//!
//! Bundles one JavaScript entry point into one minified, self-executing file.
//! Relative static imports (`./x.js`, `../lib/y.js`) are inlined recursively,
//! each module exactly once in depth-first order, so a module's code always
//! runs before the code that imported it. `export` keywords are stripped from
//! inlined declarations; since every module lands in the same IIFE scope, the
//! declared names stay visible to their importers.
//!
//! Bare specifiers (`import "lodash"`) are an error: the bundle must be
//! self-contained and there is no package resolution here. Minification is
//! delegated to `minify-js`; a syntax error anywhere in the module graph
//! aborts the whole build.
//!
//! No source map is produced.

use crate::config::BuildConfig;
use minify_js::{minify, Session, TopLevelMode};
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Script entry point not found: {0}")]
    MissingEntry(PathBuf),
    #[error("Cannot resolve import '{specifier}' from {from}")]
    UnresolvedImport { specifier: String, from: PathBuf },
    #[error("Bare import '{specifier}' in {from} — only relative imports are bundled")]
    BareImport { specifier: String, from: PathBuf },
    #[error("Script minification failed: {0}")]
    Minify(String),
}

/// Result summary for the script stage.
#[derive(Debug)]
pub struct ScriptReport {
    /// Output filename (relative to the output directory).
    pub bundle: String,
    /// Source paths of every inlined module, entry last (execution order).
    pub modules: Vec<PathBuf>,
    pub input_bytes: usize,
    pub output_bytes: usize,
}

/// Bundle and minify the configured script entry point into
/// `<output_dir>/<script_bundle>`. Overwrites any existing file.
pub fn bundle(
    config: &BuildConfig,
    source_dir: &Path,
    output_dir: &Path,
) -> Result<ScriptReport, ScriptError> {
    let entry = source_dir.join(&config.script_entry);
    if !entry.exists() {
        return Err(ScriptError::MissingEntry(entry));
    }

    let mut inliner = Inliner::new();
    let mut bundle = String::new();
    inliner.inline(&entry, &mut bundle)?;

    let iife = format!("(() => {{\n{bundle}\n}})();\n");

    let session = Session::new();
    let mut minified = Vec::new();
    minify(&session, TopLevelMode::Global, iife.as_bytes(), &mut minified)
        .map_err(|e| ScriptError::Minify(format!("{e:?}")))?;

    fs::create_dir_all(output_dir)?;
    fs::write(output_dir.join(&config.script_bundle), &minified)?;

    Ok(ScriptReport {
        bundle: config.script_bundle.clone(),
        modules: inliner.order,
        input_bytes: inliner.input_bytes,
        output_bytes: minified.len(),
    })
}

/// Recursive module inliner over relative static imports.
struct Inliner {
    import_re: Regex,
    export_list_re: Regex,
    export_prefix_re: Regex,
    visited: BTreeSet<PathBuf>,
    order: Vec<PathBuf>,
    input_bytes: usize,
}

impl Inliner {
    fn new() -> Self {
        Self {
            // Whole-line static imports: `import "./x.js";` and
            // `import { a } from "./x.js";` (also default and namespace forms).
            import_re: Regex::new(
                r#"(?m)^\s*import\s+(?:[^'"\n]*?\bfrom\s+)?["']([^"'\n]+)["']\s*;?[^\S\n]*$"#,
            )
            .unwrap(),
            // `export { a, b };` and re-export lists — dropped entirely, the
            // names are already in scope after inlining.
            export_list_re: Regex::new(
                r#"(?m)^\s*export\s*\{[^}]*\}\s*(?:from\s*["'][^"'\n]+["'])?\s*;?[^\S\n]*$"#,
            )
            .unwrap(),
            // `export const x = …` / `export default function f() {…}` —
            // keep the declaration, drop the keyword(s).
            export_prefix_re: Regex::new(r"(?m)^(\s*)export\s+(?:default\s+)?").unwrap(),
            visited: BTreeSet::new(),
            order: Vec::new(),
            input_bytes: 0,
        }
    }

    /// Inline `path` and its transitive relative imports into `out`.
    /// Dependencies are emitted before the module body that imports them.
    /// A module already visited is skipped (this also terminates cycles).
    fn inline(&mut self, path: &Path, out: &mut String) -> Result<(), ScriptError> {
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if !self.visited.insert(canonical) {
            return Ok(());
        }

        let text = fs::read_to_string(path)?;
        self.input_bytes += text.len();

        let specifiers: Vec<String> = self
            .import_re
            .captures_iter(&text)
            .map(|c| c[1].to_string())
            .collect();
        for specifier in specifiers {
            let target = self.resolve(&specifier, path)?;
            self.inline(&target, out)?;
        }

        let body = self.import_re.replace_all(&text, "");
        let body = self.export_list_re.replace_all(&body, "");
        let body = self.export_prefix_re.replace_all(&body, "$1");
        out.push_str(body.trim_end());
        out.push('\n');

        self.order.push(path.to_path_buf());
        Ok(())
    }

    /// Resolve an import specifier relative to the importing module.
    /// Extensionless specifiers get `.js` appended as a fallback.
    fn resolve(&self, specifier: &str, from: &Path) -> Result<PathBuf, ScriptError> {
        if !specifier.starts_with("./") && !specifier.starts_with("../") {
            return Err(ScriptError::BareImport {
                specifier: specifier.to_string(),
                from: from.to_path_buf(),
            });
        }
        let base = from.parent().unwrap_or_else(|| Path::new("."));
        let direct = base.join(specifier);
        if direct.is_file() {
            return Ok(direct);
        }
        let with_ext = base.join(format!("{specifier}.js"));
        if with_ext.is_file() {
            return Ok(with_ext);
        }
        Err(ScriptError::UnresolvedImport {
            specifier: specifier.to_string(),
            from: from.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildConfig;
    use tempfile::TempDir;

    fn bundle_site(files: &[(&str, &str)]) -> (TempDir, String) {
        let tmp = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(tmp.path().join(name), content).unwrap();
        }
        let config = BuildConfig::default();
        let out_dir = tmp.path().join(&config.output);
        let report = bundle(&config, tmp.path(), &out_dir).unwrap();
        let output = fs::read_to_string(out_dir.join(&report.bundle)).unwrap();
        (tmp, output)
    }

    #[test]
    fn inlines_relative_imports() {
        let (_tmp, out) = bundle_site(&[
            (
                "index.js",
                "import { greet } from \"./util.js\";\nconsole.log(greet());\n",
            ),
            (
                "util.js",
                "export function greet() { return \"hello from util\"; }\n",
            ),
        ]);
        assert!(out.contains("hello from util"));
        assert!(!out.contains("import"));
        assert!(!out.contains("export"));
    }

    #[test]
    fn module_inlined_once_in_diamond_graph() {
        let (_tmp, out) = bundle_site(&[
            (
                "index.js",
                "import \"./a.js\";\nimport \"./b.js\";\nconsole.log(\"entry\");\n",
            ),
            ("a.js", "import \"./shared.js\";\nconsole.log(\"a\");\n"),
            ("b.js", "import \"./shared.js\";\nconsole.log(\"b\");\n"),
            ("shared.js", "console.log(\"shared-marker\");\n"),
        ]);
        assert_eq!(out.matches("shared-marker").count(), 1);
    }

    #[test]
    fn side_effect_import_runs_before_importer() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("index.js"),
            "import \"./setup.js\";\nconsole.log(\"main\");\n",
        )
        .unwrap();
        fs::write(tmp.path().join("setup.js"), "console.log(\"setup\");\n").unwrap();
        let config = BuildConfig::default();
        let out_dir = tmp.path().join(&config.output);
        let report = bundle(&config, tmp.path(), &out_dir).unwrap();
        // entry is last in execution order
        assert_eq!(report.modules.len(), 2);
        assert!(report.modules[0].ends_with("setup.js"));
        assert!(report.modules[1].ends_with("index.js"));
        let out = fs::read_to_string(out_dir.join(&report.bundle)).unwrap();
        let setup_pos = out.find("setup").unwrap();
        let main_pos = out.find("main").unwrap();
        assert!(setup_pos < main_pos);
    }

    #[test]
    fn extensionless_import_resolves_with_js_appended() {
        let (_tmp, out) = bundle_site(&[
            ("index.js", "import { x } from \"./util\";\nconsole.log(x);\n"),
            ("util.js", "export const x = \"found-me\";\n"),
        ]);
        assert!(out.contains("found-me"));
    }

    #[test]
    fn bare_import_is_an_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("index.js"), "import \"lodash\";\n").unwrap();
        let config = BuildConfig::default();
        let err = bundle(&config, tmp.path(), &tmp.path().join("local")).unwrap_err();
        assert!(matches!(err, ScriptError::BareImport { .. }));
    }

    #[test]
    fn unresolved_import_is_an_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("index.js"), "import \"./missing.js\";\n").unwrap();
        let config = BuildConfig::default();
        let err = bundle(&config, tmp.path(), &tmp.path().join("local")).unwrap_err();
        assert!(matches!(err, ScriptError::UnresolvedImport { .. }));
    }

    #[test]
    fn missing_entry_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let config = BuildConfig::default();
        let err = bundle(&config, tmp.path(), &tmp.path().join("local")).unwrap_err();
        assert!(matches!(err, ScriptError::MissingEntry(_)));
    }

    #[test]
    fn syntax_error_aborts() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("index.js"), "function { nope\n").unwrap();
        let config = BuildConfig::default();
        let err = bundle(&config, tmp.path(), &tmp.path().join("local")).unwrap_err();
        assert!(matches!(err, ScriptError::Minify(_)));
    }

    #[test]
    fn output_is_minified() {
        let (_tmp, out) = bundle_site(&[(
            "index.js",
            "// a comment that should disappear\nconst message   =   \"kept\";\nconsole.log(message);\n",
        )]);
        assert!(!out.contains("a comment that should disappear"));
        assert!(out.contains("kept"));
    }

    #[test]
    fn overwrites_existing_bundle() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("index.js"), "console.log(\"fresh\");\n").unwrap();
        let config = BuildConfig::default();
        let out_dir = tmp.path().join(&config.output);
        fs::create_dir_all(&out_dir).unwrap();
        fs::write(out_dir.join(&config.script_bundle), "stale").unwrap();
        bundle(&config, tmp.path(), &out_dir).unwrap();
        let out = fs::read_to_string(out_dir.join(&config.script_bundle)).unwrap();
        assert!(out.contains("fresh"));
        assert!(!out.contains("stale"));
    }
}
