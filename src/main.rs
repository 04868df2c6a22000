use clap::{Parser, Subcommand};
use sitepack::config::{self, BuildConfig};
use sitepack::{assets, markup, output, scripts, styles, BuildError};
use std::path::{Path, PathBuf};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup — trivial, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "sitepack")]
#[command(about = "Build pipeline for hand-written static sites")]
#[command(long_about = "\
Build pipeline for hand-written static sites

Your source directory is the site. sitepack bundles and minifies the
JavaScript entry, compiles and minifies the CSS entry (inlining @imports,
flattening nested selectors, copying url() assets), copies static assets,
and minifies + rewrites every top-level HTML file to reference the built
artifacts.

Source layout (all names configurable via sitepack.toml):

  site/
  ├── sitepack.toml        # Build config (optional)
  ├── index.html           # Processed: minified, tags rewritten
  ├── about.html
  ├── index.js             # Bundled + minified → index.min.js
  ├── style.css            # Compiled + minified → style.min.css
  ├── favicon.ico          # Copied if present; link injected into markup
  ├── images/              # Copied if present
  └── json/                # Copied if present

Running with no subcommand builds the whole site into the output
directory (default: local/). Stages run strictly in sequence; the first
failure aborts the build with exit code 1.

Run 'sitepack gen-config' to print a documented sitepack.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Source directory
    #[arg(long, default_value = ".", global = true)]
    source: PathBuf,

    /// Output directory, relative to the source (overrides sitepack.toml)
    #[arg(long, global = true)]
    output: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline: scripts → styles → assets → markup (default)
    Build,
    /// Bundle and minify the JavaScript entry point
    Scripts,
    /// Compile and minify the stylesheet
    Styles,
    /// Copy favicon and asset directories
    Assets,
    /// Minify and rewrite top-level HTML files
    Markup,
    /// Print a stock sitepack.toml with all options documented
    GenConfig,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Build failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), BuildError> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Build);

    if let Command::GenConfig = command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let mut config = BuildConfig::load(&cli.source)?;
    if let Some(output) = cli.output {
        config.output = output;
        config.validate()?;
    }
    let output_dir = cli.source.join(&config.output);

    match command {
        Command::Build => build(&config, &cli.source, &output_dir)?,
        Command::Scripts => {
            let report = scripts::bundle(&config, &cli.source, &output_dir)?;
            output::print_script_report(&report);
        }
        Command::Styles => {
            let report = styles::compile(&config, &cli.source, &output_dir)?;
            output::print_style_report(&report);
        }
        Command::Assets => {
            let report = assets::copy(&config, &cli.source, &output_dir)?;
            output::print_asset_report(&report);
        }
        Command::Markup => {
            let report = markup::process(&config, &cli.source, &output_dir)?;
            output::print_markup_report(&report);
        }
        Command::GenConfig => unreachable!("handled above"),
    }

    Ok(())
}

/// Full pipeline, strictly sequential. Stage 4 references the filenames
/// stages 1 and 2 wrote; all of them come from the shared config.
fn build(config: &BuildConfig, source: &Path, output_dir: &Path) -> Result<(), BuildError> {
    println!("==> Stage 1: Bundling scripts");
    let script_report = scripts::bundle(config, source, output_dir)?;
    output::print_script_report(&script_report);

    println!("==> Stage 2: Compiling styles");
    let style_report = styles::compile(config, source, output_dir)?;
    output::print_style_report(&style_report);

    println!("==> Stage 3: Copying assets");
    let asset_report = assets::copy(config, source, output_dir)?;
    output::print_asset_report(&asset_report);

    println!("==> Stage 4: Processing markup");
    let markup_report = markup::process(config, source, output_dir)?;
    output::print_markup_report(&markup_report);

    println!("==> Build complete: {}", output_dir.display());
    Ok(())
}
