//! CLI output formatting for all pipeline stages.
//!
//! One informational line per completed stage or file, with indented
//! `Source:` / `Asset:` context lines underneath. Each stage has a pure
//! `format_*` function (returns `Vec<String>`) for testability and a
//! `print_*` wrapper that writes to stdout. Format functions do no I/O.
//!
//! This is human-readable status output, not a machine-readable log.

use crate::assets::AssetReport;
use crate::markup::MarkupReport;
use crate::scripts::ScriptReport;
use crate::styles::StyleReport;

/// Human-readable byte count: `412 B`, `1.2 KB`, `3.4 MB`.
fn format_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

pub fn format_script_report(report: &ScriptReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Bundled {} ({} module{}, {} → {})",
        report.bundle,
        report.modules.len(),
        if report.modules.len() == 1 { "" } else { "s" },
        format_size(report.input_bytes),
        format_size(report.output_bytes),
    )];
    for module in &report.modules {
        lines.push(format!("    Source: {}", module.display()));
    }
    lines
}

pub fn print_script_report(report: &ScriptReport) {
    for line in format_script_report(report) {
        println!("{line}");
    }
}

pub fn format_style_report(report: &StyleReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Compiled {} ({})",
        report.output,
        format_size(report.output_bytes)
    )];
    for asset in &report.assets {
        lines.push(format!("    Asset: {asset}"));
    }
    lines
}

pub fn print_style_report(report: &StyleReport) {
    for line in format_style_report(report) {
        println!("{line}");
    }
}

pub fn format_asset_report(report: &AssetReport) -> Vec<String> {
    report
        .copied
        .iter()
        .map(|item| {
            if item.files == 1 {
                format!("Copied {}", item.name)
            } else {
                format!("Copied {} ({} files)", item.name, item.files)
            }
        })
        .collect()
}

pub fn print_asset_report(report: &AssetReport) {
    for line in format_asset_report(report) {
        println!("{line}");
    }
}

pub fn format_markup_report(report: &MarkupReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .pages
        .iter()
        .map(|page| {
            format!(
                "Processed {} ({} → {})",
                page.filename,
                format_size(page.input_bytes),
                format_size(page.output_bytes),
            )
        })
        .collect();
    lines.push(format!(
        "Processed {} page{}",
        report.pages.len(),
        if report.pages.len() == 1 { "" } else { "s" },
    ));
    lines
}

pub fn print_markup_report(report: &MarkupReport) {
    for line in format_markup_report(report) {
        println!("{line}");
    }
}
