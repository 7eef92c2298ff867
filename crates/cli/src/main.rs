mod images;
mod render;
mod report;

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use contactlog_core::{
    ContactRecord, Diagnostic, FieldTable, Layout, LineIndex, decode_bytes, encode_table,
};
use contactlog_diagnostics as diag;
use contactlog_layout::load_layout_from_str;
use serde::Serialize;

use crate::render::{Format, print_summary, render_diagnostics};

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "contactlog",
    version,
    about = "Decode packed contact log files into contacts, call logs and images"
)]
struct Cli {
    /// Output mode: "pretty" for coloured terminal output, "json" for
    /// machine-readable JSON. Defaults to "pretty" when stdout is a TTY,
    /// "json" otherwise.
    #[arg(long, global = true, value_parser = ["pretty", "json"])]
    output: Option<String>,

    /// Path to a layout JSON file. Defaults to the built-in contacts layout.
    #[arg(long, global = true)]
    layout: Option<String>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    // ── Decoding ────────────────────────────────────────────────────
    /// Decode a log and print the contact report.
    Decode {
        file: String,
        /// Write the text report to this file instead of stdout.
        #[arg(long)]
        report: Option<String>,
        /// Save each contact's image into this directory.
        #[arg(long)]
        images_dir: Option<String>,
        /// File extension for saved images.
        #[arg(long, default_value = "png")]
        image_ext: String,
    },

    /// Decode a log and print the raw field table as JSON.
    Table { file: String },

    /// Check that a log decodes, without assembling contacts.
    Check { file: String },

    // ── Transformation ──────────────────────────────────────────────
    /// Re-encode a log in canonical form (one line per field, entities
    /// in ID order).
    Normalize {
        file: String,
        /// Write the canonical form back to the file (in-place).
        #[arg(long, short, conflicts_with = "check")]
        write: bool,
        /// Check if the file is already canonical (exit 1 if not). For CI.
        #[arg(long, conflicts_with = "write")]
        check: bool,
    },

    // ── Reference ───────────────────────────────────────────────────
    /// Print the active layout as JSON.
    Layout,

    /// Explain a diagnostic ID (e.g. CLOG1002).
    Explain { id: String },
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    let format = Format::resolve_or_detect(cli.output.as_deref());

    if let Err(err) = run(cli, format) {
        match format {
            Format::Json => {
                let out = serde_json::json!({
                    "success": false,
                    "error": "command_failed",
                    "message": format!("{err:#}"),
                });
                println!("{out}");
            }
            Format::Pretty => eprintln!("error: {err:#}"),
        }
        process::exit(1);
    }
}

fn run(cli: Cli, format: Format) -> Result<()> {
    let layout = load_layout(cli.layout.as_deref())?;

    match cli.cmd {
        Cmd::Decode {
            file,
            report,
            images_dir,
            image_ext,
        } => cmd_decode(
            &file,
            &layout,
            report.as_deref(),
            images_dir.as_deref(),
            &image_ext,
            format,
        ),
        Cmd::Table { file } => cmd_table(&file, &layout, format),
        Cmd::Check { file } => cmd_check(&file, &layout, format),
        Cmd::Normalize { file, write, check } => cmd_normalize(&file, &layout, write, check, format),
        Cmd::Layout => cmd_layout(&layout),
        Cmd::Explain { id } => cmd_explain(&id, format),
    }
}

// ── Commands ────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct DecodeOutput<'a> {
    ok: bool,
    count: usize,
    records: &'a [ContactRecord],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
    diagnostics: &'a [Diagnostic],
}

fn cmd_decode(
    file: &str,
    layout: &Layout,
    report_path: Option<&str>,
    images_dir: Option<&str>,
    image_ext: &str,
    format: Format,
) -> Result<()> {
    let input = read_input(file)?;
    let table = decode_or_exit(&input, file, layout, format);
    let assembly = contactlog_core::assemble(&table, &layout.record);
    let mut diagnostics = assembly.diagnostics;

    let mut images = Vec::new();
    if let Some(dir) = images_dir {
        let summary = images::save_images(&assembly.records, Path::new(dir), image_ext)?;
        images = summary
            .written
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        diagnostics.extend(summary.diagnostics);
    }

    let text = report::render_report(&assembly.records);
    if let Some(path) = report_path {
        fs::write(path, &text).with_context(|| format!("failed to write report '{path}'"))?;
    }

    match format {
        Format::Json => {
            let out = DecodeOutput {
                ok: true,
                count: assembly.records.len(),
                records: &assembly.records,
                images,
                diagnostics: &diagnostics,
            };
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            if report_path.is_none() {
                print!("{text}");
            }
            render_diagnostics(source_text(&input), file, &diagnostics);
            print_summary(&diagnostics);
            match report_path {
                Some(path) => eprintln!("{} contacts written to {path}", assembly.records.len()),
                None => eprintln!("{} contacts decoded", assembly.records.len()),
            }
            if !images.is_empty() {
                eprintln!("{} images saved", images.len());
            }
        }
    }

    Ok(())
}

fn cmd_table(file: &str, layout: &Layout, format: Format) -> Result<()> {
    let input = read_input(file)?;
    let table = decode_or_exit(&input, file, layout, format);
    println!("{}", serde_json::to_string_pretty(&table)?);
    Ok(())
}

fn cmd_check(file: &str, layout: &Layout, format: Format) -> Result<()> {
    let input = read_input(file)?;
    let table = decode_or_exit(&input, file, layout, format);

    match format {
        Format::Json => {
            let out = serde_json::json!({
                "ok": true,
                "entities": table.entity_count(),
                "diagnostics": [],
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => eprintln!("decode ok: {} entities", table.entity_count()),
    }
    Ok(())
}

fn cmd_normalize(
    file: &str,
    layout: &Layout,
    write: bool,
    check: bool,
    format: Format,
) -> Result<()> {
    let input = read_input(file)?;
    let table = decode_or_exit(&input, file, layout, format);
    let canonical = encode_table(&table, layout)
        .with_context(|| format!("failed to re-encode '{file}'"))?;

    let already_canonical = canonical == input;

    if check {
        status_message(
            format,
            already_canonical,
            "already normalized",
            "not normalized",
            file,
        )?;
        if !already_canonical {
            process::exit(1);
        }
    } else if write {
        if !already_canonical {
            fs::write(file, &canonical).with_context(|| format!("failed to write '{file}'"))?;
        }
        status_message(
            format,
            !already_canonical,
            "normalized",
            "already normalized",
            file,
        )?;
    } else {
        io::stdout().write_all(&canonical)?;
    }

    Ok(())
}

/// Emit a status message for --check / --write in the appropriate format.
fn status_message(
    format: Format,
    condition: bool,
    if_true: &str,
    if_false: &str,
    file: &str,
) -> Result<()> {
    let msg = if condition { if_true } else { if_false };
    match format {
        Format::Json => {
            let out = serde_json::json!({ "status": msg, "file": file });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => eprintln!("{msg}: {file}"),
    }
    Ok(())
}

fn cmd_layout(layout: &Layout) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(layout)?);
    Ok(())
}

fn cmd_explain(id: &str, format: Format) -> Result<()> {
    match format {
        Format::Json => {
            let out = serde_json::json!({
                "id": id,
                "explanation": diag::explain(id),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            if let Some(text) = diag::explain(id) {
                use ariadne::Fmt;
                println!("{}: {}", id.fg(ariadne::Color::Cyan), text);
            } else {
                println!("{id}: (no explanation available)");
            }
        }
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// Load the layout from `--layout`, or the built-in contacts layout.
fn load_layout(path: Option<&str>) -> Result<Layout> {
    let Some(path) = path else {
        return Ok(Layout::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read layout file '{path}'"))?;
    load_layout_from_str(&text).with_context(|| format!("invalid layout file '{path}'"))
}

fn read_input(file: &str) -> Result<Vec<u8>> {
    fs::read(file).with_context(|| format!("failed to read '{file}'"))
}

/// The log as text for source annotations, when it is valid UTF-8.
fn source_text(input: &[u8]) -> Option<&str> {
    std::str::from_utf8(input).ok()
}

/// Decode `input`, or report the fatal decode error and exit with code 1.
fn decode_or_exit(input: &[u8], file: &str, layout: &Layout, format: Format) -> FieldTable {
    match decode_bytes(input, layout) {
        Ok(table) => table,
        Err(err) => {
            let diagnostics = [err.to_diagnostic(&LineIndex::new(input))];
            match format {
                Format::Json => {
                    let out = serde_json::json!({
                        "ok": false,
                        "count": 0,
                        "records": [],
                        "diagnostics": diagnostics,
                    });
                    println!("{out:#}");
                }
                Format::Pretty => {
                    render_diagnostics(source_text(input), file, &diagnostics);
                    print_summary(&diagnostics);
                }
            }
            process::exit(1);
        }
    }
}
