//! Diagnostic rendering using ariadne.
//!
//! Decode errors carry byte spans into the input log and are rendered with
//! source context. Assembly and image-writer notes have no span and are
//! printed as single lines. Everything goes to stderr so stdout stays free
//! for the report or JSON.

use std::collections::BTreeMap;
use std::io::{self, IsTerminal};

use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};
use contactlog_diagnostics::{Diagnostic, Severity};

// ── Output format ───────────────────────────────────────────────────────

/// Output format for command results and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    /// Coloured, source-annotated output (ariadne).
    Pretty,
    /// Machine-readable JSON.
    Json,
}

impl Format {
    /// Use the explicit choice, or pretty for terminals and JSON for pipes.
    pub(crate) fn resolve_or_detect(explicit: Option<&str>) -> Self {
        match explicit {
            Some("json") => Format::Json,
            Some("pretty") => Format::Pretty,
            _ => {
                if io::stdout().is_terminal() {
                    Format::Pretty
                } else {
                    Format::Json
                }
            }
        }
    }
}

// ── Severity mapping ────────────────────────────────────────────────────

fn report_kind(severity: &Severity) -> ReportKind<'static> {
    match severity {
        Severity::Error => ReportKind::Error,
        Severity::Warn => ReportKind::Warning,
        Severity::Info => ReportKind::Advice,
        _ => ReportKind::Warning,
    }
}

fn severity_color(severity: &Severity) -> Color {
    match severity {
        Severity::Error => Color::Red,
        Severity::Warn => Color::Yellow,
        Severity::Info => Color::Blue,
        _ => Color::White,
    }
}

fn severity_label(severity: &Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warn => "warning",
        Severity::Info => "info",
        _ => "diagnostic",
    }
}

fn context_note(ctx: &BTreeMap<String, String>) -> String {
    ctx.iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ")
}

// ── Pretty rendering ────────────────────────────────────────────────────

/// Render diagnostics to stderr.
///
/// `source` is the input log when it is valid UTF-8; spans are byte offsets
/// into it. Without a source, spanned diagnostics print as single lines with
/// their byte range.
pub(crate) fn render_diagnostics(
    source: Option<&str>,
    filename: &str,
    diagnostics: &[Diagnostic],
) {
    if diagnostics.is_empty() {
        return;
    }

    let config = Config::default()
        .with_compact(false)
        .with_index_type(IndexType::Byte);
    let mut cache = source.map(|text| (filename, Source::from(text)));

    for diag in diagnostics {
        let (Some(span), Some(text), Some(cache)) = (&diag.span, source, cache.as_mut()) else {
            eprintln!("{}[{}]: {}", severity_label(&diag.severity), diag.id, diag.message);
            if let Some(span) = &diag.span {
                eprintln!("  --> {filename}: bytes {}..{}", span.start, span.end);
            }
            if let Some(ctx) = &diag.context {
                eprintln!("  = note: {}", context_note(ctx));
            }
            continue;
        };

        // Truncation spans can reach past the end of the input.
        let len = text.len();
        let start = span.start.min(len);
        let end = span.end.min(len).max(start);

        let label = match &diag.context {
            Some(ctx) if !ctx.is_empty() => context_note(ctx),
            _ => diag.message.clone(),
        };
        let mut builder = Report::build(report_kind(&diag.severity), (filename, start..end))
            .with_code(diag.id.as_ref())
            .with_message(&diag.message)
            .with_config(config)
            .with_label(
                Label::new((filename, start..end))
                    .with_message(label)
                    .with_color(severity_color(&diag.severity)),
            );
        if let Some(explanation) = diag.explain() {
            builder = builder.with_help(explanation);
        }
        builder.finish().eprint(cache).ok();
    }
}

// ── Summary line ────────────────────────────────────────────────────────

/// Print a coloured summary line such as `1 error, 2 warnings, 3 info`.
pub(crate) fn print_summary(diagnostics: &[Diagnostic]) {
    use ariadne::Fmt;

    let (mut errors, mut warnings, mut infos) = (0usize, 0usize, 0usize);
    for d in diagnostics {
        match d.severity {
            Severity::Error => errors += 1,
            Severity::Info => infos += 1,
            _ => warnings += 1,
        }
    }
    if errors + warnings + infos == 0 {
        return;
    }

    let mut parts = Vec::new();
    if errors > 0 {
        let s = if errors == 1 { "" } else { "s" };
        parts.push(format!("{}", format!("{errors} error{s}").fg(Color::Red)));
    }
    if warnings > 0 {
        let s = if warnings == 1 { "" } else { "s" };
        parts.push(format!(
            "{}",
            format!("{warnings} warning{s}").fg(Color::Yellow)
        ));
    }
    if infos > 0 {
        parts.push(format!("{}", format!("{infos} info").fg(Color::Blue)));
    }
    eprintln!("{}", parts.join(", "));
}
