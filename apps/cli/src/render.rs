//! Terminal output: listings, progress lines and outcome summaries.

use std::io::Write;

use pan123_protocol::constants::{CODE_CONFLICT, CODE_DUPLICATE_FILE};
use pan123_protocol::{Outcome, RemoteEntry};
use pan123_transfer::{TransferEvent, format_size};
use serde::Serialize;

/// One listing row, numbered from 1.
pub fn entry_line(index: usize, entry: &RemoteEntry) -> String {
    let (kind, size) = if entry.is_folder() {
        ("dir ", String::new())
    } else {
        ("file", format_size(entry.size))
    };
    format!("{:>4}  {kind}  {size:>10}  {:>12}  {}", index + 1, entry.id, entry.name)
}

pub fn print_entries(entries: &[RemoteEntry]) {
    for (i, entry) in entries.iter().enumerate() {
        println!("{}", entry_line(i, entry));
    }
}

/// Flag the user should add after an advisory outcome.
pub fn advisory_hint(code: i32) -> Option<&'static str> {
    match code {
        CODE_DUPLICATE_FILE => Some("a file with this name exists; retry with --overwrite or --keep-both"),
        CODE_CONFLICT => Some("the local file exists; retry with --overwrite or --skip-existing"),
        _ => None,
    }
}

/// Prints an outcome, as JSON or as a one-line summary.
pub fn print_outcome<T: Serialize>(outcome: &Outcome<T>, json: bool) {
    if json {
        match serde_json::to_string_pretty(outcome) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("cannot encode outcome: {e}"),
        }
        return;
    }
    if outcome.is_failure() {
        eprintln!("error ({}): {}", outcome.code, outcome.message);
    } else if outcome.is_advisory() {
        eprintln!("{} (code {})", outcome.message, outcome.code);
        if let Some(hint) = advisory_hint(outcome.code) {
            eprintln!("hint: {hint}");
        }
    } else {
        println!("{}", outcome.message);
    }
}

/// Progress line for one event.
pub fn progress_line(event: &TransferEvent) -> String {
    match event {
        TransferEvent::UploadProgress { uploaded, total } => format!(
            "uploaded {} / {}{}",
            format_size(*uploaded),
            format_size(*total),
            percent_suffix(event)
        ),
        TransferEvent::DownloadProgress {
            downloaded,
            total,
            bytes_per_second,
        } => {
            let total = if *total == 0 {
                "?".to_string()
            } else {
                format_size(*total)
            };
            format!(
                "downloaded {} / {total}{}  {}/s",
                format_size(*downloaded),
                percent_suffix(event),
                format_size(*bytes_per_second as u64)
            )
        }
        TransferEvent::DownloadStartFile { name, size } => {
            format!("file {name} ({})", format_size(*size))
        }
        TransferEvent::DownloadStartDirectory { name } => format!("folder {name}/"),
    }
}

fn percent_suffix(event: &TransferEvent) -> String {
    event
        .percent()
        .map(|p| format!(" ({p:.1}%)"))
        .unwrap_or_default()
}

/// Writes progress to stderr. Byte counters overwrite the current line;
/// start notifications get a line of their own.
pub fn progress(event: TransferEvent) {
    let line = progress_line(&event);
    let mut err = std::io::stderr().lock();
    let _ = match event {
        TransferEvent::UploadProgress { .. } | TransferEvent::DownloadProgress { .. } => {
            write!(err, "\r\x1b[2K{line}")
        }
        _ => writeln!(err, "\r\x1b[2K{line}"),
    };
    let _ = err.flush();
}

/// Ends an in-place progress line.
pub fn finish_progress() {
    eprintln!();
}
