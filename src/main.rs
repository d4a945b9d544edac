//! Main entry point for the zipmin CLI application.
//!
//! Minifies every archive given on the command line and prints the size
//! before and after, or lists archive contents with `-l`.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use zipmin::batch::dedupe_paths;
use zipmin::{ArchiveStore, Cli, FileReport, LocalFileStore, ZipExtractor, minify_all};

/// Application entry point.
///
/// Parses command-line arguments and dispatches to listing or minification.
/// Exits non-zero if any archive failed.
#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_logger::init();
    let cli = Cli::parse();
    let store = Arc::new(LocalFileStore::new());

    if cli.list || cli.verbose {
        let mut failed = false;
        for path in dedupe_paths(&cli.files) {
            if let Err(e) = list_files(store.as_ref(), &path, cli.verbose).await {
                failed = true;
                if !cli.is_very_quiet() {
                    eprintln!("{}: {:#}", path.display(), e);
                }
            }
        }
        return Ok(exit_code(failed));
    }

    let reports = minify_all(store, &cli.files, &cli.batch_options()).await;
    for report in &reports {
        print_report(report, &cli);
    }

    let succeeded: Vec<_> = reports
        .iter()
        .filter_map(|r| r.outcome.as_ref().ok())
        .collect();
    if !cli.is_quiet() && reports.len() > 1 {
        let saved: u64 = succeeded.iter().map(|s| s.saved()).sum();
        println!(
            "{} of {} archives minified, {} saved in total",
            succeeded.len(),
            reports.len(),
            format_size(saved)
        );
    }

    Ok(exit_code(succeeded.len() != reports.len()))
}

fn exit_code(failed: bool) -> ExitCode {
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Print the outcome for one archive.
///
/// Statistics are suppressed by `-q`; errors only by `-qq`.
fn print_report(report: &FileReport, cli: &Cli) {
    match &report.outcome {
        Ok(savings) => {
            if cli.is_quiet() {
                return;
            }
            println!("{}", report.path.display());
            println!("Minify time: {:.3}ms", savings.elapsed.as_secs_f64() * 1000.0);
            println!("Before:      {} bytes", savings.before);
            println!(
                "After:       {} bytes ({:.2}%)",
                savings.after,
                savings.after_percent()
            );
            println!(
                "Saved:       {} bytes ({:.2}%)",
                savings.saved(),
                savings.saved_percent()
            );
            match &savings.written_to {
                Some(dest) if *dest != report.path => println!("Written to:  {}", dest.display()),
                Some(_) => {}
                None => println!("Dry run, nothing written"),
            }
            println!();
        }
        Err(e) => {
            if !cli.is_very_quiet() {
                eprintln!("{}: {:#}", report.path.display(), e);
            }
        }
    }
}

/// List entries of one archive.
///
/// Supports two output formats:
/// - Simple format (`-l`): Just entry names, one per line
/// - Verbose format (`-v`): Table with sizes, method, timestamps and the
///   extra field and comment bytes minification would drop
async fn list_files<S: ArchiveStore>(store: &S, path: &Path, verbose: bool) -> Result<()> {
    let data = store.load(path).await?;
    let entries = ZipExtractor::new(&data).list_files()?;

    if !verbose {
        for entry in &entries {
            println!("{}", entry.file_name);
        }
        return Ok(());
    }

    println!("Archive:  {}", path.display());
    println!(
        "{:>10}  {:>10}  {:>5}  {:>6}  {:>8}  {:>10}  {:>5}  {:>5}  {:>5}  Name",
        "Length", "Size", "Cmpr", "Method", "CRC-32", "Date", "Time", "Extra", "Cmnt"
    );
    println!("{}", "-".repeat(96));

    let mut total_uncompressed = 0u64;
    let mut file_count = 0usize;
    let mut dir_count = 0usize;
    let mut droppable = 0u64;

    for entry in &entries {
        let (year, month, day) = entry.mod_date();
        let (hour, minute, _second) = entry.mod_time();

        // Percentage saved by compression
        let ratio = if entry.uncompressed_size > 0 {
            format!(
                "{:>4}%",
                100u64.saturating_sub(entry.compressed_size * 100 / entry.uncompressed_size)
            )
        } else {
            "   0%".to_string()
        };

        println!(
            "{:>10}  {:>10}  {}  {:>6}  {:08x}  {:04}-{:02}-{:02}  {:02}:{:02}  {:>5}  {:>5}  {}",
            entry.uncompressed_size,
            entry.compressed_size,
            ratio,
            entry.compression_method.name(),
            entry.crc32,
            year,
            month,
            day,
            hour,
            minute,
            entry.extra_field_len,
            entry.comment_len,
            entry.file_name
        );

        droppable += entry.droppable_bytes();
        if entry.is_directory {
            dir_count += 1;
        } else {
            total_uncompressed += entry.uncompressed_size;
            file_count += 1;
        }
    }

    println!("{}", "-".repeat(96));
    println!(
        "{:>10}  {} files, {} directories, {} of directory extra fields and comments",
        total_uncompressed,
        file_count,
        dir_count,
        format_size(droppable)
    );

    Ok(())
}

/// Format a byte size into a human-readable string.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
