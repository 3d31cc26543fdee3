use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use tracing::debug;

use ddm_diff::{compute_diff, DiffConfig, DiffEntry, DiffReport};
use ddm_hash::{DigestCache, FileHasher};
use ddm_types::{CancelToken, Entry, EntryKind, Side};
use ddm_walk::{PathFilter, WalkErrorRecord, WalkEvent, WalkOptions, Walker};

use crate::cli::{Cli, OutputFormat};

/// Run the parsed command line, returning the process exit code.
pub fn run(cli: Cli) -> i32 {
    match execute(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            2
        }
    }
}

fn execute(cli: Cli) -> anyhow::Result<i32> {
    let mut out = open_output(cli.out.as_deref())?;
    match cli.right.clone() {
        Some(right) => {
            debug!(left = %cli.left.display(), right = %right.display(), "diffing trees");
            diff_trees(&cli, &right, out.as_mut())
        }
        None => {
            debug!(root = %cli.left.display(), "listing tree");
            list_tree(&cli, out.as_mut())
        }
    }
}

/// Stdout by default; with `-o`, a freshly created file. An existing
/// file is never overwritten.
fn open_output(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    match path {
        None => Ok(Box::new(io::stdout())),
        Some(path) => {
            if path.exists() {
                bail!("output file {} already exists", path.display());
            }
            let file = fs::File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Box::new(file))
        }
    }
}

fn diff_trees(cli: &Cli, right: &Path, out: &mut dyn Write) -> anyhow::Result<i32> {
    let config = DiffConfig {
        follow_symlinks: cli.follow_symlinks,
        exclude_patterns: cli.exclude.clone(),
        detect_moves: cli.detect_moves,
        hash_algorithm: cli.hash.into(),
        compare_permissions: cli.compare_permissions,
        cancel: CancelToken::new(),
    };
    let report = compute_diff(&cli.left, right, &config)?;
    match cli.format {
        OutputFormat::Text => render_report(&report, cli.verbose, out)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &report)?;
            writeln!(out)?;
        }
    }
    Ok(if report.is_clean() { 0 } else { 1 })
}

fn render_report(report: &DiffReport, verbose: bool, out: &mut dyn Write) -> anyhow::Result<()> {
    for entry in &report.entries {
        match entry {
            DiffEntry::Added { entry } => {
                writeln!(out, "{} {}", "A".green().bold(), entry.path)?;
            }
            DiffEntry::Removed { entry } => {
                writeln!(out, "{} {}", "D".red().bold(), entry.path)?;
            }
            DiffEntry::Modified { right, reason, .. } => {
                writeln!(out, "{} {} ({reason})", "M".yellow().bold(), right.path)?;
            }
            DiffEntry::Moved { from, entry } => {
                writeln!(out, "{} {} -> {}", "R".cyan().bold(), from, entry.path)?;
            }
            DiffEntry::Unchanged { entry, reason } => {
                if verbose {
                    match reason {
                        Some(reason) => {
                            writeln!(out, "{} {} ({reason})", "=".dimmed(), entry.path)?;
                        }
                        None => writeln!(out, "{} {}", "=".dimmed(), entry.path)?,
                    }
                }
            }
        }
    }
    for record in &report.errors {
        writeln!(
            out,
            "{} {} {} ({}): {}",
            "E".red().bold(),
            record.side,
            record.path,
            record.kind,
            record.detail
        )?;
    }
    let summary = report.summary();
    writeln!(
        out,
        "{} added, {} removed, {} modified, {} moved, {} unchanged, {} errors",
        summary.added,
        summary.removed,
        summary.modified,
        summary.moved,
        summary.unchanged,
        summary.errors
    )?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct Listing {
    entries: Vec<Entry>,
    errors: Vec<WalkErrorRecord>,
}

/// List one tree: mode bits, size, mtime, digest, path per line, in
/// walk order.
fn list_tree(cli: &Cli, out: &mut dyn Write) -> anyhow::Result<i32> {
    let metadata = fs::metadata(&cli.left)
        .with_context(|| format!("cannot access {}", cli.left.display()))?;
    if !metadata.is_dir() {
        bail!("not a directory: {}", cli.left.display());
    }
    let filter = PathFilter::from_patterns(&cli.exclude)?;
    let options = WalkOptions {
        follow_symlinks: cli.follow_symlinks,
        filter,
    };
    let cancel = CancelToken::new();
    let walker = Walker::new(&cli.left, options, cancel.clone());
    let hasher = FileHasher::new(cli.hash.into());
    let mut cache = DigestCache::new();

    let mut errors = 0usize;
    match cli.format {
        OutputFormat::Text => {
            for event in walker {
                match event {
                    WalkEvent::Entry(entry) => {
                        let digest =
                            file_digest(&entry, &cli.left, &hasher, &mut cache, &cancel);
                        writeln!(out, "{}", entry_line(&entry, digest.as_deref()))?;
                    }
                    WalkEvent::Error(record) => {
                        errors += 1;
                        writeln!(
                            out,
                            "{} {} ({}): {}",
                            "E".red().bold(),
                            record.path,
                            record.kind,
                            record.detail
                        )?;
                    }
                }
            }
        }
        OutputFormat::Json => {
            let mut listing = Listing {
                entries: Vec::new(),
                errors: Vec::new(),
            };
            for event in walker {
                match event {
                    WalkEvent::Entry(entry) => listing.entries.push(entry),
                    WalkEvent::Error(record) => listing.errors.push(record),
                }
            }
            errors = listing.errors.len();
            serde_json::to_writer_pretty(&mut *out, &listing)?;
            writeln!(out)?;
        }
    }
    Ok(if errors == 0 { 0 } else { 1 })
}

fn file_digest(
    entry: &Entry,
    root: &Path,
    hasher: &FileHasher,
    cache: &mut DigestCache,
    cancel: &CancelToken,
) -> Option<String> {
    if !entry.is_file() {
        return None;
    }
    let file = entry.path.to_fs_path(root);
    cache
        .get_or_compute(Side::Left, &entry.path, &file, entry.size, hasher, cancel)
        .ok()
        .map(|id| id.short_hex())
}

fn entry_line(entry: &Entry, digest: Option<&str>) -> String {
    let mtime: DateTime<Utc> = entry.mtime.into();
    let mut line = format!(
        "{} {:>10} {} {:>8} {}",
        mode_string(entry),
        entry.size,
        mtime.format("%Y-%m-%d %H:%M:%S"),
        digest.unwrap_or("-"),
        entry.path,
    );
    if let Some(target) = &entry.symlink_target {
        line.push_str(" -> ");
        line.push_str(target);
    }
    line
}

fn mode_string(entry: &Entry) -> String {
    let kind = match entry.kind {
        EntryKind::File => '-',
        EntryKind::Directory => 'd',
        EntryKind::Symlink => 'l',
        EntryKind::Other => '?',
    };
    let mut mode = String::with_capacity(10);
    mode.push(kind);
    let bits = [
        (0o400, 'r'),
        (0o200, 'w'),
        (0o100, 'x'),
        (0o040, 'r'),
        (0o020, 'w'),
        (0o010, 'x'),
        (0o004, 'r'),
        (0o002, 'w'),
        (0o001, 'x'),
    ];
    for (bit, ch) in bits {
        mode.push(if entry.mode & bit != 0 { ch } else { '-' });
    }
    mode
}
