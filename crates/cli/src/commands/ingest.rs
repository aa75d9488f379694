use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use photoatlas_core::domain::IngestOutcome;
use photoatlas_core::ingest::summarize;
use photoatlas_core::{Atlas, IngestProgress};

fn active_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "  {bar:30.cyan/blue} {spinner:.green} {pos:>5}/{len:<5} {prefix:.dim} {msg}",
    )
    .unwrap()
    .progress_chars("━╸─")
}

fn done_style() -> ProgressStyle {
    ProgressStyle::with_template("  {bar:30.green} {prefix:.green} {msg:.dim}").unwrap()
}

pub fn run(atlas: &mut Atlas, dir: PathBuf) -> Result<()> {
    println!();
    println!("  Reading metadata with {}.", atlas.source_name());

    let mp = MultiProgress::new();
    let mut bar: Option<ProgressBar> = None;
    let mut total: u64 = 0;

    let outcomes = atlas.ingest(
        &dir,
        None,
        Some(&mut |progress| match progress {
            IngestProgress::ScanStart { root, file_count } => {
                let _ = mp.println(format!(
                    "  Scanning {} ({} files)",
                    root.display(),
                    file_count
                ));
                total = file_count as u64;
                let pb = mp.add(ProgressBar::new(total));
                pb.set_style(active_style());
                pb.set_prefix("extract");
                pb.enable_steady_tick(Duration::from_millis(80));
                bar = Some(pb);
            }
            IngestProgress::FileDone { path } => {
                if let Some(pb) = &bar {
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default();
                    pb.set_message(name);
                    pb.inc(1);
                }
            }
            IngestProgress::PhaseComplete { phase } => {
                if phase == "indexing" {
                    if let Some(pb) = bar.take() {
                        pb.set_style(done_style());
                        pb.set_prefix("done");
                        pb.finish_with_message(format!("Processed {total} files"));
                    }
                }
            }
        }),
    )?;

    let summary = summarize(&outcomes);
    println!();
    println!("  Indexed:     {:>6}", summary.indexed);
    println!("  No GPS:      {:>6}", summary.no_gps);
    println!("  Unsupported: {:>6}", summary.unsupported);
    println!("  Invalid GPS: {:>6}", summary.invalid);
    println!("  Failed:      {:>6}", summary.failed);

    let failures: Vec<_> = outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            IngestOutcome::Failed { path, error } => Some((path, error)),
            _ => None,
        })
        .collect();
    if !failures.is_empty() {
        println!();
        println!("  Failures:");
        for (path, error) in failures {
            println!("    {}: {error}", path.display());
        }
    }

    println!();
    println!("  Ingest complete.");
    Ok(())
}
