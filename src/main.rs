mod db;
mod export;
mod extract;
mod fetch;
mod normalize;
mod reconcile;
mod record;
mod report;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing::warn;

#[derive(Parser)]
#[command(name = "campus_scraper", about = "University student-organization directory scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the university roster and queue directory pages
    Init {
        /// JSON file with [{name, url, expected_count}] entries
        #[arg(short, long, default_value = "universities.json")]
        file: PathBuf,
    },
    /// Fetch queued directory pages
    Fetch {
        /// Max pages to fetch (default: all unvisited)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Extract, normalize and reconcile fetched pages
    Process {
        /// Max pages to process (default: all unprocessed)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Fetch + process in one pipeline
    Run {
        /// Max pages to fetch+process
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Completeness report over the reconciled record set
    Report,
    /// Export the reconciled record set as CSV
    Export {
        #[arg(short, long, default_value = "organizations.csv")]
        out: PathBuf,
    },
    /// Show pipeline statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { file } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let seeds = db::load_seed_file(&file)?;
            let queued = db::insert_universities(&conn, &seeds)?;
            println!(
                "Loaded {} universities ({} new pages queued)",
                seeds.len(),
                queued
            );
            Ok(())
        }
        Commands::Fetch { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let pages = db::fetch_unvisited(&conn, limit)?;
            if pages.is_empty() {
                println!("No unvisited pages. Run 'init' first or all pages are fetched.");
                return Ok(());
            }
            println!("Fetching {} pages (streaming to DB)...", pages.len());
            let stats = fetch::fetch_pages_streaming(&conn, pages).await?;
            println!(
                "Done: {} fetched ({} ok, {} errors).",
                stats.total, stats.ok, stats.errors
            );
            Ok(())
        }
        Commands::Process { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let pages = db::fetch_unprocessed(&conn, limit)?;
            if pages.is_empty() {
                println!("No unprocessed pages. Run 'fetch' first.");
                return Ok(());
            }
            println!("Processing {} pages...", pages.len());
            let counts = process_pages(&conn, &pages)?;
            counts.print();
            Ok(())
        }
        Commands::Run { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let pages = db::fetch_unvisited(&conn, limit)?;
            if pages.is_empty() {
                println!("No unvisited pages. Run 'init' first.");
                return Ok(());
            }

            let t_fetch = Instant::now();
            println!("Pipeline: fetching {} pages (streaming to DB)...", pages.len());
            let stats = fetch::fetch_pages_streaming(&conn, pages).await?;
            println!(
                "Fetched {} pages ({} ok, {} errors) in {:.1}s",
                stats.total,
                stats.ok,
                stats.errors,
                t_fetch.elapsed().as_secs_f64()
            );

            let unprocessed = db::fetch_unprocessed(&conn, None)?;
            if unprocessed.is_empty() {
                println!("Nothing to process.");
                return Ok(());
            }
            println!("Processing {} pages...", unprocessed.len());
            let counts = process_pages(&conn, &unprocessed)?;
            counts.print();
            Ok(())
        }
        Commands::Report => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let records = db::load_records(&conn)?;
            if records.is_empty() {
                println!("No organizations yet. Run 'process' first.");
                return Ok(());
            }
            let expected = db::expected_counts(&conn)?;
            report::report(&records, &expected).print();
            Ok(())
        }
        Commands::Export { out } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let records = db::load_records(&conn)?;
            let written = export::write_csv(&out, &records)?;
            println!("Exported {} organizations to {}", written, out.display());
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Universities:  {}", s.universities);
            println!("Pages:         {}", s.pages);
            println!("Visited:       {}", s.visited);
            println!("Fetched:       {}", s.fetched);
            println!("Fetch errors:  {}", s.fetch_errors);
            println!("Organizations: {}", s.organizations);
            println!("Placeholders:  {}", s.placeholders);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

struct ProcessCounts {
    pages: usize,
    extracted: usize,
    placeholders: usize,
    skipped_pages: usize,
    skipped_records: usize,
    merged: usize,
}

impl ProcessCounts {
    fn print(&self) {
        println!(
            "Processed {} pages: {} records extracted ({} placeholder), {} pages skipped.",
            self.pages, self.extracted, self.placeholders, self.skipped_pages,
        );
        println!(
            "Reconciled to {} organizations ({} ungroupable records dropped).",
            self.merged, self.skipped_records,
        );
    }
}

/// Extract + normalize pages in parallel, then reconcile against the
/// already-saved record set in one deterministic pass.
fn process_pages(
    conn: &rusqlite::Connection,
    pages: &[db::FetchedPage],
) -> anyhow::Result<ProcessCounts> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    use crate::record::Provenance;

    let pb = ProgressBar::new(pages.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let mut counts = ProcessCounts {
        pages: pages.len(),
        extracted: 0,
        placeholders: 0,
        skipped_pages: 0,
        skipped_records: 0,
        merged: 0,
    };

    let mut incoming = Vec::new();
    for chunk in pages.chunks(100) {
        let results: Vec<_> = chunk
            .par_iter()
            .map(|page| {
                extract::extract_or_placeholder(page.body.as_deref(), &page.university, &page.url)
                    .map(|found| found.into_iter().map(normalize::normalize).collect::<Vec<_>>())
            })
            .collect();

        for result in results {
            match result {
                Ok(found) => {
                    counts.extracted += found.len();
                    counts.placeholders += found
                        .iter()
                        .filter(|r| r.provenance == Provenance::Placeholder)
                        .count();
                    incoming.extend(found);
                }
                Err(e) => {
                    warn!("Skipping page: {}", e);
                    counts.skipped_pages += 1;
                }
            }
        }
        pb.inc(chunk.len() as u64);
    }
    pb.finish_and_clear();

    // Previously reconciled records come first so earlier runs keep
    // first-seen precedence across reruns.
    let mut inputs = db::load_records(conn)?;
    inputs.extend(incoming);
    let outcome = reconcile::reconcile(inputs);
    counts.skipped_records = outcome.skipped;
    counts.merged = outcome.records.len();

    db::save_records(conn, &outcome.records)?;
    let ids: Vec<i64> = pages.iter().map(|p| p.page_data_id).collect();
    db::mark_processed(conn, &ids)?;

    Ok(counts)
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
