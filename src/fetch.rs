use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::db::{FetchRow, PendingPage};

const CONCURRENCY: usize = 8;
const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 2000;
const REQUEST_TIMEOUT_SECS: u64 = 30;
// Many campus sites refuse the default reqwest UA.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub struct FetchStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
}

/// Fetch directory pages concurrently, saving each result to the DB as
/// it arrives. Failures are recorded as error rows so the processing
/// stage can fall back to placeholder records.
pub async fn fetch_pages_streaming(
    conn: &Connection,
    pages: Vec<PendingPage>,
) -> Result<FetchStats> {
    let client = Arc::new(
        reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?,
    );
    let semaphore = Arc::new(Semaphore::new(CONCURRENCY));
    let total = pages.len();

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    // Channel: workers send results, main loop saves to DB
    let (tx, mut rx) = tokio::sync::mpsc::channel::<FetchRow>(CONCURRENCY * 2);

    for page in pages {
        let client = Arc::clone(&client);
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();

        tokio::spawn(async move {
            let _permit = sem.acquire().await.unwrap();
            let row = fetch_with_retry(&client, page).await;
            let _ = tx.send(row).await;
        });
    }

    // Drop our copy of tx so rx closes when all spawned tasks finish
    drop(tx);

    let mut ok = 0usize;
    let mut errors = 0usize;

    let mut insert_stmt = conn.prepare(
        "INSERT INTO page_data (page_id, university, url, body, status, error, latency_ms)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    let mut update_stmt =
        conn.prepare("UPDATE pages SET visited = 1, visited_at = datetime('now') WHERE id = ?1")?;

    while let Some(row) = rx.recv().await {
        if row.error.is_some() {
            errors += 1;
        } else {
            ok += 1;
        }
        insert_stmt.execute(rusqlite::params![
            row.page_id,
            row.university,
            row.url,
            row.body,
            row.status,
            row.error,
            row.latency_ms,
        ])?;
        update_stmt.execute(rusqlite::params![row.page_id])?;
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!("Fetched {} pages ({} ok, {} errors)", total, ok, errors);

    Ok(FetchStats { total, ok, errors })
}

async fn fetch_with_retry(client: &reqwest::Client, page: PendingPage) -> FetchRow {
    for attempt in 0..MAX_RETRIES {
        let row = fetch_one(client, &page).await;
        let retryable = matches!(row.status, Some(429 | 500 | 502 | 503));
        if !retryable {
            return row;
        }
        let backoff = Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(attempt));
        warn!(
            "HTTP {} on {} (attempt {}/{}), backing off {:.1}s",
            row.status.unwrap_or_default(),
            page.url,
            attempt + 1,
            MAX_RETRIES,
            backoff.as_secs_f64()
        );
        tokio::time::sleep(backoff).await;
    }
    fetch_one(client, &page).await
}

async fn fetch_one(client: &reqwest::Client, page: &PendingPage) -> FetchRow {
    let start = Instant::now();
    let response = client.get(&page.url).send().await;
    let latency_ms = start.elapsed().as_millis() as i64;

    match response {
        Ok(resp) => {
            let status = resp.status();
            if !status.is_success() {
                return FetchRow {
                    page_id: page.page_id,
                    university: page.university.clone(),
                    url: page.url.clone(),
                    body: None,
                    status: Some(status.as_u16() as i32),
                    error: Some(format!("HTTP {}", status.as_u16())),
                    latency_ms: Some(latency_ms),
                };
            }
            match resp.text().await {
                Ok(body) => FetchRow {
                    page_id: page.page_id,
                    university: page.university.clone(),
                    url: page.url.clone(),
                    body: Some(body),
                    status: Some(status.as_u16() as i32),
                    error: None,
                    latency_ms: Some(latency_ms),
                },
                Err(e) => FetchRow {
                    page_id: page.page_id,
                    university: page.university.clone(),
                    url: page.url.clone(),
                    body: None,
                    status: Some(status.as_u16() as i32),
                    error: Some(e.to_string()),
                    latency_ms: Some(latency_ms),
                },
            }
        }
        Err(e) => FetchRow {
            page_id: page.page_id,
            university: page.university.clone(),
            url: page.url.clone(),
            body: None,
            status: None,
            error: Some(e.to_string()),
            latency_ms: Some(latency_ms),
        },
    }
}
