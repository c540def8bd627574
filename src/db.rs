use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use rusqlite::Connection;
use serde::Deserialize;

use crate::record::{Category, OrganizationRecord, Provenance};

const DB_PATH: &str = "data/orgs.sqlite";

pub fn connect() -> Result<Connection> {
    if let Some(dir) = Path::new(DB_PATH).parent() {
        std::fs::create_dir_all(dir)?;
    }
    let conn = Connection::open(DB_PATH)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS universities (
            name           TEXT PRIMARY KEY,
            url            TEXT NOT NULL,
            expected_count INTEGER
        );

        CREATE TABLE IF NOT EXISTS pages (
            id         INTEGER PRIMARY KEY,
            university TEXT NOT NULL REFERENCES universities(name),
            url        TEXT NOT NULL,
            visited    BOOLEAN NOT NULL DEFAULT 0,
            visited_at TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(university, url)
        );
        CREATE INDEX IF NOT EXISTS idx_pages_visited ON pages(visited);

        CREATE TABLE IF NOT EXISTS page_data (
            id         INTEGER PRIMARY KEY,
            page_id    INTEGER NOT NULL REFERENCES pages(id),
            university TEXT NOT NULL,
            url        TEXT NOT NULL,
            body       TEXT,
            status     INTEGER,
            error      TEXT,
            latency_ms INTEGER,
            processed  BOOLEAN NOT NULL DEFAULT 0,
            fetched_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_page_data_processed ON page_data(processed);

        CREATE TABLE IF NOT EXISTS organizations (
            university  TEXT NOT NULL,
            name        TEXT NOT NULL,
            category    TEXT NOT NULL,
            source_url  TEXT NOT NULL DEFAULT '',
            logo_url    TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            email       TEXT NOT NULL DEFAULT '',
            phone       TEXT NOT NULL DEFAULT '',
            website     TEXT NOT NULL DEFAULT '',
            linkedin    TEXT NOT NULL DEFAULT '',
            instagram   TEXT NOT NULL DEFAULT '',
            facebook    TEXT NOT NULL DEFAULT '',
            twitter     TEXT NOT NULL DEFAULT '',
            youtube     TEXT NOT NULL DEFAULT '',
            tiktok      TEXT NOT NULL DEFAULT '',
            provenance  TEXT NOT NULL CHECK(provenance IN ('scraped','placeholder')),
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (university, name)
        );
        ",
    )?;
    Ok(())
}

// ── University roster ──

#[derive(Debug, Deserialize)]
pub struct UniversitySeed {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub expected_count: Option<usize>,
}

pub fn load_seed_file(path: &Path) -> Result<Vec<UniversitySeed>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Insert universities and queue their directory pages. Returns the
/// number of newly queued pages.
pub fn insert_universities(conn: &Connection, seeds: &[UniversitySeed]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut queued = 0;
    {
        let mut uni_stmt = tx.prepare(
            "INSERT OR REPLACE INTO universities (name, url, expected_count) VALUES (?1, ?2, ?3)",
        )?;
        let mut page_stmt =
            tx.prepare("INSERT OR IGNORE INTO pages (university, url) VALUES (?1, ?2)")?;
        for seed in seeds {
            uni_stmt.execute(rusqlite::params![seed.name, seed.url, seed.expected_count])?;
            queued += page_stmt.execute(rusqlite::params![seed.name, seed.url])?;
        }
    }
    tx.commit()?;
    Ok(queued)
}

pub fn expected_counts(conn: &Connection) -> Result<HashMap<String, usize>> {
    let mut stmt = conn.prepare(
        "SELECT name, expected_count FROM universities WHERE expected_count IS NOT NULL",
    )?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get::<_, i64>(1)? as usize)))?
        .collect::<Result<HashMap<_, _>, _>>()?;
    Ok(rows)
}

// ── Fetching ──

pub struct PendingPage {
    pub page_id: i64,
    pub university: String,
    pub url: String,
}

pub fn fetch_unvisited(conn: &Connection, limit: Option<usize>) -> Result<Vec<PendingPage>> {
    let sql = match limit {
        Some(n) => format!(
            "SELECT id, university, url FROM pages WHERE visited = 0 ORDER BY id LIMIT {}",
            n
        ),
        None => "SELECT id, university, url FROM pages WHERE visited = 0 ORDER BY id".to_string(),
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(PendingPage {
                page_id: row.get(0)?,
                university: row.get(1)?,
                url: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub struct FetchRow {
    pub page_id: i64,
    pub university: String,
    pub url: String,
    pub body: Option<String>,
    pub status: Option<i32>,
    pub error: Option<String>,
    pub latency_ms: Option<i64>,
}

// ── Processing ──

pub struct FetchedPage {
    pub page_data_id: i64,
    pub university: String,
    pub url: String,
    pub body: Option<String>,
}

pub fn fetch_unprocessed(conn: &Connection, limit: Option<usize>) -> Result<Vec<FetchedPage>> {
    let sql = format!(
        "SELECT id, university, url, body FROM page_data WHERE processed = 0 ORDER BY id{}",
        match limit {
            Some(n) => format!(" LIMIT {}", n),
            None => String::new(),
        }
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(FetchedPage {
                page_data_id: row.get(0)?,
                university: row.get(1)?,
                url: row.get(2)?,
                body: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn mark_processed(conn: &Connection, page_data_ids: &[i64]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare("UPDATE page_data SET processed = 1 WHERE id = ?1")?;
        for id in page_data_ids {
            stmt.execute([id])?;
        }
    }
    tx.commit()?;
    Ok(())
}

// ── Reconciled records ──

pub fn save_records(conn: &Connection, records: &[OrganizationRecord]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO organizations
             (university, name, category, source_url, logo_url, description, email,
              phone, website, linkedin, instagram, facebook, twitter, youtube,
              tiktok, provenance)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16)",
        )?;
        for r in records {
            stmt.execute(rusqlite::params![
                r.university,
                r.name,
                r.category.as_str(),
                r.source_url,
                r.logo_url,
                r.description,
                r.email,
                r.phone,
                r.website,
                r.linkedin,
                r.instagram,
                r.facebook,
                r.twitter,
                r.youtube,
                r.tiktok,
                r.provenance.as_str(),
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// Load the reconciled record set in a stable order, so reruns over the
/// same data stay byte-identical downstream.
pub fn load_records(conn: &Connection) -> Result<Vec<OrganizationRecord>> {
    let mut stmt = conn.prepare(
        "SELECT university, name, category, source_url, logo_url, description,
                email, phone, website, linkedin, instagram, facebook, twitter,
                youtube, tiktok, provenance
         FROM organizations
         ORDER BY university, name",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(OrganizationRecord {
                university: row.get(0)?,
                name: row.get(1)?,
                category: Category::from_name(&row.get::<_, String>(2)?),
                source_url: row.get(3)?,
                logo_url: row.get(4)?,
                description: row.get(5)?,
                email: row.get(6)?,
                phone: row.get(7)?,
                website: row.get(8)?,
                linkedin: row.get(9)?,
                instagram: row.get(10)?,
                facebook: row.get(11)?,
                twitter: row.get(12)?,
                youtube: row.get(13)?,
                tiktok: row.get(14)?,
                provenance: Provenance::from_name(&row.get::<_, String>(15)?),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub universities: usize,
    pub pages: usize,
    pub visited: usize,
    pub fetched: usize,
    pub fetch_errors: usize,
    pub organizations: usize,
    pub placeholders: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let universities: usize =
        conn.query_row("SELECT COUNT(*) FROM universities", [], |r| r.get(0))?;
    let pages: usize = conn.query_row("SELECT COUNT(*) FROM pages", [], |r| r.get(0))?;
    let visited: usize =
        conn.query_row("SELECT COUNT(*) FROM pages WHERE visited = 1", [], |r| r.get(0))?;
    let fetched: usize = conn.query_row("SELECT COUNT(*) FROM page_data", [], |r| r.get(0))?;
    let fetch_errors: usize = conn.query_row(
        "SELECT COUNT(*) FROM page_data WHERE error IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    let organizations: usize =
        conn.query_row("SELECT COUNT(*) FROM organizations", [], |r| r.get(0))?;
    let placeholders: usize = conn.query_row(
        "SELECT COUNT(*) FROM organizations WHERE provenance = 'placeholder'",
        [],
        |r| r.get(0),
    )?;
    Ok(Stats {
        universities,
        pages,
        visited,
        fetched,
        fetch_errors,
        organizations,
        placeholders,
    })
}
