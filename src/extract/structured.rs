use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::normalize::collapse_ws;
use crate::record::{OrganizationRecord, Platform};

use super::fields;

static CONTAINER_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        ".organization, .club, .student-org, .org-item, .student-organization, \
         .accordion-item, .card, .listing-item",
    )
    .unwrap()
});
static LIST_ITEM_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("ul li, ol li").unwrap());
static TABLE_ROW_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table tr").unwrap());
static HEADING_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h2, h3, h4").unwrap());
static NAME_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h1, h2, h3, h4, h5, h6, .title, .name, .org-name, strong, b").unwrap()
});
static ANCHOR_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static IMG_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img[src]").unwrap());

/// Structured-markup strategy: repeated card/list/table blocks, each
/// treated as one organization. Block kinds are tried in order; the
/// first kind producing at least one plausible record wins.
pub fn extract(page: &Html, university: &str, source_url: &str) -> Vec<OrganizationRecord> {
    let cards: Vec<ElementRef> = page.select(&CONTAINER_SEL).collect();
    if cards.len() > 2 {
        let found = blocks_to_records(&cards, university, source_url);
        if !found.is_empty() {
            return found;
        }
    }

    for sel in [&*LIST_ITEM_SEL, &*TABLE_ROW_SEL] {
        let items: Vec<ElementRef> = page.select(sel).collect();
        if items.len() > 3 {
            let found = blocks_to_records(&items, university, source_url);
            if !found.is_empty() {
                return found;
            }
        }
    }

    // Heading-based listings: each org-like heading owns its parent block.
    let mut seen = HashSet::new();
    let mut found = Vec::new();
    for heading in page.select(&HEADING_SEL) {
        let name = collapse_ws(&heading.text().collect::<String>());
        if !fields::is_likely_org_name(&name) || !seen.insert(name.to_lowercase()) {
            continue;
        }
        let block = heading
            .parent()
            .and_then(ElementRef::wrap)
            .unwrap_or(heading);
        found.push(block_record(block, name, university, source_url));
    }
    found
}

fn blocks_to_records(
    blocks: &[ElementRef],
    university: &str,
    source_url: &str,
) -> Vec<OrganizationRecord> {
    let mut seen = HashSet::new();
    let mut records = Vec::new();
    for block in blocks {
        let Some(name) = find_name(*block) else {
            continue;
        };
        if !seen.insert(name.to_lowercase()) {
            continue;
        }
        records.push(block_record(*block, name, university, source_url));
    }
    records
}

/// Block heading/title text, falling back to the first link or text line.
fn find_name(block: ElementRef) -> Option<String> {
    for el in block.select(&NAME_SEL) {
        let text = collapse_ws(&el.text().collect::<String>());
        if fields::is_likely_org_name(&text) {
            return Some(text);
        }
    }
    if let Some(a) = block.select(&ANCHOR_SEL).next() {
        let text = collapse_ws(&a.text().collect::<String>());
        if fields::is_likely_org_name(&text) {
            return Some(text);
        }
    }
    let first_line = block
        .text()
        .map(str::trim)
        .find(|t| !t.is_empty())
        .map(collapse_ws)?;
    fields::is_likely_org_name(&first_line).then_some(first_line)
}

fn block_record(
    block: ElementRef,
    name: String,
    university: &str,
    source_url: &str,
) -> OrganizationRecord {
    let mut rec = OrganizationRecord::new(university, &name, source_url);
    let text: Vec<&str> = block.text().collect();
    let joined = text.join("\n");

    rec.email = fields::extract_email(&joined).unwrap_or_default();
    rec.phone = fields::extract_phone(&joined).unwrap_or_default();
    rec.description = fields::pick_description(text.iter().copied(), &name).unwrap_or_default();

    for a in block.select(&ANCHOR_SEL) {
        let Some(href) = a.value().attr("href") else {
            continue;
        };
        if href.is_empty() || href.starts_with('#') || href.starts_with("javascript") {
            continue;
        }
        if let Some(addr) = href.strip_prefix("mailto:") {
            if rec.email.is_empty() {
                rec.email = addr.split('?').next().unwrap_or_default().to_string();
            }
            continue;
        }
        let full = fields::join_url(source_url, href);
        match Platform::from_url(&full) {
            // first match per platform wins
            Some(p) if rec.social(p).is_empty() => rec.set_social(p, full),
            Some(_) => {}
            None if rec.website.is_empty() && same_host(&full, source_url) => {
                rec.website = full;
            }
            None => {}
        }
    }

    if let Some(img) = block.select(&IMG_SEL).next() {
        if let Some(src) = img.value().attr("src") {
            rec.logo_url = fields::join_url(source_url, src);
        }
    }
    if rec.logo_url.is_empty() {
        rec.logo_url = fields::first_image_url(&joined).unwrap_or_default();
    }

    rec
}

fn same_host(url: &str, base: &str) -> bool {
    let h = host(url);
    let b = host(base);
    !h.is_empty() && !b.is_empty() && (h.ends_with(b) || b.ends_with(h))
}

fn host(url: &str) -> &str {
    url.split("://")
        .nth(1)
        .unwrap_or(url)
        .split('/')
        .next()
        .unwrap_or("")
        .trim_start_matches("www.")
}
