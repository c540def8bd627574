use std::sync::LazyLock;

use regex::Regex;

use crate::record::{OrganizationRecord, Platform};

use super::fields;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s"'<>)]+"#).unwrap());

/// Text-pattern strategy: used when a page has no recognizable repeating
/// markup. Scans for capitalized multi-word organization-name-like lines
/// and treats the run of lines up to the next candidate as that
/// organization's block.
pub fn extract(text: &str, university: &str, source_url: &str) -> Vec<OrganizationRecord> {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let candidates: Vec<usize> = (0..lines.len())
        .filter(|&i| is_candidate(&lines, i))
        .collect();

    let mut records = Vec::new();
    for (n, &start) in candidates.iter().enumerate() {
        let end = candidates
            .get(n + 1)
            .copied()
            .unwrap_or(lines.len())
            .min(start + 12);
        let name = lines[start];
        let block = &lines[start + 1..end.max(start + 1)];
        let joined = block.join("\n");

        let mut rec = OrganizationRecord::new(university, name, source_url);
        rec.description = fields::pick_description(block.iter().copied(), name).unwrap_or_default();
        rec.email = fields::extract_email(&joined).unwrap_or_default();
        rec.phone = fields::extract_phone(&joined).unwrap_or_default();
        for m in URL_RE.find_iter(&joined) {
            if let Some(p) = Platform::from_url(m.as_str()) {
                if rec.social(p).is_empty() {
                    rec.set_social(p, m.as_str().to_string());
                }
            }
        }
        records.push(rec);
    }
    records
}

/// A candidate name line is a capitalized multi-word phrase that either
/// carries an organization indicator word or is followed by descriptive
/// text.
fn is_candidate(lines: &[&str], i: usize) -> bool {
    let line = lines[i];
    if !fields::is_likely_org_name(line) || line.ends_with('.') {
        return false;
    }
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.len() < 2 || words.len() > 8 {
        return false;
    }
    let capitalized = words
        .iter()
        .filter(|w| w.chars().next().is_some_and(char::is_uppercase))
        .count();
    if capitalized * 2 < words.len() {
        return false;
    }

    let lower = line.to_lowercase();
    let has_indicator = [
        "club", "society", "association", "council", "committee", "union",
        "fraternity", "sorority", "ministry", "government", "team", "program",
    ]
    .iter()
    .any(|kw| lower.contains(kw));

    let followed_by_text = lines
        .get(i + 1)
        .is_some_and(|next| next.len() > fields::MIN_DESCRIPTION_LEN && !next.starts_with("http"));

    has_indicator || followed_by_text
}
