pub mod fields;
pub mod mock;
pub mod structured;
pub mod text;

use scraper::Html;
use thiserror::Error;

use crate::record::OrganizationRecord;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("page content for {url} is not text")]
    BinaryContent { url: String },
}

/// Extract candidate organization records from raw page text. Strategies
/// run in priority order: structured markup first, then free-text
/// patterns over the page's flattened text. Zero candidates is a valid
/// outcome, not an error.
pub fn extract(
    page_text: &str,
    university: &str,
    source_url: &str,
) -> Result<Vec<OrganizationRecord>, ExtractError> {
    if page_text.contains('\0') {
        return Err(ExtractError::BinaryContent {
            url: source_url.to_string(),
        });
    }

    let page = Html::parse_document(page_text);
    let found = structured::extract(&page, university, source_url);
    if !found.is_empty() {
        return Ok(found);
    }

    let flat = page
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join("\n");
    Ok(text::extract(&flat, university, source_url))
}

/// Pipeline entry point: `None` means the fetch failed, in which case
/// flagged placeholder records keep the downstream schema exercised.
pub fn extract_or_placeholder(
    page_text: Option<&str>,
    university: &str,
    source_url: &str,
) -> Result<Vec<OrganizationRecord>, ExtractError> {
    match page_text {
        Some(body) => extract(body, university, source_url),
        None => Ok(mock::placeholder_records(university, source_url)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Provenance;

    #[test]
    fn binary_payload_is_an_error() {
        let err = extract("PK\u{0}\u{3}\u{4}junk", "Rice", "https://rice.edu");
        assert!(matches!(err, Err(ExtractError::BinaryContent { .. })));
    }

    #[test]
    fn no_candidates_is_empty_not_error() {
        let found = extract("<p>nothing here.</p>", "Rice", "https://rice.edu").unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn text_strategy_runs_when_markup_has_no_blocks() {
        let html = "<html><body><div>Chess Club\nThe Chess Club hosts weekly tournaments open to everyone.</div></body></html>";
        let found = extract(html, "Rice", "https://rice.edu").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Chess Club");
    }

    #[test]
    fn missing_page_falls_back_to_placeholders() {
        let found = extract_or_placeholder(None, "Rice", "https://rice.edu").unwrap();
        assert!(!found.is_empty());
        assert!(found.iter().all(|r| r.provenance == Provenance::Placeholder));
    }
}
