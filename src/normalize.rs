use std::collections::HashMap;

use tracing::debug;

use crate::extract::fields::{canonical_phone, is_valid_email, is_valid_url};
use crate::record::{Category, OrganizationRecord, Platform};

/// Keyword lookup for the category taxonomy, checked in order; the first
/// matching bucket wins and anything unmatched stays `Other`.
const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Leadership,
        &[
            "student government", "sga", "student council", "student senate",
            "associated students", "ambassador", "activities council", "leadership",
        ],
    ),
    (
        Category::Religious,
        &[
            "ministry", "christian", "muslim", "jewish", "faith", "chapel",
            "church", "bible", "spiritual", "religious",
        ],
    ),
    (
        Category::Academic,
        &[
            "honor society", "honor", "phi theta kappa", "academic", "scholar",
            "research", "pre-med", "pre-law", "journalism", "biology", "mathematics",
        ],
    ),
    (
        Category::Cultural,
        &[
            "cultural", "international", "heritage", "multicultural", "diversity",
            "ethnic", "native american", "hispanic", "african american", "asian",
        ],
    ),
    (
        Category::Arts,
        &[
            "arts", "art club", "music", "theater", "theatre", "dance", "drama",
            "band", "choir", "creative", "visual", "performing",
        ],
    ),
    (
        Category::Service,
        &[
            "service", "volunteer", "outreach", "charity", "veterans",
            "humanitarian", "community",
        ],
    ),
    (
        Category::Recreation,
        &[
            "recreation", "outdoor", "intramural", "sport", "athletic", "fitness",
            "hiking", "climbing",
        ],
    ),
    (
        Category::SpecialInterest,
        &[
            "fraternity", "sorority", "greek", "gaming", "anime", "photography",
            "debate", "chess", "environment", "sustainability", "robotics",
        ],
    ),
    (
        Category::Professional,
        &[
            "professional", "career", "business", "engineering", "nursing",
            "medical", "law", "accounting", "marketing", "media", "culinary",
            "technology",
        ],
    ),
];

/// Collapse internal whitespace and trim edges.
pub fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Map free text onto the closed taxonomy by keyword lookup.
pub fn infer_category(text: &str) -> Category {
    let lower = text.to_lowercase();
    for (category, keywords) in CATEGORY_KEYWORDS {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            return *category;
        }
    }
    Category::Other
}

/// Canonicalize a record: whitespace cleanup on every string field,
/// category inference for uncategorized records, shape validation that
/// clears malformed contact fields, and cross-platform social-link
/// dedup. Pure and idempotent.
pub fn normalize(mut rec: OrganizationRecord) -> OrganizationRecord {
    rec.university = collapse_ws(&rec.university);
    rec.name = collapse_ws(&rec.name);
    rec.source_url = collapse_ws(&rec.source_url);
    rec.logo_url = collapse_ws(&rec.logo_url);
    rec.description = collapse_ws(&rec.description);
    rec.email = collapse_ws(&rec.email);
    rec.phone = collapse_ws(&rec.phone);
    rec.website = collapse_ws(&rec.website);
    for p in Platform::ALL {
        rec.set_social(p, collapse_ws(rec.social(p)));
    }

    if rec.category == Category::Other {
        rec.category = infer_category(&format!("{} {}", rec.name, rec.description));
    }

    if !rec.email.is_empty() && !is_valid_email(&rec.email) {
        debug!(org = %rec.name, email = %rec.email, "clearing malformed email");
        rec.email.clear();
    }
    if !rec.phone.is_empty() {
        match canonical_phone(&rec.phone) {
            Some(p) => rec.phone = p,
            None => {
                debug!(org = %rec.name, phone = %rec.phone, "clearing malformed phone");
                rec.phone.clear();
            }
        }
    }
    for field in [&mut rec.website, &mut rec.logo_url] {
        if !field.is_empty() && !is_valid_url(field) {
            debug!(org = %rec.name, url = %field, "clearing malformed url");
            field.clear();
        }
    }
    for p in Platform::ALL {
        let url = rec.social(p).to_string();
        if !url.is_empty() && !is_valid_url(&url) {
            debug!(org = %rec.name, url = %url, "clearing malformed social link");
            rec.set_social(p, String::new());
        }
    }

    dedup_social_links(&mut rec);
    rec
}

/// A URL mistakenly captured under two platforms keeps only the platform
/// its domain actually matches; ties keep the first platform in
/// declaration order.
fn dedup_social_links(rec: &mut OrganizationRecord) {
    let mut seen: HashMap<String, Platform> = HashMap::new();
    for p in Platform::ALL {
        let url = rec.social(p).to_string();
        if url.is_empty() {
            continue;
        }
        match seen.get(&url).copied() {
            None => {
                seen.insert(url, p);
            }
            Some(prev) => {
                if Platform::from_url(&url) == Some(p) {
                    rec.set_social(prev, String::new());
                    seen.insert(url, p);
                } else {
                    rec.set_social(p, String::new());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Provenance;

    fn base() -> OrganizationRecord {
        OrganizationRecord::new("Rice University", "Chess Club", "https://rice.edu/orgs")
    }

    #[test]
    fn normalize_is_idempotent() {
        let mut rec = base();
        rec.name = "  Chess   Club ".into();
        rec.email = "foo(at)bar".into();
        rec.phone = "555.123.4567".into();
        rec.description = "  weekly   games ".into();
        let once = normalize(rec);
        let twice = normalize(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn whitespace_is_collapsed() {
        let mut rec = base();
        rec.name = "  Chess \t  Club ".into();
        assert_eq!(normalize(rec).name, "Chess Club");
    }

    #[test]
    fn malformed_email_is_cleared() {
        let mut rec = base();
        rec.email = "foo(at)bar".into();
        assert_eq!(normalize(rec).email, "");

        let mut rec = base();
        rec.email = "foo@bar.edu".into();
        assert_eq!(normalize(rec).email, "foo@bar.edu");
    }

    #[test]
    fn phone_formats_normalize_to_one_canonical_string() {
        let mut a = base();
        a.phone = "555.123.4567".into();
        let mut b = base();
        b.phone = "(555) 123-4567".into();
        let a = normalize(a);
        let b = normalize(b);
        assert_eq!(a.phone, "(555) 123-4567");
        assert_eq!(a.phone, b.phone);
    }

    #[test]
    fn malformed_phone_is_cleared() {
        let mut rec = base();
        rec.phone = "ext. 12".into();
        assert_eq!(normalize(rec).phone, "");
    }

    #[test]
    fn category_keyword_lookup() {
        assert_eq!(infer_category("Alpha Beta fraternity chapter"), Category::SpecialInterest);
        assert_eq!(infer_category("National Honor Society"), Category::Academic);
        assert_eq!(infer_category("Campus Ministry"), Category::Religious);
        assert_eq!(infer_category("completely unrelated text"), Category::Other);
    }

    #[test]
    fn category_inference_preserves_existing_assignment() {
        let mut rec = base();
        rec.category = Category::Arts;
        rec.description = "a fraternity for painters".into();
        assert_eq!(normalize(rec).category, Category::Arts);
    }

    #[test]
    fn uncategorized_record_gets_inferred_category() {
        let mut rec = base();
        rec.description = "spiritual guidance and campus ministry events".into();
        assert_eq!(normalize(rec).category, Category::Religious);
    }

    #[test]
    fn duplicate_social_url_keeps_matching_platform() {
        let mut rec = base();
        rec.facebook = "https://instagram.com/ricechess".into();
        rec.instagram = "https://instagram.com/ricechess".into();
        let rec = normalize(rec);
        assert_eq!(rec.instagram, "https://instagram.com/ricechess");
        assert_eq!(rec.facebook, "");
    }

    #[test]
    fn malformed_social_url_is_cleared() {
        let mut rec = base();
        rec.linkedin = "not a url".into();
        assert_eq!(normalize(rec).linkedin, "");
    }

    #[test]
    fn provenance_is_untouched() {
        let mut rec = base();
        rec.provenance = Provenance::Placeholder;
        assert_eq!(normalize(rec).provenance, Provenance::Placeholder);
    }
}
