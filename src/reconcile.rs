use std::collections::HashMap;

use tracing::debug;

use crate::record::{Category, OrganizationRecord, Platform, Provenance};

/// Result of a reconciliation pass: one record per dedup key, plus the
/// number of inputs dropped for having no usable key.
#[derive(Debug)]
pub struct ReconcileOutcome {
    pub records: Vec<OrganizationRecord>,
    pub skipped: usize,
}

/// Merge records referring to the same organization. Groups by dedup key
/// in first-seen order, so the pass is deterministic for a given input
/// order and idempotent when re-applied to its own output.
pub fn reconcile(records: Vec<OrganizationRecord>) -> ReconcileOutcome {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<OrganizationRecord>> = HashMap::new();
    let mut skipped = 0usize;

    for rec in records {
        let Some(key) = rec.dedup_key() else {
            debug!(university = %rec.university, name = %rec.name, "dropping ungroupable record");
            skipped += 1;
            continue;
        };
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(rec);
    }

    let records = order
        .into_iter()
        .map(|key| merge_group(groups.remove(&key).unwrap()))
        .collect();

    ReconcileOutcome { records, skipped }
}

/// Field-by-field merge: first non-empty value wins, and scraped
/// provenance strictly outranks placeholder — when any member is real,
/// placeholder members contribute nothing at all, so a placeholder value
/// can never override a real one (even a real empty).
fn merge_group(group: Vec<OrganizationRecord>) -> OrganizationRecord {
    let any_real = group.iter().any(|r| r.provenance == Provenance::Scraped);
    let mut members = group
        .into_iter()
        .filter(|r| !any_real || r.provenance == Provenance::Scraped);

    // Non-empty by construction: any_real keeps at least one member.
    let mut merged = members.next().unwrap();
    for rec in members {
        if merged.category == Category::Other && rec.category != Category::Other {
            merged.category = rec.category;
        }
        for p in Platform::ALL {
            if merged.social(p).is_empty() && !rec.social(p).is_empty() {
                merged.set_social(p, rec.social(p).to_string());
            }
        }
        fill(&mut merged.source_url, rec.source_url);
        fill(&mut merged.logo_url, rec.logo_url);
        fill(&mut merged.description, rec.description);
        fill(&mut merged.email, rec.email);
        fill(&mut merged.phone, rec.phone);
        fill(&mut merged.website, rec.website);
    }
    merged
}

fn fill(dst: &mut String, src: String) {
    if dst.is_empty() && !src.is_empty() {
        *dst = src;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract;
    use crate::normalize::normalize;

    fn rec(university: &str, name: &str) -> OrganizationRecord {
        OrganizationRecord::new(university, name, "https://u.edu/orgs")
    }

    #[test]
    fn no_two_outputs_share_a_key() {
        let input = vec![
            rec("Rice", "Chess Club"),
            rec("Rice", "chess  club"),
            rec("Rice", "Glee Club"),
            rec("Baylor", "Chess Club"),
        ];
        let out = reconcile(input);
        assert_eq!(out.records.len(), 3);
        let mut keys: Vec<_> = out.records.iter().map(|r| r.dedup_key().unwrap()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn merge_prefers_first_non_empty_value() {
        let mut a = rec("Rice", "Chess Club");
        a.email = "first@rice.edu".into();
        let mut b = rec("Rice", "Chess Club");
        b.email = "second@rice.edu".into();
        b.phone = "(555) 123-4567".into();
        let out = reconcile(vec![a, b]);
        assert_eq!(out.records[0].email, "first@rice.edu");
        assert_eq!(out.records[0].phone, "(555) 123-4567");
    }

    #[test]
    fn real_wins_even_when_empty() {
        let mut placeholder = rec("Rice", "Chess Club");
        placeholder.provenance = Provenance::Placeholder;
        placeholder.email = "x@y.com".into();
        let real = rec("Rice", "Chess Club"); // empty email, scraped

        let out = reconcile(vec![placeholder, real]);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].email, "");
        assert_eq!(out.records[0].provenance, Provenance::Scraped);
    }

    #[test]
    fn all_placeholder_group_stays_flagged() {
        let mut a = rec("Rice", "Chess Club");
        a.provenance = Provenance::Placeholder;
        let mut b = rec("Rice", "Chess Club");
        b.provenance = Provenance::Placeholder;
        b.description = "weekly games".into();
        let out = reconcile(vec![a, b]);
        assert_eq!(out.records[0].provenance, Provenance::Placeholder);
        assert_eq!(out.records[0].description, "weekly games");
    }

    #[test]
    fn ungroupable_records_are_counted_not_fatal() {
        let input = vec![rec("", ""), rec("Rice", "Chess Club"), rec("", "Nameless U Org")];
        let out = reconcile(input);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.skipped, 2);
    }

    #[test]
    fn reconcile_is_idempotent() {
        let mut a = rec("Rice", "Chess Club");
        a.email = "chess@rice.edu".into();
        let mut b = rec("Rice", "Chess Club");
        b.linkedin = "https://linkedin.com/company/ricechess".into();
        let input = vec![a, b, rec("Rice", "Glee Club")];

        let once = reconcile(input);
        let twice = reconcile(once.records.clone());
        assert_eq!(once.records, twice.records);
        assert_eq!(twice.skipped, 0);
    }

    // Two raw pages for the same university, each mentioning Chess Club
    // once: one carries an email, the other a LinkedIn link. After the
    // full pipeline exactly one record exists carrying both.
    #[test]
    fn two_pages_merge_into_one_record() {
        let page_a = r#"<div class="card"><h3>Chess Club</h3>
            <a href="mailto:chess@rice.edu">contact</a></div>
            <div class="card"><h3>Glee Club</h3></div>
            <div class="card"><h3>Debate Society</h3></div>"#;
        let page_b = r#"<div class="card"><h3>Chess Club</h3>
            <a href="https://linkedin.com/company/ricechess">LinkedIn</a></div>
            <div class="card"><h3>Jazz Band</h3></div>
            <div class="card"><h3>Art Club</h3></div>"#;

        let mut all = Vec::new();
        for page in [page_a, page_b] {
            let found = extract::extract(page, "Rice University", "https://rice.edu/orgs").unwrap();
            all.extend(found.into_iter().map(normalize));
        }
        let out = reconcile(all);

        let chess: Vec<_> = out
            .records
            .iter()
            .filter(|r| r.name == "Chess Club")
            .collect();
        assert_eq!(chess.len(), 1);
        assert_eq!(chess[0].email, "chess@rice.edu");
        assert_eq!(chess[0].linkedin, "https://linkedin.com/company/ricechess");
    }
}
