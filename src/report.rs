use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::record::{OrganizationRecord, Provenance, REPORT_COLUMNS};

/// Columns whose fill rates are tracked: everything after the two
/// required columns (Category, Organization Name).
const FIRST_TRACKED_COLUMN: usize = 2;

#[derive(Debug, Serialize)]
pub struct FieldFill {
    pub field: &'static str,
    pub filled: usize,
    pub rate_pct: f64,
}

#[derive(Debug, Serialize)]
pub struct UniversitySummary {
    pub university: String,
    pub organizations_found: usize,
    pub expected_count: Option<usize>,
    /// None means "not applicable" (expected count absent or zero),
    /// deliberately distinct from 0%.
    pub success_rate_pct: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct CompletenessReport {
    pub scraped_records: usize,
    pub placeholder_records: usize,
    pub fields: Vec<FieldFill>,
    pub universities: Vec<UniversitySummary>,
    /// Equal-weight mean of the field fill rates. Diagnostic only.
    pub health_score_pct: f64,
}

/// Compute per-field fill rates, per-university success rates against
/// expected counts, and the aggregate health score. Placeholder records
/// are counted separately and never enter the statistics.
pub fn report(
    records: &[OrganizationRecord],
    expected: &HashMap<String, usize>,
) -> CompletenessReport {
    let real: Vec<&OrganizationRecord> = records
        .iter()
        .filter(|r| r.provenance == Provenance::Scraped)
        .collect();
    let placeholder_records = records.len() - real.len();

    let tracked = &REPORT_COLUMNS[FIRST_TRACKED_COLUMN..];
    let mut filled = vec![0usize; tracked.len()];
    for rec in &real {
        let row = rec.to_row();
        for (i, cell) in row[FIRST_TRACKED_COLUMN..].iter().enumerate() {
            if !cell.is_empty() {
                filled[i] += 1;
            }
        }
    }
    let fields: Vec<FieldFill> = tracked
        .iter()
        .zip(filled)
        .map(|(&field, filled)| FieldFill {
            field,
            filled,
            rate_pct: percentage(filled, real.len()),
        })
        .collect();

    let health_score_pct = if fields.is_empty() {
        0.0
    } else {
        fields.iter().map(|f| f.rate_pct).sum::<f64>() / fields.len() as f64
    };

    CompletenessReport {
        scraped_records: real.len(),
        placeholder_records,
        fields,
        universities: university_summaries(&real, expected),
        health_score_pct,
    }
}

fn university_summaries(
    real: &[&OrganizationRecord],
    expected: &HashMap<String, usize>,
) -> Vec<UniversitySummary> {
    // First-seen order from the records, then expected-only universities
    // (typically failed scrapes) in name order.
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for rec in real {
        if !counts.contains_key(rec.university.as_str()) {
            order.push(rec.university.as_str());
        }
        *counts.entry(rec.university.as_str()).or_insert(0) += 1;
    }
    let present: HashSet<&str> = order.iter().copied().collect();
    let mut missing: Vec<&str> = expected
        .keys()
        .map(String::as_str)
        .filter(|u| !present.contains(u))
        .collect();
    missing.sort_unstable();
    order.extend(missing);

    order
        .into_iter()
        .map(|university| {
            let found = counts.get(university).copied().unwrap_or(0);
            let expected_count = expected.get(university).copied();
            let success_rate_pct = match expected_count {
                Some(e) if e > 0 => Some(percentage(found, e)),
                _ => None,
            };
            UniversitySummary {
                university: university.to_string(),
                organizations_found: found,
                expected_count,
                success_rate_pct,
            }
        })
        .collect()
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

impl CompletenessReport {
    pub fn print(&self) {
        println!(
            "Records: {} scraped, {} placeholder",
            self.scraped_records, self.placeholder_records
        );
        println!("\nField fill rates:");
        for f in &self.fields {
            println!(
                "  {:<18} {:>4}/{:<4} ({:.1}%)",
                f.field, f.filled, self.scraped_records, f.rate_pct
            );
        }
        println!("\nPer-university success:");
        for u in &self.universities {
            let rate = match u.success_rate_pct {
                Some(r) => format!("{:.1}%", r),
                None => "n/a".to_string(),
            };
            let expected = match u.expected_count {
                Some(e) => e.to_string(),
                None => "-".to_string(),
            };
            println!(
                "  {:<40} {:>4} found / {:>4} expected ({})",
                u.university, u.organizations_found, expected, rate
            );
        }
        println!("\nHealth score: {:.1}%", self.health_score_pct);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Category, OrganizationRecord};

    fn rec(university: &str, name: &str) -> OrganizationRecord {
        let mut r = OrganizationRecord::new(university, name, "");
        r.category = Category::Academic;
        r
    }

    #[test]
    fn fill_rates_count_non_empty_values() {
        let mut a = rec("Rice", "Chess Club");
        a.email = "chess@rice.edu".into();
        let b = rec("Rice", "Glee Club");

        let rep = report(&[a, b], &HashMap::new());
        let email = rep.fields.iter().find(|f| f.field == "Email").unwrap();
        assert_eq!(email.filled, 1);
        assert!((email.rate_pct - 50.0).abs() < 1e-9);
    }

    #[test]
    fn success_rate_not_applicable_without_expected_count() {
        let records = [rec("Rice", "Chess Club")];
        let mut expected = HashMap::new();
        expected.insert("Baylor".to_string(), 0usize);

        let rep = report(&records, &expected);
        let rice = rep.universities.iter().find(|u| u.university == "Rice").unwrap();
        assert_eq!(rice.success_rate_pct, None);
        // zero expected is also "not applicable", never 0% or 100%
        let baylor = rep.universities.iter().find(|u| u.university == "Baylor").unwrap();
        assert_eq!(baylor.success_rate_pct, None);
    }

    #[test]
    fn success_rate_against_expected_count() {
        let records = [rec("Rice", "A"), rec("Rice", "B")];
        let mut expected = HashMap::new();
        expected.insert("Rice".to_string(), 4usize);
        let rep = report(&records, &expected);
        assert_eq!(rep.universities[0].success_rate_pct, Some(50.0));
    }

    #[test]
    fn placeholders_never_enter_statistics() {
        let mut fake = rec("Rice", "Ghost Org");
        fake.provenance = Provenance::Placeholder;
        fake.email = "ghost@rice.edu".into();
        let real = rec("Rice", "Chess Club");

        let rep = report(&[fake, real], &HashMap::new());
        assert_eq!(rep.scraped_records, 1);
        assert_eq!(rep.placeholder_records, 1);
        let email = rep.fields.iter().find(|f| f.field == "Email").unwrap();
        assert_eq!(email.filled, 0);
        assert_eq!(rep.universities[0].organizations_found, 1);
    }

    #[test]
    fn health_score_is_mean_of_fill_rates() {
        let mut a = rec("Rice", "Chess Club");
        a.email = "chess@rice.edu".into();
        a.phone = "(555) 123-4567".into();
        let rep = report(&[a], &HashMap::new());
        let mean = rep.fields.iter().map(|f| f.rate_pct).sum::<f64>() / rep.fields.len() as f64;
        assert!((rep.health_score_pct - mean).abs() < 1e-9);
    }

    #[test]
    fn empty_input_produces_empty_report() {
        let rep = report(&[], &HashMap::new());
        assert_eq!(rep.scraped_records, 0);
        assert!(rep.universities.is_empty());
        assert_eq!(rep.health_score_pct, 0.0);
    }
}
