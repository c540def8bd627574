use std::path::Path;

use anyhow::Result;

use crate::record::{OrganizationRecord, REPORT_COLUMNS};

/// Write records as CSV in the fixed 13-column sink order.
pub fn write_csv(path: &Path, records: &[OrganizationRecord]) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(REPORT_COLUMNS)?;
    for rec in records {
        writer.write_record(rec.to_row())?;
    }
    writer.flush()?;
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Category;

    #[test]
    fn csv_has_header_and_fixed_column_order() {
        let mut rec = OrganizationRecord::new("Rice", "Chess Club", "");
        rec.category = Category::Academic;

        let path = std::env::temp_dir().join("campus_scraper_export_test.csv");
        write_csv(&path, &[rec]).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Category,Organization Name,Organization Link,Logo Link,Description,\
             Email,Phone Number,LinkedIn Link,Instagram Link,Facebook Link,\
             Twitter Link,YouTube Link,TikTok Link"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("Academic,Chess Club,"));
    }
}
