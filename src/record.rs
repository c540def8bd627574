use serde::{Deserialize, Serialize};

use crate::normalize::collapse_ws;

/// Column order expected by the downstream spreadsheet sink. `to_row`
/// emits fields in exactly this order.
pub const REPORT_COLUMNS: [&str; 13] = [
    "Category",
    "Organization Name",
    "Organization Link",
    "Logo Link",
    "Description",
    "Email",
    "Phone Number",
    "LinkedIn Link",
    "Instagram Link",
    "Facebook Link",
    "Twitter Link",
    "YouTube Link",
    "TikTok Link",
];

/// Closed category taxonomy. Free text maps onto it during
/// normalization; anything unrecognized lands in `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Academic,
    Leadership,
    Professional,
    Arts,
    Religious,
    Cultural,
    Service,
    Recreation,
    SpecialInterest,
    Other,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Academic => "Academic",
            Category::Leadership => "Leadership",
            Category::Professional => "Professional",
            Category::Arts => "Arts",
            Category::Religious => "Religious",
            Category::Cultural => "Cultural",
            Category::Service => "Service",
            Category::Recreation => "Recreation",
            Category::SpecialInterest => "Special Interest",
            Category::Other => "Other",
        }
    }

    /// Inverse of `as_str`, for rows read back from the database.
    pub fn from_name(s: &str) -> Category {
        match s {
            "Academic" => Category::Academic,
            "Leadership" => Category::Leadership,
            "Professional" => Category::Professional,
            "Arts" => Category::Arts,
            "Religious" => Category::Religious,
            "Cultural" => Category::Cultural,
            "Service" => Category::Service,
            "Recreation" => Category::Recreation,
            "Special Interest" => Category::SpecialInterest,
            _ => Category::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    LinkedIn,
    Instagram,
    Facebook,
    Twitter,
    YouTube,
    TikTok,
}

impl Platform {
    pub const ALL: [Platform; 6] = [
        Platform::LinkedIn,
        Platform::Instagram,
        Platform::Facebook,
        Platform::Twitter,
        Platform::YouTube,
        Platform::TikTok,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::LinkedIn => "LinkedIn",
            Platform::Instagram => "Instagram",
            Platform::Facebook => "Facebook",
            Platform::Twitter => "Twitter",
            Platform::YouTube => "YouTube",
            Platform::TikTok => "TikTok",
        }
    }

    /// Classify a URL by domain substring. twitter.com and x.com both
    /// count as Twitter.
    pub fn from_url(url: &str) -> Option<Platform> {
        let lower = url.to_lowercase();
        if lower.contains("linkedin.com") {
            Some(Platform::LinkedIn)
        } else if lower.contains("instagram.com") {
            Some(Platform::Instagram)
        } else if lower.contains("facebook.com") {
            Some(Platform::Facebook)
        } else if lower.contains("twitter.com") || lower.contains("x.com") {
            Some(Platform::Twitter)
        } else if lower.contains("youtube.com") {
            Some(Platform::YouTube)
        } else if lower.contains("tiktok.com") {
            Some(Platform::TikTok)
        } else {
            None
        }
    }
}

/// Where a record came from. Placeholder rows are synthesized when no
/// page content is available and must never be mistaken for real data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    Scraped,
    Placeholder,
}

impl Provenance {
    pub fn as_str(self) -> &'static str {
        match self {
            Provenance::Scraped => "scraped",
            Provenance::Placeholder => "placeholder",
        }
    }

    pub fn from_name(s: &str) -> Provenance {
        match s {
            "placeholder" => Provenance::Placeholder,
            _ => Provenance::Scraped,
        }
    }
}

/// One normalized organization entry. Empty string means "unknown";
/// fields are never partially validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationRecord {
    pub university: String,
    pub name: String,
    pub category: Category,
    pub source_url: String,
    pub logo_url: String,
    pub description: String,
    pub email: String,
    pub phone: String,
    pub website: String,
    pub linkedin: String,
    pub instagram: String,
    pub facebook: String,
    pub twitter: String,
    pub youtube: String,
    pub tiktok: String,
    pub provenance: Provenance,
}

impl OrganizationRecord {
    pub fn new(university: &str, name: &str, source_url: &str) -> Self {
        OrganizationRecord {
            university: university.to_string(),
            name: name.to_string(),
            category: Category::Other,
            source_url: source_url.to_string(),
            logo_url: String::new(),
            description: String::new(),
            email: String::new(),
            phone: String::new(),
            website: String::new(),
            linkedin: String::new(),
            instagram: String::new(),
            facebook: String::new(),
            twitter: String::new(),
            youtube: String::new(),
            tiktok: String::new(),
            provenance: Provenance::Scraped,
        }
    }

    pub fn social(&self, platform: Platform) -> &str {
        match platform {
            Platform::LinkedIn => &self.linkedin,
            Platform::Instagram => &self.instagram,
            Platform::Facebook => &self.facebook,
            Platform::Twitter => &self.twitter,
            Platform::YouTube => &self.youtube,
            Platform::TikTok => &self.tiktok,
        }
    }

    pub fn set_social(&mut self, platform: Platform, url: String) {
        let slot = match platform {
            Platform::LinkedIn => &mut self.linkedin,
            Platform::Instagram => &mut self.instagram,
            Platform::Facebook => &mut self.facebook,
            Platform::Twitter => &mut self.twitter,
            Platform::YouTube => &mut self.youtube,
            Platform::TikTok => &mut self.tiktok,
        };
        *slot = url;
    }

    /// Dedup key: university + name, case-insensitive and
    /// whitespace-normalized. None when either half is missing, in which
    /// case the record cannot be grouped.
    pub fn dedup_key(&self) -> Option<String> {
        let university = collapse_ws(&self.university).to_lowercase();
        let name = collapse_ws(&self.name).to_lowercase();
        if university.is_empty() || name.is_empty() {
            return None;
        }
        Some(format!("{}\u{1f}{}", university, name))
    }

    /// The "Organization Link" column: the org's own website when known,
    /// otherwise the page it was extracted from.
    pub fn org_link(&self) -> &str {
        if self.website.is_empty() {
            &self.source_url
        } else {
            &self.website
        }
    }

    /// Serialize into the fixed 13-column sink order (`REPORT_COLUMNS`).
    pub fn to_row(&self) -> [String; 13] {
        [
            self.category.as_str().to_string(),
            self.name.clone(),
            self.org_link().to_string(),
            self.logo_url.clone(),
            self.description.clone(),
            self.email.clone(),
            self.phone.clone(),
            self.linkedin.clone(),
            self.instagram.clone(),
            self.facebook.clone(),
            self.twitter.clone(),
            self.youtube.clone(),
            self.tiktok.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_order_matches_sink_columns() {
        let mut r = OrganizationRecord::new("Rice University", "Chess Club", "");
        r.category = Category::Academic;
        let row = r.to_row();
        assert_eq!(row[0], "Academic");
        assert_eq!(row[1], "Chess Club");
        for cell in &row[2..] {
            assert!(cell.is_empty());
        }
        assert_eq!(row.len(), REPORT_COLUMNS.len());
    }

    #[test]
    fn dedup_key_ignores_case_and_whitespace() {
        let a = OrganizationRecord::new("Rice  University", "chess   club", "");
        let b = OrganizationRecord::new("rice university", "Chess Club", "");
        assert_eq!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn dedup_key_requires_both_halves() {
        assert!(OrganizationRecord::new("", "Chess Club", "").dedup_key().is_none());
        assert!(OrganizationRecord::new("Rice", "  ", "").dedup_key().is_none());
    }

    #[test]
    fn org_link_falls_back_to_source_url() {
        let mut r = OrganizationRecord::new("Rice", "Chess Club", "https://rice.edu/orgs");
        assert_eq!(r.org_link(), "https://rice.edu/orgs");
        r.website = "https://chess.rice.edu".into();
        assert_eq!(r.org_link(), "https://chess.rice.edu");
    }

    #[test]
    fn platform_from_url() {
        assert_eq!(Platform::from_url("https://x.com/club"), Some(Platform::Twitter));
        assert_eq!(Platform::from_url("https://twitter.com/club"), Some(Platform::Twitter));
        assert_eq!(Platform::from_url("https://www.tiktok.com/@club"), Some(Platform::TikTok));
        assert_eq!(Platform::from_url("https://example.edu"), None);
    }

    #[test]
    fn category_name_round_trip() {
        for c in [
            Category::Academic,
            Category::SpecialInterest,
            Category::Other,
        ] {
            assert_eq!(Category::from_name(c.as_str()), c);
        }
        assert_eq!(Category::from_name("General"), Category::Other);
    }
}
