use std::sync::LazyLock;

use regex::Regex;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());
static OBFUSCATED_EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[A-Za-z0-9._%+-]+\s*\[at\]\s*[A-Za-z0-9.-]+\s*\[dot\]\s*[A-Za-z]{2,}")
        .unwrap()
});
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}").unwrap());
static IMAGE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)https?://[^\s"'<>)]+\.(?:png|jpe?g|gif|svg|webp)"#).unwrap()
});
static URL_SHAPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://[^\s]+\.[^\s]+$").unwrap());

/// Addresses that are never an organization contact.
const EMAIL_SKIP: &[&str] = &["noreply", "no-reply", "webmaster", "example."];
/// Local parts that suggest an org-specific inbox; preferred over generic ones.
const EMAIL_PREFER: &[&str] = &["student", "club", "org", "society", "sga", "group"];

const NAME_SKIP_TERMS: &[&str] = &[
    "home", "about us", "contact us", "login", "search", "menu", "navigation",
    "footer", "header", "sidebar", "copyright", "privacy", "terms of use",
    "back to top", "skip to", "click here", "read more", "learn more",
    "view all", "show all", "student services", "student life",
    "student organizations", "clubs and organizations",
];

const ORG_INDICATORS: &[&str] = &[
    "club", "society", "association", "organization", "group", "team",
    "council", "committee", "union", "fraternity", "sorority", "honor",
    "ministry", "choir", "band", "government", "program", "alliance",
];

const DESCRIPTION_SKIP: &[&str] = &["click here", "read more", "learn more", "view all"];

pub const MIN_DESCRIPTION_LEN: usize = 20;
pub const MAX_DESCRIPTION_LEN: usize = 800;

/// Minimal URL shape check used when clearing malformed link fields.
pub fn is_valid_url(s: &str) -> bool {
    URL_SHAPE_RE.is_match(s)
}

/// Full-shape email check; used by the normalizer to clear bad values.
pub fn is_valid_email(s: &str) -> bool {
    EMAIL_RE
        .find(s)
        .is_some_and(|m| m.start() == 0 && m.end() == s.len())
}

/// Best-effort email extraction. Matches embedded in URL paths are
/// rejected, known non-contact inboxes skipped, and `[at]`/`[dot]`
/// obfuscation undone as a fallback.
pub fn extract_email(text: &str) -> Option<String> {
    let mut candidates: Vec<&str> = Vec::new();
    for m in EMAIL_RE.find_iter(text) {
        // foo@bar inside "site.com/foo@bar" is a URL path, not a contact
        if text[..m.start()].ends_with('/') {
            continue;
        }
        let lower = m.as_str().to_lowercase();
        if EMAIL_SKIP.iter().any(|s| lower.contains(s)) {
            continue;
        }
        candidates.push(m.as_str());
    }

    let preferred = candidates.iter().find(|c| {
        let local = c.split('@').next().unwrap_or("").to_lowercase();
        EMAIL_PREFER.iter().any(|p| local.contains(p))
    });
    if let Some(email) = preferred.or(candidates.first()) {
        return Some(email.to_string());
    }

    OBFUSCATED_EMAIL_RE.find(text).map(|m| {
        m.as_str()
            .to_lowercase()
            .replace("[at]", "@")
            .replace("[dot]", ".")
            .replace(' ', "")
    })
}

/// Canonicalize a phone-shaped string to `(XXX) XXX-XXXX`. Accepts a
/// leading US country code; anything else is rejected.
pub fn canonical_phone(raw: &str) -> Option<String> {
    let digits: Vec<u8> = raw.bytes().filter(|b| b.is_ascii_digit()).collect();
    let digits: &[u8] = match digits.len() {
        10 => &digits,
        11 if digits[0] == b'1' => &digits[1..],
        _ => return None,
    };
    let s = std::str::from_utf8(digits).ok()?;
    Some(format!("({}) {}-{}", &s[..3], &s[3..6], &s[6..]))
}

/// First phone-number-shaped run in the text, canonicalized. Matches
/// that are part of a longer digit run are skipped.
pub fn extract_phone(text: &str) -> Option<String> {
    for m in PHONE_RE.find_iter(text) {
        let before = text[..m.start()].chars().next_back();
        let after = text[m.end()..].chars().next();
        if before.is_some_and(|c| c.is_ascii_digit()) || after.is_some_and(|c| c.is_ascii_digit()) {
            continue;
        }
        if let Some(p) = canonical_phone(m.as_str()) {
            return Some(p);
        }
    }
    None
}

/// First image-like URL in the text.
pub fn first_image_url(text: &str) -> Option<String> {
    IMAGE_URL_RE.find(text).map(|m| m.as_str().to_string())
}

/// Resolve an href/src against the page it came from. Handles only the
/// shapes the directories actually use: absolute, scheme-relative, and
/// host-relative.
pub fn join_url(base: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    if let Some(rest) = href.strip_prefix("//") {
        return format!("https://{}", rest);
    }
    let origin = base
        .find("://")
        .and_then(|i| base[i + 3..].find('/').map(|j| &base[..i + 3 + j]))
        .unwrap_or(base);
    if href.starts_with('/') {
        format!("{}{}", origin, href)
    } else {
        format!("{}/{}", origin.trim_end_matches('/'), href)
    }
}

/// Heuristic filter for organization-name-like text.
pub fn is_likely_org_name(text: &str) -> bool {
    let t = text.trim();
    if t.len() < 3 || t.len() > 120 {
        return false;
    }
    let lower = t.to_lowercase();
    if NAME_SKIP_TERMS.iter().any(|s| lower.contains(s)) {
        return false;
    }
    if t.chars().all(|c| c.is_ascii_digit() || c.is_ascii_punctuation()) {
        return false;
    }
    let words = t.split_whitespace().count();
    ORG_INDICATORS.iter().any(|s| lower.contains(s)) || (2..=12).contains(&words)
}

/// Longest text run above the minimum length, excluding the org name
/// itself, link-only text, and navigation boilerplate. Capped at
/// `MAX_DESCRIPTION_LEN` characters.
pub fn pick_description<'a, I>(texts: I, name: &str) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<&str> = None;
    for t in texts {
        let t = t.trim();
        if t.len() <= MIN_DESCRIPTION_LEN || t == name {
            continue;
        }
        let lower = t.to_lowercase();
        if lower.starts_with("http") || lower.starts_with("www.") {
            continue;
        }
        if DESCRIPTION_SKIP.iter().any(|s| lower.contains(s)) {
            continue;
        }
        if best.map_or(true, |b| t.len() > b.len()) {
            best = Some(t);
        }
    }
    best.map(|t| t.chars().take(MAX_DESCRIPTION_LEN).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_standard_shape() {
        assert_eq!(
            extract_email("Contact us at sga@beulah.edu for details"),
            Some("sga@beulah.edu".to_string())
        );
    }

    #[test]
    fn email_rejects_non_address() {
        assert_eq!(extract_email("foo(at)bar"), None);
        assert!(!is_valid_email("foo(at)bar"));
        assert!(is_valid_email("foo@bar.edu"));
    }

    #[test]
    fn email_rejects_url_embedded() {
        assert_eq!(extract_email("see https://example.com/user@host.com/page"), None);
    }

    #[test]
    fn email_deobfuscates() {
        assert_eq!(
            extract_email("write to club [at] rice [dot] edu"),
            Some("club@rice.edu".to_string())
        );
    }

    #[test]
    fn email_prefers_org_inbox() {
        let text = "info@rice.edu or chessclub@rice.edu";
        assert_eq!(extract_email(text), Some("chessclub@rice.edu".to_string()));
    }

    #[test]
    fn email_skips_noreply() {
        assert_eq!(extract_email("noreply@rice.edu"), None);
    }

    #[test]
    fn phone_formats_share_canonical_form() {
        let dotted = extract_phone("call 555.123.4567 today");
        let parens = extract_phone("call (555) 123-4567 today");
        assert_eq!(dotted.as_deref(), Some("(555) 123-4567"));
        assert_eq!(dotted, parens);
    }

    #[test]
    fn phone_accepts_country_code() {
        assert_eq!(
            extract_phone("+1 404-627-2681").as_deref(),
            Some("(404) 627-2681")
        );
    }

    #[test]
    fn phone_skips_longer_digit_runs() {
        assert_eq!(extract_phone("id 55512345678901"), None);
    }

    #[test]
    fn description_picks_longest_non_link_run() {
        let texts = [
            "Chess Club",
            "https://chess.rice.edu",
            "Weekly blitz tournaments open to all skill levels.",
            "The Chess Club hosts weekly tournaments, lectures by visiting masters, and an annual intercollegiate match.",
        ];
        let d = pick_description(texts, "Chess Club").unwrap();
        assert!(d.starts_with("The Chess Club hosts"));
    }

    #[test]
    fn description_requires_minimum_length() {
        assert_eq!(pick_description(["short text"], "X"), None);
    }

    #[test]
    fn org_name_heuristic() {
        assert!(is_likely_org_name("Chess Club"));
        assert!(is_likely_org_name("Phi Theta Kappa Honor Society"));
        assert!(!is_likely_org_name("Click here to read more"));
        assert!(!is_likely_org_name("42"));
        assert!(!is_likely_org_name("ok"));
    }

    #[test]
    fn join_url_shapes() {
        assert_eq!(
            join_url("https://rice.edu/orgs/page", "/img/logo.png"),
            "https://rice.edu/img/logo.png"
        );
        assert_eq!(
            join_url("https://rice.edu/orgs", "https://cdn.example.com/a.png"),
            "https://cdn.example.com/a.png"
        );
        assert_eq!(join_url("https://rice.edu", "//cdn.example.com/a.png"), "https://cdn.example.com/a.png");
    }
}
