//! Generates potential email address patterns based on names and domain.

use deunicode::deunicode;
use unicode_normalization::UnicodeNormalization;

/// Normalizes a name for local-part generation.
///
/// Composes combining sequences, transliterates to ASCII (`ø` → `o`, `ß` → `ss`),
/// lowercases, keeps only `[a-z]`, whitespace and `-`, treats `-` as a word
/// separator and collapses whitespace. Idempotent; `normalize_name("") == ""`.
pub fn normalize_name(name: &str) -> String {
    let composed: String = name.nfc().collect();
    let cleaned: String = deunicode(&composed)
        .chars()
        .map(|c| c.to_ascii_lowercase())
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_whitespace() || *c == '-')
        .map(|c| if c == '-' { ' ' } else { c })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Tokens used to build local-parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameParts {
    /// First token of the given name.
    pub first: String,
    /// Last token of the family name.
    pub last: String,
    /// Second token of the given name, if any.
    pub middle: Option<String>,
}

impl NameParts {
    /// Returns `None` when either name is empty after normalization.
    pub fn from_names(first_name: &str, last_name: &str) -> Option<Self> {
        let given = normalize_name(first_name);
        let family = normalize_name(last_name);

        let mut given_tokens = given.split(' ').filter(|t| !t.is_empty());
        let first = given_tokens.next()?.to_string();
        let middle = given_tokens.next().map(str::to_string);
        let last = family.split(' ').filter(|t| !t.is_empty()).last()?.to_string();

        Some(Self {
            first,
            last,
            middle,
        })
    }
}

fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_end_matches('.').to_lowercase()
}

fn initial(token: &str) -> char {
    // Tokens are non-empty ASCII after normalization.
    token.chars().next().unwrap_or_default()
}

/// Local-parts in canonical priority order, most likely first.
fn canonical_local_parts(parts: &NameParts) -> Vec<String> {
    let f = parts.first.as_str();
    let l = parts.last.as_str();
    let fi = initial(f);
    let li = initial(l);

    vec![
        format!("{f}.{l}"),   // john.smith
        format!("{f}{l}"),    // johnsmith
        format!("{fi}{l}"),   // jsmith
        format!("{f}_{l}"),   // john_smith
        f.to_string(),        // john
        l.to_string(),        // smith
        format!("{f}{li}"),   // johns
        format!("{fi}.{l}"),  // j.smith
        format!("{l}.{f}"),   // smith.john
        format!("{l}{f}"),    // smithjohn
        format!("{l}{fi}"),   // smithj
        format!("{fi}{li}"),  // js
        format!("{f}-{l}"),   // john-smith
        format!("{l}-{f}"),   // smith-john
        format!("{fi}_{l}"),  // j_smith
        format!("{f}.{li}"),  // john.s
    ]
}

/// Numeric suffixes on the two leading patterns, then middle-initial variants.
fn extended_local_parts(parts: &NameParts) -> Vec<String> {
    let f = parts.first.as_str();
    let l = parts.last.as_str();

    let mut local_parts = Vec::new();
    for n in ["1", "2", "01", "02"] {
        local_parts.push(format!("{f}.{l}{n}"));
        local_parts.push(format!("{f}{l}{n}"));
    }
    if let Some(middle) = parts.middle.as_deref() {
        let mi = initial(middle);
        local_parts.push(format!("{f}.{mi}.{l}"));
        local_parts.push(format!("{f}{mi}{l}"));
    }
    local_parts
}

/// Joins local-parts with the domain, dropping repeats while keeping first occurrences.
fn to_addresses(local_parts: Vec<String>, domain: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    local_parts
        .into_iter()
        .filter(|local| seen.insert(local.clone()))
        .map(|local| format!("{}@{}", local, domain))
        .collect()
}

/// Generates the canonical, ordered list of candidate addresses.
///
/// Element 0 is the most likely address. Returns an empty vector if either
/// name or the domain is empty after normalization.
pub fn generate_email_patterns(first_name: &str, last_name: &str, domain: &str) -> Vec<String> {
    let domain = normalize_domain(domain);
    let Some(parts) = NameParts::from_names(first_name, last_name) else {
        tracing::debug!(
            "Cannot generate patterns: name parts empty after normalization ('{} {}')",
            first_name,
            last_name
        );
        return Vec::new();
    };
    if domain.is_empty() {
        tracing::debug!("Cannot generate patterns: empty domain");
        return Vec::new();
    }

    let patterns = to_addresses(canonical_local_parts(&parts), &domain);
    tracing::trace!(
        "Generated {} patterns for '{} {}' @ '{}'",
        patterns.len(),
        parts.first,
        parts.last,
        domain
    );
    patterns
}

/// Canonical list followed by the extended variants. Never reorders the canonical part.
pub fn generate_email_patterns_extended(
    first_name: &str,
    last_name: &str,
    domain: &str,
) -> Vec<String> {
    let domain = normalize_domain(domain);
    let Some(parts) = NameParts::from_names(first_name, last_name) else {
        return Vec::new();
    };
    if domain.is_empty() {
        return Vec::new();
    }

    let mut local_parts = canonical_local_parts(&parts);
    local_parts.extend(extended_local_parts(&parts));
    to_addresses(local_parts, &domain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_generate_patterns_order() {
        let patterns = generate_email_patterns("John", "Smith", "acme.com");
        let locals: Vec<&str> = patterns
            .iter()
            .map(|p| p.split('@').next().unwrap())
            .collect();
        assert_eq!(
            locals,
            vec![
                "john.smith",
                "johnsmith",
                "jsmith",
                "john_smith",
                "john",
                "smith",
                "johns",
                "j.smith",
                "smith.john",
                "smithjohn",
                "smithj",
                "js",
                "john-smith",
                "smith-john",
                "j_smith",
                "john.s",
            ]
        );
        assert_eq!(patterns[0], "john.smith@acme.com");
    }

    #[test]
    fn test_multi_token_and_hyphenated_names() {
        let patterns = generate_email_patterns("Mary Jane", "Smith-Jones", "acme.com");
        assert!(patterns.contains(&"mary.jones@acme.com".to_string()));
        assert!(!patterns.iter().any(|p| p.contains("smith")));
        assert!(!patterns.iter().any(|p| p.contains("jane")));
    }

    #[test]
    fn test_diacritics_are_transliterated() {
        let patterns = generate_email_patterns("José María", "García-López", "Empresa.com ");
        assert_eq!(patterns[0], "jose.lopez@empresa.com");
    }

    #[test]
    fn test_letters_without_decomposition_are_transliterated() {
        let patterns = generate_email_patterns("Łukasz", "Østergaard", "acme.com");
        assert_eq!(patterns[0], "lukasz.ostergaard@acme.com");
        assert_eq!(normalize_name("Søren Straße"), "soren strasse");
        assert_eq!(normalize_name("Æsa Đorđević"), "aesa dordevic");
    }

    #[test]
    fn test_empty_inputs() {
        assert!(generate_email_patterns("", "Smith", "acme.com").is_empty());
        assert!(generate_email_patterns("John", "", "acme.com").is_empty());
        assert!(generate_email_patterns("John", "Smith", "  ").is_empty());
        assert!(generate_email_patterns("$%^", "Smith", "acme.com").is_empty());
        assert!(generate_email_patterns("---", "Smith", "acme.com").is_empty());
    }

    #[test]
    fn test_duplicates_removed_in_order() {
        let patterns = generate_email_patterns("Test", "Test", "test.com");
        assert_eq!(patterns[0], "test.test@test.com");
        assert_eq!(patterns.iter().filter(|p| *p == "test@test.com").count(), 1);
        assert_eq!(patterns.iter().filter(|p| *p == "ttest@test.com").count(), 1);
        let mut unique = patterns.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), patterns.len());
    }

    #[test]
    fn test_extended_appends_after_canonical() {
        let canonical = generate_email_patterns("John Paul", "Smith", "acme.com");
        let extended = generate_email_patterns_extended("John Paul", "Smith", "acme.com");
        assert_eq!(&extended[..canonical.len()], canonical.as_slice());
        let tail: Vec<&str> = extended[canonical.len()..]
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(
            tail,
            vec![
                "john.smith1@acme.com",
                "johnsmith1@acme.com",
                "john.smith2@acme.com",
                "johnsmith2@acme.com",
                "john.smith01@acme.com",
                "johnsmith01@acme.com",
                "john.smith02@acme.com",
                "johnsmith02@acme.com",
                "john.p.smith@acme.com",
                "johnpsmith@acme.com",
            ]
        );
    }

    #[test]
    fn test_extended_without_middle_name() {
        let extended = generate_email_patterns_extended("John", "Smith", "acme.com");
        assert_eq!(extended.len(), 16 + 8);
    }

    #[test]
    fn test_normalize_name_examples() {
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name("  O'Brien  "), "obrien");
        assert_eq!(normalize_name("Jean-Luc"), "jean luc");
        assert_eq!(normalize_name("Zoë\tvan  der Berg"), "zoe van der berg");
    }

    proptest! {
        #[test]
        fn normalize_name_is_idempotent(s in "\\PC{0,40}") {
            let once = normalize_name(&s);
            prop_assert_eq!(normalize_name(&once), once);
        }

        #[test]
        fn alphabetic_names_always_yield_patterns(
            first in "[A-Za-z]{1,12}",
            last in "[A-Za-z]{1,12}",
        ) {
            let patterns = generate_email_patterns(&first, &last, "acme.com");
            prop_assert!(!patterns.is_empty());
            let expected = format!("{}.{}@acme.com", first.to_lowercase(), last.to_lowercase());
            prop_assert_eq!(&patterns[0], &expected);
        }
    }
}
