//! Email candidate extraction and known-fake filtering.
//!
//! Two passes per blob: email-shaped tokens anywhere in the text, then
//! explicit `mailto:` annotations in raw markup (query strings stripped).
//! Candidates survive only if they clear the blacklist; repeated
//! discovery across blobs collapses into one entry.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

/// Local parts, domain families, and token shapes that mark a candidate
/// as fake or non-business infrastructure rather than a reachable inbox.
///
/// A configuration value, not control flow: construct your own (or extend
/// the default) to tune filtering without touching extraction.
#[derive(Debug, Clone)]
pub struct EmailBlacklist {
    /// Rejected local parts, compared case-insensitively and exactly.
    pub local_parts: Vec<String>,
    /// Rejected domain families: a candidate domain matching
    /// `<prefix>.<anything>` is dropped (`example.*`, `test.*`, ...).
    pub domain_families: Vec<String>,
    /// Rejected full domains, matched exactly or as a parent domain.
    pub infrastructure_domains: Vec<String>,
    /// A candidate containing any of these anywhere is a filename
    /// masquerading as an address.
    pub image_extensions: Vec<String>,
}

impl Default for EmailBlacklist {
    fn default() -> Self {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| (*s).to_owned()).collect()
        }
        Self {
            local_parts: owned(&[
                "test",
                "demo",
                "sample",
                "fake",
                "dummy",
                "noreply",
                "no-reply",
                "no_reply",
                "donotreply",
                "do-not-reply",
            ]),
            domain_families: owned(&["example", "test", "domain"]),
            infrastructure_domains: owned(&[
                "sentry.io",
                "wixpress.com",
                "schema.org",
                "email.com",
                "yourdomain.com",
                "yoursite.com",
            ]),
            image_extensions: owned(&[".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp"]),
        }
    }
}

impl EmailBlacklist {
    /// Whether `candidate` (already lowercased) should be discarded.
    fn rejects(&self, candidate: &str) -> bool {
        if self
            .image_extensions
            .iter()
            .any(|ext| candidate.contains(ext.as_str()))
        {
            return true;
        }
        let Some((local, domain)) = candidate.split_once('@') else {
            return true;
        };
        if self.local_parts.iter().any(|l| l == local) {
            return true;
        }
        if self
            .domain_families
            .iter()
            .any(|family| domain.starts_with(&format!("{family}.")))
        {
            return true;
        }
        self.infrastructure_domains
            .iter()
            .any(|d| domain == d || domain.ends_with(&format!(".{d}")))
    }
}

/// Pulls email-shaped tokens out of raw text and markup and filters
/// known-fake patterns.
#[derive(Debug, Clone, Default)]
pub struct EmailExtractor {
    blacklist: EmailBlacklist,
}

impl EmailExtractor {
    #[must_use]
    pub fn new(blacklist: EmailBlacklist) -> Self {
        Self { blacklist }
    }

    /// Scans each blob and returns the surviving candidates, lowercased
    /// and deduplicated. An empty set is a valid, non-error result.
    pub fn extract<I, S>(&self, blobs: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut found = BTreeSet::new();
        for blob in blobs {
            let blob = blob.as_ref();
            for m in token_pattern().find_iter(blob) {
                self.admit_candidate(m.as_str(), &mut found);
            }
            // Second pass: mailto links in markup carry addresses the text
            // pass misses (display text may differ from the href).
            for caps in mailto_pattern().captures_iter(blob) {
                if let Some(address) = caps.get(1) {
                    let address = address.as_str().split('?').next().unwrap_or("");
                    if token_pattern().is_match(address) {
                        self.admit_candidate(address, &mut found);
                    }
                }
            }
        }
        found
    }

    fn admit_candidate(&self, raw: &str, found: &mut BTreeSet<String>) {
        let candidate = raw.to_lowercase();
        if self.blacklist.rejects(&candidate) {
            tracing::debug!(candidate, "discarding blacklisted email candidate");
        } else {
            found.insert(candidate);
        }
    }
}

/// Email-shaped token: local part, `@`, domain with a ≥2-character final
/// segment.
fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("valid regex")
    })
}

/// `mailto:` href annotation in raw markup.
fn mailto_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"mailto:([^"'\s>]+)"#).expect("valid regex"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(blobs: &[&str]) -> BTreeSet<String> {
        EmailExtractor::default().extract(blobs.iter().copied())
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    // -----------------------------------------------------------------------
    // Extraction
    // -----------------------------------------------------------------------

    #[test]
    fn extracts_plain_tokens() {
        let found = extract(&["Reach us at hello@realbiz.io or sales@realbiz.io today"]);
        assert_eq!(found, set(&["hello@realbiz.io", "sales@realbiz.io"]));
    }

    #[test]
    fn collapses_repeats_across_blobs() {
        let found = extract(&["hello@realbiz.io", "footer: hello@realbiz.io"]);
        assert_eq!(found, set(&["hello@realbiz.io"]));
    }

    #[test]
    fn extracts_mailto_annotations() {
        let found = extract(&[r#"<a href="mailto:owner@cornercafe.com?subject=Hi">Email</a>"#]);
        assert_eq!(found, set(&["owner@cornercafe.com"]));
    }

    #[test]
    fn lowercases_candidates() {
        let found = extract(&["Contact: Hello@RealBiz.IO"]);
        assert_eq!(found, set(&["hello@realbiz.io"]));
    }

    #[test]
    fn empty_set_is_valid() {
        assert!(extract(&["no addresses here"]).is_empty());
    }

    #[test]
    fn requires_two_char_top_level_segment() {
        assert!(extract(&["bad@host.x is truncated"]).is_empty());
    }

    // -----------------------------------------------------------------------
    // Blacklist
    // -----------------------------------------------------------------------

    #[test]
    fn filters_blacklisted_local_and_domain() {
        let found = extract(&["Contact: fake@example.com or hello@realbiz.io"]);
        assert_eq!(found, set(&["hello@realbiz.io"]));
    }

    #[test]
    fn filters_noreply_variants() {
        let found = extract(&[
            "noreply@realbiz.io no-reply@realbiz.io donotreply@realbiz.io owner@realbiz.io",
        ]);
        assert_eq!(found, set(&["owner@realbiz.io"]));
    }

    #[test]
    fn local_part_match_is_exact() {
        // "testarossa" is a business name, not the "test" local part.
        let found = extract(&["testarossa@garage.io"]);
        assert_eq!(found, set(&["testarossa@garage.io"]));
    }

    #[test]
    fn filters_domain_families() {
        assert!(extract(&["a@example.org b@test.net c@domain.com"]).is_empty());
    }

    #[test]
    fn filters_infrastructure_domains_and_subdomains() {
        assert!(extract(&["abc123@o0.ingest.sentry.io support@wixpress.com"]).is_empty());
    }

    #[test]
    fn filters_image_filename_tokens() {
        assert!(extract(&["logo.png@cdn.assets.io is not an email"]).is_empty());
    }

    #[test]
    fn custom_blacklist_extends_filtering() {
        let mut blacklist = EmailBlacklist::default();
        blacklist.local_parts.push("info".to_owned());
        let extractor = EmailExtractor::new(blacklist);
        let found = extractor.extract(["info@realbiz.io owner@realbiz.io"]);
        assert_eq!(found, set(&["owner@realbiz.io"]));
    }
}
