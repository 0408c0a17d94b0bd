use crate::config::BrandConfig;
use crate::corpus::ReferenceCorpus;
use crate::domain::DomainUtils;
use crate::result::Verdict;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use strsim::levenshtein;

/// Subdomain labels carrying no brand information.
const GENERIC_LABELS: [&str; 4] = ["www", "mail", "login", "ftp"];

#[derive(Debug, Clone, Serialize)]
pub struct BrandMatch {
    pub label: String,
    pub distance: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BrandResult {
    pub is_suspicious: bool,
    pub reasons: Vec<String>,
    pub similar_brands: Vec<BrandMatch>,
    pub target_domain: String,
}

impl Verdict for BrandResult {
    fn is_suspicious(&self) -> bool {
        self.is_suspicious
    }
    fn reasons(&self) -> Vec<String> {
        self.reasons.clone()
    }
}

impl BrandResult {
    fn clean(target_domain: String) -> Self {
        BrandResult {
            is_suspicious: false,
            reasons: Vec::new(),
            similar_brands: Vec::new(),
            target_domain,
        }
    }
}

/// Approximate matcher of domain labels against the reference corpus.
pub struct BrandMatcher {
    corpus: Arc<ReferenceCorpus>,
    config: BrandConfig,
}

impl BrandMatcher {
    pub fn new(corpus: Arc<ReferenceCorpus>, config: BrandConfig) -> Self {
        Self { corpus, config }
    }

    pub fn check(&self, domain: &str) -> BrandResult {
        let target = domain.to_lowercase();
        let canonical = DomainUtils::canonicalize(&target);

        // Exact corpus members, trusted domains, and test domains are safe
        if self.corpus.contains_domain(&target)
            || self.config.trusted_domains.iter().any(|d| *d == canonical)
            || self.config.ignored_domains.iter().any(|d| *d == canonical)
        {
            return BrandResult::clean(target);
        }

        let mut best: HashMap<&str, usize> = HashMap::new();
        for label in self.significant_labels(&target) {
            for candidate in self.near_labels(&label) {
                let entry = best.entry(candidate.0).or_insert(candidate.1);
                if candidate.1 < *entry {
                    *entry = candidate.1;
                }
            }
        }

        let mut matches: Vec<BrandMatch> = best
            .into_iter()
            .map(|(label, distance)| BrandMatch {
                label: label.to_string(),
                distance,
            })
            .collect();
        matches.sort_by(|a, b| a.distance.cmp(&b.distance).then(a.label.cmp(&b.label)));
        matches.truncate(self.config.max_suggestions);

        let reasons: Vec<String> = matches
            .iter()
            .map(|m| {
                format!(
                    "Domain resembles known brand '{}' (edit distance: {})",
                    m.label, m.distance
                )
            })
            .collect();

        BrandResult {
            is_suspicious: !matches.is_empty(),
            reasons,
            similar_brands: matches,
            target_domain: target,
        }
    }

    /// Labels of the domain worth matching. The public suffix carries no
    /// brand information and is dropped first; hyphenated labels are split
    /// into their components so "paypa1-login" still exposes "paypa1";
    /// generic subdomain labels and very short labels are dropped.
    fn significant_labels(&self, domain: &str) -> Vec<String> {
        DomainUtils::strip_public_suffix(domain)
            .split(['.', '-'])
            .filter(|label| !GENERIC_LABELS.contains(label))
            .filter(|label| label.len() > 2)
            .map(|label| label.to_string())
            .collect()
    }

    /// Corpus labels within the edit-distance threshold of the candidate,
    /// exact matches excluded. The length prefilter bounds the Levenshtein
    /// work: distance is always at least the length difference, so labels
    /// outside the window cannot qualify.
    fn near_labels(&self, candidate: &str) -> Vec<(&str, usize)> {
        let threshold = self.config.similarity_threshold;
        let mut found = Vec::new();

        for label in self.corpus.labels() {
            if label.len().abs_diff(candidate.len()) > threshold {
                continue;
            }
            let distance = levenshtein(candidate, label);
            if distance > 0 && distance <= threshold {
                found.push((label.as_str(), distance));
            }
        }

        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> BrandMatcher {
        let corpus = ReferenceCorpus::parse(
            "1,google.com\n2,paypal.com\n3,amazon.com\n4,nubank.com.br\n5,apple.com\n",
        )
        .unwrap();
        BrandMatcher::new(Arc::new(corpus), BrandConfig::default())
    }

    #[test]
    fn test_exact_corpus_member_is_clean() {
        let result = matcher().check("paypal.com");
        assert!(!result.is_suspicious);
        assert!(result.reasons.is_empty());
        assert!(result.similar_brands.is_empty());
    }

    #[test]
    fn test_ignored_domain_is_clean() {
        let result = matcher().check("example.com");
        assert!(!result.is_suspicious);
    }

    #[test]
    fn test_trusted_domain_is_clean() {
        let result = matcher().check("accounts.google.com");
        assert!(!result.is_suspicious);
    }

    #[test]
    fn test_typosquat_detected() {
        let result = matcher().check("paypa1-login.tk");
        assert!(result.is_suspicious);
        assert_eq!(result.similar_brands.len(), 1);
        assert_eq!(result.similar_brands[0].label, "paypal");
        assert_eq!(result.similar_brands[0].distance, 1);
        assert!(result.reasons[0].contains("paypal"));
    }

    #[test]
    fn test_plain_typosquat_detected() {
        let result = matcher().check("paypa1.tk");
        assert!(result.is_suspicious);
        assert_eq!(result.similar_brands[0].label, "paypal");
        assert_eq!(result.similar_brands[0].distance, 1);
    }

    #[test]
    fn test_distance_symmetry() {
        assert_eq!(levenshtein("paypa1", "paypal"), levenshtein("paypal", "paypa1"));
        assert_eq!(levenshtein("googel", "google"), levenshtein("google", "googel"));
    }

    #[test]
    fn test_generic_and_short_labels_dropped() {
        let m = matcher();
        let labels = m.significant_labels("www.login.bb.com");
        assert!(labels.is_empty());

        let labels = m.significant_labels("mail.gooogle.net");
        assert_eq!(labels, vec!["gooogle".to_string()]);
    }

    #[test]
    fn test_length_prefilter_skips_far_labels() {
        let m = matcher();
        // "pay" is 3 shorter than "paypal"; outside the window of 2
        assert!(m.near_labels("pay").iter().all(|(l, _)| *l != "paypal"));
    }

    #[test]
    fn test_max_suggestions_and_ordering() {
        let corpus = ReferenceCorpus::parse(
            "1,brand.com\n2,brend.com\n3,brund.com\n4,brind.com\n5,brond.com\n",
        )
        .unwrap();
        let m = BrandMatcher::new(Arc::new(corpus), BrandConfig::default());

        let result = m.check("briind.net");
        assert!(result.similar_brands.len() <= 3);
        for pair in result.similar_brands.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
    }

    #[test]
    fn test_exact_label_match_is_not_a_collision() {
        // The "google" label matches the corpus at distance 0; exact label
        // reuse is legitimate, not a lookalike
        let m = matcher();
        let result = m.check("google.evil-pages.tk");
        assert!(result
            .similar_brands
            .iter()
            .all(|b| b.label != "google" || b.distance > 0));
    }
}
