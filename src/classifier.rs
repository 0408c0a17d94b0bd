use crate::result::Verdict;
use serde::Serialize;
use std::collections::HashMap;
use url::Url;

/// Tokens that phishing URLs lean on to look trustworthy.
const SUSPICIOUS_KEYWORDS: [&str; 12] = [
    "secure", "account", "update", "verify", "login", "signin", "banking", "confirm", "webscr",
    "password", "credential", "wallet",
];

/// Scores at or above this are labeled phishing.
const PHISHING_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone, Serialize)]
pub struct MlResult {
    pub label: String,
    pub score: f64,
    pub is_suspicious: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Verdict for MlResult {
    fn is_suspicious(&self) -> bool {
        self.is_suspicious
    }
    fn reasons(&self) -> Vec<String> {
        if self.is_suspicious {
            vec![format!(
                "ML model flagged this as phishing (score: {})",
                self.score
            )]
        } else {
            Vec::new()
        }
    }
}

impl MlResult {
    fn unavailable(error: String) -> Self {
        MlResult {
            label: "error".to_string(),
            score: 0.0,
            is_suspicious: false,
            error: Some(error),
        }
    }
}

/// Lexical features extracted from one URL.
#[derive(Debug, Clone, Serialize)]
pub struct UrlFeatures {
    pub url_length: usize,
    pub host_digit_ratio: f64,
    pub host_hyphen_count: usize,
    pub subdomain_depth: usize,
    pub has_userinfo: bool,
    pub has_ip_host: bool,
    pub suspicious_keyword_count: usize,
    pub host_entropy: f64,
    pub is_plain_http: bool,
}

/// Lightweight lexical URL classifier. Produces a 0-100 score from weighted
/// features and labels the URL phishing or benign.
pub struct UrlClassifier;

impl UrlClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, url: &str) -> MlResult {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => return MlResult::unavailable(format!("Unparseable URL: {e}")),
        };

        let features = self.extract_features(url, &parsed);
        let score = Self::score(&features);
        let label = if score >= PHISHING_THRESHOLD {
            "phishing"
        } else {
            "benign"
        };

        log::debug!("Classifier scored {url} at {score:.1} ({label})");

        MlResult {
            label: label.to_string(),
            score: (score * 100.0).round() / 100.0,
            is_suspicious: label == "phishing",
            error: None,
        }
    }

    fn extract_features(&self, raw: &str, url: &Url) -> UrlFeatures {
        let host = url.host_str().unwrap_or("").to_lowercase();
        let host_len = host.chars().count().max(1);
        let digits = host.chars().filter(|c| c.is_ascii_digit()).count();
        let lower = raw.to_lowercase();

        UrlFeatures {
            url_length: raw.len(),
            host_digit_ratio: digits as f64 / host_len as f64,
            host_hyphen_count: host.matches('-').count(),
            subdomain_depth: host.split('.').count().saturating_sub(2),
            has_userinfo: !url.username().is_empty(),
            has_ip_host: matches!(url.host(), Some(url::Host::Ipv4(_)) | Some(url::Host::Ipv6(_))),
            suspicious_keyword_count: SUSPICIOUS_KEYWORDS
                .iter()
                .filter(|kw| lower.contains(*kw))
                .count(),
            host_entropy: Self::shannon_entropy(&host),
            is_plain_http: url.scheme() == "http",
        }
    }

    fn score(features: &UrlFeatures) -> f64 {
        let mut score = 0.0;

        if features.url_length > 75 {
            score += 15.0;
        } else if features.url_length > 54 {
            score += 10.0;
        }
        if features.host_digit_ratio > 0.3 {
            score += 10.0;
        }
        if features.host_hyphen_count >= 3 {
            score += 10.0;
        }
        if features.subdomain_depth > 2 {
            score += 10.0;
        }
        if features.has_userinfo {
            score += 15.0;
        }
        if features.has_ip_host {
            score += 20.0;
        }
        score += (features.suspicious_keyword_count as f64 * 10.0).min(30.0);
        if features.host_entropy > 3.8 {
            score += 10.0;
        }
        if features.is_plain_http {
            score += 5.0;
        }

        score.min(100.0)
    }

    fn shannon_entropy(text: &str) -> f64 {
        if text.is_empty() {
            return 0.0;
        }

        let mut counts: HashMap<char, usize> = HashMap::new();
        for c in text.chars() {
            *counts.entry(c).or_insert(0) += 1;
        }

        let len = text.chars().count() as f64;
        counts
            .values()
            .map(|&count| {
                let p = count as f64 / len;
                -p * p.log2()
            })
            .sum()
    }
}

impl Default for UrlClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_benign_url() {
        let result = UrlClassifier::new().classify("https://www.google.com/");
        assert_eq!(result.label, "benign");
        assert!(!result.is_suspicious);
        assert!(result.error.is_none());
    }

    #[test]
    fn test_keyword_stuffed_url_flagged() {
        let result = UrlClassifier::new()
            .classify("http://secure-login-verify-account-update.bad123456.tk/session");
        assert_eq!(result.label, "phishing");
        assert!(result.is_suspicious);
        assert!(result.score >= PHISHING_THRESHOLD);
    }

    #[test]
    fn test_unparseable_url_degrades() {
        let result = UrlClassifier::new().classify("not a url at all");
        assert_eq!(result.label, "error");
        assert_eq!(result.score, 0.0);
        assert!(!result.is_suspicious);
        assert!(result.error.is_some());
    }

    #[test]
    fn test_feature_extraction() {
        let classifier = UrlClassifier::new();
        let raw = "http://user@203.0.113.9/login";
        let url = Url::parse(raw).unwrap();
        let features = classifier.extract_features(raw, &url);

        assert!(features.has_userinfo);
        assert!(features.has_ip_host);
        assert!(features.is_plain_http);
        assert_eq!(features.suspicious_keyword_count, 1);
    }

    #[test]
    fn test_entropy() {
        assert_eq!(UrlClassifier::shannon_entropy("aaaa"), 0.0);
        let uniform = UrlClassifier::shannon_entropy("abcd");
        assert!((uniform - 2.0).abs() < 1e-9);
        assert_eq!(UrlClassifier::shannon_entropy(""), 0.0);
    }

    #[test]
    fn test_verdict_reason() {
        let result = MlResult {
            label: "phishing".to_string(),
            score: 72.5,
            is_suspicious: true,
            error: None,
        };
        assert_eq!(
            result.reasons(),
            vec!["ML model flagged this as phishing (score: 72.5)"]
        );
    }
}
