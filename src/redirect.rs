use crate::config::RedirectConfig;
use crate::domain::DomainUtils;
use crate::result::Verdict;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Serialize)]
pub struct RedirectResult {
    pub is_suspicious: bool,
    pub reasons: Vec<String>,
    pub redirect_chain: Vec<String>,
    pub domains_visited: Vec<String>,
    pub final_url: String,
}

impl Verdict for RedirectResult {
    fn is_suspicious(&self) -> bool {
        self.is_suspicious
    }
    fn reasons(&self) -> Vec<String> {
        self.reasons.clone()
    }
}

/// What one traversal of the redirect chain produced. Classification is a
/// separate, pure step.
#[derive(Debug)]
struct ChainOutcome {
    chain: Vec<String>,
    domains: Vec<String>,
    looped: bool,
}

/// Follows a URL's redirect chain hop by hop, detecting loops and
/// classifying domain transitions.
pub struct RedirectResolver {
    client: Client,
    config: RedirectConfig,
}

impl RedirectResolver {
    pub fn new(config: RedirectConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(format!("PhishGuard/{}", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self { client, config })
    }

    pub async fn resolve(&self, url: &str) -> RedirectResult {
        match self.follow(url).await {
            Ok(outcome) => self.classify(url, outcome),
            Err(e) => {
                log::debug!("Redirect resolution failed for {url}: {e}");
                RedirectResult {
                    is_suspicious: true,
                    reasons: vec![format!("Error checking redirects: {e}")],
                    redirect_chain: vec![url.to_string()],
                    domains_visited: DomainUtils::host_of(url).into_iter().collect(),
                    final_url: url.to_string(),
                }
            }
        }
    }

    /// Walk the chain with redirects suppressed, up to the hop limit.
    async fn follow(&self, url: &str) -> anyhow::Result<ChainOutcome> {
        let mut current = Self::normalize(url)?;
        let mut chain: Vec<String> = Vec::new();
        let mut domains: Vec<String> = Vec::new();

        for _ in 0..self.config.max_hops {
            chain.push(current.clone());
            if let Some(host) = DomainUtils::host_of(&current) {
                if !domains.contains(&host) {
                    domains.push(host);
                }
            }

            let response = self.client.head(&current).send().await?;
            if !response.status().is_redirection() {
                break;
            }

            // Some servers omit Location on HEAD; retry once with GET
            let location = match Self::location_header(response.headers()) {
                Some(loc) => loc,
                None => {
                    let response = self.client.get(&current).send().await?;
                    match Self::location_header(response.headers()) {
                        Some(loc) => loc,
                        None => break,
                    }
                }
            };

            let next = Self::resolve_location(&current, &location)?;

            if Self::would_loop(&chain, &next) {
                chain.push(next.clone());
                if let Some(host) = DomainUtils::host_of(&next) {
                    if !domains.contains(&host) {
                        domains.push(host);
                    }
                }
                return Ok(ChainOutcome {
                    chain,
                    domains,
                    looped: true,
                });
            }

            current = next;
        }

        Ok(ChainOutcome {
            chain,
            domains,
            looped: false,
        })
    }

    /// Pure classification of a finished traversal.
    fn classify(&self, origin: &str, outcome: ChainOutcome) -> RedirectResult {
        let final_url = outcome
            .chain
            .last()
            .cloned()
            .unwrap_or_else(|| origin.to_string());

        if outcome.looped {
            log::debug!("Redirect loop detected for {origin}");
            return RedirectResult {
                is_suspicious: true,
                reasons: vec!["Redirect loop detected".to_string()],
                redirect_chain: outcome.chain,
                domains_visited: outcome.domains,
                final_url,
            };
        }

        let mut reasons = Vec::new();
        let is_auth_flow = self.is_auth_flow(origin);

        if !is_auth_flow && outcome.chain.len() > 3 {
            reasons.push(format!("Too many redirects ({})", outcome.chain.len()));
        }

        let init_host = DomainUtils::host_of(origin).unwrap_or_default();
        let final_host = DomainUtils::host_of(&final_url).unwrap_or_default();
        let init_registrable = DomainUtils::registrable_domain(&init_host);
        let final_registrable = DomainUtils::registrable_domain(&final_host);

        if init_registrable != final_registrable
            && !DomainUtils::is_www_variant(&init_host, &final_host)
        {
            if is_auth_flow {
                if self.is_suspicious_provider(&final_registrable) {
                    reasons.push(format!(
                        "Auth flow redirects to suspicious domain: {final_host}"
                    ));
                }
            } else {
                reasons.push(format!(
                    "Redirects to different domain (from {init_host} to {final_host})"
                ));
            }
        }

        for domain in &outcome.domains {
            if self.is_suspicious_provider(&DomainUtils::registrable_domain(domain)) {
                reasons.push(format!("Uses suspicious domain: {domain}"));
            }
        }

        RedirectResult {
            is_suspicious: !reasons.is_empty(),
            reasons,
            redirect_chain: outcome.chain,
            domains_visited: outcome.domains,
            final_url,
        }
    }

    /// Known identity-provider origins legitimately chain several redirects.
    fn is_auth_flow(&self, url: &str) -> bool {
        match DomainUtils::host_of(url) {
            Some(host) => self.config.auth_domains.iter().any(|d| *d == host),
            None => false,
        }
    }

    fn is_suspicious_provider(&self, registrable: &str) -> bool {
        self.config
            .suspicious_providers
            .iter()
            .any(|p| p == registrable)
    }

    fn would_loop(chain: &[String], next: &str) -> bool {
        chain.iter().any(|visited| visited == next)
    }

    /// Parse and re-serialize so percent-encoding and trailing slashes are
    /// consistent across hops; loop detection relies on this.
    fn normalize(url: &str) -> anyhow::Result<String> {
        Ok(Url::parse(url.trim())?.to_string())
    }

    fn location_header(headers: &reqwest::header::HeaderMap) -> Option<String> {
        headers
            .get("location")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
    }

    fn resolve_location(current: &str, location: &str) -> anyhow::Result<String> {
        if location.starts_with("http://") || location.starts_with("https://") {
            Self::normalize(location)
        } else {
            let base = Url::parse(current)?;
            Ok(base.join(location)?.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RedirectConfig;

    fn resolver() -> RedirectResolver {
        RedirectResolver::new(RedirectConfig::default()).unwrap()
    }

    fn outcome(chain: &[&str], looped: bool) -> ChainOutcome {
        let mut domains = Vec::new();
        for url in chain {
            if let Some(host) = DomainUtils::host_of(url) {
                if !domains.contains(&host) {
                    domains.push(host);
                }
            }
        }
        ChainOutcome {
            chain: chain.iter().map(|s| s.to_string()).collect(),
            domains,
            looped,
        }
    }

    #[test]
    fn test_short_same_domain_chain_is_clean() {
        let result = resolver().classify(
            "https://example.org/a",
            outcome(
                &[
                    "https://example.org/a",
                    "https://example.org/b",
                    "https://example.org/c",
                ],
                false,
            ),
        );
        assert!(!result.is_suspicious);
        assert!(result.reasons.is_empty());
        assert_eq!(result.final_url, "https://example.org/c");
    }

    #[test]
    fn test_loop_detection() {
        let chain = [
            "https://a.example/",
            "https://b.example/",
            "https://a.example/",
        ];
        let result = resolver().classify("https://a.example/", outcome(&chain, true));
        assert!(result.is_suspicious);
        assert_eq!(result.reasons, vec!["Redirect loop detected".to_string()]);
        assert_eq!(result.redirect_chain.len(), 3);
    }

    #[test]
    fn test_would_loop_membership() {
        let chain = vec!["https://a.example/".to_string(), "https://b.example/".to_string()];
        assert!(RedirectResolver::would_loop(&chain, "https://a.example/"));
        assert!(!RedirectResolver::would_loop(&chain, "https://c.example/"));
    }

    #[test]
    fn test_too_many_redirects() {
        let result = resolver().classify(
            "https://example.org/1",
            outcome(
                &[
                    "https://example.org/1",
                    "https://example.org/2",
                    "https://example.org/3",
                    "https://example.org/4",
                ],
                false,
            ),
        );
        assert!(result.is_suspicious);
        assert!(result.reasons.contains(&"Too many redirects (4)".to_string()));
    }

    #[test]
    fn test_auth_flow_exempt_from_hop_count() {
        let result = resolver().classify(
            "https://accounts.google.com/signin",
            outcome(
                &[
                    "https://accounts.google.com/signin",
                    "https://accounts.google.com/v2",
                    "https://accounts.google.com/v3",
                    "https://myaccount.google.com/",
                ],
                false,
            ),
        );
        // Same registrable domain throughout, auth origin: nothing to flag
        assert!(!result.is_suspicious);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn test_cross_domain_redirect_flagged() {
        let result = resolver().classify(
            "https://example.org/",
            outcome(&["https://example.org/", "https://evil.example.net/"], false),
        );
        assert!(result.is_suspicious);
        assert!(result.reasons[0].contains("Redirects to different domain"));
    }

    #[test]
    fn test_www_variant_not_flagged() {
        let result = resolver().classify(
            "https://example.org/",
            outcome(&["https://example.org/", "https://www.example.org/"], false),
        );
        assert!(!result.is_suspicious);
    }

    #[test]
    fn test_auth_flow_to_suspicious_provider_flagged() {
        let result = resolver().classify(
            "https://accounts.google.com/signin",
            outcome(
                &["https://accounts.google.com/signin", "https://bit.ly/x"],
                false,
            ),
        );
        assert!(result.is_suspicious);
        assert!(result
            .reasons
            .iter()
            .any(|r| r.contains("Auth flow redirects to suspicious domain")));
    }

    #[test]
    fn test_auth_flow_to_benign_domain_not_flagged() {
        let result = resolver().classify(
            "https://accounts.google.com/signin",
            outcome(
                &[
                    "https://accounts.google.com/signin",
                    "https://partner-site.com/welcome",
                ],
                false,
            ),
        );
        assert!(!result.is_suspicious);
    }

    #[test]
    fn test_suspicious_domain_in_chain_flagged() {
        let result = resolver().classify(
            "https://example.org/",
            outcome(
                &[
                    "https://example.org/",
                    "https://bit.ly/abc",
                    "https://example.org/final",
                ],
                false,
            ),
        );
        assert!(result.is_suspicious);
        assert!(result
            .reasons
            .iter()
            .any(|r| r.contains("Uses suspicious domain: bit.ly")));
        // Final domain equals origin, so no cross-domain reason
        assert!(!result
            .reasons
            .iter()
            .any(|r| r.contains("Redirects to different domain")));
    }

    #[test]
    fn test_normalize_is_stable() {
        let once = RedirectResolver::normalize("https://example.org/path?q=a b").unwrap();
        let twice = RedirectResolver::normalize(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_resolve_location_relative() {
        let next =
            RedirectResolver::resolve_location("https://example.org/a/b", "/login").unwrap();
        assert_eq!(next, "https://example.org/login");

        let absolute =
            RedirectResolver::resolve_location("https://example.org/", "https://other.example/")
                .unwrap();
        assert_eq!(absolute, "https://other.example/");
    }
}
