use crate::config::TlsConfig;
use crate::domain::DomainUtils;
use crate::result::Verdict;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
pub struct TlsResult {
    pub is_valid: bool,
    pub is_expired: bool,
    pub is_not_valid_yet: bool,
    pub issuer: Option<String>,
    pub valid_from: Option<String>,
    pub valid_until: Option<String>,
    pub domain_match: bool,
    pub is_suspicious: bool,
    pub error: Option<String>,
}

impl Default for TlsResult {
    fn default() -> Self {
        TlsResult {
            is_valid: false,
            is_expired: false,
            is_not_valid_yet: false,
            issuer: None,
            valid_from: None,
            valid_until: None,
            domain_match: true,
            is_suspicious: false,
            error: None,
        }
    }
}

impl Verdict for TlsResult {
    fn is_suspicious(&self) -> bool {
        self.is_suspicious
    }
    fn reasons(&self) -> Vec<String> {
        if !self.is_suspicious {
            return Vec::new();
        }

        let mut reasons = Vec::new();
        if self.is_expired {
            reasons.push("SSL certificate is expired".to_string());
        }
        if self.is_not_valid_yet {
            reasons.push("SSL certificate is not yet valid".to_string());
        }
        if !self.domain_match {
            reasons.push("SSL certificate domain doesn't match website domain".to_string());
        }
        if reasons.is_empty() {
            if let Some(error) = &self.error {
                reasons.push(format!("SSL certificate could not be verified: {error}"));
            }
        }
        reasons
    }
}

/// How the verifying handshake failed.
#[derive(Debug, PartialEq)]
enum HandshakeFailure {
    Expired,
    NotYetValid,
    HostnameMismatch,
    UntrustedCertificate,
    Transport,
}

/// Probes a host's certificate by handshaking twice: once with full
/// verification and once accepting any certificate. A host that only
/// answers the permissive probe has a broken certificate; the strict
/// probe's error text tells us how it is broken.
pub struct TlsInspector {
    strict: Client,
    permissive: Client,
}

impl TlsInspector {
    pub fn new(config: TlsConfig) -> Result<Self, reqwest::Error> {
        let timeout = Duration::from_secs(config.timeout_seconds);
        let user_agent = format!("PhishGuard/{}", env!("CARGO_PKG_VERSION"));

        let strict = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent.clone())
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        let permissive = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(true)
            .build()?;

        Ok(Self { strict, permissive })
    }

    pub async fn check(&self, url: &str) -> TlsResult {
        let host = match DomainUtils::host_of(url) {
            Some(host) => host,
            None => {
                return TlsResult {
                    is_suspicious: true,
                    error: Some("URL has no host to probe".to_string()),
                    ..Default::default()
                }
            }
        };

        // Probe port 443 regardless of the URL's scheme
        let probe_url = format!("https://{host}/");

        let strict_error = match self.strict.head(&probe_url).send().await {
            Ok(_) => {
                log::debug!("Certificate for {host} verified");
                return TlsResult {
                    is_valid: true,
                    ..Default::default()
                };
            }
            Err(e) => e,
        };

        let chain_text = Self::error_chain(&strict_error);
        log::debug!("Strict TLS probe for {host} failed: {chain_text}");

        match Self::classify_failure(&chain_text) {
            HandshakeFailure::Transport => TlsResult {
                is_suspicious: true,
                error: Some(format!("Error checking SSL: {chain_text}")),
                ..Default::default()
            },
            failure => {
                // Confirm the host actually speaks TLS before blaming the cert
                if self.permissive.head(&probe_url).send().await.is_err() {
                    return TlsResult {
                        is_suspicious: true,
                        error: Some(format!("Error checking SSL: {chain_text}")),
                        ..Default::default()
                    };
                }

                TlsResult {
                    is_expired: failure == HandshakeFailure::Expired,
                    is_not_valid_yet: failure == HandshakeFailure::NotYetValid,
                    domain_match: failure != HandshakeFailure::HostnameMismatch,
                    is_suspicious: true,
                    error: Some(chain_text),
                    ..Default::default()
                }
            }
        }
    }

    fn classify_failure(chain_text: &str) -> HandshakeFailure {
        let text = chain_text.to_lowercase();

        if !text.contains("certificate") && !text.contains("handshake") && !text.contains("tls") {
            return HandshakeFailure::Transport;
        }
        if text.contains("expired") {
            return HandshakeFailure::Expired;
        }
        if text.contains("not valid yet")
            || text.contains("not yet valid")
            || text.contains("not valid before")
        {
            return HandshakeFailure::NotYetValid;
        }
        if text.contains("hostname") || text.contains("name mismatch") || text.contains("invalid for name")
        {
            return HandshakeFailure::HostnameMismatch;
        }
        HandshakeFailure::UntrustedCertificate
    }

    fn error_chain(error: &dyn std::error::Error) -> String {
        let mut text = error.to_string();
        let mut source = error.source();
        while let Some(inner) = source {
            text.push_str(": ");
            text.push_str(&inner.to_string());
            source = inner.source();
        }
        text
    }
}
