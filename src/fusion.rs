use crate::brand::{BrandMatcher, BrandResult};
use crate::classifier::{MlResult, UrlClassifier};
use crate::config::Config;
use crate::content::{ContentAnalyzer, ContentResult};
use crate::corpus::ReferenceCorpus;
use crate::dynamic_dns::{DynamicDnsList, DynamicDnsResult};
use crate::redirect::{RedirectResolver, RedirectResult};
use crate::reputation::{ReputationClient, ReputationResult};
use crate::result::Verdict;
use crate::tls::{TlsInspector, TlsResult};
use crate::whois::{WhoisChecker, WhoisResult};
use anyhow::anyhow;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// One evaluated URL: the fused verdict, the ordered reason list, and every
/// detector's raw result for transparency.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateResult {
    pub url: String,
    #[serde(rename = "isPhishing")]
    pub is_phishing: bool,
    pub reasons: Vec<String>,
    pub phishtank: ReputationResult,
    pub whois: WhoisResult,
    pub ssl: TlsResult,
    pub redirects: RedirectResult,
    pub dynamic_dns: DynamicDnsResult,
    pub brand_similarity: BrandResult,
    pub content_analysis: ContentResult,
    pub ml_model: MlResult,
}

/// Runs every detector for a URL and fuses their verdicts. Detectors are
/// independent and stateless; the only shared state is the read-only
/// reference data injected at construction.
pub struct DecisionEngine {
    reputation: ReputationClient,
    whois: WhoisChecker,
    tls: TlsInspector,
    redirects: RedirectResolver,
    brand: BrandMatcher,
    content: ContentAnalyzer,
    dynamic_dns: Arc<DynamicDnsList>,
    classifier: UrlClassifier,
    detector_timeout: Duration,
}

impl DecisionEngine {
    pub fn new(
        config: &Config,
        corpus: Arc<ReferenceCorpus>,
        dynamic_dns: Arc<DynamicDnsList>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            reputation: ReputationClient::new(config.reputation.clone())?,
            whois: WhoisChecker::new(config.whois.clone()),
            tls: TlsInspector::new(config.tls.clone())?,
            redirects: RedirectResolver::new(config.redirects.clone())?,
            brand: BrandMatcher::new(corpus, config.brand.clone()),
            content: ContentAnalyzer::new(config.content.clone())?,
            dynamic_dns,
            classifier: UrlClassifier::new(),
            detector_timeout: Duration::from_secs(config.detector_timeout_seconds),
        })
    }

    /// Evaluate one URL. Fails fast on malformed input; every detector
    /// failure past that point degrades into the detector's own result.
    pub async fn evaluate(&self, url: &str) -> anyhow::Result<AggregateResult> {
        let parsed = Url::parse(url)?;
        let domain = parsed
            .host_str()
            .ok_or_else(|| anyhow!("URL has no host: {url}"))?
            .to_lowercase();

        log::info!("Evaluating {url} (domain: {domain})");

        // Network-bound detectors run concurrently, each under its own
        // timeout so one slow dependency cannot stall the rest
        let (phishtank, whois, ssl, redirects, content_analysis) = tokio::join!(
            self.bounded(self.reputation.check(url), || {
                ReputationResult {
                    error: Some("PhishTank lookup timed out".to_string()),
                    ..Default::default()
                }
            }),
            self.bounded(self.whois.check(&domain), || WhoisResult {
                error: Some("WHOIS lookup timed out".to_string()),
                ..Default::default()
            }),
            self.bounded(self.tls.check(url), || TlsResult {
                is_suspicious: true,
                error: Some("Error checking SSL: probe timed out".to_string()),
                ..Default::default()
            }),
            self.bounded(self.redirects.resolve(url), || RedirectResult {
                is_suspicious: true,
                reasons: vec!["Error checking redirects: resolution timed out".to_string()],
                redirect_chain: vec![url.to_string()],
                domains_visited: vec![domain.clone()],
                final_url: url.to_string(),
            }),
            self.bounded(self.content.analyze(url), || ContentResult {
                is_suspicious: true,
                reasons: vec!["Error analyzing content: fetch timed out".to_string()],
                ..Default::default()
            }),
        );

        let brand_similarity = self.brand.check(&domain);
        let dynamic_dns = self.dynamic_dns.check(&domain);
        let ml_model = self.classifier.classify(url);

        Ok(Self::merge(
            url.to_string(),
            phishtank,
            whois,
            ssl,
            redirects,
            dynamic_dns,
            brand_similarity,
            content_analysis,
            ml_model,
        ))
    }

    /// Fuse detector outputs: the verdict is a pure OR over the suspicion
    /// flags, and reasons concatenate in a fixed detector order.
    #[allow(clippy::too_many_arguments)]
    fn merge(
        url: String,
        phishtank: ReputationResult,
        whois: WhoisResult,
        ssl: TlsResult,
        redirects: RedirectResult,
        dynamic_dns: DynamicDnsResult,
        brand_similarity: BrandResult,
        content_analysis: ContentResult,
        ml_model: MlResult,
    ) -> AggregateResult {
        let ordered: [&dyn Verdict; 8] = [
            &phishtank,
            &whois,
            &ssl,
            &redirects,
            &brand_similarity,
            &content_analysis,
            &dynamic_dns,
            &ml_model,
        ];

        let is_phishing = ordered.iter().any(|detector| detector.is_suspicious());
        let reasons: Vec<String> = ordered
            .iter()
            .flat_map(|detector| detector.reasons())
            .collect();

        AggregateResult {
            url,
            is_phishing,
            reasons,
            phishtank,
            whois,
            ssl,
            redirects,
            dynamic_dns,
            brand_similarity,
            content_analysis,
            ml_model,
        }
    }

    async fn bounded<T, F, D>(&self, detector: F, degraded: D) -> T
    where
        F: Future<Output = T>,
        D: FnOnce() -> T,
    {
        match tokio::time::timeout(self.detector_timeout, detector).await {
            Ok(result) => result,
            Err(_) => {
                log::warn!("Detector exceeded {:?} timeout", self.detector_timeout);
                degraded()
            }
        }
    }
}
