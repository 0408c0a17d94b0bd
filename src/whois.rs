use crate::config::WhoisConfig;
use crate::domain::DomainUtils;
use crate::result::Verdict;
use anyhow::{anyhow, Result};
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Default, Serialize)]
pub struct WhoisResult {
    pub age_days: Option<u32>,
    pub creation_date: Option<String>,
    pub is_suspicious: bool,
    pub registrar: Option<String>,
    pub expiration_date: Option<String>,
    pub organization: Option<String>,
    pub country: Option<String>,
    pub error: Option<String>,
}

impl Verdict for WhoisResult {
    fn is_suspicious(&self) -> bool {
        self.is_suspicious
    }
    fn reasons(&self) -> Vec<String> {
        if self.is_suspicious {
            vec![format!(
                "Domain is less than 30 days old (created: {})",
                self.creation_date.as_deref().unwrap_or("unknown")
            )]
        } else {
            Vec::new()
        }
    }
}

impl WhoisResult {
    fn unavailable(error: String) -> Self {
        WhoisResult {
            error: Some(error),
            ..Default::default()
        }
    }
}

/// Registration-record details pulled out of a WHOIS text response.
#[derive(Debug, Default)]
struct WhoisRecord {
    creation_date: Option<String>,
    registrar: Option<String>,
    expiration_date: Option<String>,
    organization: Option<String>,
    country: Option<String>,
}

/// Looks up registration age for a domain by querying WHOIS servers
/// directly over TCP port 43.
pub struct WhoisChecker {
    timeout: Duration,
    max_age_days: u32,
}

impl WhoisChecker {
    pub fn new(config: WhoisConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_seconds),
            max_age_days: config.max_age_days,
        }
    }

    /// Check a domain's registration record. A lookup that cannot produce a
    /// creation date degrades to a non-suspicious, error-annotated result
    /// so it never biases the verdict.
    pub async fn check(&self, domain: &str) -> WhoisResult {
        let root_domain = DomainUtils::registrable_domain(&DomainUtils::canonicalize(domain));
        log::debug!("Checking WHOIS for {domain} (root: {root_domain})");

        if !Self::is_queryable(&root_domain) {
            return WhoisResult::unavailable(format!("Invalid domain format: {root_domain}"));
        }

        match self.fetch_record(&root_domain).await {
            Ok(record) => self.evaluate(record),
            Err(e) => {
                log::debug!("WHOIS lookup failed for {root_domain}: {e}");
                WhoisResult::unavailable(e.to_string())
            }
        }
    }

    fn evaluate(&self, record: WhoisRecord) -> WhoisResult {
        let creation_date = match record.creation_date {
            Some(date) => date,
            None => return WhoisResult::unavailable("No creation date found".to_string()),
        };

        let age_days = match Self::parse_date(&creation_date).map(Self::age_in_days) {
            Ok(age) => age,
            Err(e) => {
                return WhoisResult::unavailable(format!(
                    "Could not parse creation date '{creation_date}': {e}"
                ))
            }
        };

        WhoisResult {
            age_days: Some(age_days),
            is_suspicious: age_days < self.max_age_days,
            creation_date: Some(creation_date),
            registrar: record.registrar,
            expiration_date: record.expiration_date,
            organization: record.organization,
            country: record.country,
            error: None,
        }
    }

    /// Basic validation to keep junk out of WHOIS queries.
    fn is_queryable(domain: &str) -> bool {
        !domain.is_empty()
            && domain.contains('.')
            && domain.len() < 255
            && domain
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    }

    async fn fetch_record(&self, domain: &str) -> Result<WhoisRecord> {
        let server = Self::whois_server_for(domain);
        log::debug!("Using WHOIS server {server} for {domain}");

        match self.query_server(&server, domain).await {
            Ok(text) => Self::parse_record(&text)
                .ok_or_else(|| anyhow!("Could not parse WHOIS response from {server}")),
            Err(e) => {
                log::debug!("WHOIS query to {server} failed: {e}");
                self.try_fallbacks(domain).await
            }
        }
    }

    async fn try_fallbacks(&self, domain: &str) -> Result<WhoisRecord> {
        for server in ["whois.iana.org", "whois.internic.net"] {
            log::debug!("Trying fallback WHOIS server: {server}");
            if let Ok(text) = self.query_server(server, domain).await {
                if let Some(record) = Self::parse_record(&text) {
                    return Ok(record);
                }
            }
        }

        // Last resort: confirm the domain exists at all via DNS
        self.dns_fallback(domain).await
    }

    /// Query a WHOIS server directly on TCP port 43.
    async fn query_server(&self, server: &str, domain: &str) -> Result<String> {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpStream;
        use tokio::time::timeout;

        let mut stream =
            timeout(self.timeout, TcpStream::connect(format!("{server}:43"))).await??;

        let query = format!("{domain}\r\n");
        stream.write_all(query.as_bytes()).await?;

        let mut response = String::new();
        timeout(self.timeout, stream.read_to_string(&mut response)).await??;

        if response.is_empty() {
            return Err(anyhow!("Empty WHOIS response"));
        }

        Ok(response)
    }

    /// When every WHOIS server fails, a resolving domain still yields a
    /// record with unknown age rather than an error.
    async fn dns_fallback(&self, domain: &str) -> Result<WhoisRecord> {
        use hickory_resolver::TokioAsyncResolver;

        log::debug!("All WHOIS servers failed, using DNS fallback for {domain}");
        let resolver = TokioAsyncResolver::tokio_from_system_conf()?;

        match resolver.lookup_ip(domain).await {
            Ok(_) => Ok(WhoisRecord::default()),
            Err(e) => Err(anyhow!("Domain does not resolve: {e}")),
        }
    }

    fn whois_server_for(domain: &str) -> String {
        let tld = domain.split('.').next_back().unwrap_or(domain);

        let servers = HashMap::from([
            ("com", "whois.verisign-grs.com"),
            ("net", "whois.verisign-grs.com"),
            ("org", "whois.pir.org"),
            ("info", "whois.afilias.net"),
            ("biz", "whois.neulevel.biz"),
            ("us", "whois.nic.us"),
            ("uk", "whois.nic.uk"),
            ("de", "whois.denic.de"),
            ("fr", "whois.afnic.fr"),
            ("it", "whois.nic.it"),
            ("nl", "whois.domain-registry.nl"),
            ("au", "whois.auda.org.au"),
            ("ca", "whois.cira.ca"),
            ("jp", "whois.jprs.jp"),
            ("cn", "whois.cnnic.cn"),
            ("ru", "whois.tcinet.ru"),
            ("br", "whois.registro.br"),
            ("mx", "whois.mx"),
            ("tk", "whois.dot.tk"),
            ("ml", "whois.dot.ml"),
            ("ga", "whois.dot.ga"),
            ("cf", "whois.dot.cf"),
        ]);

        servers
            .get(tld)
            .copied()
            .unwrap_or("whois.iana.org")
            .to_string()
    }

    /// Pull the interesting fields out of a free-form WHOIS text response.
    fn parse_record(text: &str) -> Option<WhoisRecord> {
        let creation_patterns = [
            r"(?i)creation\s*date[:\s]+([^\r\n]+)",
            r"(?i)created[:\s]+([^\r\n]+)",
            r"(?i)registered[:\s]+([^\r\n]+)",
            r"(?i)domain\s*created[:\s]+([^\r\n]+)",
            r"(?i)registration\s*date[:\s]+([^\r\n]+)",
            r"(?i)created\s*on[:\s]+([^\r\n]+)",
            r"(?i)registered\s*on[:\s]+([^\r\n]+)",
            r"(?i)create_date[:\s]+([^\r\n]+)",
            r"(?i)created_date[:\s]+([^\r\n]+)",
            r"(?i)registration_time[:\s]+([^\r\n]+)",
        ];

        let creation_date = Self::first_capture(text, &creation_patterns)?;

        let record = WhoisRecord {
            creation_date: Some(creation_date),
            registrar: Self::first_capture(text, &[r"(?i)registrar[:\s]+([^\r\n]+)"]),
            expiration_date: Self::first_capture(
                text,
                &[
                    r"(?i)registry\s*expiry\s*date[:\s]+([^\r\n]+)",
                    r"(?i)expiration\s*date[:\s]+([^\r\n]+)",
                    r"(?i)expires?\s*(?:on)?[:\s]+([^\r\n]+)",
                ],
            ),
            organization: Self::first_capture(
                text,
                &[
                    r"(?i)registrant\s*organi[sz]ation[:\s]+([^\r\n]+)",
                    r"(?i)org(?:anization)?-?name[:\s]+([^\r\n]+)",
                ],
            ),
            country: Self::first_capture(
                text,
                &[r"(?i)registrant\s*country[:\s]+([^\r\n]+)"],
            ),
        };

        Some(record)
    }

    fn first_capture(text: &str, patterns: &[&str]) -> Option<String> {
        for pattern in patterns {
            if let Ok(regex) = Regex::new(pattern) {
                if let Some(captures) = regex.captures(text) {
                    if let Some(m) = captures.get(1) {
                        let value = m.as_str().trim();
                        if !value.is_empty() {
                            return Some(value.to_string());
                        }
                    }
                }
            }
        }
        None
    }

    /// Parse the leading ISO-style date out of a WHOIS date string.
    fn parse_date(date_str: &str) -> Result<SystemTime> {
        let iso = Regex::new(r"(\d{4})-(\d{2})-(\d{2})")?;
        let captures = iso
            .captures(date_str.trim())
            .ok_or_else(|| anyhow!("Date format not supported: {date_str}"))?;

        let year: u32 = captures[1].parse()?;
        let month: u32 = captures[2].parse()?;
        let day: u32 = captures[3].parse()?;

        let days = Self::days_since_epoch(year, month, day)?;
        Ok(UNIX_EPOCH + Duration::from_secs(days * 24 * 60 * 60))
    }

    /// Days since the Unix epoch, approximate but plenty for age thresholds.
    fn days_since_epoch(year: u32, month: u32, day: u32) -> Result<u64> {
        if year < 1970 || month == 0 || month > 12 || day == 0 || day > 31 {
            return Err(anyhow!("Invalid date"));
        }

        let years_since_1970 = year - 1970;
        let mut days = years_since_1970 as u64 * 365;
        days += years_since_1970 as u64 / 4;

        let days_in_month = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
        for m in 1..month {
            days += days_in_month[(m - 1) as usize] as u64;
        }

        days += day as u64 - 1;
        Ok(days)
    }

    fn age_in_days(creation: SystemTime) -> u32 {
        let age_secs = SystemTime::now()
            .duration_since(creation)
            .unwrap_or(Duration::from_secs(0))
            .as_secs();

        (age_secs / (24 * 60 * 60)) as u32
    }
}
