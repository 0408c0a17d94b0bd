use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Optional path to a larger "rank,domain" corpus file. The embedded
    /// dataset is used when unset.
    pub corpus_path: Option<String>,
    /// Optional path to a dynamic-DNS provider list file.
    pub dynamic_dns_path: Option<String>,
    /// Upper bound, in seconds, applied to each detector inside the fusion
    /// layer on top of the detectors' own network timeouts.
    pub detector_timeout_seconds: u64,
    pub redirects: RedirectConfig,
    pub brand: BrandConfig,
    pub whois: WhoisConfig,
    pub tls: TlsConfig,
    pub content: ContentConfig,
    pub reputation: ReputationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedirectConfig {
    pub max_hops: u8,
    pub timeout_seconds: u64,
    /// Identity-provider hosts whose flows legitimately chain redirects.
    pub auth_domains: Vec<String>,
    /// Shortener / free-hosting registrable domains considered suspicious.
    pub suspicious_providers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandConfig {
    /// Maximum edit distance still treated as a near-duplicate.
    pub similarity_threshold: usize,
    pub max_suggestions: usize,
    /// Fully trusted domains, never matched against the corpus.
    pub trusted_domains: Vec<String>,
    /// Test/placeholder domains excluded from matching.
    pub ignored_domains: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WhoisConfig {
    pub timeout_seconds: u64,
    /// Registrations younger than this many days are flagged.
    pub max_age_days: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub timeout_seconds: u64,
    /// Domains allowed to serve login forms without being flagged.
    pub trusted_domains: Vec<String>,
    /// Test/placeholder domains skipped entirely.
    pub ignored_domains: Vec<String>,
    /// Form field names treated as requests for sensitive information.
    pub sensitive_fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReputationConfig {
    pub timeout_seconds: u64,
    /// PhishTank application key; anonymous queries are rate-limited harder.
    pub app_key: Option<String>,
}

fn ignored_test_domains() -> Vec<String> {
    [
        "example.com",
        "example.org",
        "example.net",
        "test.com",
        "test.org",
        "test.net",
        "localhost",
        "127.0.0.1",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn trusted_login_domains() -> Vec<String> {
    [
        "google.com",
        "accounts.google.com",
        "gmail.com",
        "microsoft.com",
        "outlook.com",
        "hotmail.com",
        "apple.com",
        "icloud.com",
        "amazon.com",
        "amazon.com.br",
        "facebook.com",
        "fb.com",
        "netflix.com",
        "spotify.com",
        "nubank.com.br",
        "itau.com.br",
        "bradesco.com.br",
        "santander.com.br",
        "bb.com.br",
        "caixa.gov.br",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            corpus_path: None,
            dynamic_dns_path: None,
            detector_timeout_seconds: 15,
            redirects: RedirectConfig::default(),
            brand: BrandConfig::default(),
            whois: WhoisConfig::default(),
            tls: TlsConfig::default(),
            content: ContentConfig::default(),
            reputation: ReputationConfig::default(),
        }
    }
}

impl Default for RedirectConfig {
    fn default() -> Self {
        RedirectConfig {
            max_hops: 5,
            timeout_seconds: 3,
            auth_domains: [
                "accounts.google.com",
                "login.microsoftonline.com",
                "login.live.com",
                "appleid.apple.com",
                "auth.amazon.com",
                "facebook.com",
                "accounts.spotify.com",
                "login.nubank.com.br",
                "login.itau.com.br",
                "login.bradesco.com.br",
                "login.bb.com.br",
                "login.caixa.gov.br",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            suspicious_providers: [
                "bit.ly",
                "tinyurl.com",
                "goo.gl",
                "t.co",
                "freehosting.com",
                "000webhost.com",
                "herokuapp.com",
                "netlify.app",
                "vercel.app",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl Default for BrandConfig {
    fn default() -> Self {
        BrandConfig {
            similarity_threshold: 2,
            max_suggestions: 3,
            trusted_domains: trusted_login_domains(),
            ignored_domains: ignored_test_domains(),
        }
    }
}

impl Default for WhoisConfig {
    fn default() -> Self {
        WhoisConfig {
            timeout_seconds: 10,
            max_age_days: 30,
        }
    }
}

impl Default for TlsConfig {
    fn default() -> Self {
        TlsConfig { timeout_seconds: 10 }
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        ContentConfig {
            timeout_seconds: 10,
            trusted_domains: trusted_login_domains(),
            ignored_domains: ignored_test_domains(),
            sensitive_fields: [
                "credit", "cartao", "card", "cc", "cvv", "cvc", "cpf", "cnpj", "document",
                "documento", "identity", "bank", "banco", "account", "conta", "agency",
                "agencia", "mother", "mae", "father", "pai", "birth", "nascimento", "social",
                "security", "seguranca", "ssn", "pin",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl Default for ReputationConfig {
    fn default() -> Self {
        ReputationConfig {
            timeout_seconds: 10,
            app_key: None,
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.redirects.max_hops, 5);
        assert_eq!(config.brand.similarity_threshold, 2);
        assert_eq!(config.brand.max_suggestions, 3);
        assert_eq!(config.whois.max_age_days, 30);
        assert!(config
            .redirects
            .auth_domains
            .contains(&"accounts.google.com".to_string()));
        assert!(config
            .redirects
            .suspicious_providers
            .contains(&"bit.ly".to_string()));
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.redirects.max_hops, config.redirects.max_hops);
        assert_eq!(
            parsed.content.sensitive_fields,
            config.content.sensitive_fields
        );
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let parsed: Config = serde_yaml::from_str("detector_timeout_seconds: 30\n").unwrap();
        assert_eq!(parsed.detector_timeout_seconds, 30);
        assert_eq!(parsed.redirects.max_hops, 5);
    }
}
