use crate::domain::DomainUtils;
use crate::result::Verdict;
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::collections::HashSet;

/// Built-in provider list, used when no file is configured.
const DEFAULT_PROVIDERS: &str = include_str!("../data/dyn-dns-providers.txt");

#[derive(Debug, Clone, Serialize)]
pub struct DynamicDnsResult {
    pub is_dynamic_dns: bool,
    pub domain: String,
}

impl Verdict for DynamicDnsResult {
    fn is_suspicious(&self) -> bool {
        self.is_dynamic_dns
    }
    fn reasons(&self) -> Vec<String> {
        if self.is_dynamic_dns {
            vec![format!(
                "Domain uses Dynamic-DNS provider ({})",
                self.domain
            )]
        } else {
            Vec::new()
        }
    }
}

/// Static set of dynamic-DNS provider suffixes, loaded once at startup.
#[derive(Debug)]
pub struct DynamicDnsList {
    providers: HashSet<String>,
}

impl DynamicDnsList {
    pub fn parse(text: &str) -> Result<Self> {
        let providers: HashSet<String> = text
            .lines()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| line.to_lowercase())
            .collect();

        if providers.is_empty() {
            return Err(anyhow!("dynamic-DNS provider list is empty"));
        }

        log::info!("Loaded {} dynamic-DNS providers", providers.len());
        Ok(Self { providers })
    }

    pub fn builtin() -> Result<Self> {
        Self::parse(DEFAULT_PROVIDERS)
    }

    pub fn load(path: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// True when the domain or any of its parent suffixes is a listed provider.
    pub fn is_dynamic(&self, domain: &str) -> bool {
        let domain = DomainUtils::canonicalize(domain);
        self.providers
            .iter()
            .any(|dd| domain == *dd || domain.ends_with(&format!(".{}", dd)))
    }

    pub fn check(&self, domain: &str) -> DynamicDnsResult {
        let is_dynamic_dns = self.is_dynamic(domain);
        if is_dynamic_dns {
            log::debug!("Domain {domain} matches a dynamic-DNS provider");
        }
        DynamicDnsResult {
            is_dynamic_dns,
            domain: domain.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_match() {
        let list = DynamicDnsList::parse("duckdns.org\nno-ip.com\n").unwrap();

        assert!(list.is_dynamic("duckdns.org"));
        assert!(list.is_dynamic("sub.duckdns.org"));
        assert!(list.is_dynamic("deep.sub.duckdns.org"));
        assert!(!list.is_dynamic("notduckdns.org"));
        assert!(!list.is_dynamic("example.com"));
    }

    #[test]
    fn test_www_prefix_stripped() {
        let list = DynamicDnsList::parse("duckdns.org\n").unwrap();
        assert!(list.is_dynamic("www.duckdns.org"));
    }

    #[test]
    fn test_check_result_shape() {
        let list = DynamicDnsList::parse("duckdns.org\n").unwrap();
        let result = list.check("sub.duckdns.org");
        assert!(result.is_dynamic_dns);
        assert_eq!(result.domain, "sub.duckdns.org");
    }

    #[test]
    fn test_builtin_loads() {
        let list = DynamicDnsList::builtin().unwrap();
        assert!(list.len() > 50);
        assert!(list.is_dynamic("myhost.duckdns.org"));
    }
}
