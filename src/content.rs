use crate::config::ContentConfig;
use crate::domain::DomainUtils;
use crate::result::Verdict;
use regex::Regex;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                                  (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Clone, Default, Serialize)]
pub struct ContentResult {
    pub is_suspicious: bool,
    pub reasons: Vec<String>,
    pub suspicious_forms: Vec<String>,
    pub suspicious_text: Vec<String>,
}

impl Verdict for ContentResult {
    fn is_suspicious(&self) -> bool {
        self.is_suspicious
    }
    fn reasons(&self) -> Vec<String> {
        self.reasons.clone()
    }
}

/// Fetches a page and scans its forms for credential and sensitive-data
/// collection.
pub struct ContentAnalyzer {
    client: Client,
    config: ContentConfig,
    form_pattern: Regex,
    password_pattern: Regex,
    input_pattern: Regex,
    name_attr_pattern: Regex,
}

impl ContentAnalyzer {
    pub fn new(config: ContentConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(BROWSER_USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            config,
            form_pattern: Regex::new(r"(?is)<form\b.*?</form>")?,
            password_pattern: Regex::new(r#"(?i)<input[^>]*type\s*=\s*["']?password"#)?,
            input_pattern: Regex::new(r"(?is)<input\b[^>]*>")?,
            name_attr_pattern: Regex::new(r#"(?i)name\s*=\s*["']?([a-z0-9_-]+)"#)?,
        })
    }

    pub async fn analyze(&self, url: &str) -> ContentResult {
        let host = DomainUtils::host_of(url).unwrap_or_default();

        if self.is_ignored(&host) {
            return ContentResult::default();
        }

        let html = match self.fetch(url).await {
            Ok(html) => html,
            Err(e) => {
                log::debug!("Content fetch failed for {url}: {e}");
                return ContentResult {
                    is_suspicious: true,
                    reasons: vec![format!("Error analyzing content: {e}")],
                    ..Default::default()
                };
            }
        };

        let reasons = self.scan_forms(&html, self.is_trusted(&host));

        ContentResult {
            is_suspicious: !reasons.is_empty(),
            suspicious_forms: reasons.clone(),
            reasons,
            suspicious_text: Vec::new(),
        }
    }

    async fn fetch(&self, url: &str) -> anyhow::Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    /// Scan each form block: password fields are only acceptable on trusted
    /// domains; sensitive field names are flagged everywhere.
    fn scan_forms(&self, html: &str, trusted: bool) -> Vec<String> {
        let mut reasons = Vec::new();

        for form in self.form_pattern.find_iter(html) {
            let form = form.as_str();

            if !trusted && self.password_pattern.is_match(form) {
                reasons.push("Form contains password field".to_string());
            }

            for input in self.input_pattern.find_iter(form) {
                if let Some(captures) = self.name_attr_pattern.captures(input.as_str()) {
                    let field_name = captures[1].to_lowercase();
                    if self.config.sensitive_fields.contains(&field_name) {
                        reasons.push(format!(
                            "Form requests sensitive information: {field_name}"
                        ));
                    }
                }
            }
        }

        reasons
    }

    fn is_trusted(&self, host: &str) -> bool {
        let canonical = DomainUtils::canonicalize(host);
        self.config.trusted_domains.iter().any(|d| *d == canonical)
    }

    fn is_ignored(&self, host: &str) -> bool {
        let canonical = DomainUtils::canonicalize(host);
        self.config.ignored_domains.iter().any(|d| *d == canonical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> ContentAnalyzer {
        ContentAnalyzer::new(ContentConfig::default()).unwrap()
    }

    const LOGIN_FORM: &str = r#"
        <html><body>
        <form action="/login" method="post">
            <input type="text" name="username">
            <input type="password" name="pass">
        </form>
        </body></html>
    "#;

    const SENSITIVE_FORM: &str = r#"
        <form action="/verify">
            <input type="text" name="cvv">
            <input type="text" name="cpf">
        </form>
    "#;

    #[test]
    fn test_password_field_flagged_on_untrusted() {
        let reasons = analyzer().scan_forms(LOGIN_FORM, false);
        assert_eq!(reasons, vec!["Form contains password field".to_string()]);
    }

    #[test]
    fn test_password_field_allowed_on_trusted() {
        let reasons = analyzer().scan_forms(LOGIN_FORM, true);
        assert!(reasons.is_empty());
    }

    #[test]
    fn test_sensitive_fields_flagged_everywhere() {
        let reasons = analyzer().scan_forms(SENSITIVE_FORM, true);
        assert!(reasons.contains(&"Form requests sensitive information: cvv".to_string()));
        assert!(reasons.contains(&"Form requests sensitive information: cpf".to_string()));
    }

    #[test]
    fn test_inputs_outside_forms_ignored() {
        let html = r#"<input type="password" name="stray">"#;
        let reasons = analyzer().scan_forms(html, false);
        assert!(reasons.is_empty());
    }

    #[test]
    fn test_benign_form_is_clean() {
        let html = r#"<form><input type="text" name="search"></form>"#;
        assert!(analyzer().scan_forms(html, false).is_empty());
    }

    #[test]
    fn test_trusted_and_ignored_lookup() {
        let a = analyzer();
        assert!(a.is_trusted("accounts.google.com"));
        assert!(a.is_trusted("www.google.com"));
        assert!(!a.is_trusted("evil.example.net"));
        assert!(a.is_ignored("example.com"));
        assert!(a.is_ignored("localhost"));
    }
}
