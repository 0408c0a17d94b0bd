use crate::config::ReputationConfig;
use crate::result::Verdict;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

const CHECKURL_ENDPOINT: &str = "https://checkurl.phishtank.com/checkurl/";

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReputationResult {
    #[serde(rename = "isPhishing")]
    pub is_phishing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phishtank: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Verdict for ReputationResult {
    fn is_suspicious(&self) -> bool {
        self.is_phishing
    }
    fn reasons(&self) -> Vec<String> {
        if self.is_phishing {
            vec!["URL found in PhishTank database".to_string()]
        } else {
            Vec::new()
        }
    }
}

impl ReputationResult {
    fn unavailable(error: String) -> Self {
        ReputationResult {
            error: Some(error),
            ..Default::default()
        }
    }
}

/// Queries the PhishTank checkurl API for a known-phish verdict.
pub struct ReputationClient {
    client: Client,
    app_key: Option<String>,
}

impl ReputationClient {
    pub fn new(config: ReputationConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("phishtank/phishguard")
            .build()?;

        Ok(Self {
            client,
            app_key: config.app_key,
        })
    }

    /// A lookup failure degrades to a non-phishing, error-annotated result;
    /// reputation data is advisory and must never block a verdict.
    pub async fn check(&self, url: &str) -> ReputationResult {
        let mut params = vec![("url", url), ("format", "json")];
        if let Some(key) = &self.app_key {
            params.push(("app_key", key));
        }

        let response = match self.client.post(CHECKURL_ENDPOINT).form(&params).send().await {
            Ok(response) => response,
            Err(e) => {
                log::debug!("PhishTank request failed: {e}");
                return ReputationResult::unavailable(format!("Could not check PhishTank: {e}"));
            }
        };

        let status = response.status();
        if !status.is_success() {
            return ReputationResult::unavailable(format!(
                "PhishTank responded with status {status}"
            ));
        }

        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                return ReputationResult::unavailable(format!(
                    "Could not read PhishTank response: {e}"
                ))
            }
        };
        let body: Value = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(e) => {
                return ReputationResult::unavailable(format!(
                    "PhishTank did not return JSON: {e}"
                ))
            }
        };

        match body.get("results") {
            Some(results) => ReputationResult {
                is_phishing: Self::interpret(results),
                phishtank: Some(results.clone()),
                error: None,
            },
            None => ReputationResult::unavailable("PhishTank response had no results".to_string()),
        }
    }

    /// A URL counts as phishing only when PhishTank both knows it and has
    /// verified the report.
    fn interpret(results: &Value) -> bool {
        let in_database = results
            .get("in_database")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let valid = results.get("valid").and_then(Value::as_bool).unwrap_or(false);
        in_database && valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_interpret_verified_phish() {
        let results = json!({"in_database": true, "valid": true, "url": "http://bad.example"});
        assert!(ReputationClient::interpret(&results));
    }

    #[test]
    fn test_interpret_unverified_report() {
        let results = json!({"in_database": true, "valid": false});
        assert!(!ReputationClient::interpret(&results));
    }

    #[test]
    fn test_interpret_unknown_url() {
        let results = json!({"in_database": false});
        assert!(!ReputationClient::interpret(&results));
    }

    #[test]
    fn test_unavailable_is_not_phishing() {
        let result = ReputationResult::unavailable("timeout".to_string());
        assert!(!result.is_suspicious());
        assert!(result.reasons().is_empty());
        assert!(result.error.is_some());
    }

    #[test]
    fn test_verdict_reason() {
        let result = ReputationResult {
            is_phishing: true,
            ..Default::default()
        };
        assert_eq!(result.reasons(), vec!["URL found in PhishTank database"]);
    }
}
