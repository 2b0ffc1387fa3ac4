//! Vulnerability API client

use crate::client::HttpClient;
use crate::error::{Error, Result};
use crate::npm::encode_package_name;
use crate::types::Advisory;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct TestResponse {
    #[serde(default)]
    issues: Issues,
}

#[derive(Debug, Default, Deserialize)]
struct Issues {
    #[serde(default)]
    vulnerabilities: Vec<Advisory>,
}

fn test_url(api_url: &str, package_name: &str, version: &str) -> Result<String> {
    let encoded_name = encode_package_name(package_name)?;
    let version = if version.is_empty() { "latest" } else { version };
    Ok(format!(
        "{}/v1/test/npm/{}/{}",
        api_url.trim_end_matches('/'),
        encoded_name,
        version
    ))
}

/// Fetch advisories for one package version
pub async fn fetch_vulnerabilities(
    client: &HttpClient,
    api_url: &str,
    token: &str,
    package_name: &str,
    version: &str,
) -> Result<Vec<Advisory>> {
    if token.is_empty() {
        return Err(Error::NotAuthenticated);
    }

    let url = test_url(api_url, package_name, version)?;

    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&format!("token {}", token))
        .map_err(|e| Error::other(format!("Invalid credential: {}", e)))?;
    headers.insert(AUTHORIZATION, value);

    let response: TestResponse = client
        .get_json_with_headers(&url, headers)
        .await
        .map_err(|e| match e {
            Error::Status { status: 401, .. } | Error::Status { status: 403, .. } => {
                Error::NotAuthenticated
            }
            e if e.is_not_found() => {
                Error::PackageNotFound(package_name.to_string(), "vulnerability".to_string())
            }
            e => e,
        })?;

    Ok(response.issues.vulnerabilities)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_url() {
        assert_eq!(
            test_url("https://api.snyk.io/", "lodash", "4.17.15").unwrap(),
            "https://api.snyk.io/v1/test/npm/lodash/4.17.15"
        );
        assert_eq!(
            test_url("https://api.snyk.io", "@babel/core", "").unwrap(),
            "https://api.snyk.io/v1/test/npm/@babel%2Fcore/latest"
        );
    }

    #[test]
    fn test_parse_response() {
        let body = r#"{
            "ok": false,
            "issues": {
                "vulnerabilities": [
                    {"id": "SNYK-JS-LODASH-567746", "title": "Prototype Pollution", "severity": "high"}
                ],
                "licenses": []
            }
        }"#;
        let parsed: TestResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.issues.vulnerabilities.len(), 1);
        assert_eq!(parsed.issues.vulnerabilities[0].severity, "high");
        assert!(parsed.issues.vulnerabilities[0].url.is_none());
    }

    #[test]
    fn test_parse_clean_response() {
        let parsed: TestResponse = serde_json::from_str(r#"{"ok": true}"#).unwrap();
        assert!(parsed.issues.vulnerabilities.is_empty());
    }

    #[tokio::test]
    async fn test_missing_token() {
        let client = HttpClient::new().unwrap();
        let result = fetch_vulnerabilities(&client, "https://api.snyk.io", "", "lodash", "4.17.15").await;
        assert!(matches!(result, Err(Error::NotAuthenticated)));
    }
}
