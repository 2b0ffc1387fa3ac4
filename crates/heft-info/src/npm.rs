//! npm registry client

use crate::client::HttpClient;
use crate::error::{Error, Result};
use crate::types::PackageSize;
use serde::Deserialize;

/// Version manifest returned by `GET /<name>/<version>`
#[derive(Debug, Deserialize)]
struct NpmVersionResponse {
    name: String,
    version: String,
    #[serde(default)]
    dist: Option<Dist>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Dist {
    unpacked_size: Option<u64>,
}

/// Encode package name for URL (handle scoped packages like @scope/name)
pub(crate) fn encode_package_name(package_name: &str) -> Result<String> {
    if package_name.is_empty() {
        return Err(Error::InvalidPackageName("Package name cannot be empty".to_string()));
    }
    if package_name.starts_with('@') {
        if !package_name.contains('/') {
            return Err(Error::InvalidPackageName(package_name.to_string()));
        }
        Ok(package_name.replacen('/', "%2F", 1))
    } else {
        Ok(package_name.to_string())
    }
}

/// Build the version manifest URL; `None` asks for the `latest` dist-tag
pub(crate) fn version_url(registry: &str, package_name: &str, version: Option<&str>) -> Result<String> {
    let encoded_name = encode_package_name(package_name)?;
    let version = version.filter(|v| !v.is_empty()).unwrap_or("latest");
    Ok(format!("{}/{}/{}", registry.trim_end_matches('/'), encoded_name, version))
}

/// Fetch the unpacked size of a package version from the npm registry
pub async fn fetch_package_size(
    client: &HttpClient,
    registry: &str,
    package_name: &str,
    version: Option<&str>,
) -> Result<PackageSize> {
    let url = version_url(registry, package_name, version)?;

    let response: NpmVersionResponse = client.get_json(&url).await.map_err(|e| {
        if e.is_not_found() {
            Error::PackageNotFound(package_name.to_string(), "npm".to_string())
        } else {
            e
        }
    })?;

    let size = response
        .dist
        .and_then(|dist| dist.unpacked_size)
        .ok_or_else(|| Error::MissingSize(format!("{}@{}", response.name, response.version)))?;

    Ok(PackageSize {
        name: response.name,
        version: response.version,
        size,
    })
}
