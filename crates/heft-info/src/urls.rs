//! Links shown to the user

use crate::auth::UTM_PARAMS;
use crate::error::{Error, Result};
use url::Url;

/// Public advisory page for an npm package
pub fn vuln_page_url(vuln_registry_url: &str, package_name: &str) -> Result<Url> {
    if package_name.is_empty() {
        return Err(Error::InvalidPackageName("Package name cannot be empty".to_string()));
    }

    let mut url = Url::parse(vuln_registry_url)?;
    url.path_segments_mut()
        .map_err(|_| Error::other(format!("Cannot use {} as a base URL", vuln_registry_url)))?
        .pop_if_empty()
        .extend(["test", "npm"])
        .extend(package_name.split('/'));
    url.query_pairs_mut().extend_pairs(UTM_PARAMS);
    Ok(url)
}
