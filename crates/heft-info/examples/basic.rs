//! Basic usage example for heft-info
//!
//! Run with: cargo run --package heft-info --example basic

use heft_info::InfoClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== heft-info Basic Example ===\n");

    let client = InfoClient::new()?;

    // 1. Latest version
    println!("1. Fetching react@latest from npm...");
    let react = client.package_size("react", None).await?;
    println!("   Version: {}", react.version);
    println!("   Size: {}", heft_core::format_bytes(react.size));

    // 2. Pinned version
    println!("\n2. Fetching lodash@4.17.21 from npm...");
    match client.package_size("lodash", Some("4.17.21")).await {
        Ok(lodash) => println!("   Size: {}", heft_core::format_bytes(lodash.size)),
        Err(e) => println!("   Error: {}", e),
    }

    // 3. Advisories need a token
    println!("\n3. Checking lodash@4.17.15 for advisories...");
    match std::env::var("HEFT_TOKEN") {
        Ok(token) => match client.vulnerabilities(&token, "lodash", "4.17.15").await {
            Ok(vulns) => {
                println!("   Found {} advisories", vulns.len());
                for vuln in vulns.iter().take(5) {
                    println!("   - [{}] {}", vuln.severity.as_str(), vuln.title);
                }
            }
            Err(e) => println!("   Error: {}", e),
        },
        Err(_) => println!("   Skipped (set HEFT_TOKEN to enable)"),
    }

    println!("\n   Details: {}", client.vuln_page_url("lodash")?);

    println!("\n=== Example Complete ===");
    Ok(())
}
