//! JSON formatter for check reports.

use super::CheckReport;

pub fn print_json(report: &CheckReport) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing results: {}", e),
    }
}
