//! Colored verification output.
//!
//! Produces per-function verification results with color-coded status:
//!   [OK]      function_name (green)
//!   [FAIL]    function_name - detail (red)
//!   [UNKNOWN] function_name - reason (yellow)

use colored::Colorize;
use serde::Serialize;

/// Status of a function's verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VerificationStatus {
    /// All VCs of the function proved
    Ok,
    /// At least one VC refuted
    Fail,
    /// No refutation, but some VC came back undecided
    Unknown,
}

/// Result of verifying a single function.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionResult {
    pub name: String,
    pub status: VerificationStatus,
    /// Detail message for FAIL/UNKNOWN
    pub message: Option<String>,
    /// Number of VCs checked
    pub vc_count: usize,
    /// Number of VCs that verified
    pub verified_count: usize,
}

/// Print a header for the verification run.
pub fn print_header(source: &str) {
    eprintln!("{}", format!("Verifying {source}").bold());
}

/// Print verification results with colored output.
///
/// Output format:
/// ```text
///   [OK]      count_up (3/3 VCs)
///   [FAIL]    set_two (correctness of set_two: block 0 -> block 2 [x = 1])
///
/// Summary: 1 OK, 1 FAIL
/// ```
pub fn print_verification_results(results: &[FunctionResult]) {
    if results.is_empty() {
        eprintln!("{}", "No functions found.".dimmed());
        return;
    }

    eprintln!();
    for result in results {
        match result.status {
            VerificationStatus::Ok => {
                eprintln!(
                    "  {}  {} ({}/{} VCs)",
                    "[OK]".green().bold(),
                    result.name,
                    result.verified_count,
                    result.vc_count,
                );
            }
            VerificationStatus::Fail => {
                let detail = result.message.as_deref().unwrap_or("verification failed");
                eprintln!("  {}  {} ({})", "[FAIL]".red().bold(), result.name, detail);
            }
            VerificationStatus::Unknown => {
                let detail = result.message.as_deref().unwrap_or("solver was undecided");
                eprintln!(
                    "  {}  {} ({})",
                    "[UNKNOWN]".yellow().bold(),
                    result.name,
                    detail,
                );
            }
        }
    }

    let ok_count = results
        .iter()
        .filter(|r| r.status == VerificationStatus::Ok)
        .count();
    let fail_count = results
        .iter()
        .filter(|r| r.status == VerificationStatus::Fail)
        .count();
    let unknown_count = results
        .iter()
        .filter(|r| r.status == VerificationStatus::Unknown)
        .count();

    eprintln!();
    let mut parts = Vec::new();
    if ok_count > 0 {
        parts.push(format!("{} {}", ok_count, "OK".green()));
    }
    if fail_count > 0 {
        parts.push(format!("{} {}", fail_count, "FAIL".red()));
    }
    if unknown_count > 0 {
        parts.push(format!("{} {}", unknown_count, "UNKNOWN".yellow()));
    }
    eprintln!("Summary: {}", parts.join(", "));
    eprintln!();
}
