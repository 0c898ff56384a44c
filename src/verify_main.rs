use std::env;
use std::path::Path;
use std::process;
use std::time::Duration;

use clap::Parser;

use onefile::core::{print_error_message, print_info_message};
use onefile::verifier::{
    find_latest_artifact, verify_file, verify_url, VerificationReport, DEFAULT_FETCH_TIMEOUT,
};

/// Verify that a bundled artifact satisfies the pipeline's output contract
#[derive(Parser)]
#[command(name = "onefile-verify", version, about, long_about = None)]
struct Cli {
    /// Artifact to verify: a file path or an http(s) URL
    /// (defaults to the newest artifact in the current directory)
    target: Option<String>,

    /// Timeout in seconds when fetching the artifact over the network
    #[arg(long, default_value_t = DEFAULT_FETCH_TIMEOUT.as_secs())]
    timeout: u64,
}

fn print_report(report: &VerificationReport) {
    for check in &report.checks {
        let status = if check.passed { "PASS" } else { "FAIL" };
        print_info_message(&format!("[{}] {}: {}", status, check.name, check.detail));
    }
    print_info_message(&format!(
        "{}/{} checks passed",
        report.score(),
        report.total()
    ));
}

fn main() {
    let cli = Cli::parse();

    let target: String = match cli.target {
        Some(target) => target,
        None => {
            let cwd = env::current_dir().unwrap_or_else(|_| ".".into());
            match find_latest_artifact(&cwd) {
                Some(path) => {
                    let target = path.to_string_lossy().to_string();
                    print_info_message(&format!("Verifying newest artifact: {}", target));
                    target
                }
                None => {
                    print_error_message("Error: no artifact found in the current directory");
                    process::exit(1);
                }
            }
        }
    };

    let result = if target.starts_with("http://") || target.starts_with("https://") {
        verify_url(&target, Duration::from_secs(cli.timeout))
    } else {
        verify_file(Path::new(&target))
    };

    match result {
        Ok(report) => {
            print_report(&report);
            process::exit(if report.passed() { 0 } else { 1 });
        }
        Err(e) => {
            print_error_message(&format!("Error: {}", e));
            process::exit(1);
        }
    }
}
