use std::path::PathBuf;
use std::process;

use clap::Parser;

use onefile::core::{
    bundle_app, print_error_message, print_info_message, write_artifact, BundleOptions,
};

/// Package a browser application into a single self-contained HTML file
#[derive(Parser)]
#[command(name = "onefile", version, about, long_about = None)]
struct Cli {
    /// Source tree containing the entry document and its assets
    source_root: PathBuf,

    /// Entry document file name within the source root
    /// (auto-detected when the source root holds exactly one .html file)
    #[arg(long)]
    entry: Option<String>,

    /// Artifact name prefix (defaults to the entry document's file stem)
    #[arg(long)]
    app_name: Option<String>,

    /// Application version recorded in the artifact name and build stamp
    #[arg(long, default_value = "0.1.0")]
    app_version: String,

    /// Directory to write the artifact into (defaults to the source root)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Suppress warnings and progress output
    #[arg(long)]
    silent: bool,
}

fn main() {
    let cli = Cli::parse();

    let options = BundleOptions {
        app_name: cli.app_name,
        app_version: cli.app_version,
        entry: cli.entry,
        output_dir: cli.output_dir,
        silent: cli.silent,
        ..BundleOptions::default()
    };

    let artifact = match bundle_app(&cli.source_root, &options) {
        Ok(artifact) => artifact,
        Err(e) => {
            print_error_message(&format!("Error: {}", e));
            process::exit(1);
        }
    };

    let output_dir = options
        .output_dir
        .clone()
        .unwrap_or_else(|| cli.source_root.clone());
    let output_path = match write_artifact(&artifact, &output_dir) {
        Ok(path) => path,
        Err(e) => {
            print_error_message(&format!("Error: {}", e));
            process::exit(1);
        }
    };

    if !cli.silent {
        if let Some(title) = &artifact.title {
            print_info_message(&format!("Bundled: {}", title.trim()));
        }
        let stats = &artifact.stats;
        print_info_message(&format!("CSS files inlined: {}", stats.css_files_inlined));
        print_info_message(&format!("JS files inlined: {}", stats.js_files_inlined));
        print_info_message(&format!("Images encoded: {}", stats.images_encoded));
        print_info_message(&format!(
            "PWA references removed: {}",
            stats.pwa_refs_removed
        ));
        print_info_message(&format!(
            "Test references removed: {}",
            stats.test_refs_removed
        ));
        print_info_message(&format!("Original size: {} bytes", stats.original_size));
        print_info_message(&format!(
            "Final size: {} bytes ({:+} bytes)",
            stats.final_size,
            stats.final_size as i64 - stats.original_size as i64
        ));
        print_info_message(&format!("Artifact: {}", output_path.display()));
    }
}
