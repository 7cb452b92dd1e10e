//! gcsprobe CLI: drive the storage harness from the command line.
//!
//! Thin command-line surface over the library: environment checks, object
//! listing and transfer, signed-URL generation, and browser-backed
//! signed-URL validation.

// CLI-specific lint allowances (CLI binary, not library)
#![allow(missing_docs)]
#![allow(clippy::print_stdout)] // CLI must print to stdout
#![allow(clippy::print_stderr)] // CLI must print to stderr
#![allow(clippy::exit)] // CLI uses exit codes

use clap::{Parser, Subcommand};
use gcsprobe::browser::{BrowserHandle, SignedUrlValidator};
use gcsprobe::config::HarnessConfig;
use gcsprobe::model::SignedUrlVerdict;
use gcsprobe::storage::{StorageCli, GS_SCHEME};
use miette::{IntoDiagnostic, Result};
use std::path::{Path, PathBuf};
use tracing::error;

#[derive(Debug, Parser)]
#[command(
    name = "gcsprobe",
    version,
    about = "Test harness for the gcloud storage CLI"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check that the storage CLI is installed and authenticated
    Doctor {
        #[arg(long)]
        json: bool,
    },
    /// List objects under a path or prefix
    Ls {
        /// Object path, prefix, or bare object name resolved via GCS_BUCKET_NAME
        path: String,
        #[arg(short, long)]
        recursive: bool,
        #[arg(long)]
        json: bool,
    },
    /// Copy an object or tree between local and remote locations
    Cp {
        source: String,
        destination: String,
        #[arg(short, long)]
        recursive: bool,
    },
    /// Delete an object or prefix tree
    Rm {
        path: String,
        #[arg(short, long)]
        recursive: bool,
    },
    /// Show object metadata as JSON
    Describe {
        path: String,
    },
    /// Generate a time-limited signed download URL
    Sign {
        path: String,
        /// Validity window in minutes
        #[arg(long, default_value_t = 60)]
        duration: u32,
    },
    /// Validate a signed URL in a headless browser
    Validate {
        url: String,
        #[arg(long)]
        json: bool,
    },
    /// Download the object behind a signed URL through the browser
    Fetch {
        url: String,
        destination: PathBuf,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Doctor { json } => doctor(json),
        Commands::Ls {
            path,
            recursive,
            json,
        } => ls(&path, recursive, json),
        Commands::Cp {
            source,
            destination,
            recursive,
        } => cp(&source, &destination, recursive),
        Commands::Rm { path, recursive } => rm(&path, recursive),
        Commands::Describe { path } => describe(&path),
        Commands::Sign { path, duration } => sign(&path, duration),
        Commands::Validate { url, json } => validate(&url, json),
        Commands::Fetch { url, destination } => fetch(&url, &destination),
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn doctor(json: bool) -> Result<()> {
    let cli = StorageCli::new();
    let available = cli.is_available();
    let authenticated = available && cli.is_authenticated();
    let configured = HarnessConfig::from_env().is_ok();
    if json {
        let report = serde_json::json!({
            "cli_available": available,
            "authenticated": authenticated,
            "bucket_configured": configured,
        });
        println!("{report}");
    } else {
        println!("storage CLI available: {available}");
        println!("authenticated:         {authenticated}");
        println!("bucket configured:     {configured}");
    }
    if !available || !authenticated {
        std::process::exit(1);
    }
    Ok(())
}

fn ls(path: &str, recursive: bool, json: bool) -> Result<()> {
    let resolved = resolve_remote_path(path)?;
    let objects = StorageCli::new().list_objects(&resolved, recursive)?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&objects).into_diagnostic()?
        );
    } else {
        for object in &objects {
            println!("{object}");
        }
    }
    Ok(())
}

fn cp(source: &str, destination: &str, recursive: bool) -> Result<()> {
    let cli = StorageCli::new();
    let outcome = if recursive {
        cli.copy_recursive(source, destination)?
    } else {
        cli.copy(source, destination)?
    };
    exit_on_failure(&outcome)
}

fn rm(path: &str, recursive: bool) -> Result<()> {
    let resolved = resolve_remote_path(path)?;
    let cli = StorageCli::new();
    let outcome = if recursive {
        cli.delete_recursive(&resolved)?
    } else {
        cli.delete_object(&resolved)?
    };
    exit_on_failure(&outcome)
}

fn describe(path: &str) -> Result<()> {
    let resolved = resolve_remote_path(path)?;
    let outcome = StorageCli::new().describe_object(&resolved)?;
    if outcome.success() {
        println!("{}", outcome.stdout());
    }
    exit_on_failure(&outcome)
}

fn sign(path: &str, duration: u32) -> Result<()> {
    let resolved = resolve_remote_path(path)?;
    let url = StorageCli::new().generate_signed_url(&resolved, duration)?;
    println!("{url}");
    Ok(())
}

fn validate(url: &str, json: bool) -> Result<()> {
    let validator = SignedUrlValidator::new();
    let verdict = validator.validate(url);
    BrowserHandle::shutdown();
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&verdict).into_diagnostic()?
        );
    } else {
        print_verdict(&verdict);
    }
    if !verdict.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

fn fetch(url: &str, destination: &Path) -> Result<()> {
    let validator = SignedUrlValidator::new();
    let downloaded = validator.download_via_url(url, destination);
    BrowserHandle::shutdown();
    if downloaded {
        println!("downloaded to {}", destination.display());
        Ok(())
    } else {
        error!(url, "download failed");
        std::process::exit(1);
    }
}

fn print_verdict(verdict: &SignedUrlVerdict) {
    println!("url:      {}", verdict.url);
    println!("status:   {}", verdict.status);
    println!("phishing: {}", verdict.phishing_detected);
    if !verdict.page_title.is_empty() {
        println!("title:    {}", verdict.page_title);
    }
    if let Some(screenshot) = &verdict.screenshot {
        println!("screenshot: {}", screenshot.display());
    }
    println!(
        "verdict:  {}",
        if verdict.is_success() { "ok" } else { "failed" }
    );
}

/// Accept full object paths as-is; resolve bare names through the
/// configured bucket.
fn resolve_remote_path(path: &str) -> Result<String> {
    if path.starts_with(GS_SCHEME) {
        return Ok(path.to_string());
    }
    let config = HarnessConfig::from_env()?;
    Ok(config.gs_path(path))
}

fn exit_on_failure(outcome: &gcsprobe::model::ExecOutcome) -> Result<()> {
    if outcome.success() {
        Ok(())
    } else {
        error!(
            command = outcome.command(),
            stderr = outcome.stderr(),
            "command failed"
        );
        std::process::exit(1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::resolve_remote_path;

    #[test]
    fn full_paths_pass_through_untouched() {
        let resolved = resolve_remote_path("gs://bucket/key.txt").unwrap();
        assert_eq!(resolved, "gs://bucket/key.txt");
    }
}
