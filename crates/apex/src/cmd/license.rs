//! License management commands.
//!
//! Provides CLI commands for viewing, checking, issuing, activating and
//! removing license keys.

use anyhow::{Context, Result, bail};
use apex_config::Config;
use apex_license::{
    Edition, EditionFeatures, Feature, LICENSE_ENV_VAR, Limit, LicenseValidator, ValidationResult,
    activate_license, deactivate_license, default_license_path, load_license_key,
};
use clap::{Args, Subcommand};
use serde::Serialize;
use tracing::warn;

/// License management arguments
#[derive(Args, Debug)]
pub struct LicenseArgs {
    #[command(subcommand)]
    command: LicenseCommand,
}

#[derive(Subcommand, Debug)]
enum LicenseCommand {
    /// Show current license status
    Show {
        /// Host to check domain-locked keys against (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a license key without activating it
    Check {
        /// License key to check
        key: String,

        /// Host to check domain-locked keys against (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Issue new license keys
    Generate {
        /// Edition name or code (free, standard, professional, ...)
        #[arg(short, long, default_value = "standard")]
        edition: String,

        /// Bind the keys to this domain (any domain if omitted)
        #[arg(short, long)]
        domain: Option<String>,

        /// Number of keys to issue
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },

    /// Activate a license key
    Activate {
        /// License key to activate
        key: String,

        /// Host to check domain-locked keys against (overrides config)
        #[arg(long)]
        host: Option<String>,
    },

    /// Remove the current license
    Deactivate,

    /// List editions with their limits and features
    Features {
        /// Only show this edition
        edition: Option<String>,

        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },
}

/// JSON status output
#[derive(Serialize)]
struct StatusReport<'a> {
    #[serde(flatten)]
    result: &'a ValidationResult,
    edition_name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    host: Option<&'a str>,
    features: &'static EditionFeatures,
}

/// Run the license command
pub fn run(args: LicenseArgs, config: &Config) -> Result<()> {
    match args.command {
        LicenseCommand::Show { host, json } => show_license(config, resolve_host(host, config), json),
        LicenseCommand::Check { key, host, json } => {
            check(&key, resolve_host(host, config).as_deref(), json)
        }
        LicenseCommand::Generate {
            edition,
            domain,
            count,
        } => generate(&edition, domain.as_deref(), count),
        LicenseCommand::Activate { key, host } => activate(&key, resolve_host(host, config).as_deref()),
        LicenseCommand::Deactivate => deactivate(config),
        LicenseCommand::Features { edition, json } => features(edition.as_deref(), json),
    }
}

/// CLI flag wins over the config file
fn resolve_host(cli_host: Option<String>, config: &Config) -> Option<String> {
    cli_host.or_else(|| config.license.host.clone())
}

/// Show current license status
fn show_license(config: &Config, host: Option<String>, json: bool) -> Result<()> {
    let loaded = load_license_key(
        config.license.key.as_deref(),
        config.license.key_file.as_deref(),
    );
    let source = loaded.as_ref().map(|l| l.source.to_string());

    let mut validator = LicenseValidator::new(loaded.map(|l| l.key));
    if let Some(host) = &host {
        validator = validator.with_host(host);
    }
    let result = validator.validate();

    if json {
        let report = StatusReport {
            result: result.as_ref(),
            edition_name: result.edition_name(),
            source,
            host: validator.host(),
            features: result.features(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("License Status");
    println!("==============\n");

    if result.free_tier {
        println!("Edition:  {}", Edition::Free.display_name());
        println!("Status:   No license key configured");
    } else {
        print_result(&result);
    }

    if let Some(source) = &source {
        println!("Source:   {}", source);
    }
    if let Some(host) = validator.host() {
        println!("Host:     {}", host);
    }

    println!();
    print_features(result.edition().display_name(), result.features());

    println!("\n---");
    println!("License file: {}", default_license_path().display());
    println!("Environment:  {}", LICENSE_ENV_VAR);

    Ok(())
}

/// Validate a key and report the outcome
fn check(key: &str, host: Option<&str>, json: bool) -> Result<()> {
    let validator = LicenseValidator::default();
    let result = validator.validate_key_for_host(key, host);

    if json {
        let report = StatusReport {
            result: &result,
            edition_name: result.edition_name(),
            source: None,
            host,
            features: result.features(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_result(&result);
    }

    match &result.failure {
        Some(failure) => bail!("license key rejected ({})", failure.code()),
        None => Ok(()),
    }
}

/// Issue new keys
fn generate(edition: &str, domain: Option<&str>, count: usize) -> Result<()> {
    let edition = Edition::parse(edition).unwrap_or_else(|| {
        warn!(edition, "unknown edition, issuing standard keys");
        Edition::Standard
    });

    let validator = LicenseValidator::default();
    for _ in 0..count {
        println!("{}", validator.generate(edition, domain));
    }

    Ok(())
}

/// Activate a license key
fn activate(key: &str, host: Option<&str>) -> Result<()> {
    let key = key.trim();

    if key.is_empty() {
        bail!("License key cannot be empty");
    }

    println!("Validating license key...\n");

    match activate_license(key, host) {
        Ok((result, path)) => {
            println!("\x1b[32mLicense activated successfully!\x1b[0m\n");
            print_result(&result);
            println!("\nSaved to: {}", path.display());

            Ok(())
        }
        Err(e) => {
            eprintln!("\x1b[31mFailed to activate license:\x1b[0m {}", e);
            eprintln!("\nPlease verify your license key and the shop's host name.");
            Err(e.into())
        }
    }
}

/// Deactivate the current license
fn deactivate(config: &Config) -> Result<()> {
    let removed = deactivate_license().context("failed to remove license")?;

    if !removed {
        println!("No license file at {}.", default_license_path().display());
    } else {
        println!("\x1b[32mLicense removed.\x1b[0m");
    }

    // Keys from the environment or config survive removing the file
    let remaining = load_license_key(
        config.license.key.as_deref(),
        config.license.key_file.as_deref(),
    );
    match remaining {
        Some(loaded) => println!("A license key is still configured via {}.", loaded.source),
        None => println!("Apex will run in free tier mode."),
    }

    Ok(())
}

/// List editions
fn features(edition: Option<&str>, json: bool) -> Result<()> {
    let editions: Vec<Edition> = match edition {
        Some(name) => match Edition::parse(name) {
            Some(edition) => vec![edition],
            None => bail!("unknown edition '{}'", name),
        },
        None => Edition::ALL.to_vec(),
    };

    if json {
        let catalog: serde_json::Map<String, serde_json::Value> = editions
            .iter()
            .map(|e| Ok((e.name().to_string(), serde_json::to_value(e.features())?)))
            .collect::<Result<_, serde_json::Error>>()?;
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    for (i, edition) in editions.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print_features(
            &format!("{} ({})", edition.display_name(), edition.code()),
            edition.features(),
        );
    }

    Ok(())
}

fn print_result(result: &ValidationResult) {
    match &result.failure {
        None => {
            println!("Edition:  {}", result.edition().display_name());
            println!("Code:     {}", result.edition_code());
            if let Some(key) = &result.key {
                println!("Key:      {}", key);
            }
            println!(
                "Domain:   {}",
                if result.domain_locked {
                    "locked"
                } else {
                    "any"
                }
            );
            println!("Status:   Valid");
        }
        Some(failure) => {
            println!("Status:   \x1b[31mInvalid license\x1b[0m");
            println!("Reason:   {} ({})", failure, failure.code());
            println!(
                "\nRunning with {} limits until the key is fixed.",
                Edition::Standard.display_name()
            );
        }
    }
}

fn print_features(title: &str, features: &EditionFeatures) {
    println!("{}", title);
    for limit in Limit::ALL {
        println!("  {:<26}{}", limit.name(), features.limit(limit));
    }
    for feature in Feature::ALL {
        let mark = if features.has(feature) { "yes" } else { "no" };
        println!("  {:<26}{}", feature.name(), mark);
    }
}
