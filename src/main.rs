//! CDC Protocol - auditable clinical records
//!
//! Command-line front end that runs the CDC Protocol walkthroughs and
//! prints what each one produced.

use anyhow::Result;
use cdc_protocol::{
    config::CdcConfig,
    scenarios::{self, MigraineReport, ScreeningReport, SerializationReport, SharingReport},
    screening::scorer::PHQ9_MAX_SCORE,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cdc")]
#[command(author = "Omnni XAI Team")]
#[command(version)]
#[command(about = "CDC Protocol walkthroughs for auditable medical reasoning")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "CDC_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Screen a patient statement for depression symptoms
    Screen {
        /// Patient identifier
        #[arg(short, long, default_value = "S001")]
        patient: String,

        /// What the patient said
        #[arg(short, long, default_value = "I don't want to do things I used to enjoy anymore")]
        utterance: String,
    },

    /// Parse a headache complaint against migraine criteria
    Migraine {
        /// Patient identifier
        #[arg(short, long, default_value = "P001")]
        patient: String,

        /// What the patient said
        #[arg(short, long, default_value = "throbbing headache with nausea")]
        utterance: String,
    },

    /// Share a treatment protocol between two institutions
    Share {
        /// Patient the imported protocol is applied to
        #[arg(short, long, default_value = "P002")]
        patient: String,
    },

    /// Serialize a record set to JSON and read it back
    Serialize,

    /// Run every walkthrough
    Demo,

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("cdc_protocol={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match cli.config.or_else(existing_default_path) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Loading configuration");
            CdcConfig::from_file(&path)?
        }
        None => CdcConfig::default(),
    };

    match cli.command {
        Commands::Screen { patient, utterance } => {
            print_screening(&scenarios::depression_screening(&config, &patient, &utterance)?);
        }
        Commands::Migraine { patient, utterance } => {
            print_migraine(&scenarios::migraine_diagnosis(&config, &patient, &utterance)?);
        }
        Commands::Share { patient } => {
            print_sharing(&scenarios::cross_institution_sharing(&config, &patient)?);
        }
        Commands::Serialize => {
            print_serialization(&scenarios::serialization_roundtrip(&config)?);
        }
        Commands::Demo => run_demo(&config)?,
        Commands::Config { default } => {
            show_config(if default { None } else { Some(&config) })?;
        }
    }

    Ok(())
}

fn existing_default_path() -> Option<PathBuf> {
    CdcConfig::default_path().filter(|p| p.exists())
}

fn run_demo(config: &CdcConfig) -> Result<()> {
    println!("🚀 Running CDC Protocol Examples");

    print_migraine(&scenarios::migraine_diagnosis(
        config,
        "P001",
        "throbbing headache with nausea",
    )?);
    print_screening(&scenarios::depression_screening(
        config,
        "S001",
        "I don't want to do things I used to enjoy anymore",
    )?);
    print_sharing(&scenarios::cross_institution_sharing(config, "P002")?);
    print_serialization(&scenarios::serialization_roundtrip(config)?);

    println!();
    println!("{}", "=".repeat(50));
    println!("🎯 All Examples Completed");
    println!("Features demonstrated:");
    println!("  ✅ Transparent audit trails");
    println!("  ✅ Cross-institution knowledge sharing");
    println!("  ✅ Structured record serialization");
    println!("{}", "=".repeat(50));
    Ok(())
}

fn print_screening(report: &ScreeningReport) {
    println!();
    println!("=== Depression Screening Example ===");
    println!("Observations parsed: {}", report.observations.len());
    println!(
        "Reference: {} ({})",
        report.knowledge.concept, report.knowledge.reference_standard
    );
    println!(
        "PHQ-9 Total Score: {}/{}",
        report.assessment.total_score, PHQ9_MAX_SCORE
    );
    println!("Severity: {}", report.assessment.severity);
    println!("Recommendations:");
    for rec in &report.assessment.recommendations {
        println!("  - {}", rec);
    }
    println!("Process Records:");
    for process in &report.processes {
        println!("  - {}: {} -> {}", process.concept, process.action, process.value);
    }
}

fn print_migraine(report: &MigraineReport) {
    println!();
    println!("=== Migraine Diagnosis Example ===");
    println!("Observations:");
    for obs in &report.observations {
        println!("  - {}: {}", obs.concept, obs.relation);
    }
    println!(
        "Reference: {} ({})",
        report.knowledge.concept, report.knowledge.reference_standard
    );
    println!("Process Records:");
    for process in &report.processes {
        println!("  - {}: {}", process.action, process.value);
    }
}

fn print_sharing(report: &SharingReport) {
    println!();
    println!("=== Cross-Hospital Knowledge Sharing Example ===");
    match &report.import {
        Ok(receipt) => {
            println!(
                "Hospital A ({}): Created {}",
                report.source_institution, receipt.concept
            );
            println!(
                "Hospital B ({}): Imported and applied protocol (source: {})",
                report.target_institution, receipt.imported_from
            );
            println!("Application Process:");
            for process in &report.processes {
                println!("  - {}: {}", process.action, process.value);
            }
        }
        Err(e) => println!("❌ Import into {} failed: {}", report.target_institution, e),
    }
}

fn print_serialization(report: &SerializationReport) {
    println!();
    println!("=== CDC JSON Serialization Example ===");
    println!("{}", report.json);
    println!();
    println!(
        "Deserialized: {} observations, {} knowledge, {} processes",
        report.observations, report.knowledge, report.processes
    );
}

fn show_config(config: Option<&CdcConfig>) -> Result<()> {
    let config = config.cloned().unwrap_or_default();
    let toml = toml::to_string_pretty(&config)?;
    println!("{}", toml);
    Ok(())
}
