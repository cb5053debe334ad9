//! Phase Simulation CLI
//!
//! - `phase_sim catalog`
//! - `phase_sim transform <input.json> <output.json> <wave> <YYYY-MM-DD> <company> <CODES,..>`
//! - `phase_sim journey <input.json> <output_dir> <company>`

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use tracing::{info, warn};

use phase_sim::catalog::InterventionCatalog;
use phase_sim::config::EngineConfig;
use phase_sim::journey::{Journey, PhasePlan};
use phase_sim::store::DatasetStore;
use phase_sim::summary::PhaseSummary;
use phase_sim::transformer::{PhaseRequest, PhaseTransformer};
use phase_sim::validator::{validate, ValidationReport};

// ──────────────────────────────────────────────────────────────────────────────
// CONFIGURATION
// ──────────────────────────────────────────────────────────────────────────────

/// Runtime settings taken from the environment
struct SimConfig {
    /// Catalog YAML; the shipped catalog when unset
    catalog_file: Option<String>,
    /// Engine YAML; built-in defaults when unset
    engine_file: Option<String>,
    /// Fixed seed for reproducible runs
    seed: Option<u64>,
}

impl SimConfig {
    fn from_env() -> Result<Self> {
        let seed = match std::env::var("PHASE_SIM_SEED") {
            Ok(raw) => Some(raw.trim().parse::<u64>().context("PHASE_SIM_SEED must be an unsigned integer")?),
            Err(_) => None,
        };
        Ok(Self {
            catalog_file: std::env::var("PHASE_SIM_CATALOG").ok(),
            engine_file: std::env::var("PHASE_SIM_CONFIG").ok(),
            seed,
        })
    }

    async fn catalog(&self) -> Result<InterventionCatalog> {
        match &self.catalog_file {
            Some(path) => InterventionCatalog::load(path)
                .await
                .with_context(|| format!("Failed to load intervention catalog from {}", path)),
            None => InterventionCatalog::standard().context("Failed to load the shipped intervention catalog"),
        }
    }

    async fn engine(&self) -> Result<EngineConfig> {
        match &self.engine_file {
            Some(path) => EngineConfig::load(path)
                .await
                .with_context(|| format!("Failed to load engine config from {}", path)),
            None => Ok(EngineConfig::default()),
        }
    }

    fn seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// MAIN ENTRY POINT
// ──────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("phase_sim=info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let settings = SimConfig::from_env()?;

    match args.first().map(String::as_str) {
        Some("catalog") => run_catalog(&settings).await,
        Some("transform") => run_transform(&settings, &args[1..]).await,
        Some("journey") => run_journey(&settings, &args[1..]).await,
        _ => {
            print_usage();
            bail!("expected a subcommand: catalog | transform | journey");
        }
    }
}

fn print_usage() {
    println!("Usage:");
    println!("  phase_sim catalog");
    println!("  phase_sim transform <input.json> <output.json> <wave> <YYYY-MM-DD> <company> <CODES,..>");
    println!("  phase_sim journey <input.json> <output_dir> <company>");
}

fn banner(title: &str) {
    println!("\n{}", "═".repeat(60));
    println!("{}", title);
    println!("{}", "═".repeat(60));
}

// ──────────────────────────────────────────────────────────────────────────────
// SUBCOMMANDS
// ──────────────────────────────────────────────────────────────────────────────

async fn run_catalog(settings: &SimConfig) -> Result<()> {
    let catalog = settings.catalog().await?;
    banner(&format!("Intervention Catalog ({} entries)", catalog.len()));

    for intervention in catalog.iter() {
        let cells: Vec<String> = intervention.targets.cells.iter().map(|c| c.to_string()).collect();
        let dims: Vec<String> = intervention.targets.dimensions.iter().map(|d| d.id().to_string()).collect();
        println!(
            "{:<4} {:<12} {}",
            intervention.code,
            intervention.category.to_string(),
            intervention.name
        );
        println!(
            "     cells [{}]  dimensions [{}]  sentiment {:+.2}  capability {:+.2}",
            cells.join(", "),
            dims.join(", "),
            intervention.impact.sentiment_delta,
            intervention.impact.capability_delta
        );
        if !intervention.prerequisites.is_empty() {
            println!("     requires {}", intervention.prerequisites.join(", "));
        }
    }
    Ok(())
}

async fn run_transform(settings: &SimConfig, args: &[String]) -> Result<()> {
    let [input, output, wave, date, company, codes] = args else {
        print_usage();
        bail!("transform expects 6 arguments, got {}", args.len());
    };

    let catalog = settings.catalog().await?;
    let config = settings.engine().await?;
    let assessment_date = parse_date(date)?;
    let applied: Vec<String> = codes
        .split(',')
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();

    let baseline = DatasetStore::new(input)
        .load()
        .await
        .with_context(|| format!("Failed to load source dataset {}", input))?;

    let none: [&str; 0] = [];
    for unmet in catalog.unmet_prerequisites(&applied, &none)? {
        warn!("'{}' applied without prerequisite(s) {}", unmet.code, unmet.missing.join(", "));
    }

    let seed = settings.seed();
    info!("Using seed {}", seed);
    let request = PhaseRequest::new(wave.as_str(), assessment_date, company.as_str(), applied);
    let dataset = PhaseTransformer::new(&catalog, &config)
        .transform_parallel(&baseline, &request, seed)
        .context("Phase transformation failed")?;

    DatasetStore::new(output).save(&dataset).await?;

    banner(&format!("Wave '{}' ({} records)", dataset.wave_label, dataset.len()));
    print_report(&validate(&dataset.records, &config));
    print_delta(&PhaseSummary::from_records(&baseline), &PhaseSummary::from_records(&dataset.records));
    Ok(())
}

async fn run_journey(settings: &SimConfig, args: &[String]) -> Result<()> {
    let [input, output_dir, company] = args else {
        print_usage();
        bail!("journey expects 3 arguments, got {}", args.len());
    };

    let catalog = settings.catalog().await?;
    let config = settings.engine().await?;
    let baseline = DatasetStore::new(input)
        .load()
        .await
        .with_context(|| format!("Failed to load baseline dataset {}", input))?;

    let seed = settings.seed();
    info!("Using seed {}", seed);
    let mut rng = StdRng::seed_from_u64(seed);
    let plans = PhasePlan::standard_journey()?;
    let steps = Journey::new(&catalog, &config, company.as_str())
        .run(&baseline, &plans, &mut rng)
        .context("Journey failed")?;

    let mut previous = PhaseSummary::from_records(&baseline);
    for step in &steps {
        let path = Path::new(output_dir).join(format!("{}.json", step.dataset.wave_label));
        DatasetStore::new(&path).save(&step.dataset).await?;

        banner(&format!(
            "Wave '{}' [{}] -> {}",
            step.dataset.wave_label,
            step.dataset.applied_interventions.join(", "),
            path.display()
        ));
        for unmet in &step.unmet_prerequisites {
            println!("⚠️  {} applied without {}", unmet.code, unmet.missing.join(", "));
        }
        print_report(&validate(&step.dataset.records, &config));
        print_delta(&previous, &step.summary);
        previous = step.summary.clone();
    }
    Ok(())
}

// ──────────────────────────────────────────────────────────────────────────────
// OUTPUT
// ──────────────────────────────────────────────────────────────────────────────

fn parse_date(raw: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").with_context(|| format!("Invalid date '{}'", raw))?;
    Ok(date.and_time(NaiveTime::MIN).and_utc())
}

fn print_report(report: &ValidationReport) {
    if report.valid {
        println!("✅ Validation passed");
        return;
    }
    println!("⚠️  Validation reported {} problem(s)", report.errors.len());
    for error in report.errors.iter().take(20) {
        warn!("{}", error);
    }
    if report.errors.len() > 20 {
        println!("   ... and {} more", report.errors.len() - 20);
    }
}

fn print_delta(before: &PhaseSummary, after: &PhaseSummary) {
    let delta = before.delta(after);
    println!(
        "Sentiment mean {:.3} -> {:.3} ({:+.3}), std dev {:.3}",
        before.sentiment_mean, after.sentiment_mean, delta.sentiment_change, after.sentiment_std_dev
    );
    println!(
        "Capability mean {:.3} -> {:.3} ({:+.3})",
        before.capability_mean, after.capability_mean, delta.capability_change
    );
    println!("Most improved cells:");
    for (cell, change) in delta.most_improved_cells(5) {
        println!("  {:<6} {:+.3}  ({} / {})", cell.to_string(), change, cell.level_name(), cell.category_name());
    }
}
