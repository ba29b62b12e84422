use clap::{Parser, Subcommand};
use dosetrack_core::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dosetrack")]
#[command(about = "Personal dose tracker with injection-site rotation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a dose
    Log {
        /// Compound name
        #[arg(long)]
        compound: String,

        /// Dose amount
        #[arg(long)]
        amount: f64,

        /// Dose unit (defaults to config)
        #[arg(long)]
        unit: Option<String>,

        /// Injection modality: intramuscular (im) or subcutaneous (subq)
        #[arg(long)]
        modality: Option<String>,

        /// Injection site id (see `dosetrack sites`); omit for non-injected doses
        #[arg(long)]
        site: Option<String>,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Show the recommended next injection site
    Next {
        /// Injection modality: intramuscular (im) or subcutaneous (subq)
        #[arg(long)]
        modality: Option<String>,
    },

    /// List available and blocked sites for a modality
    Sites {
        /// Injection modality: intramuscular (im) or subcutaneous (subq)
        #[arg(long)]
        modality: Option<String>,
    },

    /// Show the rotation-quality report
    Quality {
        /// Injection modality: intramuscular (im) or subcutaneous (subq)
        #[arg(long)]
        modality: Option<String>,
    },

    /// Roll up WAL doses to CSV
    Rollup {
        /// Clean up processed WAL files after rollup
        #[arg(long)]
        cleanup: bool,
    },
}

struct Paths {
    wal_dir: PathBuf,
    wal: PathBuf,
    csv: PathBuf,
}

impl Paths {
    fn new(data_dir: &PathBuf) -> Self {
        let wal_dir = data_dir.join("wal");
        Self {
            wal: wal_dir.join("doses.wal"),
            csv: data_dir.join("doses.csv"),
            wal_dir,
        }
    }
}

fn main() -> Result<()> {
    dosetrack_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());

    let errors = catalog::validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::Catalog("Invalid catalog".into()));
    }

    match cli.command {
        Commands::Log {
            compound,
            amount,
            unit,
            modality,
            site,
            notes,
        } => cmd_log(data_dir, &config, compound, amount, unit, modality, site, notes),
        Commands::Next { modality } => cmd_next(data_dir, &config, modality),
        Commands::Sites { modality } => cmd_sites(data_dir, &config, modality),
        Commands::Quality { modality } => cmd_quality(data_dir, &config, modality),
        Commands::Rollup { cleanup } => cmd_rollup(data_dir, cleanup),
    }
}

/// Resolve a modality from a CLI flag, falling back to the configured default.
fn resolve_modality(flag: Option<String>, config: &Config) -> Result<Modality> {
    let name = flag.unwrap_or_else(|| config.dosing.default_modality.clone());
    match name.to_lowercase().as_str() {
        "intramuscular" | "im" => Ok(Modality::Intramuscular),
        "subcutaneous" | "subq" | "sq" => Ok(Modality::Subcutaneous),
        other => Err(Error::Config(format!(
            "Unknown modality '{}' (expected intramuscular/im or subcutaneous/subq)",
            other
        ))),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_log(
    data_dir: PathBuf,
    config: &Config,
    compound: String,
    amount: f64,
    unit: Option<String>,
    modality: Option<String>,
    site: Option<String>,
    notes: Option<String>,
) -> Result<()> {
    let paths = Paths::new(&data_dir);
    std::fs::create_dir_all(&paths.wal_dir)?;

    let modality = resolve_modality(modality, config)?;
    let now = chrono::Utc::now();

    // A chosen site must exist in the modality's catalog; warn if it is
    // still inside its recovery window, but never block the user.
    if let Some(ref site_id) = site {
        let Some(known) = site_by_id(modality, site_id) else {
            eprintln!("Unknown site '{}' for {:?}.", site_id, modality);
            eprintln!("Run `dosetrack sites` to list valid site ids.");
            return Err(Error::Config(format!("Unknown site: {}", site_id)));
        };

        let events =
            load_recent_events(&paths.wal, &paths.csv, modality, RECOMMENDATION_LOOKBACK)?;
        let decision = check_interval(known.id, modality, &events, now);
        if !decision.allowed {
            println!(
                "⚠ {} was used recently; recommended wait: {}",
                known.display_name,
                decision.wait_text.as_deref().unwrap_or("unknown")
            );
        }
    }

    let dose = DoseRecord {
        id: uuid::Uuid::new_v4(),
        compound,
        amount,
        unit: unit.unwrap_or_else(|| config.dosing.default_unit.clone()),
        modality,
        site,
        injected_at: now,
        notes,
    };

    let mut sink = JsonlSink::new(&paths.wal);
    sink.append(&dose)?;

    println!(
        "✓ Logged {} {} of {}",
        dose.amount, dose.unit, dose.compound
    );
    if let Some(ref site_id) = dose.site {
        if let Some(site) = site_by_id(modality, site_id) {
            println!("  Site: {}", site.display_name);
        }

        // Show where the next one should go
        let events =
            load_recent_events(&paths.wal, &paths.csv, modality, RECOMMENDATION_LOOKBACK)?;
        let next = recommend_next(modality, &events, now);
        if let Some(next_site) = site_by_id(modality, next) {
            println!("  Next time: {}", next_site.display_name);
        }
    }

    Ok(())
}

fn cmd_next(data_dir: PathBuf, config: &Config, modality: Option<String>) -> Result<()> {
    let paths = Paths::new(&data_dir);
    let modality = resolve_modality(modality, config)?;
    let now = chrono::Utc::now();

    let events = load_recent_events(&paths.wal, &paths.csv, modality, RECOMMENDATION_LOOKBACK)?;
    let id = recommend_next(modality, &events, now);
    let site = site_by_id(modality, id).unwrap_or_else(|| default_site(modality));

    println!("Recommended next site ({:?}):", modality);
    println!("  {} [{}]", site.display_name, site.id);

    let decision = check_interval(site.id, modality, &events, now);
    if decision.allowed {
        println!("  Ready now.");
    } else {
        // Only possible when every site is inside its recovery window
        println!(
            "  Still recovering; wait {}",
            decision.wait_text.as_deref().unwrap_or("a while")
        );
    }

    Ok(())
}

fn cmd_sites(data_dir: PathBuf, config: &Config, modality: Option<String>) -> Result<()> {
    let paths = Paths::new(&data_dir);
    let modality = resolve_modality(modality, config)?;
    let now = chrono::Utc::now();

    let events = load_recent_events(&paths.wal, &paths.csv, modality, RECOMMENDATION_LOOKBACK)?;

    let available = available_sites(modality, &events, now);
    let blocked = blocked_sites(modality, &events, now);

    println!("Available sites ({:?}):", modality);
    if available.is_empty() {
        println!("  (none - everything is recovering)");
    }
    for site in available {
        println!("  {} [{}]", site.display_name, site.id);
    }

    if !blocked.is_empty() {
        println!("\nBlocked sites (soonest first):");
        for (site, hours) in blocked {
            println!("  {} [{}] - {}h remaining", site.display_name, site.id, hours);
        }
    }

    Ok(())
}

fn cmd_quality(data_dir: PathBuf, config: &Config, modality: Option<String>) -> Result<()> {
    let paths = Paths::new(&data_dir);
    let modality = resolve_modality(modality, config)?;

    let events = load_recent_events(&paths.wal, &paths.csv, modality, STATISTICS_LOOKBACK)?;
    let result = score_rotation(modality, &events);

    println!("Rotation quality ({:?}):", modality);

    if result.rating == QualityRating::Insufficient {
        println!(
            "  Not enough history yet - log at least {} injections to get a score.",
            MIN_HISTORY_FOR_SCORING
        );
        return Ok(());
    }

    println!("  Score: {}/100 ({:?})", result.score, result.rating);
    println!();
    for factor in &result.factors {
        println!(
            "  {:<24} {:>5.1}  (weight {:.2})",
            factor.name, factor.score, factor.weight
        );
        println!("    {}", factor.feedback);
    }

    Ok(())
}

fn cmd_rollup(data_dir: PathBuf, cleanup: bool) -> Result<()> {
    let paths = Paths::new(&data_dir);

    if !paths.wal.exists() {
        println!("No WAL file found - nothing to roll up.");
        return Ok(());
    }

    let count = dosetrack_core::csv_rollup::wal_to_csv_and_archive(&paths.wal, &paths.csv)?;

    println!("✓ Rolled up {} doses to CSV", count);
    println!("  CSV: {}", paths.csv.display());

    if cleanup {
        let cleaned = dosetrack_core::csv_rollup::cleanup_processed_wals(&paths.wal_dir)?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed WAL files", cleaned);
        }
    }

    Ok(())
}
