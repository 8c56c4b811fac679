//! competency-rollup CLI: rollup and clustering analytics over a JSON snapshot.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};

use competency_rollup::config::AnalyticsConfig;
use competency_rollup::engine::Engine;
use competency_rollup::export::{HeatmapExport, ProgressExport};
use competency_rollup::graph::analytics;
use competency_rollup::outcome::{AggregateKind, Granularity};
use competency_rollup::rollup::RollupFormula;
use competency_rollup::snapshot::Snapshot;

#[derive(Parser)]
#[command(name = "competency-rollup", version, about = "Competency rollup and clustering analytics")]
struct Cli {
    /// Analytics configuration file (TOML). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Snapshot of one curriculum framework (JSON).
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a clustered heatmap and print it as JSON.
    Heatmap {
        /// Column granularity.
        #[arg(long, value_enum, default_value = "plo")]
        granularity: GranularityArg,

        /// Override the configured heatmap rollup formula.
        #[arg(long, value_enum)]
        formula: Option<FormulaArg>,
    },

    /// Print one student's PI or PLO progress as JSON.
    Progress {
        /// Student id as it appears on the roster.
        #[arg(long)]
        student: String,

        /// Aggregate level to report.
        #[arg(long, value_enum, default_value = "plo")]
        kind: KindArg,

        /// Override the configured progress rollup formula.
        #[arg(long, value_enum)]
        formula: Option<FormulaArg>,
    },

    /// Inspect the link graph.
    Links {
        /// Show the PIs related to this PLO instead of graph statistics.
        #[arg(long)]
        plo: Option<String>,
    },

    /// Print the effective configuration as TOML.
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum GranularityArg {
    Clo,
    Pi,
    Plo,
}

impl From<GranularityArg> for Granularity {
    fn from(arg: GranularityArg) -> Self {
        match arg {
            GranularityArg::Clo => Granularity::Clo,
            GranularityArg::Pi => Granularity::Pi,
            GranularityArg::Plo => Granularity::Plo,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Pi,
    Plo,
}

impl From<KindArg> for AggregateKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Pi => AggregateKind::Pi,
            KindArg::Plo => AggregateKind::Plo,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormulaArg {
    Counting,
    Weighted,
}

impl From<FormulaArg> for RollupFormula {
    fn from(arg: FormulaArg) -> Self {
        match arg {
            FormulaArg::Counting => RollupFormula::Counting,
            FormulaArg::Weighted => RollupFormula::Weighted,
        }
    }
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AnalyticsConfig::load(path)?,
        None => AnalyticsConfig::default(),
    };
    let engine = Engine::new(&config)?;

    match cli.command {
        Commands::Heatmap {
            granularity,
            formula,
        } => {
            let snapshot = load_snapshot(cli.snapshot.as_deref())?;
            let formula = formula.map_or(engine.config().heatmap_formula, Into::into);
            let report = engine.heatmap_with(&snapshot, granularity.into(), formula)?;
            let export = HeatmapExport::from_report(&report)?;
            println!("{}", serde_json::to_string_pretty(&export).into_diagnostic()?);
        }

        Commands::Progress {
            student,
            kind,
            formula,
        } => {
            let snapshot = load_snapshot(cli.snapshot.as_deref())?;
            let formula = formula.map_or(engine.config().progress_formula, Into::into);
            let progress = engine.student_progress_with(&snapshot, &student, kind.into(), formula)?;
            let export = ProgressExport::from(&progress);
            println!("{}", serde_json::to_string_pretty(&export).into_diagnostic()?);
        }

        Commands::Links { plo } => {
            let snapshot = load_snapshot(cli.snapshot.as_deref())?;
            let index = snapshot.link_index();
            match plo {
                Some(code) => {
                    let pis = index.pis_for_plo(&code);
                    if pis.is_empty() {
                        println!("{code}: no related PIs");
                    } else {
                        println!("{code}: {}", pis.join(", "));
                    }
                }
                None => {
                    println!("{}", analytics::stats(&index));
                    println!("\nCLO coverage (fan-out):");
                    for c in analytics::coverage(&index) {
                        println!("  {}: {} (PLO {}, PI {})", c.clo, c.fan_out, c.plos, c.pis);
                    }
                    let engine_view = engine.prepare(&snapshot);
                    let observed = engine_view.facts.clo_keys();
                    let orphans = analytics::orphan_clos(&index, &observed);
                    if !orphans.is_empty() {
                        println!("\nCLOs with achievement data but no links:");
                        for clo in orphans {
                            println!("  {clo}");
                        }
                    }
                }
            }
        }

        Commands::Config => {
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}

fn load_snapshot(path: Option<&Path>) -> Result<Snapshot> {
    let Some(path) = path else {
        miette::bail!("no snapshot given: pass --snapshot <file.json>");
    };
    Ok(Snapshot::load(path)?)
}
