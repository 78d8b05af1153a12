//! Lighthouse Driver
//!
//! Loads pre-parsed translation units, optionally dumps them, and runs the
//! enabled checkers over every call site.

use anyhow::{Context, Result};
use clap::Parser;
use lh_analysis::{AnalysisConfig, AnalysisRun, CheckerCatalog, CheckerRegistry};
use lh_common::DiagnosticSink;
use lh_ir::{Function, Unit};
use log::{debug, error};
use std::fmt::{self, Write as _};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "lighthouse", version, about = "Call-site checker for pre-parsed C/C++ units")]
struct Cli {
    /// Unit documents (JSON) to analyse
    #[arg(required = true)]
    documents: Vec<PathBuf>,

    /// Site-wide checker manifest (defaults to <exe dir>/analysers/checkers.json)
    #[arg(long, value_name = "FILE")]
    site_manifest: Option<PathBuf>,

    /// Per-user checker manifest (defaults to $HOME/.lh/checkers.json)
    #[arg(long, value_name = "FILE")]
    user_manifest: Option<PathBuf>,

    /// Enable a checker by name, in addition to the manifests
    #[arg(short, long = "checker", value_name = "NAME")]
    checkers: Vec<String>,

    /// Print each unit's functions with their complexity
    #[arg(long)]
    dump: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn analysis_config(&self) -> AnalysisConfig {
        let mut config = AnalysisConfig::with_default_locations();
        if let Some(path) = &self.site_manifest {
            config.site_manifest = Some(path.clone());
        }
        if let Some(path) = &self.user_manifest {
            config.user_manifest = Some(path.clone());
        }
        config.extra_checkers = self.checkers.clone();
        config
    }
}

/// What a run saw, for the exit status
#[derive(Debug, Default, PartialEq, Eq)]
struct Outcome {
    analysed: usize,
    failed_loads: usize,
    errors: usize,
    warnings: usize,
    faulted: bool,
}

impl Outcome {
    fn success(&self) -> bool {
        self.failed_loads == 0 && self.errors == 0 && !self.faulted
    }
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    match run(&cli) {
        Ok(outcome) if outcome.success() => {}
        Ok(_) => std::process::exit(1),
        Err(e) => {
            eprintln!("lighthouse: {e:#}");
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<Outcome> {
    let config = cli.analysis_config();
    let registry = CheckerRegistry::from_config(&config, &CheckerCatalog::builtin()).context("loading checkers")?;
    debug!("enabled checkers: {:?}", registry.names());

    let mut analysis = AnalysisRun::new(registry);
    let mut outcome = Outcome::default();

    for path in &cli.documents {
        let unit = match load_unit(path) {
            Ok(unit) => unit,
            Err(e) => {
                eprintln!("lighthouse: {e:#}");
                outcome.failed_loads += 1;
                continue;
            }
        };

        if cli.dump {
            print!("{}", dump_unit(&unit).context("dumping unit")?);
        }

        if let Err(e) = analysis.analyse(&unit) {
            error!("{e}");
            outcome.faulted = true;
            break;
        }
        outcome.analysed += 1;
    }

    report(analysis.diagnostics(), &mut outcome);
    Ok(outcome)
}

/// Print everything collected and fold the counts into `outcome`
fn report(diagnostics: &DiagnosticSink, outcome: &mut Outcome) {
    diagnostics.print_diagnostics();
    if !diagnostics.diagnostics().is_empty() {
        eprintln!("{}", diagnostics.summary());
    }
    outcome.errors = diagnostics.error_count();
    outcome.warnings = diagnostics.warning_count();
}

fn load_unit(path: &Path) -> Result<Unit> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let unit = Unit::from_json(&text).with_context(|| format!("loading {}", path.display()))?;
    debug!("loaded {} with {} functions", unit.filename(), unit.functions().len());
    Ok(unit)
}

/// Every function in C-like form, each headed by its complexity
fn dump_unit(unit: &Unit) -> Result<String, fmt::Error> {
    let mut out = String::new();
    for function in unit.functions() {
        write_function(&mut out, function)?;
    }
    Ok(out)
}

fn write_function(out: &mut String, function: &Function) -> fmt::Result {
    write!(out, "// {}: complexity {}", function.name, function.cyclomatic_complexity())?;
    if let Some(ratio) = function.complexity_raw_lines() {
        write!(out, ", {ratio:.2} per body line")?;
    }
    if let Some(ratio) = function.complexity_source_lines() {
        write!(out, ", {ratio:.2} per source line")?;
    }
    writeln!(out)?;
    writeln!(out, "{function}")
}
