//! condlab CLI: evaluate, replay and edit condition trees.
//!
//! Commands:
//! - `evaluate`: evaluate a tree on candles and print result + trace
//! - `intents`: print the action intents of a passing tree
//! - `plan`: size and round intents into planned orders
//! - `replay`: replay a tree bar by bar from a TOML run config
//! - `batch`: replay several trees over the same candles in parallel
//! - `lookback`: bars of history a tree needs
//! - `normalize`: canonical tree JSON and its fingerprint
//! - `migrate`: convert stored legacy JSON to the current tree
//! - `legacy-view`: flattened legacy export of a tree

mod logging;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};

use condlab_core::algebra::normalize;
use condlab_core::domain::{Candle, OhlcSeries};
use condlab_core::eval::{evaluate_with_trace, EvaluateOptions, EvaluationContext};
use condlab_core::fingerprint::tree_fingerprint;
use condlab_core::intents::{
    build_action_intents, materialize_orders, ActionIntent, MarketConstraints, PlannerOptions, RuntimeAmounts,
};
use condlab_core::model::{migrate_legacy, to_legacy_view, IndicatorConditions};
use condlab_core::signals::{build_numeric_series, required_lookback};
use condlab_runner::config::OutputConfig;
use condlab_runner::{
    export_json, load_candles, load_inputs, replay_many, replay_options, run_replay, write_report,
    LoadOptions, LogFormat, OutputFormat, RunConfig,
};

#[derive(Parser)]
#[command(name = "condlab", about = "condlab CLI: condition-tree trading rules", version)]
struct Cli {
    /// Log output format. Defaults to the run config's `[logging]`, else pretty.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormatArg>,

    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

/// Inputs shared by the evaluation commands. Explicit flags override the
/// matching entries of `--config`.
#[derive(Args)]
struct Inputs {
    /// TOML run config supplying any input not given explicitly.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tree JSON (any stored shape; migrated and normalized on load).
    #[arg(long)]
    tree: Option<PathBuf>,

    /// Candle file (.csv or .json).
    #[arg(long)]
    candles: Option<PathBuf>,

    /// Evaluation context as TOML (symbol, direction, status metrics).
    #[arg(long)]
    context: Option<PathBuf>,

    /// Force an indicator leaf's signal, e.g. `--signal rsi-1=true`. Repeatable.
    #[arg(long = "signal", value_parser = parse_signal)]
    signals: Vec<(String, bool)>,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a tree on the latest candle and print result and trace.
    Evaluate {
        #[command(flatten)]
        inputs: Inputs,
    },
    /// Print the action intents of a passing tree.
    Intents {
        #[command(flatten)]
        inputs: Inputs,
    },
    /// Materialize intents into sized, rounded orders.
    Plan {
        #[command(flatten)]
        inputs: Inputs,

        /// Read intents from this JSON file instead of evaluating the tree.
        #[arg(long)]
        intents: Option<PathBuf>,

        /// Reference price for market orders. Defaults to the last close.
        #[arg(long)]
        last_price: Option<f64>,

        /// Do not raise orders below the minimum notional.
        #[arg(long, default_value_t = false)]
        no_min_notional_fallback: bool,
    },
    /// Replay a tree bar by bar as described by a run config.
    Replay {
        /// Path to a TOML run config.
        #[arg(long)]
        config: PathBuf,

        /// Report file (.csv or .json). Overrides `[replay.output]`.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Replay several trees over the run config's candles in parallel.
    Batch {
        /// Path to a TOML run config (its tree is ignored).
        #[arg(long)]
        config: PathBuf,

        /// Tree files to replay.
        #[arg(required = true)]
        trees: Vec<PathBuf>,

        /// Directory for one JSON report per tree, named by fingerprint.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Print the number of candles a tree needs.
    Lookback {
        #[arg(long)]
        tree: PathBuf,
    },
    /// Print the normalized tree and its fingerprint.
    Normalize {
        #[arg(long)]
        tree: PathBuf,
    },
    /// Convert stored legacy JSON into the current tree shape.
    Migrate {
        #[arg(long)]
        input: PathBuf,

        /// Write here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the flattened legacy export of a tree.
    LegacyView {
        #[arg(long)]
        tree: PathBuf,
    },
}

impl Commands {
    fn config_path(&self) -> Option<&Path> {
        match self {
            Commands::Evaluate { inputs } | Commands::Intents { inputs } | Commands::Plan { inputs, .. } => {
                inputs.config.as_deref()
            }
            Commands::Replay { config, .. } | Commands::Batch { config, .. } => Some(config),
            _ => None,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = cli
        .command
        .config_path()
        .map(|path| RunConfig::load(path).with_context(|| format!("failed to load {}", path.display())))
        .transpose()?;
    let format = cli
        .log_format
        .map(LogFormat::from)
        .or_else(|| config.as_ref().map(|c| c.logging.format))
        .unwrap_or_default();
    let level = logging::level_for(cli.verbose, config.as_ref().map(|c| c.logging.level.as_str()));
    logging::init_logging(format, &level);

    match cli.command {
        Commands::Evaluate { inputs } => run_evaluate(&load_session(&inputs, config.as_ref())?),
        Commands::Intents { inputs } => run_intents(&load_session(&inputs, config.as_ref())?),
        Commands::Plan {
            inputs,
            intents,
            last_price,
            no_min_notional_fallback,
        } => run_plan(
            &load_session(&inputs, config.as_ref())?,
            intents.as_deref(),
            last_price,
            no_min_notional_fallback,
        ),
        Commands::Replay { output, .. } => run_replay_cmd(require(config)?, output),
        Commands::Batch { trees, output_dir, .. } => run_batch(&require(config)?, &trees, output_dir.as_deref()),
        Commands::Lookback { tree } => {
            println!("{}", required_lookback(&read_tree(&tree)?));
            Ok(())
        }
        Commands::Normalize { tree } => run_normalize(&tree),
        Commands::Migrate { input, output } => run_migrate(&input, output.as_deref()),
        Commands::LegacyView { tree } => print_json(&to_legacy_view(&read_tree(&tree)?)),
    }
}

fn require(config: Option<RunConfig>) -> Result<RunConfig> {
    config.context("a run config is required")
}

// ─── Inputs ─────────────────────────────────────────────────────────

/// Everything the evaluation commands need, resolved from flags and config.
struct Session {
    tree: IndicatorConditions,
    candles: Vec<Candle>,
    context: EvaluationContext,
    signals: HashMap<String, bool>,
    market: MarketConstraints,
    runtime: RuntimeAmounts,
    planner: PlannerOptions,
}

impl Session {
    fn history(&self) -> OhlcSeries {
        OhlcSeries::from_candles(&self.candles)
    }

    fn context(&self) -> EvaluationContext {
        self.context.clone().with_candles(&self.candles)
    }
}

fn load_session(inputs: &Inputs, config: Option<&RunConfig>) -> Result<Session> {
    let tree = match (&inputs.tree, config) {
        (Some(path), _) => read_tree(path)?,
        (None, Some(config)) => config.load_tree()?,
        (None, None) => bail!("--tree or --config is required"),
    };
    let candles = match (&inputs.candles, config) {
        (Some(path), _) => load_candles(path, &LoadOptions::default())
            .with_context(|| format!("failed to load candles from {}", path.display()))?,
        (None, Some(config)) => load_candles(&config.data.path, &config.load_options())?,
        (None, None) => Vec::new(),
    };
    let context = match (&inputs.context, config) {
        (Some(path), _) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
            toml::from_str(&text).with_context(|| format!("invalid context in {}", path.display()))?
        }
        (None, Some(config)) => config.context.clone(),
        (None, None) => EvaluationContext::default(),
    };
    let mut signals = config.map(RunConfig::signal_overrides).unwrap_or_default();
    signals.extend(inputs.signals.iter().cloned());
    debug!(candles = candles.len(), signals = signals.len(), "inputs loaded");

    Ok(Session {
        tree,
        candles,
        context,
        signals,
        market: config.map(|c| c.market).unwrap_or_default(),
        runtime: config.map(|c| c.runtime).unwrap_or_default(),
        planner: config.map(|c| c.planner).unwrap_or_default(),
    })
}

fn read_tree(path: &Path) -> Result<IndicatorConditions> {
    let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    migrate_legacy(&text).with_context(|| format!("invalid tree JSON in {}", path.display()))
}

fn parse_signal(raw: &str) -> std::result::Result<(String, bool), String> {
    let (id, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ID=true|false, got '{raw}'"))?;
    let value = value
        .parse::<bool>()
        .map_err(|_| format!("expected true or false after '=', got '{value}'"))?;
    Ok((id.to_string(), value))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ─── Evaluation commands ────────────────────────────────────────────

fn options<'a>(session: &'a Session, history: &'a OhlcSeries) -> EvaluateOptions<'a> {
    let opts = EvaluateOptions::default().with_history(history);
    if session.signals.is_empty() {
        opts
    } else {
        opts.with_signals(&session.signals)
    }
}

fn run_evaluate(session: &Session) -> Result<()> {
    let history = session.history();
    let result = evaluate_with_trace(&session.tree, &session.context(), options(session, &history));
    info!(result = result.result, nodes = result.trace.len(), "evaluated");
    print_json(&result)
}

fn compute_intents(session: &Session) -> Vec<ActionIntent> {
    let history = session.history();
    let series = build_numeric_series(&session.tree, &history);
    build_action_intents(&session.tree, &session.context(), options(session, &history), &series, None)
}

fn run_intents(session: &Session) -> Result<()> {
    let intents = compute_intents(session);
    info!(count = intents.len(), "intents built");
    print_json(&intents)
}

fn run_plan(
    session: &Session,
    intents_path: Option<&Path>,
    last_price: Option<f64>,
    no_min_notional_fallback: bool,
) -> Result<()> {
    let intents: Vec<ActionIntent> = match intents_path {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("invalid intents JSON in {}", path.display()))?
        }
        None => compute_intents(session),
    };
    let last_price = last_price.or_else(|| session.candles.last().map(|c| c.close));
    let mut planner = session.planner;
    if no_min_notional_fallback {
        planner.use_min_notional_fallback = false;
    }
    let orders = materialize_orders(&intents, &session.market, last_price, &session.runtime, planner);
    info!(intents = intents.len(), orders = orders.len(), "orders planned");
    print_json(&orders)
}

// ─── Replay commands ────────────────────────────────────────────────

fn run_replay_cmd(mut config: RunConfig, output: Option<PathBuf>) -> Result<()> {
    let to_stdout = output.is_none() && config.replay.output.is_none();
    if let Some(path) = output {
        config.replay.output = Some(OutputConfig { path, format: None });
    }
    let run = run_replay(&config)?;
    let report = &run.report;
    if to_stdout {
        println!("{}", export_json(report)?);
    }
    eprintln!(
        "run {} | tree {} | {} bars, start {} | passed {}/{}",
        &run.run_id[..run.run_id.len().min(12)],
        report.fingerprint.short(12),
        report.bars,
        report.start,
        report.pass_count(),
        report.records.len()
    );
    Ok(())
}

fn run_batch(config: &RunConfig, tree_paths: &[PathBuf], output_dir: Option<&Path>) -> Result<()> {
    let trees = tree_paths.iter().map(|p| read_tree(p)).collect::<Result<Vec<_>>>()?;
    let (_, candles) = load_inputs(config)?;
    let reports = replay_many(&trees, &candles, &config.context, &replay_options(config));

    for (path, report) in tree_paths.iter().zip(&reports) {
        println!(
            "{}\t{}\t{}/{}",
            report.fingerprint.short(12),
            path.display(),
            report.pass_count(),
            report.records.len()
        );
        if let Some(dir) = output_dir {
            let file = dir.join(format!("{}.json", report.fingerprint.short(16)));
            write_report(report, &file, Some(OutputFormat::Json))?;
        }
    }
    Ok(())
}

// ─── Tree commands ──────────────────────────────────────────────────

fn run_normalize(path: &Path) -> Result<()> {
    let normalized = normalize(&read_tree(path)?);
    let fingerprint = tree_fingerprint(&normalized);
    print_json(&serde_json::json!({
        "fingerprint": fingerprint,
        "tree": normalized,
    }))
}

fn run_migrate(input: &Path, output: Option<&Path>) -> Result<()> {
    let tree = read_tree(input)?;
    let json = tree.to_json_pretty()?;
    match output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "migrated tree written");
        }
        None => println!("{json}"),
    }
    Ok(())
}
