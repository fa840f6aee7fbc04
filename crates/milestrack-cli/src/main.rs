//! milestrack CLI - Milestone dependency status
//!
//! Command-line interface for checking, summarizing and charting a
//! milestone dependency feed.
//!
//! ## Exit Codes
//!
//! | Exit Code | Meaning |
//! |-----------|---------|
//! | 0 | Success (ordering warnings allowed) |
//! | 1 | Failure: bad input, or warnings under `check --strict` |

mod input;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use milestrack_core::{Config, DependencyEdge, MilestoneKey, Renderer};
use milestrack_render::{
    overlay_today_line, render_project_status, render_summary, render_violations,
    ChartDataRenderer, LineStyle, MermaidRenderer, SvgChart, TimelineSvgRenderer,
};
use milestrack_status::{analyze, DependencyGraph, StatusClassifier};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::input::{load_config, load_feed, FeedFormat};

#[derive(Parser)]
#[command(name = "milestrack")]
#[command(author, version, about = "Milestone dependency status and timelines", long_about = None)]
struct Cli {
    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (defaults to ./milestrack.toml when present)
    #[arg(short, long, global = true, env = "MILESTRACK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FeedArgs {
    /// Dependency feed (CSV or JSON)
    #[arg(value_name = "FEED")]
    feed: PathBuf,

    /// Feed format (detected from the extension if not given)
    #[arg(long, value_enum)]
    input_format: Option<FeedFormat>,
}

impl FeedArgs {
    fn load(&self) -> Result<Vec<DependencyEdge>> {
        load_feed(&self.feed, self.input_format)
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ChartFormat {
    Json,
    Svg,
    Mermaid,
}

#[derive(Subcommand)]
enum Commands {
    /// Report successors that start before their predecessor finishes
    Check {
        #[command(flatten)]
        feed: FeedArgs,

        /// Exit 1 when any ordering warning is found
        #[arg(long)]
        strict: bool,
    },

    /// Green / yellow / red dependency margins
    Summary {
        #[command(flatten)]
        feed: FeedArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: ReportFormat,
    },

    /// Per-project schedule status
    Status {
        #[command(flatten)]
        feed: FeedArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: ReportFormat,
    },

    /// Timeline chart data or rendering
    Gantt {
        #[command(flatten)]
        feed: FeedArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: ChartFormat,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Date used for progress and the today line (defaults to the local date)
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Draw the today line on an externally rendered SVG chart
    Overlay {
        /// Rendered chart
        #[arg(value_name = "CHART")]
        chart: PathBuf,

        #[command(flatten)]
        feed: FeedArgs,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Date of the line (defaults to the local date)
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Milestones affected downstream of one milestone
    Impacts {
        #[command(flatten)]
        feed: FeedArgs,

        /// Project of the milestone
        #[arg(long)]
        project: String,

        /// Milestone name
        #[arg(long)]
        milestone: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: ReportFormat,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Check { feed, strict } => cmd_check(&feed, &config, strict),
        Commands::Summary { feed, format } => cmd_summary(&feed, &config, format),
        Commands::Status { feed, format } => cmd_status(&feed, &config, format),
        Commands::Gantt {
            feed,
            format,
            output,
            today,
        } => cmd_gantt(&feed, &config, format, output.as_deref(), resolve_today(today)),
        Commands::Overlay {
            chart,
            feed,
            output,
            today,
        } => cmd_overlay(&chart, &feed, &config, output.as_deref(), resolve_today(today)),
        Commands::Impacts {
            feed,
            project,
            milestone,
            format,
        } => cmd_impacts(&feed, MilestoneKey::new(project, milestone), format),
    }
}

/// Logs go to stderr. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn resolve_today(today: Option<NaiveDate>) -> NaiveDate {
    today.unwrap_or_else(|| chrono::Local::now().date_naive())
}

/// Write to `path`, or stdout
fn emit(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "wrote output");
        }
        None => {
            print!("{}", content);
            if !content.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize JSON")
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_check(feed: &FeedArgs, config: &Config, strict: bool) -> Result<ExitCode> {
    let edges = feed.load()?;
    let classifier = StatusClassifier::from_config(&config.status);
    let violations = classifier.ordering_violations(&edges);

    print!("{}", render_violations(&violations, classifier.resolution));
    println!(
        "{} ordering warning(s) in {} dependencies",
        violations.len(),
        edges.len()
    );

    if strict && !violations.is_empty() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_summary(feed: &FeedArgs, config: &Config, format: ReportFormat) -> Result<ExitCode> {
    let edges = feed.load()?;
    let report = analyze(&edges, config, resolve_today(None));
    let summary = report.summary();

    let output = match format {
        ReportFormat::Text => render_summary(&summary),
        ReportFormat::Json => to_json(&summary)?,
    };
    emit(None, &output)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_status(feed: &FeedArgs, config: &Config, format: ReportFormat) -> Result<ExitCode> {
    let edges = feed.load()?;
    let report = analyze(&edges, config, resolve_today(None));

    let output = match format {
        ReportFormat::Text => render_project_status(&report.projects),
        ReportFormat::Json => to_json(&report.projects)?,
    };
    emit(None, &output)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_gantt(
    feed: &FeedArgs,
    config: &Config,
    format: ChartFormat,
    output: Option<&Path>,
    today: NaiveDate,
) -> Result<ExitCode> {
    let edges = feed.load()?;
    let report = analyze(&edges, config, today);

    let rendered = match format {
        ChartFormat::Json => ChartDataRenderer::new().pretty().render(&report.chart)?,
        ChartFormat::Svg => TimelineSvgRenderer::new()
            .today_style(&config.overlay)
            .with_today(today)
            .render(&report.chart)?,
        ChartFormat::Mermaid => MermaidRenderer::new().render(&report.chart)?,
    };
    emit(output, &rendered)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_overlay(
    chart_path: &Path,
    feed: &FeedArgs,
    config: &Config,
    output: Option<&Path>,
    today: NaiveDate,
) -> Result<ExitCode> {
    let edges = feed.load()?;
    let source = std::fs::read_to_string(chart_path)
        .with_context(|| format!("Failed to read chart {}", chart_path.display()))?;
    let mut chart = SvgChart::parse(&source)
        .with_context(|| format!("Failed to parse chart {}", chart_path.display()))?;

    let outcome = overlay_today_line(
        &mut chart,
        &edges,
        today,
        config.status.resolution(),
        &LineStyle::from(&config.overlay),
    );
    match outcome.x() {
        Some(x) => info!(x, %today, "today line drawn"),
        None => warn!(?outcome, %today, "no today line drawn"),
    }

    emit(output, &chart.to_svg_string())?;
    Ok(ExitCode::SUCCESS)
}

#[derive(Serialize)]
struct ImpactReport<'a> {
    milestone: &'a MilestoneKey,
    downstream: Vec<MilestoneKey>,
    cross_project: usize,
}

fn cmd_impacts(feed: &FeedArgs, key: MilestoneKey, format: ReportFormat) -> Result<ExitCode> {
    let edges = feed.load()?;
    let graph = DependencyGraph::from_edges(&edges);
    if !graph.contains(&key) {
        bail!("Milestone '{}' is not in the feed", key);
    }

    let downstream = graph.downstream(&key);
    let cross_project = downstream
        .iter()
        .filter(|k| k.project != key.project)
        .count();

    let output = match format {
        ReportFormat::Json => to_json(&ImpactReport {
            milestone: &key,
            downstream,
            cross_project,
        })?,
        ReportFormat::Text => {
            let mut out = format!(
                "{} affects {} milestone(s), {} in other projects\n",
                key,
                downstream.len(),
                cross_project
            );
            for affected in &downstream {
                out.push_str(&format!("  {}\n", affected));
            }
            out
        }
    };
    emit(None, &output)?;
    Ok(ExitCode::SUCCESS)
}
