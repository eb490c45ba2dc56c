//! CLI binary for tablecast.
//!
//! A thin shim over the library crate that maps subcommands onto the
//! negotiation workflow and renders session state to the terminal.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tablecast::{
    workflow, ClientConfig, DisplayLabel, HttpTypeService, Preview, SessionState, StatusKind,
};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Preview the first rows of a file (no server needed)
  tablecast preview people.csv

  # Upload for type inference and print the proposed labels
  tablecast infer people.csv --server http://127.0.0.1:8000

  # Override two columns and request server-side conversion
  tablecast convert people.csv --set age=Float --set active=True/False

  # Structured output for scripting
  tablecast infer people.xlsx --json

DISPLAY LABELS:
  Text, Date, Integer, Float, Category, True/False, Complex, Duration

ENVIRONMENT VARIABLES:
  TABLECAST_SERVER   Base URL of the inference service (default http://127.0.0.1:8000)
  TABLECAST_TIMEOUT  Request timeout in seconds (default 30)
"#;

/// Preview tabular files and negotiate column types with an inference service.
#[derive(Parser, Debug)]
#[command(
    name = "tablecast",
    version,
    about = "Preview CSV/Excel files and negotiate per-column data types",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Base URL of the inference service.
    #[arg(
        long,
        global = true,
        env = "TABLECAST_SERVER",
        default_value = "http://127.0.0.1:8000"
    )]
    server: String,

    /// Request timeout in seconds.
    #[arg(long, global = true, env = "TABLECAST_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Output the final session state as JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a file locally and print its leading rows.
    Preview {
        /// CSV or Excel file.
        input: PathBuf,
    },
    /// Upload a file for type inference and print the proposed labels.
    Infer {
        /// CSV or Excel file.
        input: PathBuf,
    },
    /// Infer, apply label overrides, and request server-side conversion.
    Convert {
        /// CSV or Excel file.
        input: PathBuf,
        /// Column override as COLUMN=LABEL (repeatable).
        #[arg(long = "set", value_name = "COLUMN=LABEL", required = true)]
        set: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Library info logs would interleave with the rendered output, so they
    // stay off unless explicitly requested.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    let config = ClientConfig::builder()
        .base_url(cli.server.clone())
        .timeout_secs(cli.timeout)
        .build()
        .context("Invalid configuration")?;

    match cli.command {
        Command::Preview { ref input } => run_preview(&cli, input),
        Command::Infer { ref input } => run_infer(&cli, input, config).await,
        Command::Convert { ref input, ref set } => run_convert(&cli, input, set, config).await,
    }
}

// ── Subcommands ──────────────────────────────────────────────────────────────

fn run_preview(cli: &Cli, input: &PathBuf) -> Result<()> {
    let state = workflow::select_path(SessionState::new(), input)
        .with_context(|| format!("Failed to read '{}'", input.display()))?;

    finish(cli, &state, |state| {
        render_preview(state.preview());
    })
}

async fn run_infer(cli: &Cli, input: &PathBuf, config: ClientConfig) -> Result<()> {
    let service = HttpTypeService::new(config).context("Failed to build HTTP client")?;

    let state = workflow::select_path(SessionState::new(), input)
        .with_context(|| format!("Failed to read '{}'", input.display()))?;
    bail_on_error_status(cli, &state)?;

    let spin = spinner(cli, "Uploading for inference…");
    let state = workflow::upload(state, &service).await;
    spin.finish_and_clear();

    finish(cli, &state, |state| {
        render_preview(state.preview());
        render_types(state);
    })
}

async fn run_convert(
    cli: &Cli,
    input: &PathBuf,
    set: &[String],
    config: ClientConfig,
) -> Result<()> {
    let overrides = set
        .iter()
        .map(|s| parse_override(s))
        .collect::<Result<Vec<_>>>()?;

    let service = HttpTypeService::new(config).context("Failed to build HTTP client")?;

    let state = workflow::select_path(SessionState::new(), input)
        .with_context(|| format!("Failed to read '{}'", input.display()))?;
    bail_on_error_status(cli, &state)?;

    let spin = spinner(cli, "Uploading for inference…");
    let mut state = workflow::upload(state, &service).await;
    spin.finish_and_clear();
    bail_on_error_status(cli, &state)?;

    for (column, label) in overrides {
        if !state.current_types().contains_key(&column) {
            eprintln!(
                "{} no column named '{}' was inferred; ignoring override",
                dim("note:"),
                column
            );
        }
        state = state.apply(tablecast::session::Event::TypeOverridden { column, label });
    }

    if !state.can_convert() {
        if !cli.quiet {
            println!("Selected labels match the inference; nothing to convert.");
        }
        return finish(cli, &state, |_| {});
    }

    let spin = spinner(cli, "Converting…");
    let state = workflow::convert(state, &service).await;
    spin.finish_and_clear();

    finish(cli, &state, |state| {
        render_types(state);
    })
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Parse a `COLUMN=LABEL` override argument.
fn parse_override(s: &str) -> Result<(String, DisplayLabel)> {
    let (column, label) = s
        .split_once('=')
        .with_context(|| format!("Invalid override '{s}': expected COLUMN=LABEL"))?;
    let label = label.parse::<DisplayLabel>().map_err(|e| anyhow!(e))?;
    Ok((column.trim().to_string(), label))
}

/// A steady spinner for the network round-trips (suppressed by --quiet/--json).
fn spinner(cli: &Cli, msg: &str) -> ProgressBar {
    if cli.quiet || cli.json {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_message(msg.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// Exit early when the state already carries an error status.
fn bail_on_error_status(cli: &Cli, state: &SessionState) -> Result<()> {
    if let Some(status) = state.status() {
        if status.kind == StatusKind::Error {
            report(cli, state)?;
            std::process::exit(1);
        }
    }
    Ok(())
}

/// Render the final state: JSON or text body plus the status line, with a
/// non-zero exit when the last operation failed.
fn finish(cli: &Cli, state: &SessionState, body: impl FnOnce(&SessionState)) -> Result<()> {
    if cli.json {
        return report(cli, state);
    }
    if !cli.quiet {
        body(state);
    }
    report(cli, state)?;
    if matches!(state.status(), Some(s) if s.kind == StatusKind::Error) {
        std::process::exit(1);
    }
    Ok(())
}

/// Print the status line (text mode) or the whole session state (JSON mode).
fn report(cli: &Cli, state: &SessionState) -> Result<()> {
    if cli.json {
        let json = serde_json::to_string_pretty(state).context("Failed to serialise state")?;
        println!("{json}");
        return Ok(());
    }

    if let Some(status) = state.status() {
        match status.kind {
            StatusKind::Success => {
                if !cli.quiet {
                    eprintln!("{} {}", green("✔"), status.text);
                }
            }
            StatusKind::Error => {
                eprintln!("{} {}", red("✘"), status.text);
                for (column, label) in state.conversion_errors() {
                    eprintln!("  {} {}: Failed to convert to {}.", red("✗"), bold(column), label);
                }
            }
        }
    }
    Ok(())
}

/// Print the preview rows as an aligned table, header first.
fn render_preview(preview: &Preview) {
    if preview.is_empty() {
        println!("{}", dim("(no preview rows)"));
        return;
    }

    let columns = preview
        .rows()
        .iter()
        .map(Vec::len)
        .max()
        .unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in preview.rows() {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (i, row) in preview.rows().iter().enumerate() {
        let mut line = String::new();
        for (j, cell) in row.iter().enumerate() {
            let padded = format!("{:<width$}", cell, width = widths[j]);
            line.push_str(&padded);
            if j + 1 < row.len() {
                line.push_str("  ");
            }
        }
        let rendered = if i == 0 { bold(&line) } else { line };
        let _ = writeln!(out, "{rendered}");
    }
}

/// Print the current column → label mapping, marking edits and failures.
fn render_types(state: &SessionState) {
    if state.current_types().is_empty() {
        return;
    }
    println!();
    println!("{}", bold("Column types"));
    for (column, label) in state.current_types() {
        let edited = state.original_types().get(column) != Some(label);
        let marker = if edited { "*" } else { " " };
        let failed = state.conversion_errors().contains_key(column);
        let line = format!(
            "  {marker} {column}: {label} {}",
            dim(&format!("({})", label.token()))
        );
        println!("{}", if failed { red(&line) } else { line });
    }
    if state.dirty() {
        println!("{}", dim("  * edited since inference"));
    }
}
