use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use glob::Pattern;
use netpack_tools::{encode_scenario, format_report_pretty, PacketReport, Scenario};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "netpack-tools",
    version,
    about = "netpack scenario encoding tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encode scenario JSON into packets and report bit usage.
    Encode {
        /// Scenario file, or a directory of scenario files.
        scenario_path: PathBuf,
        /// Optional glob filter when encoding a directory.
        #[arg(long)]
        glob: Option<String>,
        /// Force debug streams regardless of the scenario config.
        #[arg(long)]
        debug_streams: bool,
        /// Override the packet budget in bytes.
        #[arg(long)]
        max_packet_bytes: Option<usize>,
        /// Sort encoded scenarios.
        #[arg(long, value_enum)]
        sort: Option<EncodeSort>,
        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
        /// Write the packet bytes to this file (single scenario only).
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the default scenario as JSON.
    Template,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EncodeSort {
    Bits,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

struct Overrides {
    debug_streams: bool,
    max_packet_bytes: Option<usize>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Encode {
            scenario_path,
            glob,
            debug_streams,
            max_packet_bytes,
            sort,
            format,
            out,
        } => {
            let overrides = Overrides {
                debug_streams,
                max_packet_bytes,
            };
            if scenario_path.is_dir() {
                if out.is_some() {
                    anyhow::bail!("--out needs a single scenario file");
                }
                let paths = collect_scenarios(&scenario_path, glob.as_deref())?;
                let mut reports = Vec::with_capacity(paths.len());
                for path in paths {
                    let report = encode_file(&path, &overrides)?;
                    reports.push((path, report));
                }
                if let Some(EncodeSort::Bits) = sort {
                    reports.sort_by(|a, b| b.1.bits.cmp(&a.1.bits).then_with(|| a.0.cmp(&b.0)));
                }
                for (path, report) in &reports {
                    println!("== {} ==", path.display());
                    print_report(report, format)?;
                }
            } else {
                let report = encode_file(&scenario_path, &overrides)?;
                print_report(&report, format)?;
                if let Some(out) = out {
                    fs::write(&out, &report.packet)
                        .with_context(|| format!("write packet {}", out.display()))?;
                    info!(path = %out.display(), bytes = report.bytes, "packet written");
                }
            }
        }
        Command::Template => {
            let json = serde_json::to_string_pretty(&Scenario::default())
                .context("serialize scenario")?;
            println!("{json}");
        }
    }
    Ok(())
}

fn encode_file(path: &Path, overrides: &Overrides) -> Result<PacketReport> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read scenario {}", path.display()))?;
    let mut scenario: Scenario = serde_json::from_str(&contents)
        .with_context(|| format!("parse scenario {}", path.display()))?;
    if overrides.debug_streams {
        scenario.config.use_debug_streams = true;
    }
    if let Some(bytes) = overrides.max_packet_bytes {
        scenario.config.max_packet_bytes = bytes;
    }
    encode_scenario(&scenario).with_context(|| format!("encode scenario {}", path.display()))
}

fn print_report(report: &PacketReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(report).context("serialize report")?;
            println!("{json}");
        }
        OutputFormat::Pretty => println!("{}", format_report_pretty(report)),
    }
    Ok(())
}

fn collect_scenarios(dir: &Path, glob: Option<&str>) -> Result<Vec<PathBuf>> {
    let pattern = match glob {
        Some(value) => Some(Pattern::new(value).context("invalid glob pattern")?),
        None => None,
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        let matches = match &pattern {
            Some(pattern) => {
                pattern.matches_path(&path)
                    || path
                        .file_name()
                        .and_then(|name| name.to_str())
                        .is_some_and(|name| pattern.matches(name))
            }
            None => is_json,
        };
        if matches {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}
