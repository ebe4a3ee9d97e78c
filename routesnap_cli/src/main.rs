mod config;

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use routesnap_diff::{
    CSV_HEADER, CompareOptions, ComparisonResult, compare, compare_records, format_csv_report,
    format_csv_rows, format_text_report,
};
use routesnap_ingest::{DeviceCapture, Snapshot, Vendor, ingest_batch, parse_capture};
use routesnap_ir::{RouteRecord, Timestamp};
use routesnap_store::{SnapshotKey, SnapshotStore, SqliteStore};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Settings;

#[derive(Debug, Parser)]
#[command(name = "route-diff", version)]
#[command(about = "Store route table snapshots and report route changes between them")]
struct Cli {
    /// Configuration file (created with commented defaults when missing)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Snapshot database, overriding the configured one
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse captures and store one snapshot per device and service
    Load {
        /// Capture format: timos, timos-bgp, vrp or auto
        #[arg(long)]
        vendor: Option<String>,

        /// Snapshot timestamp (YYYY-MM-DD_HH:MM), defaults to the current minute
        #[arg(long)]
        timestamp: Option<String>,

        /// Captures as HOSTNAME=FILE
        #[arg(required = true, value_name = "HOSTNAME=FILE")]
        captures: Vec<String>,
    },
    /// List stored snapshots, newest first
    List { hostname: Option<String> },
    /// Compare two snapshots of one device service
    Compare {
        hostname: String,
        service: String,
        ts1: String,
        ts2: String,

        /// Match records on the prefix only
        #[arg(long)]
        route_only: bool,

        #[arg(long)]
        json: bool,

        #[arg(long, conflicts_with = "json")]
        csv: bool,
    },
    /// Remove every snapshot of a device taken at a timestamp
    Remove { hostname: String, timestamp: String },
    /// Compare two capture files without touching the database
    DiffFiles {
        left: PathBuf,
        right: PathBuf,

        /// Capture format: timos, timos-bgp, vrp or auto
        #[arg(long)]
        vendor: Option<String>,

        /// Match records on the prefix only
        #[arg(long)]
        route_only: bool,

        #[arg(long)]
        json: bool,

        #[arg(long, conflicts_with = "json")]
        csv: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
    Csv,
}

impl OutputFormat {
    fn from_flags(json: bool, csv: bool) -> Self {
        match (json, csv) {
            (true, _) => Self::Json,
            (false, true) => Self::Csv,
            (false, false) => Self::Text,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let settings = Settings::load(cli.config.as_deref())?;
    let database = cli.database.clone().unwrap_or_else(|| settings.database.clone());
    debug!(database = %database.display(), "settings loaded");

    match cli.command {
        Command::Load {
            vendor,
            timestamp,
            captures,
        } => {
            let vendor = resolve_vendor(vendor.as_deref(), &settings)?;
            let timestamp = match timestamp {
                Some(text) => parse_timestamp(&text)?,
                None => Timestamp::now(),
            };
            let store = open_store(&database)?;
            load(&store, vendor, &timestamp, &captures)
        }
        Command::List { hostname } => {
            let store = open_store(&database)?;
            list(&store, hostname.as_deref())
        }
        Command::Compare {
            hostname,
            service,
            ts1,
            ts2,
            route_only,
            json,
            csv,
        } => {
            let store = open_store(&database)?;
            let options = compare_options(route_only || settings.route_only);
            run_compare(
                &store,
                &hostname,
                &service,
                (&ts1, &ts2),
                &options,
                OutputFormat::from_flags(json, csv),
            )
        }
        Command::Remove {
            hostname,
            timestamp,
        } => {
            let timestamp = parse_timestamp(&timestamp)?;
            let store = open_store(&database)?;
            let removed = store.remove_snapshot(&hostname, &timestamp)?;
            println!("Removed {removed} route record(s) for {hostname} at {timestamp}");
            Ok(())
        }
        Command::DiffFiles {
            left,
            right,
            vendor,
            route_only,
            json,
            csv,
        } => {
            let vendor = resolve_vendor(vendor.as_deref(), &settings)?;
            let options = compare_options(route_only || settings.route_only);
            diff_files(
                &left,
                &right,
                vendor,
                &options,
                OutputFormat::from_flags(json, csv),
            )
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_store(path: &Path) -> Result<SqliteStore> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("unable to create directory {}", parent.display()))?;
    }
    SqliteStore::open(path).with_context(|| format!("unable to open database {}", path.display()))
}

fn resolve_vendor(flag: Option<&str>, settings: &Settings) -> Result<Vendor> {
    match flag {
        Some(name) => Ok(name.parse::<Vendor>()?),
        None => Ok(settings.vendor),
    }
}

fn parse_timestamp(text: &str) -> Result<Timestamp> {
    Ok(Timestamp::parse(text)?)
}

fn compare_options(route_only: bool) -> CompareOptions {
    if route_only {
        CompareOptions::route_only()
    } else {
        CompareOptions::default()
    }
}

fn load(
    store: &dyn SnapshotStore,
    vendor: Vendor,
    timestamp: &Timestamp,
    captures: &[String],
) -> Result<()> {
    let mut devices = Vec::with_capacity(captures.len());
    for capture in captures {
        let Some((hostname, file)) = capture.split_once('=') else {
            bail!("expected HOSTNAME=FILE, got '{capture}'");
        };
        let raw = fs::read_to_string(file).with_context(|| format!("unable to read {file}"))?;
        devices.push(DeviceCapture::new(hostname, raw, vendor));
    }

    let outcomes = ingest_batch(store, &devices, timestamp);
    let mut failures = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(saved) => {
                let records: usize = saved.iter().map(|s| s.records).sum();
                println!(
                    "{}: {} snapshot(s), {} record(s) at {}",
                    outcome.hostname,
                    saved.len(),
                    records,
                    timestamp
                );
            }
            Err(err) => {
                failures += 1;
                println!("{}: failed: {err}", outcome.hostname);
            }
        }
    }
    if failures > 0 {
        bail!("{failures} of {} device(s) failed", outcomes.len());
    }
    Ok(())
}

fn list(store: &dyn SnapshotStore, hostname: Option<&str>) -> Result<()> {
    let keys = store.list_snapshots(hostname)?;
    if keys.is_empty() {
        println!("No snapshots stored.");
        return Ok(());
    }
    println!("{:<16}  {:<24}  SERVICE", "TIMESTAMP", "HOSTNAME");
    for key in keys {
        println!("{:<16}  {:<24}  {}", key.timestamp, key.hostname, key.service);
    }
    Ok(())
}

fn run_compare(
    store: &dyn SnapshotStore,
    hostname: &str,
    service: &str,
    (ts1, ts2): (&str, &str),
    options: &CompareOptions,
    format: OutputFormat,
) -> Result<()> {
    let mut from = parse_timestamp(ts1)?;
    let mut to = parse_timestamp(ts2)?;
    if from == to {
        bail!("cannot compare a snapshot with itself ({from})");
    }
    if from > to {
        warn!(%from, %to, "timestamps given newest first, swapping");
        std::mem::swap(&mut from, &mut to);
    }

    for timestamp in [&from, &to] {
        let key = SnapshotKey::new(hostname, service, timestamp.clone());
        if !store.snapshot_exists(&key)? {
            println!("No data for {key}");
            return Ok(());
        }
    }

    let result = compare(store, hostname, service, &from, &to, options)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Csv => print!("{}", format_csv_report(&result)),
        OutputFormat::Text => print!(
            "{}",
            format_text_report(&result, from.as_str(), to.as_str())
        ),
    }
    Ok(())
}

fn diff_files(
    left: &Path,
    right: &Path,
    vendor: Vendor,
    options: &CompareOptions,
    format: OutputFormat,
) -> Result<()> {
    let timestamp = Timestamp::now();
    let left_tables = read_capture(left, vendor, &timestamp)?;
    let right_tables = read_capture(right, vendor, &timestamp)?;

    let services: BTreeSet<&String> = left_tables.keys().chain(right_tables.keys()).collect();
    let mut results: BTreeMap<&str, ComparisonResult> = BTreeMap::new();
    for service in services {
        let before = left_tables.get(service).map(Vec::as_slice).unwrap_or_default();
        let after = right_tables.get(service).map(Vec::as_slice).unwrap_or_default();
        results.insert(service.as_str(), compare_records(before, after, options));
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
        OutputFormat::Csv => {
            println!("{CSV_HEADER}");
            for result in results.values() {
                print!("{}", format_csv_rows(result));
            }
        }
        OutputFormat::Text => {
            let (left_label, right_label) =
                (left.display().to_string(), right.display().to_string());
            for (service, result) in &results {
                debug!(service, "rendering service report");
                print!("{}", format_text_report(result, &left_label, &right_label));
                println!();
            }
        }
    }
    Ok(())
}

/// Parse a capture file into per-service records. Both sides share one
/// hostname so identity keys line up.
fn read_capture(
    path: &Path,
    vendor: Vendor,
    timestamp: &Timestamp,
) -> Result<BTreeMap<String, Vec<RouteRecord>>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("unable to read {}", path.display()))?;
    let snapshots = parse_capture(vendor, &raw, "capture", timestamp)
        .with_context(|| format!("unable to parse {}", path.display()))?;
    Ok(snapshots
        .into_iter()
        .map(|Snapshot { key, records }| (key.service, records))
        .collect())
}
