use clap::Parser;
use comfy_table::Table;
use prometheus::Registry;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::exit;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use certmetrics::config::{Config, OutputFormat, DEFAULT_CONFIG_FILE};
use certmetrics::{
    encode_text, observe, push, x509, CertificateRecord, LabelTuple, PrometheusSink, PushTarget,
    LABEL_NAMES,
};

/// Exports certificate expiration times as a Prometheus gauge.
#[derive(Parser, Debug)]
#[command(name = "certmetrics", version, author, about, long_about = None)]
struct Args {
    /// Certificate files (PEM bundles or DER)
    files: Vec<String>,

    /// Output format: prometheus, json, table
    #[arg(short, long)]
    output: Option<String>,

    /// Configuration file [default: certmetrics.toml if present]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Push the observed series to a Prometheus Pushgateway
    #[arg(long)]
    prometheus: bool,

    /// Pushgateway address
    #[arg(long)]
    prometheus_address: Option<String>,

    /// Job name used when pushing
    #[arg(long)]
    job: Option<String>,

    /// Print an example configuration file and exit
    #[arg(long)]
    generate_config: bool,
}

#[derive(Serialize)]
struct Series {
    labels: LabelTuple,
    value: f64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if args.generate_config {
        println!("{}", Config::example_toml());
        exit(0);
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            exit(2);
        }
    };
    let output = match config.validate().and_then(|_| config.output_format()) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("{}", e);
            exit(2);
        }
    };

    let registry = Registry::new();
    let sink = match PrometheusSink::new(&registry) {
        Ok(sink) => sink,
        Err(e) => {
            eprintln!("{}", e);
            exit(2);
        }
    };

    let mut records: Vec<CertificateRecord> = Vec::new();
    let mut failures = 0;
    for path in config.certificates.iter().flatten() {
        match x509::records_from_path(path) {
            Ok(mut loaded) => {
                info!(path = %path, certificates = loaded.len(), "observing certificates");
                records.append(&mut loaded);
            }
            Err(e) => {
                error!(path = %path, error = %e, "failed to load certificates");
                eprintln!("Failed to load {}: {}", path, e);
                failures += 1;
            }
        }
    }

    observe(&sink, &records);

    if let Err(e) = print_series(output, &registry, &sink, &records) {
        eprintln!("{}", e);
        exit(2);
    }

    if config.push_enabled() {
        let prometheus = config.prometheus.as_ref();
        let target = PushTarget::new(
            prometheus
                .and_then(|p| p.address.clone())
                .unwrap_or_default(),
            prometheus
                .and_then(|p| p.job.clone())
                .unwrap_or_else(|| "certmetrics".to_string()),
        );
        if let Err(e) = push(&registry, &target) {
            eprintln!("\n{}", e);
            failures += 1;
        }
    }

    exit(if failures > 0 { 1 } else { 0 });
}

fn load_config(args: &Args) -> Result<Config, certmetrics::config::ConfigError> {
    let file_config = match &args.config {
        Some(path) => Some(Config::from_file(path)?),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            Some(Config::from_file(DEFAULT_CONFIG_FILE)?)
        }
        None => None,
    };

    let cli_config = Config::from_cli_args(
        if args.files.is_empty() {
            None
        } else {
            Some(args.files.clone())
        },
        args.output.clone(),
        if args.prometheus { Some(true) } else { None },
        args.prometheus_address.clone(),
        args.job.clone(),
    );

    let mut config = Config::default();
    if let Some(file_config) = file_config {
        config = config.merge_with(file_config);
    }
    Ok(config.merge_with(cli_config))
}

fn print_series(
    output: OutputFormat,
    registry: &Registry,
    sink: &PrometheusSink,
    records: &[CertificateRecord],
) -> certmetrics::Result<()> {
    match output {
        OutputFormat::Prometheus => {
            print!("{}", encode_text(registry)?);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&collect_series(sink, records)).map_err(
                |e| certmetrics::CertMetricsError::Encoding {
                    details: e.to_string(),
                },
            )?;
            println!("{}", json);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            let mut header: Vec<&str> = LABEL_NAMES.to_vec();
            header.push("expiration");
            table.set_header(header);
            for series in collect_series(sink, records) {
                let mut row: Vec<String> =
                    series.labels.values().iter().map(|v| v.to_string()).collect();
                row.push(series.value.to_string());
                table.add_row(row);
            }
            println!("{}", table);
        }
    }
    Ok(())
}

/// One entry per distinct label set, read back from the gauge.
fn collect_series(sink: &PrometheusSink, records: &[CertificateRecord]) -> Vec<Series> {
    records
        .iter()
        .map(LabelTuple::from_certificate)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|labels| Series {
            value: sink.gauge().with_label_values(&labels.values()).get(),
            labels,
        })
        .collect()
}
