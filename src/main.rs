use anyhow::Result;
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;

use busbytes::config::SystemConfig;
use busbytes::ingest::CsvFrameSource;
use busbytes::report;
use busbytes::store::FrameStore;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Frame log: id,time,b0,b1,... (hex bytes)
    log: PathBuf,

    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the JSON report here
    #[arg(long)]
    json: Option<PathBuf>,

    /// Override the minimum constancy run length
    #[arg(long)]
    min_run: Option<usize>,

    /// Override the distinct-value threshold for numeric channels
    #[arg(long)]
    cardinality: Option<usize>,

    /// Override the mean step above which a byte is noise
    #[arg(long)]
    noise: Option<f64>,

    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn load_config(args: &Args) -> Result<SystemConfig> {
    let mut config = match &args.config {
        Some(path) => SystemConfig::load(path)?,
        None => SystemConfig::default(),
    };
    if let Some(n) = args.min_run {
        config.analysis.min_run_length = n;
    }
    if let Some(n) = args.cardinality {
        config.analysis.cardinality_threshold = n;
    }
    if let Some(f) = args.noise {
        config.activity.noise_threshold = f;
    }
    Ok(config)
}

fn run(args: &Args) -> Result<()> {
    let config = load_config(args)?;
    info!(
        "Config: cardinality > {} => numeric, min run {}, noise > {:.1}",
        config.analysis.cardinality_threshold,
        config.analysis.min_run_length,
        config.activity.noise_threshold
    );

    let mut source = CsvFrameSource::open(&args.log)?;
    let mut store = FrameStore::new();
    store.ingest(&mut source)?;

    let analysis = store.analyze(&config);
    let report = report::build(&analysis);

    for frame in &report.frames {
        info!(
            "{} constant intervals: {}",
            frame.identifier,
            report::interval_counts(frame)
        );
    }

    if let Some(path) = &args.json {
        report::write_json(&report, path)?;
        info!("Report written to {}", path.display());
    }
    Ok(())
}

fn main() {
    let args = Args::parse();

    env_logger::builder()
        .format_timestamp(None)
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    if let Err(e) = run(&args) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
