use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;
use tabforest::server::{self, ServerConfig, SplitFrame};
use tabforest::{load_csv, Pipeline, Schema};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fit a pipeline on a headerless census income CSV and save the artifact
    Train {
        /// Training data file
        #[arg(short, long)]
        data: PathBuf,
        /// Where to write the fitted artifact
        #[arg(short, long, default_value = "artifacts/model.bin")]
        output: PathBuf,
        #[arg(long, default_value_t = 50)]
        n_estimators: usize,
        /// Maximum tree depth (0 = unlimited)
        #[arg(long, default_value_t = 20)]
        max_depth: usize,
        /// Training threads (0 = one per core)
        #[arg(long, default_value_t = 4)]
        n_jobs: usize,
        #[arg(long)]
        seed: Option<u64>,
        /// Fraction of rows held out for the validation report
        #[arg(long, default_value_t = 0.25)]
        test_size: f64,
    },
    /// Serve predictions over HTTP
    Serve {
        #[arg(short, long, env = "TABFOREST_ARTIFACT", default_value = "artifacts/model.bin")]
        artifact: PathBuf,
        #[arg(short, long, env = "TABFOREST_LISTEN", default_value = "0.0.0.0:5000")]
        listen: SocketAddr,
    },
    /// Predict labels for a split-orient JSON table
    Predict {
        #[arg(short, long, env = "TABFOREST_ARTIFACT", default_value = "artifacts/model.bin")]
        artifact: PathBuf,
        /// JSON file with `columns` and `data`
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tabforest::init_logger();
    let args = Args::parse();

    match args.command {
        Command::Train {
            data,
            output,
            n_estimators,
            max_depth,
            n_jobs,
            seed,
            test_size,
        } => {
            let max_depth = (max_depth > 0).then_some(max_depth);
            tokio::task::spawn_blocking(move || {
                train(data, output, n_estimators, max_depth, n_jobs, seed, test_size)
            })
            .await??
        }
        Command::Serve { artifact, listen } => {
            server::serve(ServerConfig {
                listen_addr: listen,
                artifact_path: artifact,
            })
            .await?
        }
        Command::Predict { artifact, input } => predict(artifact, input)?,
    }

    Ok(())
}

fn train(
    data: PathBuf,
    output: PathBuf,
    n_estimators: usize,
    max_depth: Option<usize>,
    n_jobs: usize,
    seed: Option<u64>,
    test_size: f64,
) -> anyhow::Result<()> {
    info!("=== Training pipeline from {:?} ===", data);
    let start_time = Instant::now();

    let schema = Schema::census_income();
    let (dataset, _) = load_csv(&data, &schema).with_context(|| format!("reading {:?}", data))?;

    let mut builder = Pipeline::builder()
        .with_schema(schema)
        .with_n_estimators(n_estimators)
        .with_max_depth(max_depth)
        .with_n_jobs(n_jobs);
    if let Some(seed) = seed {
        builder = builder.with_seed(seed);
    }
    if let Some(fraction) = validation_fraction(test_size) {
        builder = builder.with_validation_split(fraction);
    }

    let pipeline = builder.fit_dataset(&dataset)?;
    info!("=== Pipeline fitted (took {:.2?}) ===", start_time.elapsed());

    if let Some(report) = pipeline.validation_report() {
        info!("Validation report:\n{}", report);
    }

    pipeline
        .save(&output)
        .with_context(|| format!("saving artifact to {:?}", output))?;
    println!("Saved pipeline to {}", output.display());
    Ok(())
}

/// `0` turns the validation report off; any other value is checked by the builder.
fn validation_fraction(test_size: f64) -> Option<f64> {
    (test_size != 0.0).then_some(test_size)
}

fn predict(artifact: PathBuf, input: PathBuf) -> anyhow::Result<()> {
    let pipeline = Pipeline::load(&artifact).with_context(|| format!("loading {:?}", artifact))?;
    let body = fs::read(&input).with_context(|| format!("reading {:?}", input))?;
    let frame: SplitFrame = serde_json::from_slice(&body)?;
    let records = frame.into_records()?;

    let start = Instant::now();
    let predictions = pipeline.predict(&records)?;
    info!("Predicted {} rows in {:.2?}", predictions.len(), start.elapsed());

    println!("{}", serde_json::json!({ "predictions": predictions }));
    Ok(())
}
