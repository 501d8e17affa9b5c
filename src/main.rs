use clap::Parser;
use tracing::{debug, info};
use tracing_error::ErrorLayer;
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::artifact::{ArtifactStore, ContractArtifact};
use crate::cli::Args;
use crate::config::DeploymentConfig;
use crate::deployment::report::{exit_code, failure_line};
use crate::deployment::{DeployOptions, DeploymentPlan, Stage};
use crate::error::DeployError;
use crate::network::EthersNetwork;

pub mod artifact;
pub mod config;
pub mod error;
pub mod network;
pub mod serde_utils;

mod cli;
mod deployment;

async fn load_artifact(args: &Args) -> Result<ContractArtifact, DeployError> {
    match args.artifact_path.as_ref() {
        Some(path) => ContractArtifact::from_file(path).await,
        None => {
            ArtifactStore::new(&args.artifacts_dir)
                .find(&args.contract)
                .await
        }
    }
}

async fn start(args: Args) -> Result<(), DeployError> {
    let config = DeploymentConfig::from_env();

    debug!(?config, "Loaded configuration");

    config.validate()?;

    let artifact = load_artifact(&args).await?;

    info!(%artifact, "Loaded artifact");

    let options = DeployOptions {
        constructor_args: args.constructor_args,
        confirmations: args.confirmations,
    };

    if args.dry_run {
        let plan = DeploymentPlan::new(&config, &artifact, &options)?;

        println!("{plan}");
        println!("Compiler:      solc {}", config.compiler_version);
        println!(
            "Explorer key:  {}",
            if config.etherscan_api_key.is_some() {
                "set"
            } else {
                "not set"
            }
        );

        return Ok(());
    }

    let result = deployment::deploy(
        &config,
        &artifact,
        &options,
        EthersNetwork::connect,
    )
    .await?;

    if args.json {
        println!("{}", serde_utils::to_json_line(&result)?);
    } else {
        println!("{}", result.summary_line());
    }

    info!(stage = %Stage::Reported, "Deployment reported");

    Ok(())
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    dotenv::dotenv().ok();

    let indicatif_layer = IndicatifLayer::new();

    let filter = EnvFilter::from_default_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(indicatif_layer.get_stderr_writer())
                .with_filter(filter),
        )
        .with(indicatif_layer)
        .with(ErrorLayer::default())
        .init();

    let args = Args::parse();

    let outcome = start(args).await;
    let code = exit_code(&outcome);

    if let Err(err) = outcome {
        eprintln!("{}", failure_line(&err));

        if err.is_configuration() {
            tracing::warn!(
                "Run with --help to see the expected environment variables"
            );
        }

        let step = err.network_step();
        let report = eyre::ErrReport::from(err);
        tracing::error!(stage = %Stage::Reported, ?step, "{:?}", report);
    }

    std::process::exit(code)
}
