use std::path::PathBuf;

use clap::Parser;

pub mod private_key;

pub use private_key::PrivateKey;

/// Deploy a compiled contract to the configured network and print its address.
///
/// Connection settings come from the environment (or a `.env` file):
/// RPC_URL, PRIVATE_KEY, NETWORK, SOLIDITY_VERSION and ETHERSCAN_API_KEY.
#[derive(Debug, Clone, Parser)]
#[clap(rename_all = "kebab-case")]
pub struct Args {
    /// Name of the contract to deploy
    #[clap(short, long, env, default_value = "TrustOrb")]
    pub contract: String,

    /// Directory holding the compiler's build artifacts
    #[clap(short, long, env, default_value = "artifacts")]
    pub artifacts_dir: PathBuf,

    /// Explicit artifact file, skips the lookup in the artifacts directory
    #[clap(long)]
    pub artifact_path: Option<PathBuf>,

    /// Constructor argument, repeat in declaration order
    #[clap(long = "constructor-arg")]
    pub constructor_args: Vec<String>,

    /// Number of confirmations to wait for
    #[clap(long, default_value = "1")]
    pub confirmations: usize,

    /// Print the deployment result as a single JSON line
    #[clap(long)]
    pub json: bool,

    /// Validate the configuration and the artifact without touching the network
    #[clap(long)]
    pub dry_run: bool,
}
