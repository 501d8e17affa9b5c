use std::fmt;

use ethers::signers::Signer;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, Eip1559TransactionRequest, U64};
use ethers::utils::{format_ether, get_contract_address, to_checksum};
use tracing::{error, info, instrument, warn};

use crate::artifact::ContractArtifact;
use crate::config::{DeploymentConfig, ValidatedConfig};
use crate::error::{DeployError, Step};
use crate::network::NetworkService;

pub mod report;

pub use self::report::DeploymentResult;

pub const DEFAULT_CONFIRMATIONS: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Stage {
    NotStarted,
    Submitted,
    Confirmed,
    Failed,
    Reported,
}

#[derive(Debug, Clone)]
pub struct DeployOptions {
    pub constructor_args: Vec<String>,
    pub confirmations: usize,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            constructor_args: vec![],
            confirmations: DEFAULT_CONFIRMATIONS,
        }
    }
}

/// Everything a deployment needs that can be checked without a network.
#[derive(Debug)]
pub struct DeploymentPlan {
    pub contract: String,
    pub config: ValidatedConfig,
    pub deployer: Address,
    pub creation_code: Bytes,
    pub confirmations: usize,
}

impl DeploymentPlan {
    pub fn new(
        config: &DeploymentConfig,
        artifact: &ContractArtifact,
        options: &DeployOptions,
    ) -> Result<Self, DeployError> {
        let config = config.validate()?;
        let creation_code = artifact.creation_code(&options.constructor_args)?;

        Ok(Self {
            contract: artifact.name.clone(),
            deployer: config.private_key.address(),
            config,
            creation_code,
            confirmations: options.confirmations.max(1),
        })
    }
}

impl fmt::Display for DeploymentPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Contract:      {}", self.contract)?;
        writeln!(f, "Network:       {}", self.config.network)?;
        writeln!(
            f,
            "RPC host:      {}",
            self.config.rpc_url.host_str().unwrap_or("<none>")
        )?;
        writeln!(f, "Deployer:      {}", to_checksum(&self.deployer, None))?;
        writeln!(f, "Creation code: {} bytes", self.creation_code.len())?;
        write!(f, "Confirmations: {}", self.confirmations)
    }
}

/// Deploys `artifact` once and waits for its receipt.
///
/// The config is validated before `connect` is called, so an incomplete
/// config never reaches the network. Nothing is retried.
#[instrument(name = "deploy", skip_all, fields(contract = %artifact.name))]
pub async fn deploy<N, F>(
    config: &DeploymentConfig,
    artifact: &ContractArtifact,
    options: &DeployOptions,
    connect: F,
) -> Result<DeploymentResult, DeployError>
where
    N: NetworkService,
    F: FnOnce(&reqwest::Url) -> Result<N, DeployError>,
{
    let plan = DeploymentPlan::new(config, artifact, options)?;

    info!(stage = %Stage::NotStarted, network = %plan.config.network, "Deployment planned");

    let network = connect(&plan.config.rpc_url)?;

    let result = execute(&plan, &network).await;

    if let Err(err) = &result {
        error!(stage = %Stage::Failed, %err, "Deployment failed");
    }

    result
}

async fn execute<N>(
    plan: &DeploymentPlan,
    network: &N,
) -> Result<DeploymentResult, DeployError>
where
    N: NetworkService,
{
    let chain_id = network.chain_id().await?;
    let wallet = plan.config.private_key.wallet(chain_id);

    let nonce = network.nonce(plan.deployer).await?;
    let balance = network.balance(plan.deployer).await?;

    info!(
        chain_id,
        deployer = %to_checksum(&plan.deployer, None),
        %nonce,
        balance = %format_ether(balance),
        "Deployer account"
    );

    if balance.is_zero() {
        warn!("Deployer has no funds, the node will most likely reject the transaction");
    }

    let expected_address = get_contract_address(plan.deployer, nonce);

    let tx = TypedTransaction::Eip1559(
        Eip1559TransactionRequest::new()
            .from(plan.deployer)
            .data(plan.creation_code.clone())
            .nonce(nonce)
            .chain_id(U64::from(chain_id)),
    );

    let tx = network.fill_transaction(tx).await?;

    let signature = wallet
        .sign_transaction(&tx)
        .await
        .map_err(|err| eyre::eyre!("Signing the deployment transaction: {err}"))?;

    let tx_hash = network
        .submit_raw_transaction(tx.rlp_signed(&signature))
        .await?;

    info!(stage = %Stage::Submitted, ?tx_hash, "Deployment transaction submitted");

    let receipt = network.await_receipt(tx_hash, plan.confirmations).await?;

    if receipt.status != Some(U64::one()) {
        return Err(DeployError::network(
            Step::Confirming,
            format!("transaction {tx_hash:?} reverted"),
        ));
    }

    let contract_address = receipt.contract_address.ok_or_else(|| {
        DeployError::network(
            Step::Confirming,
            format!("receipt of {tx_hash:?} has no contract address"),
        )
    })?;

    if contract_address != expected_address {
        warn!(
            ?expected_address,
            ?contract_address,
            "Contract landed on an unexpected address"
        );
    }

    let block_number = receipt.block_number.map(|n| n.as_u64());

    info!(
        stage = %Stage::Confirmed,
        contract_address = %to_checksum(&contract_address, None),
        ?block_number,
        "Deployment confirmed"
    );

    Ok(DeploymentResult {
        contract: plan.contract.clone(),
        contract_address,
        transaction_hash: receipt.transaction_hash,
        deployer: plan.deployer,
        network: plan.config.network.clone(),
        block_number,
    })
}
