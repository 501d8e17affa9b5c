use ethers::types::{Address, H256};
use ethers::utils::to_checksum;
use serde::{Deserialize, Serialize};

use crate::error::DeployError;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

/// The outcome of a successful deployment. Never persisted.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentResult {
    pub contract: String,
    pub contract_address: Address,
    pub transaction_hash: H256,
    pub deployer: Address,
    pub network: String,
    #[serde(default)]
    pub block_number: Option<u64>,
}

impl DeploymentResult {
    pub fn summary_line(&self) -> String {
        format!(
            "{} deployed to: {}",
            self.contract,
            to_checksum(&self.contract_address, None)
        )
    }
}

pub fn failure_line(err: &DeployError) -> String {
    format!("Deployment failed: {err}")
}

pub fn exit_code<T>(outcome: &Result<T, DeployError>) -> i32 {
    match outcome {
        Ok(_) => EXIT_SUCCESS,
        Err(_) => EXIT_FAILURE,
    }
}
