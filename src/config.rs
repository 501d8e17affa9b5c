use std::collections::HashMap;
use std::ffi::OsString;

use reqwest::Url;

use crate::cli::PrivateKey;
use crate::error::DeployError;

pub const RPC_URL_VAR: &str = "RPC_URL";
pub const PRIVATE_KEY_VAR: &str = "PRIVATE_KEY";
pub const NETWORK_VAR: &str = "NETWORK";
pub const SOLIDITY_VERSION_VAR: &str = "SOLIDITY_VERSION";
pub const ETHERSCAN_API_KEY_VAR: &str = "ETHERSCAN_API_KEY";

pub const DEFAULT_NETWORK: &str = "sepolia";
pub const DEFAULT_SOLIDITY_VERSION: &str = "0.8.20";

/// Connection parameters as found in the environment.
///
/// Loading never fails: missing values stay empty and are only rejected by
/// [`DeploymentConfig::validate`] when a deployment actually needs them.
#[derive(Clone, PartialEq, Eq)]
pub struct DeploymentConfig {
    pub rpc_url: String,
    pub private_key: Option<String>,
    pub network: String,
    pub compiler_version: String,
    pub etherscan_api_key: Option<String>,
}

/// A config that passed validation and can be used against a network.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub rpc_url: Url,
    pub private_key: PrivateKey,
    pub network: String,
}

impl DeploymentConfig {
    pub fn from_env() -> Self {
        Self::from_os_vars(std::env::vars_os())
    }

    /// Like [`DeploymentConfig::from_vars`], skipping entries that are not
    /// valid UTF-8 instead of failing on them.
    pub fn from_os_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        Self::from_vars(vars.into_iter().filter_map(|(key, value)| {
            Some((key.into_string().ok()?, value.into_string().ok()?))
        }))
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let mut take = |key: &str| {
            vars.remove(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            rpc_url: take(RPC_URL_VAR).unwrap_or_default(),
            private_key: take(PRIVATE_KEY_VAR),
            network: take(NETWORK_VAR)
                .unwrap_or_else(|| DEFAULT_NETWORK.to_string()),
            compiler_version: take(SOLIDITY_VERSION_VAR)
                .unwrap_or_else(|| DEFAULT_SOLIDITY_VERSION.to_string()),
            etherscan_api_key: take(ETHERSCAN_API_KEY_VAR),
        }
    }

    pub fn validate(&self) -> Result<ValidatedConfig, DeployError> {
        let private_key = self.private_key.as_deref().ok_or_else(|| {
            DeployError::configuration(format!(
                "{PRIVATE_KEY_VAR} is not set, refusing to send an unsigned transaction"
            ))
        })?;

        if self.rpc_url.is_empty() {
            return Err(DeployError::configuration(format!(
                "{RPC_URL_VAR} is not set"
            )));
        }

        let rpc_url: Url = self.rpc_url.parse().map_err(|err| {
            DeployError::configuration(format!(
                "{RPC_URL_VAR} is not a valid url: {err}"
            ))
        })?;

        let private_key: PrivateKey =
            private_key.parse().map_err(|err: eyre::Report| {
                DeployError::configuration(format!(
                    "{PRIVATE_KEY_VAR} is not a valid secp256k1 key: {err}"
                ))
            })?;

        Ok(ValidatedConfig {
            rpc_url,
            private_key,
            network: self.network.clone(),
        })
    }
}

impl std::fmt::Debug for DeploymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploymentConfig")
            .field("rpc_url", &self.rpc_url)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("network", &self.network)
            .field("compiler_version", &self.compiler_version)
            .field(
                "etherscan_api_key",
                &self.etherscan_api_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}
