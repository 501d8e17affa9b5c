use async_trait::async_trait;
use ethers::providers::{
    Http, JsonRpcClient, Middleware, PendingTransaction, Provider,
};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{
    Address, BlockNumber, Bytes, TransactionReceipt, TxHash, U256,
};
use reqwest::Url;
use tracing::{info, instrument};

use crate::error::{DeployError, Step};

#[cfg(test)]
pub mod fake;

/// The chain operations a deployment needs.
///
/// Implementations only move data to and from the node. Signing happens on
/// the caller's side, so the credential never crosses this boundary.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait NetworkService: Send + Sync {
    async fn chain_id(&self) -> Result<u64, DeployError>;

    /// Next nonce of `address`, counting pending transactions.
    async fn nonce(&self, address: Address) -> Result<U256, DeployError>;

    async fn balance(&self, address: Address) -> Result<U256, DeployError>;

    /// Fills gas limit and fee fields with the node's suggestions.
    async fn fill_transaction(
        &self,
        tx: TypedTransaction,
    ) -> Result<TypedTransaction, DeployError>;

    async fn submit_raw_transaction(
        &self,
        raw: Bytes,
    ) -> Result<TxHash, DeployError>;

    /// Waits until `tx_hash` is mined with `confirmations` blocks on top.
    ///
    /// There is no timeout other than the transport's own.
    async fn await_receipt(
        &self,
        tx_hash: TxHash,
        confirmations: usize,
    ) -> Result<TransactionReceipt, DeployError>;
}

/// JSON-RPC through an ethers provider, over HTTP unless told otherwise.
#[derive(Debug, Clone)]
pub struct EthersNetwork<P = Http> {
    provider: Provider<P>,
}

impl<P> EthersNetwork<P> {
    pub fn new(provider: Provider<P>) -> Self {
        Self { provider }
    }
}

impl EthersNetwork {
    pub fn connect(rpc_url: &Url) -> Result<Self, DeployError> {
        let provider = Provider::<Http>::try_from(rpc_url.as_str())
            .map_err(|err| DeployError::network(Step::Connecting, err))?;

        Ok(Self::new(provider))
    }
}

#[async_trait]
impl<P> NetworkService for EthersNetwork<P>
where
    P: JsonRpcClient,
{
    async fn chain_id(&self) -> Result<u64, DeployError> {
        let chain_id = self
            .provider
            .get_chainid()
            .await
            .map_err(|err| DeployError::network(Step::Connecting, err))?;

        Ok(chain_id.as_u64())
    }

    async fn nonce(&self, address: Address) -> Result<U256, DeployError> {
        self.provider
            .get_transaction_count(address, Some(BlockNumber::Pending.into()))
            .await
            .map_err(|err| DeployError::network(Step::Connecting, err))
    }

    async fn balance(&self, address: Address) -> Result<U256, DeployError> {
        self.provider
            .get_balance(address, None)
            .await
            .map_err(|err| DeployError::network(Step::Connecting, err))
    }

    async fn fill_transaction(
        &self,
        mut tx: TypedTransaction,
    ) -> Result<TypedTransaction, DeployError> {
        self.provider
            .fill_transaction(&mut tx, None)
            .await
            .map_err(|err| DeployError::network(Step::Submitting, err))?;

        Ok(tx)
    }

    #[instrument(skip_all)]
    async fn submit_raw_transaction(
        &self,
        raw: Bytes,
    ) -> Result<TxHash, DeployError> {
        let pending = self
            .provider
            .send_raw_transaction(raw)
            .await
            .map_err(|err| DeployError::network(Step::Submitting, err))?;

        Ok(pending.tx_hash())
    }

    #[instrument(skip(self))]
    async fn await_receipt(
        &self,
        tx_hash: TxHash,
        confirmations: usize,
    ) -> Result<TransactionReceipt, DeployError> {
        info!("Waiting for confirmation");

        PendingTransaction::new(tx_hash, &self.provider)
            .confirmations(confirmations)
            .await
            .map_err(|err| DeployError::network(Step::Confirming, err))?
            .ok_or_else(|| {
                DeployError::network(
                    Step::Confirming,
                    format!("transaction {tx_hash:?} was dropped from the mempool"),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use ethers::providers::MockProvider;
    use serde_json::json;

    use super::*;
    use crate::artifact::tests::hardhat_artifacts;
    use crate::artifact::ArtifactStore;
    use crate::config::{DeploymentConfig, PRIVATE_KEY_VAR, RPC_URL_VAR};
    use crate::deployment::report::{exit_code, EXIT_FAILURE};
    use crate::deployment::{deploy, DeployOptions};

    // Nothing listens on port 1, connections are refused right away
    const REFUSING_ENDPOINT: &str = "http://127.0.0.1:1";

    const ANVIL_KEY: &str =
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn refusing() -> eyre::Result<EthersNetwork> {
        Ok(EthersNetwork::connect(&REFUSING_ENDPOINT.parse()?)?)
    }

    #[tokio::test]
    async fn unreachable_node_fails_while_connecting() -> eyre::Result<()> {
        let err = refusing()?.chain_id().await.unwrap_err();

        assert_eq!(err.network_step(), Some(Step::Connecting));

        Ok(())
    }

    #[tokio::test]
    async fn refused_submission_fails_while_submitting() -> eyre::Result<()> {
        let err = refusing()?
            .submit_raw_transaction(Bytes::from(vec![0x02, 0xf8]))
            .await
            .unwrap_err();

        assert_eq!(err.network_step(), Some(Step::Submitting));

        Ok(())
    }

    #[tokio::test]
    async fn deploying_against_an_unreachable_node_exits_with_one(
    ) -> eyre::Result<()> {
        let dir = hardhat_artifacts()?;
        let artifact = ArtifactStore::new(dir.path()).find("TrustOrb").await?;
        let config = DeploymentConfig::from_vars([
            (RPC_URL_VAR, REFUSING_ENDPOINT),
            (PRIVATE_KEY_VAR, ANVIL_KEY),
        ]);

        let outcome = deploy(
            &config,
            &artifact,
            &DeployOptions::default(),
            EthersNetwork::connect,
        )
        .await;

        assert_eq!(exit_code(&outcome), EXIT_FAILURE);
        assert_eq!(
            outcome.unwrap_err().network_step(),
            Some(Step::Connecting)
        );

        Ok(())
    }

    #[tokio::test]
    async fn nonce_includes_pending_transactions() -> eyre::Result<()> {
        let (provider, mock) = Provider::mocked();
        mock.push::<U256, _>(U256::from(7))?;

        let network: EthersNetwork<MockProvider> = EthersNetwork::new(provider);
        let address = Address::repeat_byte(0x42);

        let nonce = network.nonce(address).await?;

        assert_eq!(nonce, U256::from(7));
        mock.assert_request(
            "eth_getTransactionCount",
            [serde_json::to_value(address)?, json!("pending")],
        )?;

        Ok(())
    }
}
