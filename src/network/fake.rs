//! An in-memory chain for deployment tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{
    Address, Bytes, TransactionReceipt, TxHash, H256, U256, U64,
};
use ethers::utils::{get_contract_address, keccak256};

use super::NetworkService;
use crate::error::{DeployError, Step};

pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;

/// Accepts every transaction from `deployer` and mines it immediately.
///
/// Created addresses follow the usual `keccak(rlp(sender, nonce))` rule, so
/// every deployment lands on a fresh address. Clones share the same chain.
#[derive(Debug, Clone)]
pub struct FakeChain {
    deployer: Address,
    state: Arc<Mutex<FakeState>>,
}

#[derive(Debug, Default)]
struct FakeState {
    nonce: U256,
    block_number: u64,
    balance: U256,
    receipts: HashMap<TxHash, TransactionReceipt>,
    submitted: Vec<Bytes>,
}

impl FakeChain {
    pub fn new(deployer: Address) -> Self {
        Self {
            deployer,
            state: Arc::new(Mutex::new(FakeState {
                balance: U256::exp10(18),
                ..Default::default()
            })),
        }
    }

    pub fn submitted(&self) -> usize {
        self.state.lock().unwrap().submitted.len()
    }
}

#[async_trait]
impl NetworkService for FakeChain {
    async fn chain_id(&self) -> Result<u64, DeployError> {
        Ok(SEPOLIA_CHAIN_ID)
    }

    async fn nonce(&self, address: Address) -> Result<U256, DeployError> {
        if address != self.deployer {
            return Ok(U256::zero());
        }

        Ok(self.state.lock().unwrap().nonce)
    }

    async fn balance(&self, address: Address) -> Result<U256, DeployError> {
        if address != self.deployer {
            return Ok(U256::zero());
        }

        Ok(self.state.lock().unwrap().balance)
    }

    async fn fill_transaction(
        &self,
        mut tx: TypedTransaction,
    ) -> Result<TypedTransaction, DeployError> {
        tx.set_gas(3_000_000u64);

        if let TypedTransaction::Eip1559(inner) = &mut tx {
            inner.max_fee_per_gas = Some(U256::from(2_000_000_000u64));
            inner.max_priority_fee_per_gas = Some(U256::from(1_000_000_000u64));
        }

        Ok(tx)
    }

    async fn submit_raw_transaction(
        &self,
        raw: Bytes,
    ) -> Result<TxHash, DeployError> {
        let mut state = self.state.lock().unwrap();

        let tx_hash = H256(keccak256(&raw));
        let contract_address = get_contract_address(self.deployer, state.nonce);

        state.nonce += U256::one();
        state.block_number += 1;

        let receipt = TransactionReceipt {
            transaction_hash: tx_hash,
            from: self.deployer,
            contract_address: Some(contract_address),
            block_number: Some(U64::from(state.block_number)),
            status: Some(U64::one()),
            ..Default::default()
        };

        state.receipts.insert(tx_hash, receipt);
        state.submitted.push(raw);

        Ok(tx_hash)
    }

    async fn await_receipt(
        &self,
        tx_hash: TxHash,
        _confirmations: usize,
    ) -> Result<TransactionReceipt, DeployError> {
        self.state
            .lock()
            .unwrap()
            .receipts
            .get(&tx_hash)
            .cloned()
            .ok_or_else(|| {
                DeployError::network(Step::Confirming, "unknown transaction")
            })
    }
}
