use std::time::Duration;

use alloy::{
    primitives::{Address, B256, Bytes, TxHash, U256},
    providers::{DynProvider, PendingTransactionBuilder, Provider},
};

use crate::deposit::DepositData;
use crate::error::{Error, Result};

// https://github.com/ethereum/consensus-specs/blob/dev/solidity_deposit_contract/deposit_contract.sol
alloy::sol! {
    #[sol(rpc)]
    #[derive(Debug, PartialEq)]
    interface IDepositContract {
        /// @notice A processed deposit event.
        event DepositEvent(
            bytes pubkey,
            bytes withdrawal_credentials,
            bytes amount,
            bytes signature,
            bytes index
        );

        /// @notice Submit a Phase 0 DepositData object.
        /// @param pubkey A BLS12-381 public key.
        /// @param withdrawal_credentials Commitment to a public key for withdrawals.
        /// @param signature A BLS12-381 signature.
        /// @param deposit_data_root The SHA-256 hash of the SSZ-encoded DepositData object.
        /// Used as a protection against malformed input.
        function deposit(
            bytes calldata pubkey,
            bytes calldata withdrawal_credentials,
            bytes calldata signature,
            bytes32 deposit_data_root
        ) external payable;

        /// @notice Query the current deposit count.
        /// @return The deposit count encoded as a little endian 64-bit number.
        function get_deposit_count() external view returns (bytes memory);

        /// @notice Query the current deposit root hash.
        function get_deposit_root() external view returns (bytes32);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DepositReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
}

/// One historical on-chain deposit observation, fields kept as the opaque
/// byte strings the event carries.
#[derive(Debug, Clone)]
pub struct RawDepositEvent {
    pub block_number: u64,
    pub tx_hash: TxHash,
    pub pubkey: Bytes,
    pub withdrawal_credentials: Bytes,
    pub amount: Bytes,
    pub signature: Bytes,
    pub index: Bytes,
}

/// Gas settings forwarded to outbound deposit transactions, fees in wei.
/// Anything left unset is estimated by the provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct TxFees {
    pub gas_limit: Option<u64>,
    pub max_fee_per_gas: Option<u128>,
    pub max_priority_fee_per_gas: Option<u128>,
}

/// The four contract operations this tool consumes, plus confirmation.
/// `send_deposit` returns at transaction-hash time so callers can record
/// completion before awaiting inclusion.
#[allow(async_fn_in_trait)]
pub trait DepositContract {
    async fn send_deposit(&self, data: &DepositData, value_wei: U256, fees: &TxFees)
    -> Result<TxHash>;
    async fn confirm_deposit(&self, tx_hash: TxHash) -> Result<DepositReceipt>;
    /// Raw little-endian deposit count bytes as returned by the contract.
    async fn deposit_count(&self) -> Result<Bytes>;
    async fn deposit_root(&self) -> Result<B256>;
    async fn deposit_events(&self, from_block: u64, to_block: u64)
    -> Result<Vec<RawDepositEvent>>;
}

pub struct AlloyDepositContract {
    instance: IDepositContract::IDepositContractInstance<DynProvider>,
}

impl AlloyDepositContract {
    pub fn new(address: Address, provider: DynProvider) -> Self {
        Self {
            instance: IDepositContract::new(address, provider),
        }
    }

    pub fn address(&self) -> &Address {
        self.instance.address()
    }
}

impl DepositContract for AlloyDepositContract {
    async fn send_deposit(
        &self,
        data: &DepositData,
        value_wei: U256,
        fees: &TxFees,
    ) -> Result<TxHash> {
        let mut call = self
            .instance
            .deposit(
                data.pubkey.into(),
                data.withdrawal_credentials.into(),
                data.signature.into(),
                data.hash_tree_root(),
            )
            .value(value_wei);
        if let Some(gas_limit) = fees.gas_limit {
            call = call.gas(gas_limit);
        }
        if let Some(max_fee) = fees.max_fee_per_gas {
            call = call.max_fee_per_gas(max_fee);
        }
        if let Some(max_priority) = fees.max_priority_fee_per_gas {
            call = call.max_priority_fee_per_gas(max_priority);
        }
        let pending = call.send().await.map_err(Error::submission)?;
        Ok(*pending.tx_hash())
    }

    async fn confirm_deposit(&self, tx_hash: TxHash) -> Result<DepositReceipt> {
        let receipt =
            PendingTransactionBuilder::new(self.instance.provider().root().clone(), tx_hash)
                .with_required_confirmations(1)
                .with_timeout(Some(Duration::from_secs(60)))
                .get_receipt()
                .await
                .map_err(Error::rpc)?;
        if !receipt.status() {
            return Err(Error::submission(format!("transaction {tx_hash} reverted")));
        }
        Ok(DepositReceipt {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number.unwrap_or_default(),
        })
    }

    async fn deposit_count(&self) -> Result<Bytes> {
        self.instance
            .get_deposit_count()
            .call()
            .await
            .map_err(Error::rpc)
    }

    async fn deposit_root(&self) -> Result<B256> {
        self.instance
            .get_deposit_root()
            .call()
            .await
            .map_err(Error::rpc)
    }

    async fn deposit_events(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RawDepositEvent>> {
        let events = self
            .instance
            .DepositEvent_filter()
            .from_block(from_block)
            .to_block(to_block)
            .query()
            .await
            .map_err(Error::rpc)?;
        Ok(events
            .into_iter()
            .map(|(event, log)| RawDepositEvent {
                block_number: log.block_number.unwrap_or_default(),
                tx_hash: log.transaction_hash.unwrap_or_default(),
                pubkey: event.pubkey,
                withdrawal_credentials: event.withdrawal_credentials,
                amount: event.amount,
                signature: event.signature,
                index: event.index,
            })
            .collect())
    }
}
