use alloy::primitives::{
    TxHash, U256, hex,
    utils::{Unit, format_ether},
};
use colored::*;
use log::*;

use crate::{
    contract::{DepositContract, DepositReceipt, TxFees},
    deposit::DepositRecord,
    error::Result,
};

/// Record amounts are gwei-denominated, the transaction value is wei.
pub fn deposit_value_wei(amount_gwei: u64) -> U256 {
    U256::from(amount_gwei) * Unit::GWEI.wei()
}

/// A broadcast deposit whose inclusion has not been awaited yet.
#[derive(Debug, Clone, Copy)]
pub struct SubmittedDeposit {
    pub tx_hash: TxHash,
}

/// Drives one deposit transaction per record: validate shape, compute the
/// deposit data root, scale the amount, broadcast, await inclusion.
/// Completion markers are the caller's responsibility, which keeps this
/// usable standalone for single-record submission.
pub struct Submitter<'a, C> {
    contract: &'a C,
    fees: TxFees,
}

impl<'a, C: DepositContract> Submitter<'a, C> {
    pub fn new(contract: &'a C, fees: TxFees) -> Self {
        Self { contract, fees }
    }

    /// Broadcast, returning at transaction-hash time. No automatic retry, a
    /// failed send surfaces as `SubmissionFailed`.
    pub async fn send(&self, record: &DepositRecord) -> Result<SubmittedDeposit> {
        let data = record.to_deposit_data()?;
        let root = data.hash_tree_root();
        let value = deposit_value_wei(data.amount);
        debug!(
            "Deposit data root for {}: {}",
            record.pubkey.blue(),
            hex::encode(root).magenta()
        );
        debug!("Deposit value: {} eth", format_ether(value).yellow());

        let tx_hash = self.contract.send_deposit(&data, value, &self.fees).await?;
        info!("Transaction sent. Hash: {}", tx_hash.to_string().red());
        Ok(SubmittedDeposit { tx_hash })
    }

    pub async fn wait(&self, submitted: &SubmittedDeposit) -> Result<DepositReceipt> {
        let receipt = self.contract.confirm_deposit(submitted.tx_hash).await?;
        info!(
            "Transaction {} confirmed in block {}",
            receipt.tx_hash.to_string().red(),
            receipt.block_number.to_string().blue()
        );
        Ok(receipt)
    }

    /// Single-record path: send and await inclusion, errors propagate.
    pub async fn submit(&self, record: &DepositRecord) -> Result<DepositReceipt> {
        let submitted = self.send(record).await?;
        self.wait(&submitted).await
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::utils::parse_ether;

    use super::*;

    #[test]
    fn gwei_amount_scales_to_native_units() {
        // 32_000_000_000 gwei is exactly 32 ether
        assert_eq!(deposit_value_wei(32_000_000_000), parse_ether("32").unwrap());
    }

    #[test]
    fn one_gwei_is_1e9_wei() {
        assert_eq!(deposit_value_wei(1), U256::from(1_000_000_000u64));
        assert_eq!(deposit_value_wei(0), U256::ZERO);
    }

    #[test]
    fn max_effective_balance_scales_without_overflow() {
        // EIP-7251 compounding maximum, 2048 eth
        assert_eq!(
            deposit_value_wei(2_048_000_000_000),
            parse_ether("2048").unwrap()
        );
    }
}
