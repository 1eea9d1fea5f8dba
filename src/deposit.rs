use alloy::primitives::{B256, FixedBytes};
use serde_derive::Deserialize;

use crate::codec;
use crate::error::{Error, Result};

pub const PUBKEY_BYTES: usize = 48;
pub const WITHDRAWAL_CREDENTIALS_BYTES: usize = 32;
pub const SIGNATURE_BYTES: usize = 96;

/// The SSZ container the deposit contract reconstructs on-chain. The
/// `tree_hash_root` of this struct must match the contract's own
/// recomputation over the raw call arguments or the deposit reverts.
#[derive(Debug, Clone, PartialEq, tree_hash_derive::TreeHash, serde_derive::Serialize)]
pub struct DepositData {
    /// Validator public key
    pub pubkey: FixedBytes<48>,
    /// Withdrawal credentials
    pub withdrawal_credentials: B256,
    /// Amount of ether deposited in gwei
    #[serde(with = "serde_utils::quoted_u64")]
    pub amount: u64,
    /// Deposit signature
    pub signature: FixedBytes<96>,
}

impl DepositData {
    pub fn hash_tree_root(&self) -> B256 {
        use tree_hash::TreeHash; // import tree_hash_root() trait
        self.tree_hash_root()
    }
}

/// One validator's deposit intent as found in `deposit_data-*.json`
/// collection files: hex-encoded fields (no `0x` prefix expected) and a
/// gwei-denominated integer amount.
#[derive(Debug, Clone, Deserialize)]
pub struct DepositRecord {
    pub pubkey: String,
    pub withdrawal_credentials: String,
    pub amount: u64,
    pub signature: String,
}

impl DepositRecord {
    /// Byte lengths are checked before any hashing proceeds, a record with
    /// wrong lengths fails fast instead of being truncated or padded.
    pub fn to_deposit_data(&self) -> Result<DepositData> {
        Ok(DepositData {
            pubkey: parse_fixed::<PUBKEY_BYTES>("pubkey", &self.pubkey)?.into(),
            withdrawal_credentials: parse_fixed::<WITHDRAWAL_CREDENTIALS_BYTES>(
                "withdrawal_credentials",
                &self.withdrawal_credentials,
            )?
            .into(),
            amount: self.amount,
            signature: parse_fixed::<SIGNATURE_BYTES>("signature", &self.signature)?.into(),
        })
    }
}

fn parse_fixed<const N: usize>(field: &'static str, s: &str) -> Result<[u8; N]> {
    let bytes = codec::hex_to_bytes(s)?;
    let actual = bytes.len();
    bytes.try_into().map_err(|_| Error::MalformedRecord {
        field,
        expected: N,
        actual,
    })
}
