use alloy::primitives::Address;
use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::parse_address;

#[derive(Debug, Clone)]
pub struct ChainData {
    pub id: u64,
    pub name: &'static str,
    pub deposit_contract: Address,
}

pub static CHAINDATA: Lazy<HashMap<u64, ChainData>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert(
        1,
        ChainData {
            id: 1,
            name: "mainnet",
            deposit_contract: parse_address!("0x00000000219ab540356cBB839Cbe05303d7705Fa"),
        },
    );
    m.insert(
        17000,
        ChainData {
            id: 17000,
            name: "holesky",
            deposit_contract: parse_address!("0x4242424242424242424242424242424242424242"),
        },
    );
    m.insert(
        560048,
        ChainData {
            id: 560048,
            name: "hoodi",
            deposit_contract: parse_address!("0x00000000219ab540356cBB839Cbe05303d7705Fa"),
        },
    );
    m
});

pub fn get(chain_id: u64) -> Option<&'static ChainData> {
    CHAINDATA.get(&chain_id)
}

pub fn name(chain_id: u64) -> &'static str {
    get(chain_id).map(|c| c.name).unwrap_or("unknown")
}

/// Known deposit contract for a chain, used when no --contract-address is
/// configured.
pub fn deposit_contract(chain_id: u64) -> Option<Address> {
    get(chain_id)
        .map(|c| c.deposit_contract)
        .filter(|addr| *addr != Address::ZERO)
}
