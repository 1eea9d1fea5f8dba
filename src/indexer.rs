use std::io::Write;

use alloy::primitives::hex;
use log::*;

use crate::{
    codec,
    contract::{DepositContract, RawDepositEvent},
    error::{Error, Result},
};

/// Window sizing trades request count against RPC result-size limits, it
/// never affects what gets written.
pub const DEFAULT_WINDOW_SIZE: u64 = 100;
/// Validator slots that pre-date the indexed contract.
pub const DEFAULT_INDEX_OFFSET: u64 = 4096;

#[derive(Debug, Clone, Copy)]
pub struct ScanOpts {
    pub from_block: u64,
    /// Chain head observed at scan start. Blocks arriving while the scan
    /// runs are picked up by the next run.
    pub to_block: u64,
    pub window_size: u64,
    pub index_offset: u64,
}

/// Validator index from the event's packed little-endian index field.
pub fn validator_index(raw_index: &[u8], offset: u64) -> Result<u64> {
    let index = codec::decode_le(raw_index)?;
    let index = u64::try_from(index)
        .map_err(|_| Error::MalformedEncoding(format!("deposit index {} exceeds u64", index)))?;
    Ok(index + offset)
}

/// Fetch deposit events in block-aligned windows and append one
/// `<pubkey>:<validator-index>` line per event. Output is flushed per
/// window, a mid-window failure aborts the scan with the log truncated at
/// the last fully written window. Returns the number of events indexed.
pub async fn scan<C: DepositContract>(
    contract: &C,
    opts: &ScanOpts,
    out: &mut impl Write,
) -> Result<u64> {
    let window_size = opts.window_size.max(1);
    let mut cursor = opts.from_block;
    let mut total = 0u64;
    while cursor <= opts.to_block {
        // Window ends land on multiples of the window size, so resizing
        // windows reshapes requests without moving range boundaries past
        // each other.
        let window_end = ((cursor / window_size) + 1) * window_size;
        let window_end = window_end.min(opts.to_block);

        info!("Fetching events from block {} to {}", cursor, window_end);
        let events = contract.deposit_events(cursor, window_end).await?;
        for event in &events {
            append_event(out, event, opts.index_offset)?;
            total += 1;
        }
        out.flush()?;

        cursor = window_end + 1;
    }
    Ok(total)
}

fn append_event(out: &mut impl Write, event: &RawDepositEvent, offset: u64) -> Result<()> {
    let index = validator_index(&event.index, offset)?;
    debug!("Block Number: {}", event.block_number);
    debug!("Transaction: {}", event.tx_hash);
    debug!("Pubkey: 0x{}", hex::encode(&event.pubkey));
    debug!(
        "Withdrawal Credentials: 0x{}",
        hex::encode(&event.withdrawal_credentials)
    );
    debug!("Amount: 0x{}", hex::encode(&event.amount));
    debug!("Signature: 0x{}", hex::encode(&event.signature));
    debug!("Index: {}", index);
    writeln!(out, "0x{}:{}", hex::encode(&event.pubkey), index)?;
    Ok(())
}
