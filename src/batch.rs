use std::io::BufReader;
use std::path::{Path, PathBuf};

use colored::*;
use log::*;

use crate::{
    contract::DepositContract,
    deposit::DepositRecord,
    error::{Error, Result},
    markers::{CompletionStore, FsCompletionStore},
    submit::Submitter,
};

/// Collection files inside a source directory follow a fixed naming
/// convention, anything else in the directory is ignored.
pub const RECORD_FILE_PREFIX: &str = "deposit_data-";
pub const RECORD_FILE_SUFFIX: &str = ".json";

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct BatchSummary {
    pub submitted: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    fn merge(&mut self, other: BatchSummary) {
        self.submitted += other.submitted;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

pub fn load_records(path: &Path) -> Result<Vec<DepositRecord>> {
    let file = std::fs::File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// `deposit_data-*.json` files in `dir`, sorted by name.
pub fn collection_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if path.is_file()
            && name.starts_with(RECORD_FILE_PREFIX)
            && name.ends_with(RECORD_FILE_SUFFIX)
        {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Process one record collection file, or every `deposit_data-*.json` file
/// in a directory. Each file gets its own marker store next to it.
pub async fn process_source<C: DepositContract>(
    submitter: &Submitter<'_, C>,
    source: &Path,
) -> Result<BatchSummary> {
    if !source.exists() {
        return Err(Error::SourceNotFound(source.to_path_buf()));
    }
    let files = match source.is_dir() {
        true => collection_files(source)?,
        false => vec![source.to_path_buf()],
    };
    if files.is_empty() {
        warn!(
            "No {}*{} files in {}",
            RECORD_FILE_PREFIX,
            RECORD_FILE_SUFFIX,
            source.display()
        );
    }

    let mut summary = BatchSummary::default();
    for file in files {
        info!("Processing {}", file.display().to_string().green());
        let records = load_records(&file)?;
        let store = FsCompletionStore::for_source(&file)?;
        summary.merge(process_records(submitter, &store, &records).await?);
    }
    Ok(summary)
}

/// Strictly sequential on purpose: deposits from one signing key must stay
/// nonce-ordered, so the next record is not touched until the previous
/// transaction has been broadcast.
pub async fn process_records<C: DepositContract>(
    submitter: &Submitter<'_, C>,
    store: &impl CompletionStore,
    records: &[DepositRecord],
) -> Result<BatchSummary> {
    let mut summary = BatchSummary::default();
    for record in records {
        if store.has(&record.pubkey)? {
            info!(
                "Transaction for pubkey {} already processed. Skipping.",
                record.pubkey.blue()
            );
            summary.skipped += 1;
            continue;
        }
        match submitter.send(record).await {
            Ok(submitted) => {
                // Marked at transaction-hash time, a later revert does not
                // unmark. Re-running the batch will not resubmit this key.
                store.mark(&record.pubkey)?;
                summary.submitted += 1;
                if let Err(e) = submitter.wait(&submitted).await {
                    warn!("Confirmation failed for pubkey {}: {}", record.pubkey, e);
                }
            }
            Err(e) => {
                // Best effort, one attempt per run. The record stays
                // unmarked so a re-run picks it up again.
                error!(
                    "Error sending transaction for pubkey {}: {}",
                    record.pubkey, e
                );
                summary.failed += 1;
            }
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use alloy::primitives::{B256, Bytes, TxHash, U256, hex};

    use super::*;
    use crate::{
        contract::{DepositReceipt, RawDepositEvent, TxFees},
        deposit::DepositData,
        markers::MemoryCompletionStore,
    };

    #[derive(Default)]
    struct MockContract {
        sent: Mutex<Vec<String>>,
        fail_send_for: Option<String>,
        fail_confirm: bool,
    }

    impl DepositContract for MockContract {
        async fn send_deposit(
            &self,
            data: &DepositData,
            _value_wei: U256,
            _fees: &TxFees,
        ) -> crate::error::Result<TxHash> {
            let pubkey = hex::encode(data.pubkey);
            if self.fail_send_for.as_deref() == Some(pubkey.as_str()) {
                return Err(Error::submission("rpc rejected"));
            }
            let mut sent = self.sent.lock().unwrap();
            sent.push(pubkey);
            Ok(TxHash::with_last_byte(sent.len() as u8))
        }

        async fn confirm_deposit(&self, tx_hash: TxHash) -> crate::error::Result<DepositReceipt> {
            if self.fail_confirm {
                return Err(Error::rpc("confirmation timeout"));
            }
            Ok(DepositReceipt {
                tx_hash,
                block_number: 1,
            })
        }

        async fn deposit_count(&self) -> crate::error::Result<Bytes> {
            unreachable!("not used by the batch driver")
        }

        async fn deposit_root(&self) -> crate::error::Result<B256> {
            unreachable!("not used by the batch driver")
        }

        async fn deposit_events(
            &self,
            _from_block: u64,
            _to_block: u64,
        ) -> crate::error::Result<Vec<RawDepositEvent>> {
            unreachable!("not used by the batch driver")
        }
    }

    fn record(fill: u8) -> DepositRecord {
        let byte = format!("{:02x}", fill);
        DepositRecord {
            pubkey: byte.repeat(48),
            withdrawal_credentials: byte.repeat(32),
            amount: 32_000_000_000,
            signature: byte.repeat(96),
        }
    }

    #[tokio::test]
    async fn marked_record_is_skipped() {
        let contract = MockContract::default();
        let submitter = Submitter::new(&contract, TxFees::default());
        let store = MemoryCompletionStore::new();
        let (a, b) = (record(0xaa), record(0xbb));
        store.mark(&a.pubkey).unwrap();

        let summary = process_records(&submitter, &store, &[a.clone(), b.clone()])
            .await
            .unwrap();

        assert_eq!(
            summary,
            BatchSummary {
                submitted: 1,
                skipped: 1,
                failed: 0
            }
        );
        // only B was submitted, exactly once
        assert_eq!(*contract.sent.lock().unwrap(), vec![b.pubkey.clone()]);
        assert!(store.has(&b.pubkey).unwrap());
    }

    #[tokio::test]
    async fn failed_record_does_not_abort_the_batch() {
        let (a, b) = (record(0xaa), record(0xbb));
        let contract = MockContract {
            fail_send_for: Some(a.pubkey.clone()),
            ..Default::default()
        };
        let submitter = Submitter::new(&contract, TxFees::default());
        let store = MemoryCompletionStore::new();

        let summary = process_records(&submitter, &store, &[a.clone(), b.clone()])
            .await
            .unwrap();

        assert_eq!(
            summary,
            BatchSummary {
                submitted: 1,
                skipped: 0,
                failed: 1
            }
        );
        assert!(!store.has(&a.pubkey).unwrap());
        assert!(store.has(&b.pubkey).unwrap());
    }

    #[tokio::test]
    async fn marker_is_created_even_when_confirmation_fails() {
        let contract = MockContract {
            fail_confirm: true,
            ..Default::default()
        };
        let submitter = Submitter::new(&contract, TxFees::default());
        let store = MemoryCompletionStore::new();
        let a = record(0xaa);

        let summary = process_records(&submitter, &store, std::slice::from_ref(&a))
            .await
            .unwrap();

        // marked at transaction-hash time, the confirmation failure is only logged
        assert_eq!(summary.submitted, 1);
        assert!(store.has(&a.pubkey).unwrap());
    }

    #[tokio::test]
    async fn missing_source_is_an_error() {
        let contract = MockContract::default();
        let submitter = Submitter::new(&contract, TxFees::default());
        let missing = Path::new("/nonexistent/deposit_data-00.json");

        match process_source(&submitter, missing).await {
            Err(Error::SourceNotFound(path)) => assert_eq!(path, missing.to_path_buf()),
            other => panic!("expected SourceNotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn directory_source_processes_matching_files_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let write = |name: &str, records: &[DepositRecord]| {
            let json = serde_json::json!(
                records
                    .iter()
                    .map(|r| {
                        serde_json::json!({
                            "pubkey": r.pubkey,
                            "withdrawal_credentials": r.withdrawal_credentials,
                            "amount": r.amount,
                            "signature": r.signature,
                        })
                    })
                    .collect::<Vec<_>>()
            );
            std::fs::write(tmp.path().join(name), json.to_string()).unwrap();
        };
        let (a, b) = (record(0xaa), record(0xbb));
        write("deposit_data-02.json", std::slice::from_ref(&b));
        write("deposit_data-01.json", std::slice::from_ref(&a));
        write("ignored.json", std::slice::from_ref(&a));

        let contract = MockContract::default();
        let submitter = Submitter::new(&contract, TxFees::default());
        let summary = process_source(&submitter, tmp.path()).await.unwrap();

        assert_eq!(summary.submitted, 2);
        // file-name order, the ignored file is not picked up
        assert_eq!(
            *contract.sent.lock().unwrap(),
            vec![a.pubkey.clone(), b.pubkey.clone()]
        );
        // marker store sits next to each collection file
        assert!(
            tmp.path()
                .join("deposit_data-01.json-locks")
                .join(format!("{}.lock", a.pubkey))
                .exists()
        );
    }
}
