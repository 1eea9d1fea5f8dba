#[macro_use]
extern crate log;

use clap::{CommandFactory, Parser};
use colored::*;
use eyre::{Result, WrapErr, bail, eyre};

use alloy::{
    primitives::{Address, U256, hex, utils::parse_units},
    signers::local::PrivateKeySigner,
};

use eth_depositor::{
    batch, chains, codec,
    config::{self, *},
    contract::{AlloyDepositContract, DepositContract, TxFees},
    deposit::DepositRecord,
    indexer::{self, ScanOpts},
    logger::Logger,
    rpc::Client,
    submit::Submitter,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse args with clap
    let args = Cli::parse();

    // Load config file
    let config = config::merge_args_from_file::<CliArgs>(args.config, args.config_path)?;

    // Setup our global logger
    let logger = Logger::new(config.log_level.unwrap_or(3u8));
    logger.set_global();

    cmd_dispatch(&config, &args.command).await
}

async fn cmd_dispatch(config: &CliArgs, cmd: &CliCmd) -> Result<()> {
    match cmd {
        CliCmd::Version {} => {
            let mut ver = Cli::command().render_version();
            ver.pop(); // remove "\n"
            println!("version: {}", ver);
        }
        CliCmd::Send {
            pubkey,
            withdrawal_credentials,
            signature,
            amount,
            tx_args,
        } => {
            let client = build_client(config, true)?;
            let contract = deposit_contract(config, &client).await?;
            let submitter = Submitter::new(&contract, tx_fees(tx_args)?);
            let record = DepositRecord {
                pubkey: pubkey.clone(),
                withdrawal_credentials: withdrawal_credentials.clone(),
                amount: *amount,
                signature: signature.clone(),
            };
            let receipt = submitter.submit(&record).await?;
            println!(
                "Transaction {} confirmed in block: {}",
                receipt.tx_hash.to_string().red(),
                receipt.block_number.to_string().blue()
            );
        }
        CliCmd::Batch { source, tx_args } => {
            let client = build_client(config, true)?;
            let contract = deposit_contract(config, &client).await?;
            let submitter = Submitter::new(&contract, tx_fees(tx_args)?);
            let summary = batch::process_source(&submitter, source).await?;
            println!(
                "{} submitted, {} skipped, {} failed",
                summary.submitted.to_string().green(),
                summary.skipped.to_string().yellow(),
                summary.failed.to_string().red(),
            );
        }
        CliCmd::Scan {
            from_block,
            to_block,
            out,
        } => {
            let client = build_client(config, false)?;
            let contract = deposit_contract(config, &client).await?;
            // Head is captured once, blocks arriving during a long scan
            // belong to the next run
            let to_block = match to_block {
                Some(block) => *block,
                None => client.block_number().await?,
            };
            let opts = ScanOpts {
                from_block: *from_block,
                to_block,
                window_size: config.window_size.unwrap_or(indexer::DEFAULT_WINDOW_SIZE),
                index_offset: config.index_offset.unwrap_or(indexer::DEFAULT_INDEX_OFFSET),
            };
            info!(
                "Scanning blocks {}..={} (window {}, index offset {})",
                opts.from_block, opts.to_block, opts.window_size, opts.index_offset
            );
            let out_path = shellexpand::full(out)?.to_string();
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&out_path)
                .wrap_err_with(|| format!("cannot open index file '{}'", out_path))?;
            let total = indexer::scan(&contract, &opts, &mut file).await?;
            println!(
                "Indexed {} deposit events to \"{}\"",
                total.to_string().magenta(),
                out_path.green()
            );
        }
        CliCmd::Query(subcmd) => {
            let client = build_client(config, false)?;
            let contract = deposit_contract(config, &client).await?;
            match subcmd {
                CmdQuery::Count {} => {
                    let raw = contract.deposit_count().await?;
                    let count = codec::decode_le(&raw)?;
                    println!(
                        "Deposit count: {} (raw: 0x{})",
                        count.to_string().blue(),
                        hex::encode(&raw)
                    );
                }
                CmdQuery::Root {} => {
                    let root = contract.deposit_root().await?;
                    println!("Deposit root: {}", root.to_string().blue());
                }
            }
        }
    };
    Ok(())
}

fn build_client(config: &CliArgs, with_signer: bool) -> Result<Client> {
    let rpc_url = config.rpc_url.clone().unwrap_or_default();
    let signer = match with_signer {
        true => {
            let key = config
                .private_key
                .clone()
                .ok_or_else(|| eyre!("must specify --private-key for deposit submission"))?;
            Some(
                key.parse::<PrivateKeySigner>()
                    .wrap_err_with(|| "private key parsing failed")?,
            )
        }
        false => None,
    };
    Client::new(&rpc_url, signer)
}

async fn deposit_contract(config: &CliArgs, client: &Client) -> Result<AlloyDepositContract> {
    let provider = client.provider().await?;
    let address = match &config.contract_address {
        Some(addr) => addr
            .parse::<Address>()
            .wrap_err_with(|| "contract address parsing failed")?,
        None => match chains::deposit_contract(client.chain_id()) {
            Some(addr) => addr,
            None => bail!("Unknown chain, must specify --contract-address"),
        },
    };
    debug!("Deposit contract: {}", address.to_string().blue());
    Ok(AlloyDepositContract::new(address, provider))
}

fn tx_fees(tx_args: &TxCommonArgs) -> Result<TxFees> {
    let to_wei = |gwei: f64| -> Result<u128> {
        let wei: U256 = parse_units(&gwei.to_string(), "gwei")?.into();
        Ok(wei.to::<u128>())
    };
    let max_fee_per_gas = match tx_args.max_fee {
        Some(gwei) => Some(to_wei(gwei)?),
        None => None,
    };
    let max_priority_fee_per_gas = match tx_args.max_priority {
        Some(gwei) => Some(to_wei(gwei)?),
        None => None,
    };
    Ok(TxFees {
        gas_limit: tx_args.gas_limit,
        max_fee_per_gas,
        max_priority_fee_per_gas,
    })
}
