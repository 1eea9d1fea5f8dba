use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::{fs::File, io::BufReader};

use eyre::{Result, WrapErr, bail};
use serde_derive::Deserialize;

use clap_serde_derive::{
    ClapSerde,
    clap::{self, Parser, Subcommand},
};

#[allow(deprecated)]
fn config_file() -> PathBuf {
    match std::env::var("XDG_CONFIG_HOME") {
        Ok(dir) => PathBuf::from(OsString::from(dir))
            .join("eth-depositor")
            .join("config.toml"),
        _ => std::env::home_dir()
            .unwrap()
            .join(".eth-depositor")
            .join("config.toml"),
    }
}

#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Config file
    #[arg(short, long = "config", default_value = config_file().into_os_string())]
    pub config_path: Option<PathBuf>,

    /// Global arguments
    #[command(flatten)]
    pub config: <CliArgs as ClapSerde>::Opt,

    // Subcommands
    #[command(subcommand)]
    pub command: CliCmd,
}

// Make sure all values are optional or parsing fails if a value
// is missing in the config file
#[derive(Debug, Clone, ClapSerde, Deserialize)]
pub struct CliArgs {
    /// Logging level
    #[arg(short, long = "log-level", required = false, default_value = "3")]
    pub log_level: Option<u8>,

    /// JsonRPC URL
    #[arg(long = "rpc-url", required = false)]
    pub rpc_url: Option<String>,

    /// Hex encoded signing key for outbound deposit transactions
    #[arg(long = "private-key", required = false)]
    pub private_key: Option<String>,

    /// Deposit contract address, resolved from the connected chain when omitted
    #[arg(long = "contract-address", required = false)]
    pub contract_address: Option<String>,

    /// Validator slots that pre-date the indexed contract
    #[arg(long = "index-offset", required = false, default_value = "4096")]
    pub index_offset: Option<u64>,

    /// Event scan window in blocks
    #[arg(long = "window-size", required = false, default_value = "100")]
    pub window_size: Option<u64>,
}

// Command line cmds
#[derive(Subcommand)]
pub enum CliCmd {
    /// Print version information
    #[clap(visible_alias = "ver")]
    Version {},
    /// Submit a single validator deposit
    #[clap(visible_alias = "s")]
    Send {
        /// Validator BLS public key (hex)
        #[arg(short, long = "pubkey", required = true)]
        pubkey: String,
        /// Withdrawal credentials (hex)
        #[arg(short, long = "withdrawal-credentials", visible_alias = "wc", required = true)]
        withdrawal_credentials: String,
        /// Deposit signature (hex)
        #[arg(short, long = "signature", required = true)]
        signature: String,
        /// Deposit amount in gwei, hashed into the deposit data root and
        /// sent as the transaction value
        #[arg(short, long = "amount", visible_alias = "gwei", required = false, default_value_t = 32_000_000_000)]
        amount: u64,
        /// tx common args
        #[command(flatten)]
        tx_args: TxCommonArgs,
    },
    /// Submit deposits from a record collection file or directory
    #[clap(visible_alias = "b")]
    Batch {
        /// deposit_data-*.json file, or a directory scanned for them
        #[arg(required = true)]
        source: PathBuf,
        /// tx common args
        #[command(flatten)]
        tx_args: TxCommonArgs,
    },
    /// Scan deposit events and index validator indices
    #[clap(visible_alias = "sc")]
    Scan {
        /// First block to scan
        #[arg(long = "from", required = false, default_value_t = 0)]
        from_block: u64,
        /// Last block to scan (default: current head)
        #[arg(long = "to", required = false)]
        to_block: Option<u64>,
        /// Append-only index file
        #[arg(short, long, required = false, default_value = "validator_index.txt")]
        out: String,
    },
    /// Query the deposit contract
    #[clap(visible_alias = "q")]
    #[command(subcommand)]
    Query(CmdQuery),
}

#[derive(Subcommand)]
pub enum CmdQuery {
    /// Deposit count (little-endian decoded)
    #[clap(visible_alias = "c")]
    Count {},
    /// Current deposit data root
    #[clap(visible_alias = "r")]
    Root {},
}

#[derive(Parser)]
#[clap(
    // Fees are "all-or-none", if one is present the other must be as well
    group(clap::ArgGroup::new("fee_args")
        .required(false)
        .multiple(true)
        .requires_all(&["max_fee", "max_priority"])
        .args(&["max_fee", "max_priority"])
    )
)]
pub struct TxCommonArgs {
    /// Max priority fee per gas in gwei
    #[arg(long, required = false)]
    pub max_priority: Option<f64>,
    /// Max fee per gas in gwei
    #[arg(long, required = false)]
    pub max_fee: Option<f64>,
    /// TX gas limit
    #[arg(long, required = false)]
    pub gas_limit: Option<u64>,
}

pub fn merge_args_from_file<T>(
    args: <T as ClapSerde>::Opt,
    maybe_path: Option<PathBuf>,
) -> Result<T>
where
    T: ClapSerde + serde::de::DeserializeOwned,
{
    match maybe_path {
        Some(path) => {
            let config_path = std::path::Path::new(&path);
            match config_path.exists() {
                true => {
                    let config = match config_path.extension().and_then(OsStr::to_str) {
                        Some("toml") => read_toml_config::<T, _>(config_path),
                        Some("json") => read_json_config::<T, _>(config_path),
                        Some("jsonc") => read_jsonc_config::<T, _>(config_path),
                        _ => {
                            bail!("Unsupported config file type: {:?}", path);
                        }
                    }?;
                    // Fields which are not None in `other` will be cleared and used to update `self`.
                    // Fields which are None in `other` will not be modified in `self`.
                    Ok(T::from(args).merge(config))
                }
                false => Ok(T::from(args)),
            }
        }
        None => Ok(T::from(args)),
    }
}

fn read_toml_config<T, P: AsRef<std::path::Path>>(path: P) -> Result<<T as ClapSerde>::Opt>
where
    P: AsRef<std::path::Path> + std::fmt::Debug + Copy,
    T: ClapSerde + serde::de::DeserializeOwned,
{
    let content = std::fs::read_to_string(path).wrap_err_with(|| format!("{:?}", path))?;
    Ok(toml::from_str(&content)?)
}

fn read_json_config<T: ClapSerde, P: AsRef<std::path::Path>>(
    path: P,
) -> Result<<T as ClapSerde>::Opt>
where
    P: AsRef<std::path::Path> + std::fmt::Debug + Copy,
{
    let f = File::open(path).wrap_err_with(|| format!("{:?}", path))?;
    let json_cfg = serde_json::from_reader::<_, <T as ClapSerde>::Opt>(BufReader::new(f))?;
    Ok(json_cfg)
}

fn read_jsonc_config<T: ClapSerde, P: AsRef<std::path::Path>>(
    path: P,
) -> Result<<T as ClapSerde>::Opt>
where
    P: AsRef<std::path::Path> + std::fmt::Debug + Copy,
{
    let f = File::open(path).wrap_err_with(|| format!("{:?}", path))?;
    let jsonc_cfg = serde_jsonc::from_reader::<_, <T as ClapSerde>::Opt>(BufReader::new(f))?;
    Ok(jsonc_cfg)
}
