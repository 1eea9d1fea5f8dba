use alloy::{
    network::EthereumWallet,
    primitives::BlockNumber,
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
};
use colored::*;
use eyre::{Result, WrapErr, bail};
use log::*;
use std::sync::Mutex;
use url::Url;

use crate::chains;

/// Lazily connected JSON-RPC client. When a signer is supplied the provider
/// is built with a wallet layer so contract calls can be sent directly.
pub struct Client {
    pub rpc_url: String,
    signer: Option<PrivateKeySigner>,
    chain_id: Mutex<u64>,
    provider: Mutex<Option<DynProvider>>,
}

impl Client {
    pub fn new(url: &str, signer: Option<PrivateKeySigner>) -> Result<Client> {
        if url.trim().is_empty() {
            bail!("must specify a valid --rpc-url")
        };
        Url::parse(url).wrap_err_with(|| format!("invalid --rpc-url '{}'", url))?;

        Ok(Client {
            rpc_url: url.to_string(),
            signer,
            chain_id: Mutex::new(0),
            provider: Mutex::new(None),
        })
    }

    pub fn is_connected(&self) -> bool {
        self.provider.lock().unwrap().is_some() && *self.chain_id.lock().unwrap() != 0
    }

    pub async fn provider(&self) -> Result<DynProvider> {
        if !self.is_connected() {
            self._connect().await?;
        }
        Ok(DynProvider::clone(
            self.provider.lock().unwrap().as_ref().unwrap(),
        ))
    }

    async fn _connect(&self) -> Result<()> {
        let provider = match &self.signer {
            Some(signer) => DynProvider::new(
                ProviderBuilder::new()
                    .wallet(EthereumWallet::from(signer.clone()))
                    .connect(self.rpc_url.as_str())
                    .await
                    .wrap_err_with(|| format!("Connect failed to '{}'", self.rpc_url))?,
            ),
            None => DynProvider::new(
                ProviderBuilder::new()
                    .connect(self.rpc_url.as_str())
                    .await
                    .wrap_err_with(|| format!("Connect failed to '{}'", self.rpc_url))?,
            ),
        };

        // Get chain ID and height
        let chain_id = provider.get_chain_id().await?;
        let height = provider.get_block_number().await?;

        *self.provider.lock().unwrap() = Some(provider);
        *self.chain_id.lock().unwrap() = chain_id;

        debug!(
            "Connected to {} {}:{} {}:{}",
            chains::name(chain_id).green().bold(),
            "chainId".white().bold(),
            format!("{:?}", chain_id).blue(),
            "height".white().bold(),
            format!("{:?}", height).blue(),
        );
        Ok(())
    }

    pub fn chain_id(&self) -> u64 {
        *self.chain_id.lock().unwrap()
    }

    pub async fn block_number(&self) -> Result<BlockNumber> {
        Ok(self.provider().await?.get_block_number().await?)
    }
}
