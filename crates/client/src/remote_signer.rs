//! Remote wallet that signs over JSON-RPC.
//!
//! The signer exposes `eth_accounts`, `eth_chainId` and `eth_signTransaction`.
//! This covers a signer-proxy in front of an HSM as well as a browser-style
//! wallet bridge that holds the user's key.

use alloy_primitives::{Address, Bytes, U64};
use alloy_rpc_types::eth::TransactionRequest;
use eyre::{bail, eyre, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::info;

const NO_PARAMS: [(); 0] = [];

/// A wallet reachable over HTTP that signs transactions for one account.
#[derive(Debug, Clone)]
pub struct RemoteSigner {
    client: reqwest::Client,
    proxy_url: String,
    address: Address,
    chain_id: u64,
}

impl RemoteSigner {
    /// Creates a remote signer for a known account and chain.
    pub fn new(proxy_url: impl Into<String>, address: Address, chain_id: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            proxy_url: proxy_url.into(),
            address,
            chain_id,
        }
    }

    /// Connects to a wallet and adopts its first account and current chain.
    pub async fn connect(proxy_url: impl Into<String>) -> Result<Self> {
        let mut signer = Self::new(proxy_url, Address::ZERO, 0);

        let accounts: Vec<Address> = signer.call("eth_accounts", NO_PARAMS).await?;
        signer.address = accounts
            .first()
            .copied()
            .ok_or_else(|| eyre!("wallet at {} exposes no accounts", signer.proxy_url))?;

        let chain_id: U64 = signer.call("eth_chainId", NO_PARAMS).await?;
        signer.chain_id = chain_id.to::<u64>();

        info!(
            address = %signer.address,
            chain_id = signer.chain_id,
            url = %signer.proxy_url,
            "Connected remote wallet"
        );
        Ok(signer)
    }

    /// Returns the signer's address.
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Returns the chain ID the wallet is connected to.
    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Signs a filled transaction and returns raw EIP-2718 bytes ready for broadcast.
    pub async fn sign_transaction(&self, tx: TransactionRequest) -> Result<Bytes> {
        let signed: SignedTransactionResponse = self.call("eth_signTransaction", [tx]).await?;
        Ok(signed.raw.parse()?)
    }

    async fn call<P, R>(&self, method: &'static str, params: P) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: 1,
        };

        let response = self
            .client
            .post(&self.proxy_url)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            bail!("wallet returned {status} for {method}: {body}");
        }

        response.json::<JsonRpcResponse<R>>().await?.into_result()
    }
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<T> {
    jsonrpc: &'static str,
    method: &'static str,
    params: T,
    id: u32,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

impl<T> JsonRpcResponse<T> {
    fn into_result(self) -> Result<T> {
        match (self.result, self.error) {
            (Some(result), _) => Ok(result),
            (None, Some(error)) => bail!("JSON-RPC error {}: {}", error.code, error.message),
            (None, None) => bail!("JSON-RPC response carries neither result nor error"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

/// Response from eth_signTransaction containing the signed transaction.
#[derive(Debug, Deserialize)]
struct SignedTransactionResponse {
    /// The signed transaction as hex-encoded bytes.
    raw: String,
}
