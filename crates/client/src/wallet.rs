//! The user's wallet: an account, the chain it is connected to, and a way to sign.

use crate::{fill_transaction, ClientError, RemoteSigner, SignerFn};
use alloy_consensus::TxEnvelope;
use alloy_network::{eip2718::Encodable2718, EthereumWallet, TransactionBuilder};
use alloy_primitives::{Address, Bytes};
use alloy_provider::Provider;
use alloy_rpc_types::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
use std::{fmt, sync::Arc};

/// Signs transactions for one account on one chain.
///
/// A wallet connected to L1 cannot sign for L2 and vice versa; callers check
/// [`WalletSigner::chain_id`] before asking it to sign.
#[derive(Clone)]
pub struct WalletSigner {
    address: Address,
    chain_id: u64,
    sign: SignerFn,
}

impl fmt::Debug for WalletSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletSigner")
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

impl WalletSigner {
    pub fn new(address: Address, chain_id: u64, sign: SignerFn) -> Self {
        Self {
            address,
            chain_id,
            sign,
        }
    }

    /// Local private key. The provider fills nonce, fees and gas before signing.
    pub fn local<P>(private_key: &str, chain_id: u64, provider: P) -> Result<Self, ClientError>
    where
        P: Provider + Clone + 'static,
    {
        let signer: PrivateKeySigner = private_key
            .parse()
            .map_err(|e| ClientError::InvalidPrivateKey(format!("{}", e)))?;
        let address = signer.address();
        let wallet = EthereumWallet::from(signer);

        let sign: SignerFn = Arc::new(move |tx: TransactionRequest| {
            let wallet = wallet.clone();
            let provider = provider.clone();
            Box::pin(async move {
                let filled_tx = fill_transaction(tx, &provider, address, chain_id).await?;

                let tx_envelope: TxEnvelope = filled_tx
                    .build(&wallet)
                    .await
                    .map_err(|e| eyre::eyre!("{}", e))?;

                let mut encoded = Vec::new();
                tx_envelope.encode_2718(&mut encoded);
                Ok(Bytes::from(encoded))
            })
        });

        Ok(Self::new(address, chain_id, sign))
    }

    /// Remote wallet. The provider fills nonce, fees and gas before the request is sent.
    pub fn remote<P>(remote: RemoteSigner, provider: P) -> Self
    where
        P: Provider + Clone + 'static,
    {
        let address = remote.address();
        let chain_id = remote.chain_id();

        let sign: SignerFn = Arc::new(move |tx| {
            let remote = remote.clone();
            let provider = provider.clone();
            Box::pin(async move {
                let filled_tx = fill_transaction(tx, &provider, address, chain_id).await?;
                remote.sign_transaction(filled_tx).await
            })
        });

        Self::new(address, chain_id, sign)
    }

    pub const fn address(&self) -> Address {
        self.address
    }

    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Sign a transaction request. Fails if the wallet declines.
    pub async fn sign(&self, tx: TransactionRequest) -> eyre::Result<Bytes> {
        (self.sign)(tx).await
    }
}
