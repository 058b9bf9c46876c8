//! Proof generation for L2→L1 withdrawals.
//!
//! A withdrawal is proven against a dispute game whose L2 block is at or after
//! the block that initiated it. The proof is a storage proof of the
//! `sentMessages` slot in the L2ToL1MessagePasser at the game's L2 block.

use crate::types::WithdrawalHash;
use alloy_contract::private::Provider;
use alloy_primitives::{keccak256, Address, BlockNumber, Bytes, B256, U256};
use alloy_rpc_types_eth::BlockNumberOrTag;
use binding::opstack::{
    IDisputeGameFactory::{self, GameSearchResult},
    IFaultDisputeGame, IOptimismPortal2, OutputRootProof, MESSAGE_PASSER_ADDRESS,
    OUTPUT_VERSION_V0,
};
use eyre::{eyre, Result};
use tracing::debug;

/// How many recent games to search, ~40 days at one game per hour.
pub const MAX_GAMES_TO_CHECK: u64 = 1000;

/// Everything the portal needs besides the withdrawal itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProofInput {
    pub dispute_game_index: U256,
    /// L2 block committed by the selected game
    pub game_l2_block: BlockNumber,
    pub version: B256,
    pub state_root: B256,
    pub message_passer_storage_root: B256,
    pub latest_blockhash: B256,
    pub withdrawal_proof: Vec<Bytes>,
}

impl ProofInput {
    pub const fn output_root_proof(&self) -> OutputRootProof {
        OutputRootProof {
            version: self.version,
            stateRoot: self.state_root,
            messagePasserStorageRoot: self.message_passer_storage_root,
            latestBlockhash: self.latest_blockhash,
        }
    }
}

/// Build the proof input for a withdrawal initiated at `block_number`.
///
/// Fails if no game covers the block yet; callers are expected to wait for
/// provability first.
pub async fn generate_proof<P1, P2>(
    l1_provider: &P1,
    l2_provider: &P2,
    portal_address: Address,
    factory_address: Address,
    withdrawal_hash: WithdrawalHash,
    block_number: BlockNumber,
) -> Result<ProofInput>
where
    P1: Provider,
    P2: Provider,
{
    let (dispute_game_index, game_l2_block) =
        find_game_for_withdrawal(l1_provider, portal_address, factory_address, block_number)
            .await?
            .ok_or_else(|| eyre!("no dispute game covers L2 block {block_number} yet"))?;

    debug!(
        game_index = %dispute_game_index,
        game_l2_block,
        withdrawal_block = block_number,
        "Found covering dispute game"
    );

    // The output root proof must match the game's block, not the withdrawal's
    let block = l2_provider
        .get_block_by_number(BlockNumberOrTag::Number(game_l2_block))
        .await?
        .ok_or_else(|| eyre!("Block not found: {}", game_l2_block))?;

    let storage_slot = compute_storage_slot(withdrawal_hash);
    let proof_result = l2_provider
        .get_proof(MESSAGE_PASSER_ADDRESS, vec![storage_slot])
        .block_id(BlockNumberOrTag::Number(game_l2_block).into())
        .await?;

    let withdrawal_proof = proof_result
        .storage_proof
        .first()
        .ok_or_else(|| eyre!("No storage proof returned"))?
        .proof
        .clone();

    debug!(proof_nodes = withdrawal_proof.len(), "Generated storage proof");

    Ok(ProofInput {
        dispute_game_index,
        game_l2_block,
        version: OUTPUT_VERSION_V0,
        state_root: block.header.state_root,
        message_passer_storage_root: proof_result.storage_hash,
        latest_blockhash: block.header.hash,
        withdrawal_proof,
    })
}

/// Latest games of the portal's respected type, newest first.
pub async fn latest_games<P>(
    l1_provider: &P,
    portal_address: Address,
    factory_address: Address,
    limit: u64,
) -> Result<Vec<GameSearchResult>>
where
    P: Provider,
{
    let portal = IOptimismPortal2::new(portal_address, l1_provider);
    let game_type = portal.respectedGameType().call().await?;

    let factory = IDisputeGameFactory::new(factory_address, l1_provider);
    let game_count = factory.gameCount().call().await?;
    if game_count == U256::ZERO {
        return Ok(Vec::new());
    }

    let start = game_count - U256::from(1);
    let games = factory
        .findLatestGames(game_type, start, U256::from(limit))
        .call()
        .await?;

    if let Some(game) = games.iter().find(|g| g.index >= game_count) {
        return Err(eyre!(
            "Invalid game index {} >= game count {}",
            game.index,
            game_count
        ));
    }

    debug!(game_type, found = games.len(), total = %game_count, "Fetched latest games");
    Ok(games)
}

/// Proxy address packed into the low 160 bits of a GameId.
pub fn game_proxy_address(game: &GameSearchResult) -> Address {
    Address::from_slice(&game.metadata.as_slice()[12..32])
}

/// L2 block number a game commits to.
pub async fn game_l2_block<P>(l1_provider: &P, game: &GameSearchResult) -> Result<u64>
where
    P: Provider,
{
    let address = game_proxy_address(game);
    let l2_block = IFaultDisputeGame::new(address, l1_provider)
        .l2BlockNumber()
        .call()
        .await
        .map_err(|e| eyre!("l2BlockNumber failed on game {} at {}: {}", game.index, address, e))?;

    Ok(l2_block.to::<u64>())
}

/// Find the oldest game whose L2 block covers `withdrawal_l2_block`.
///
/// Returns `None` when even the newest game is behind the withdrawal.
pub async fn find_game_for_withdrawal<P>(
    l1_provider: &P,
    portal_address: Address,
    factory_address: Address,
    withdrawal_l2_block: u64,
) -> Result<Option<(U256, u64)>>
where
    P: Provider,
{
    let games = latest_games(
        l1_provider,
        portal_address,
        factory_address,
        MAX_GAMES_TO_CHECK,
    )
    .await?;

    // games[0] is the newest. Find the first game that does NOT cover; the one
    // before it is the oldest that does.
    let mut lo = 0;
    let mut hi = games.len();
    while lo < hi {
        let mi = lo + (hi - lo) / 2;
        if game_l2_block(l1_provider, &games[mi]).await? >= withdrawal_l2_block {
            lo = mi + 1;
        } else {
            hi = mi;
        }
    }

    if lo == 0 {
        return Ok(None);
    }

    let selected = &games[lo - 1];
    let l2_block = game_l2_block(l1_provider, selected).await?;
    Ok(Some((selected.index, l2_block)))
}

/// Storage slot of `sentMessages[withdrawal_hash]` in the L2ToL1MessagePasser.
///
/// The mapping sits at slot 0, so the slot is `keccak256(hash ‖ 0)`.
pub fn compute_storage_slot(withdrawal_hash: B256) -> B256 {
    let mut data = [0u8; 64];
    data[0..32].copy_from_slice(withdrawal_hash.as_slice());
    keccak256(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, b256};

    #[test]
    fn test_storage_slot_format() {
        assert_eq!(compute_storage_slot(B256::ZERO), keccak256([0u8; 64]));

        let slot = compute_storage_slot(B256::from([1u8; 32]));
        assert_ne!(slot, compute_storage_slot(B256::from([2u8; 32])));
    }

    #[test]
    fn test_game_proxy_address_from_metadata() {
        let game = GameSearchResult {
            index: U256::from(5),
            metadata: b256!("0000000100000000676f0c1b0d83dab629f0e0f9d36c0cbc89b69a489f0751bd"),
            timestamp: 0,
            rootClaim: B256::ZERO,
            extraData: Bytes::new(),
        };

        assert_eq!(
            game_proxy_address(&game),
            address!("0d83dab629f0e0F9d36c0Cbc89B69a489f0751bD")
        );
    }

    #[test]
    fn test_output_root_proof_from_input() {
        let input = ProofInput {
            dispute_game_index: U256::from(42),
            state_root: B256::repeat_byte(0xaa),
            message_passer_storage_root: B256::repeat_byte(0xbb),
            latest_blockhash: B256::repeat_byte(0xcc),
            ..Default::default()
        };

        let proof = input.output_root_proof();
        assert_eq!(proof.version, OUTPUT_VERSION_V0);
        assert_eq!(proof.stateRoot, B256::repeat_byte(0xaa));
        assert_eq!(proof.messagePasserStorageRoot, B256::repeat_byte(0xbb));
        assert_eq!(proof.latestBlockhash, B256::repeat_byte(0xcc));
    }
}
