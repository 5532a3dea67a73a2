//! Dice game interface and reference contract

use alloy_primitives::map::AddressHashMap;
use tracing::debug;

use crate::context::CallContext;
use crate::error::GameError;
use crate::events::Event;
use crate::roll::PredictedOutcome;
use crate::types::{Address, Amount, STAKE_REQUIREMENT, U256};

/// What the predictor needs from the dice game.
///
/// `play` must derive its outcome from the block's parent hash, the game's own
/// address and the counter value at the time of the call, the same way
/// [`PredictedOutcome::compute`] does.
pub trait DiceGame {
    /// Address the game is deployed at
    fn address(&self) -> Address;

    /// Current sequence counter
    fn sequence_counter(&self) -> U256;

    /// Play once, sending `value` from `player`
    fn play(
        &mut self,
        ctx: &mut CallContext<'_>,
        player: Address,
        value: Amount,
    ) -> Result<(), GameError>;
}

/// Reference dice game.
///
/// Keeps stakes, advances its counter on every play and tallies wins per player.
#[derive(Clone, Debug)]
pub struct DiceContract {
    address: Address,
    counter: U256,
    open: bool,
    wins: AddressHashMap<u64>,
    plays: u64,
}

impl DiceContract {
    /// Deploy a fresh game
    pub fn new(address: Address) -> Self {
        Self::with_counter(address, U256::ZERO)
    }

    /// Deploy a game whose counter starts at `counter`
    pub fn with_counter(address: Address, counter: U256) -> Self {
        Self { address, counter, open: true, wins: AddressHashMap::default(), plays: 0 }
    }

    /// Stop accepting plays
    pub fn close(&mut self) {
        self.open = false;
    }

    /// Accept plays again
    pub fn reopen(&mut self) {
        self.open = true;
    }

    /// Whether plays are accepted
    pub const fn is_open(&self) -> bool {
        self.open
    }

    /// Wins recorded for a player
    pub fn wins_of(&self, player: &Address) -> u64 {
        self.wins.get(player).copied().unwrap_or_default()
    }

    /// Total plays settled
    pub const fn plays(&self) -> u64 {
        self.plays
    }
}

impl DiceGame for DiceContract {
    fn address(&self) -> Address {
        self.address
    }

    fn sequence_counter(&self) -> U256 {
        self.counter
    }

    fn play(
        &mut self,
        ctx: &mut CallContext<'_>,
        player: Address,
        value: Amount,
    ) -> Result<(), GameError> {
        if !self.open {
            return Err(GameError::Closed);
        }
        if value != STAKE_REQUIREMENT {
            return Err(GameError::StakeMismatch { expected: STAKE_REQUIREMENT, actual: value });
        }
        ctx.ledger_mut().move_value(player, self.address, value)?;

        let outcome =
            PredictedOutcome::compute(&ctx.block().parent_hash, &self.address, self.counter);
        let won = outcome.is_win();
        debug!(%player, counter = %self.counter, roll = outcome.roll, won, "dice rolled");

        self.counter += U256::from(1u64);
        self.plays += 1;
        if won {
            *self.wins.entry(player).or_default() += 1;
        }

        ctx.emit(self.address, Event::Rolled { player, roll: outcome.roll, won });
        Ok(())
    }
}
