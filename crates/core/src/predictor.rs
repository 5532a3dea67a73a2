//! Roll predictor
//!
//! Holds custody funds and plays the dice game only when the roll it
//! recomputes for the current block is a win. The recomputation reads the
//! game's counter inside the same call that plays, so the prediction and the
//! game's own roll see identical inputs.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::block::BlockContext;
use crate::context::CallContext;
use crate::error::{LedgerError, PredictorError};
use crate::events::Event;
use crate::game::DiceGame;
use crate::roll::PredictedOutcome;
use crate::types::{Address, Amount, STAKE_REQUIREMENT};

/// Predictor contract state. Nothing changes after deployment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollPredictor {
    address: Address,
    owner: Address,
    game: Address,
}

impl RollPredictor {
    /// Deploy at `address`, owned by `owner`, bound to the game at `game`
    pub const fn new(address: Address, owner: Address, game: Address) -> Self {
        Self { address, owner, game }
    }

    /// Address holding the custody balance
    pub const fn address(&self) -> Address {
        self.address
    }

    /// The only account allowed to withdraw
    pub const fn owner(&self) -> Address {
        self.owner
    }

    /// Game this predictor plays against
    pub const fn game(&self) -> Address {
        self.game
    }

    /// Play once if the recomputed roll wins.
    ///
    /// Emits `RollPredicted` before branching and `PlaySucceeded` after a
    /// successful play. A failed play is surfaced as `ExternalCallFailed`;
    /// undoing the stake transfer is left to the executor's rollback.
    pub fn attempt_rigged_play<G>(
        &self,
        ctx: &mut CallContext<'_>,
        game: &mut G,
    ) -> Result<PredictedOutcome, PredictorError>
    where
        G: DiceGame + ?Sized,
    {
        let available = ctx.balance(&self.address);
        if available < STAKE_REQUIREMENT {
            return Err(PredictorError::InsufficientBalance {
                required: STAKE_REQUIREMENT,
                available,
            });
        }

        let counter = game.sequence_counter();
        let outcome = PredictedOutcome::compute(&ctx.block().parent_hash, &self.game, counter);
        ctx.emit(self.address, Event::RollPredicted { roll: outcome.roll });
        debug!(roll = outcome.roll, %counter, block = ctx.block().number, "roll predicted");

        if !outcome.is_win() {
            return Err(PredictorError::PredictedLoss { roll: outcome.roll });
        }

        game.play(ctx, self.address, STAKE_REQUIREMENT)
            .map_err(PredictorError::ExternalCallFailed)?;

        ctx.emit(self.address, Event::PlaySucceeded);
        info!(roll = outcome.roll, %counter, "play committed on predicted win");
        Ok(outcome)
    }

    /// Owner-only transfer out of custody
    pub fn withdraw(
        &self,
        ctx: &mut CallContext<'_>,
        caller: Address,
        destination: Address,
        amount: Amount,
    ) -> Result<(), PredictorError> {
        if caller != self.owner {
            return Err(PredictorError::Unauthorized(caller));
        }

        let available = ctx.balance(&self.address);
        if amount > available {
            return Err(PredictorError::WithdrawalTooLarge { requested: amount, available });
        }

        ctx.ledger_mut()
            .transfer(self.address, destination, amount)
            .map_err(PredictorError::WithdrawalTransferFailed)?;

        ctx.emit(self.address, Event::Withdrawal { amount });
        info!(%destination, %amount, "withdrawal");
        Ok(())
    }

    /// Accept value sent to the predictor
    pub fn receive_funds(
        &self,
        ctx: &mut CallContext<'_>,
        from: Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        ctx.ledger_mut().move_value(from, self.address, amount)?;
        ctx.emit(self.address, Event::FundsReceived { from, amount });
        Ok(())
    }

    /// Prediction for a block without touching any state
    pub fn preview<G>(&self, block: &BlockContext, game: &G) -> PredictedOutcome
    where
        G: DiceGame + ?Sized,
    {
        PredictedOutcome::compute(&block.parent_hash, &self.game, game.sequence_counter())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::error::GameError;
    use crate::game::DiceContract;
    use crate::ledger::Ledger;
    use crate::types::{Hash, U256};

    fn owner() -> Address {
        Address::repeat_byte(0x0e)
    }

    fn predictor() -> RollPredictor {
        RollPredictor::new(Address::repeat_byte(0x9d), owner(), Address::repeat_byte(0x6a))
    }

    /// Block whose parent hash makes the predictor's roll satisfy `want`
    fn block_where(want: impl Fn(u8) -> bool) -> BlockContext {
        (0..=u8::MAX)
            .map(|i| BlockContext { number: 1, parent_hash: Hash::with_last_byte(i), timestamp: 0 })
            .find(|b| {
                let outcome =
                    PredictedOutcome::compute(&b.parent_hash, &predictor().game(), U256::ZERO);
                want(outcome.roll)
            })
            .expect("no parent hash yields the wanted roll")
    }

    /// Game that counts how often the predictor touches it
    #[derive(Default)]
    struct CountingGame {
        counter_reads: Cell<u32>,
        plays: u32,
    }

    impl DiceGame for CountingGame {
        fn address(&self) -> Address {
            predictor().game()
        }

        fn sequence_counter(&self) -> U256 {
            self.counter_reads.set(self.counter_reads.get() + 1);
            U256::ZERO
        }

        fn play(
            &mut self,
            _ctx: &mut CallContext<'_>,
            _player: Address,
            _value: Amount,
        ) -> Result<(), GameError> {
            self.plays += 1;
            Ok(())
        }
    }

    #[test]
    fn test_insufficient_balance_reads_nothing() {
        let mut ledger = Ledger::new();
        let available = STAKE_REQUIREMENT / U256::from(2u64);
        ledger.set_balance(predictor().address(), available);
        let mut logs = Vec::new();
        let mut game = CountingGame::default();
        let block = block_where(|r| r <= 2);
        let mut ctx = CallContext::new(block, Hash::ZERO, &mut ledger, &mut logs);

        let err = predictor().attempt_rigged_play(&mut ctx, &mut game).unwrap_err();
        assert_eq!(
            err,
            PredictorError::InsufficientBalance { required: STAKE_REQUIREMENT, available }
        );
        assert_eq!(game.counter_reads.get(), 0);
        assert_eq!(game.plays, 0);
        assert!(logs.is_empty());
        assert_eq!(ledger.balance(&predictor().address()), available);
    }

    #[test]
    fn test_funded_attempt_reads_counter_once() {
        let mut ledger = Ledger::new();
        ledger.set_balance(predictor().address(), STAKE_REQUIREMENT);
        let mut logs = Vec::new();
        let mut game = CountingGame::default();
        let block = block_where(|r| r <= 2);
        let mut ctx = CallContext::new(block, Hash::ZERO, &mut ledger, &mut logs);

        predictor().attempt_rigged_play(&mut ctx, &mut game).unwrap();
        assert_eq!(game.counter_reads.get(), 1);
        assert_eq!(game.plays, 1);
    }

    #[test]
    fn test_predicted_loss_commits_nothing() {
        let mut ledger = Ledger::new();
        ledger.set_balance(predictor().address(), STAKE_REQUIREMENT);
        let mut logs = Vec::new();
        let mut game = DiceContract::new(predictor().game());
        let block = block_where(|r| r > 2);
        let mut ctx = CallContext::new(block, Hash::ZERO, &mut ledger, &mut logs);

        let err = predictor().attempt_rigged_play(&mut ctx, &mut game).unwrap_err();
        let PredictorError::PredictedLoss { roll } = err else {
            panic!("unexpected error {err:?}")
        };
        assert!(roll > 2);

        assert_eq!(ledger.balance(&predictor().address()), STAKE_REQUIREMENT);
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].event, Event::RollPredicted { roll });
        assert_eq!(game.plays(), 0);
    }

    #[test]
    fn test_predicted_win_plays_and_wins() {
        let mut ledger = Ledger::new();
        ledger.set_balance(predictor().address(), STAKE_REQUIREMENT);
        let mut logs = Vec::new();
        let mut game = DiceContract::new(predictor().game());
        let block = block_where(|r| r <= 2);
        let mut ctx = CallContext::new(block, Hash::ZERO, &mut ledger, &mut logs);

        let outcome = predictor().attempt_rigged_play(&mut ctx, &mut game).unwrap();
        assert!(outcome.is_win());

        assert_eq!(ledger.balance(&predictor().address()), U256::ZERO);
        assert_eq!(game.wins_of(&predictor().address()), 1);
        let events: Vec<_> = logs.iter().map(|l| l.event.clone()).collect();
        assert_eq!(
            events,
            vec![
                Event::RollPredicted { roll: outcome.roll },
                Event::Rolled { player: predictor().address(), roll: outcome.roll, won: true },
                Event::PlaySucceeded,
            ]
        );
    }

    #[test]
    fn test_failed_play_is_external_call_failure() {
        let mut ledger = Ledger::new();
        ledger.set_balance(predictor().address(), STAKE_REQUIREMENT);
        let mut logs = Vec::new();
        let mut game = DiceContract::new(predictor().game());
        game.close();
        let mut ctx = CallContext::new(block_where(|r| r <= 2), Hash::ZERO, &mut ledger, &mut logs);

        assert_eq!(
            predictor().attempt_rigged_play(&mut ctx, &mut game),
            Err(PredictorError::ExternalCallFailed(GameError::Closed))
        );
        assert!(!logs.iter().any(|l| l.event == Event::PlaySucceeded));
    }

    #[test]
    fn test_withdraw_rules() {
        let mut ledger = Ledger::new();
        ledger.set_balance(predictor().address(), U256::from(100u64));
        let mut logs = Vec::new();
        let block = BlockContext::default();
        let dest = Address::repeat_byte(0xde);
        let mut ctx = CallContext::new(block, Hash::ZERO, &mut ledger, &mut logs);

        let stranger = Address::repeat_byte(0x55);
        assert_eq!(
            predictor().withdraw(&mut ctx, stranger, dest, U256::from(1u64)),
            Err(PredictorError::Unauthorized(stranger))
        );
        assert_eq!(
            predictor().withdraw(&mut ctx, owner(), dest, U256::from(101u64)),
            Err(PredictorError::WithdrawalTooLarge {
                requested: U256::from(101u64),
                available: U256::from(100u64),
            })
        );
        predictor().withdraw(&mut ctx, owner(), dest, U256::from(40u64)).unwrap();

        assert_eq!(ledger.balance(&predictor().address()), U256::from(60u64));
        assert_eq!(ledger.balance(&dest), U256::from(40u64));
        assert_eq!(
            logs.last().map(|l| &l.event),
            Some(&Event::Withdrawal { amount: U256::from(40u64) })
        );
    }

    #[test]
    fn test_withdraw_to_rejecting_account() {
        let mut ledger = Ledger::new();
        ledger.set_balance(predictor().address(), U256::from(100u64));
        let dest = Address::repeat_byte(0xde);
        ledger.reject_transfers(dest);
        let mut logs = Vec::new();
        let mut ctx = CallContext::new(BlockContext::default(), Hash::ZERO, &mut ledger, &mut logs);

        assert_eq!(
            predictor().withdraw(&mut ctx, owner(), dest, U256::from(1u64)),
            Err(PredictorError::WithdrawalTransferFailed(LedgerError::TransferRejected(dest)))
        );
        assert!(logs.is_empty());
    }

    #[test]
    fn test_preview_matches_attempt() {
        let game = DiceContract::with_counter(predictor().game(), U256::from(5u64));
        let block = BlockContext { number: 4, parent_hash: Hash::repeat_byte(0x21), timestamp: 0 };
        let expected =
            PredictedOutcome::compute(&block.parent_hash, &game.address(), U256::from(5u64));
        assert_eq!(predictor().preview(&block, &game), expected);
    }
}
