use crate::config::LedgerConfig;
use crate::error::LedgerError;
use serde::{Deserialize, Serialize};
use squad_model::{ChipKind, Gameweek, SeasonCalendar};
use tracing::{debug, info};

/// What a batch of transfers costs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferCharge {
    pub free_used: u8,
    pub paid: u8,
    pub hit_points: u32,
}

/// Closed gameweek record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub gameweek: Gameweek,
    pub balance_at_start: u8,
    pub transfers: u8,
    pub hit_points: u32,
    pub chip: Option<ChipKind>,
}

/// Free transfer balance and hit accounting
///
/// The balance always stays within `0..=max_banked`. A ledger is a plain
/// value so planner branches can clone it freely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLedger {
    config: LedgerConfig,
    gameweek: Gameweek,
    balance: u8,
    balance_at_start: u8,
    transfers: u8,
    free_used: u8,
    hit_points: u32,
    chip: Option<ChipKind>,
    history: Vec<LedgerEntry>,
}

impl TransferLedger {
    /// Create a ledger at `gameweek` with the configured initial balance
    pub fn new(config: LedgerConfig, gameweek: Gameweek) -> Result<Self, LedgerError> {
        config.validate()?;
        Self::with_balance(config, gameweek, config.initial_balance)
    }

    /// Restore a ledger with a known balance
    pub fn with_balance(
        config: LedgerConfig,
        gameweek: Gameweek,
        balance: u8,
    ) -> Result<Self, LedgerError> {
        if balance > config.max_banked {
            return Err(LedgerError::BalanceOutOfRange { balance, max: config.max_banked });
        }
        Ok(Self {
            config,
            gameweek,
            balance,
            balance_at_start: balance,
            transfers: 0,
            free_used: 0,
            hit_points: 0,
            chip: None,
            history: Vec::new(),
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn gameweek(&self) -> Gameweek {
        self.gameweek
    }

    pub fn balance(&self) -> u8 {
        self.balance
    }

    /// Transfers recorded in the open gameweek
    pub fn transfers_made(&self) -> u8 {
        self.transfers
    }

    /// Hit points charged in the open gameweek
    pub fn hit_points(&self) -> u32 {
        self.hit_points
    }

    pub fn chip(&self) -> Option<ChipKind> {
        self.chip
    }

    pub fn history(&self) -> &[LedgerEntry] {
        &self.history
    }

    fn costs_waived(&self) -> bool {
        self.chip.is_some_and(ChipKind::waives_transfer_cost)
    }

    /// Close the open gameweek and open the next one.
    ///
    /// The balance grows by one up to the cap, unless the calendar forces
    /// a top-up value for the new gameweek.
    pub fn advance_gameweek(&mut self, calendar: &SeasonCalendar) -> Result<u8, LedgerError> {
        if self.gameweek >= calendar.last_gameweek {
            return Err(LedgerError::SeasonOver { gameweek: self.gameweek });
        }
        self.history.push(LedgerEntry {
            gameweek: self.gameweek,
            balance_at_start: self.balance_at_start,
            transfers: self.transfers,
            hit_points: self.hit_points,
            chip: self.chip,
        });

        let next = self.gameweek + 1;
        let balance = match calendar.top_up(next) {
            Some(forced) if forced > self.config.max_banked => {
                return Err(LedgerError::TopUpOutOfRange {
                    gameweek: next,
                    balance: forced,
                    max: self.config.max_banked,
                });
            }
            Some(forced) => {
                info!(gameweek = next, balance = forced, "free transfer top-up applied");
                forced
            }
            None => (self.balance + 1).min(self.config.max_banked),
        };

        self.gameweek = next;
        self.balance = balance;
        self.balance_at_start = balance;
        self.transfers = 0;
        self.free_used = 0;
        self.hit_points = 0;
        self.chip = None;
        Ok(balance)
    }

    /// Preview the charge for `count` more transfers in the open gameweek
    pub fn quote(&self, count: u8) -> TransferCharge {
        if self.costs_waived() {
            return TransferCharge { free_used: 0, paid: 0, hit_points: 0 };
        }
        let free_used = count.min(self.balance);
        let paid = count - free_used;
        TransferCharge { free_used, paid, hit_points: u32::from(paid) * u32::from(self.config.hit_cost) }
    }

    /// Record `count` transfers, consuming free transfers first
    pub fn record_transfers(&mut self, count: u8) -> TransferCharge {
        let charge = self.quote(count);
        self.balance -= charge.free_used;
        self.free_used += charge.free_used;
        self.hit_points += charge.hit_points;
        self.transfers = self.transfers.saturating_add(count);
        debug!(
            gameweek = self.gameweek,
            count,
            hit_points = charge.hit_points,
            balance = self.balance,
            "recorded transfers"
        );
        charge
    }

    /// Register a chip for the open gameweek.
    ///
    /// Wildcard and Free Hit make the whole gameweek free: transfers already
    /// recorded are refunded and the banked balance is left as it was at the
    /// start of the gameweek. Other chips do not affect the ledger.
    pub fn apply_chip_override(&mut self, chip: ChipKind) {
        self.chip = Some(chip);
        if chip.waives_transfer_cost() {
            self.balance += self.free_used;
            self.free_used = 0;
            self.hit_points = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ledger(balance: u8) -> TransferLedger {
        TransferLedger::with_balance(LedgerConfig::default(), 10, balance).unwrap()
    }

    #[test]
    fn test_balance_caps_at_five() {
        let calendar = SeasonCalendar::default();
        let mut ledger = ledger(1);
        let balances: Vec<u8> =
            (0..6).map(|_| ledger.advance_gameweek(&calendar).unwrap()).collect();
        assert_eq!(balances, vec![2, 3, 4, 5, 5, 5]);
        assert_eq!(ledger.history().len(), 6);
    }

    #[test]
    fn test_free_transfers_consumed_before_hits() {
        let mut ledger = ledger(2);
        let charge = ledger.record_transfers(3);
        assert_eq!(charge, TransferCharge { free_used: 2, paid: 1, hit_points: 4 });
        assert_eq!(ledger.balance(), 0);

        let charge = ledger.record_transfers(1);
        assert_eq!(charge.hit_points, 4);
        assert_eq!(ledger.hit_points(), 8);
    }

    #[test]
    fn test_next_gameweek_after_using_all() {
        let calendar = SeasonCalendar::default();
        let mut ledger = ledger(1);
        ledger.record_transfers(1);
        assert_eq!(ledger.advance_gameweek(&calendar).unwrap(), 1);
    }

    #[test]
    fn test_wildcard_preserves_balance_and_waives_hits() {
        let mut ledger = ledger(3);
        ledger.record_transfers(2);
        ledger.apply_chip_override(ChipKind::Wildcard);
        assert_eq!(ledger.balance(), 3);
        assert_eq!(ledger.hit_points(), 0);

        let charge = ledger.record_transfers(10);
        assert_eq!(charge.hit_points, 0);
        assert_eq!(ledger.balance(), 3);

        let calendar = SeasonCalendar::default();
        assert_eq!(ledger.advance_gameweek(&calendar).unwrap(), 4);
        assert_eq!(ledger.history()[0].chip, Some(ChipKind::Wildcard));
    }

    #[test]
    fn test_bench_boost_does_not_waive_hits() {
        let mut ledger = ledger(0);
        ledger.apply_chip_override(ChipKind::BenchBoost);
        assert_eq!(ledger.record_transfers(1).hit_points, 4);
    }

    #[test]
    fn test_forced_top_up_overrides_balance() {
        let calendar = SeasonCalendar::default().with_top_up(11, 5);
        let mut ledger = ledger(0);
        assert_eq!(ledger.advance_gameweek(&calendar).unwrap(), 5);

        let calendar = SeasonCalendar::default().with_top_up(12, 1);
        assert_eq!(ledger.advance_gameweek(&calendar).unwrap(), 1);

        let calendar = SeasonCalendar::default().with_top_up(13, 9);
        assert!(matches!(
            ledger.advance_gameweek(&calendar),
            Err(LedgerError::TopUpOutOfRange { gameweek: 13, .. })
        ));
    }

    #[test]
    fn test_restore_rejects_out_of_range_balance() {
        assert!(TransferLedger::with_balance(LedgerConfig::default(), 1, 6).is_err());
    }

    #[test]
    fn test_season_end() {
        let calendar = SeasonCalendar::default();
        let mut ledger = TransferLedger::with_balance(LedgerConfig::default(), 38, 1).unwrap();
        assert!(matches!(ledger.advance_gameweek(&calendar), Err(LedgerError::SeasonOver { .. })));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Advance,
        Record(u8),
        Chip(usize),
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Advance),
            (0u8..6).prop_map(Op::Record),
            (0usize..4).prop_map(Op::Chip),
        ]
    }

    proptest! {
        #[test]
        fn prop_balance_stays_in_range(ops in proptest::collection::vec(arb_op(), 0..60)) {
            let calendar = SeasonCalendar { last_gameweek: 200, ..Default::default() };
            let mut ledger = TransferLedger::new(LedgerConfig::default(), 1).unwrap();
            for op in ops {
                match op {
                    Op::Advance => { ledger.advance_gameweek(&calendar).unwrap(); }
                    Op::Record(n) => { ledger.record_transfers(n); }
                    Op::Chip(i) => ledger.apply_chip_override(ChipKind::ALL[i]),
                }
                prop_assert!(ledger.balance() <= 5);
            }
        }
    }
}
