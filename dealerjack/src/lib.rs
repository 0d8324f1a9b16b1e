pub mod simulation;
pub mod statistics;
pub mod strategy;

use serde_enum_str::{Deserialize_enum_str, Serialize_enum_str};
use thiserror::Error;

use simulation::{SilentHandler, Simulator};
use statistics::{EdgeReport, StatsAccumulator, CARD_BUCKETS, PUSH_CATEGORIES};
use strategy::RuleTable;

/// Most casinos will not seat more players than this at one table.
pub const MAX_PLAYERS: u8 = 10;

/// Table rules and variant parameters for one simulation run.
/// Built and validated once, read-only afterwards.
#[derive(Debug, Clone)]
pub struct Rule {
    pub number_of_decks: u8,
    /// Remaining-card threshold at which a traditional shoe is reshuffled.
    /// Checked only at hand boundaries, as at a real table.
    pub reshuffle_cutoff: u16,
    /// Rebuild and reshuffle the shoe after every hand.
    pub continuous_shuffle: bool,
    pub player_hit_soft17: bool,
    pub dealer_hit_soft17: bool,
    /// Let player seats draw out their hands against a dealer natural.
    /// The outcome is already decided; this only changes card consumption
    /// and the card counts recorded for the push sidebet.
    pub hit_against_blackjack: bool,
    /// Commission percentage deducted from even-money winning payouts.
    pub commission_pct: f64,
    /// Payout ratio when the bet wins through a dealer natural. Paid without
    /// commission.
    pub payout_blackjack: f64,
    pub number_of_players: u8,
    /// Custom hit/stand table applied to the player seats ahead of the
    /// default stand-on-17 policy.
    pub player_rules: RuleTable,
    pub sidebet: Option<SidebetPayouts>,
}

impl Default for Rule {
    fn default() -> Self {
        Rule {
            number_of_decks: 6,
            reshuffle_cutoff: 52,
            continuous_shuffle: false,
            player_hit_soft17: false,
            dealer_hit_soft17: false,
            hit_against_blackjack: false,
            commission_pct: 5.0,
            payout_blackjack: 1.0,
            number_of_players: 1,
            player_rules: RuleTable::default(),
            sidebet: None,
        }
    }
}

impl Rule {
    /// Rejects configurations the engine cannot honor. Called by
    /// [`run_simulation`] and [`Simulator::new`]; front ends should call it
    /// before starting any long run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.number_of_decks == 0 {
            return Err(ConfigError::NoDecks);
        }
        let shoe_size = self.number_of_decks as u16 * 52;
        if !self.continuous_shuffle && self.reshuffle_cutoff >= shoe_size {
            return Err(ConfigError::CutoffTooLarge {
                cutoff: self.reshuffle_cutoff,
                shoe_size,
            });
        }
        if !(0.0..=100.0).contains(&self.commission_pct) {
            return Err(ConfigError::CommissionOutOfRange(self.commission_pct));
        }
        if !(self.payout_blackjack >= 0.0) {
            return Err(ConfigError::NegativePayout(self.payout_blackjack));
        }
        if self.number_of_players == 0 || self.number_of_players > MAX_PLAYERS {
            return Err(ConfigError::PlayerCountOutOfRange(self.number_of_players));
        }
        if let Some(sidebet) = &self.sidebet {
            let all_payouts = sidebet.by_total.iter().chain(sidebet.by_cards.iter());
            for &payout in all_payouts {
                if !(payout >= 0.0) {
                    return Err(ConfigError::NegativeSidebetPayout(payout));
                }
            }
        }
        Ok(())
    }

    pub fn commission_multiplier(&self) -> f64 {
        1.0 - self.commission_pct / 100.0
    }
}

/// Which key the push sidebet pays on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_enum_str, Deserialize_enum_str)]
pub enum SidebetMode {
    /// Pay by the tied hand total (17..21, bust-bust, natural-natural).
    Total,
    /// Pay by the combined number of cards in both hands.
    Cards,
}

/// Payout multipliers for the push sidebet. Only the table selected by
/// `mode` is consulted at report time.
#[derive(Debug, Clone, PartialEq)]
pub struct SidebetPayouts {
    pub mode: SidebetMode,
    /// Multipliers for ties on 17, 18, 19, 20, 21, bust-bust and
    /// natural-natural, in that order.
    pub by_total: [f64; PUSH_CATEGORIES],
    /// Multipliers for 4..=11 combined cards, then 12 or more.
    pub by_cards: [f64; CARD_BUCKETS],
}

impl Default for SidebetPayouts {
    fn default() -> Self {
        SidebetPayouts {
            mode: SidebetMode::Total,
            by_total: [1.0; PUSH_CATEGORIES],
            by_cards: [1.0; CARD_BUCKETS],
        }
    }
}

/// Configuration rejected before any simulation starts. Nothing in here is
/// ever silently clamped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("number_of_decks must be at least 1")]
    NoDecks,
    #[error("reshuffle_cutoff {cutoff} must be smaller than the shoe size {shoe_size}")]
    CutoffTooLarge { cutoff: u16, shoe_size: u16 },
    #[error("commission_pct {0} must lie within [0, 100]")]
    CommissionOutOfRange(f64),
    #[error("payout_blackjack {0} must be non-negative")]
    NegativePayout(f64),
    #[error("number_of_players must lie within [1, {MAX_PLAYERS}], got {0}")]
    PlayerCountOutOfRange(u8),
    #[error("hands_to_simulate must be positive")]
    NoHands,
    #[error("invalid hit rule `{entry}`: {reason}")]
    InvalidHitRule { entry: String, reason: String },
    #[error("`{0}` is not a sidebet mode (expected Total or Cards)")]
    InvalidSidebetMode(String),
    #[error("sidebet payout {0} must be non-negative")]
    NegativeSidebetPayout(f64),
}

/// Hit or stand. The dealer-bet variant has no doubling, splitting or
/// surrender, so these are the only actions a decision table may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Hit,
    Stand,
}

/// Whether a total counts an ace as 11.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandType {
    Hard,
    Soft,
}

/// How much work to do and how to spread it.
#[derive(Debug, Clone, Copy)]
pub struct RunProfile {
    /// Number of rounds dealt. Each round produces one outcome per player
    /// seat.
    pub hands_to_simulate: u64,
    /// Zero means one worker per available core.
    pub number_of_threads: usize,
    /// Base seed; worker stream `i` runs on `seed + i`. `None` draws a seed
    /// from the OS, which the report echoes back for reproduction.
    pub seed: Option<u64>,
}

impl Default for RunProfile {
    fn default() -> Self {
        RunProfile {
            hands_to_simulate: 1_000_000,
            number_of_threads: 0,
            seed: None,
        }
    }
}

/// Everything a front end needs after a run: the derived edge figures plus
/// the raw merged counters for matrix reports.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub edge: EdgeReport,
    pub stats: StatsAccumulator,
    /// The base seed actually used, echoed for reproduction.
    pub seed: u64,
}

/// Runs the configured number of rounds and returns the aggregated report.
///
/// Work is split across worker threads, each owning its own shoe, RNG stream
/// and local accumulator; the per-worker counters are merged after all
/// workers complete. Results are deterministic for a given `(rule, profile)`
/// with a fixed seed and thread count.
pub fn run_simulation(rule: &Rule, profile: &RunProfile) -> Result<SimulationReport, ConfigError> {
    rule.validate()?;
    if profile.hands_to_simulate == 0 {
        return Err(ConfigError::NoHands);
    }

    let number_of_threads = {
        if profile.number_of_threads == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            profile.number_of_threads
        }
    };
    let base_seed = profile.seed.unwrap_or_else(rand::random);
    log::info!(
        "simulating {} rounds on {} threads, base seed {}",
        profile.hands_to_simulate,
        number_of_threads,
        base_seed
    );

    let mut merged = StatsAccumulator::default();
    std::thread::scope(|scope| {
        let mut workers = Vec::with_capacity(number_of_threads);
        for stream in 0..number_of_threads as u64 {
            let rounds =
                rounds_for_stream(profile.hands_to_simulate, number_of_threads as u64, stream);
            if rounds == 0 {
                continue;
            }
            workers.push(scope.spawn(move || {
                let mut simulator = Simulator::new(rule, base_seed.wrapping_add(stream))
                    .expect("rule was validated before the workers started");
                let mut stats = StatsAccumulator::default();
                let mut handler = SilentHandler;
                for _ in 0..rounds {
                    let outcomes = simulator
                        .run_hand(&mut handler)
                        .expect("run_hand drives the phases in order");
                    for outcome in &outcomes {
                        stats.record(outcome);
                    }
                }
                stats
            }));
        }
        for worker in workers {
            let stats = worker.join().expect("a simulation worker panicked");
            merged.merge(&stats);
        }
    });

    let edge = merged.finalize(rule);
    Ok(SimulationReport {
        edge,
        stats: merged,
        seed: base_seed,
    })
}

/// Splits `total` rounds over `streams` workers, spreading the remainder over
/// the first few.
fn rounds_for_stream(total: u64, streams: u64, stream: u64) -> u64 {
    total / streams + u64::from(stream < total % streams)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rule_is_valid() {
        assert!(Rule::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_configurations() {
        let mut rule = Rule::default();
        rule.number_of_decks = 0;
        assert_eq!(rule.validate(), Err(ConfigError::NoDecks));

        let mut rule = Rule::default();
        rule.reshuffle_cutoff = 6 * 52;
        assert!(matches!(
            rule.validate(),
            Err(ConfigError::CutoffTooLarge { .. })
        ));

        let mut rule = Rule::default();
        rule.commission_pct = 101.0;
        assert!(matches!(
            rule.validate(),
            Err(ConfigError::CommissionOutOfRange(_))
        ));
        rule.commission_pct = f64::NAN;
        assert!(matches!(
            rule.validate(),
            Err(ConfigError::CommissionOutOfRange(_))
        ));

        let mut rule = Rule::default();
        rule.number_of_players = 0;
        assert!(matches!(
            rule.validate(),
            Err(ConfigError::PlayerCountOutOfRange(0))
        ));
        rule.number_of_players = MAX_PLAYERS + 1;
        assert!(matches!(
            rule.validate(),
            Err(ConfigError::PlayerCountOutOfRange(_))
        ));

        let mut rule = Rule::default();
        let mut sidebet = SidebetPayouts::default();
        sidebet.by_total[0] = -1.0;
        rule.sidebet = Some(sidebet);
        assert!(matches!(
            rule.validate(),
            Err(ConfigError::NegativeSidebetPayout(_))
        ));
    }

    #[test]
    fn cutoff_is_ignored_in_continuous_mode() {
        let mut rule = Rule::default();
        rule.continuous_shuffle = true;
        rule.reshuffle_cutoff = 6 * 52;
        assert!(rule.validate().is_ok());
    }

    #[test]
    fn rounds_are_split_evenly() {
        let total: u64 = (0..4).map(|s| rounds_for_stream(10, 4, s)).sum();
        assert_eq!(total, 10);
        assert_eq!(rounds_for_stream(10, 4, 0), 3);
        assert_eq!(rounds_for_stream(10, 4, 3), 2);
        assert_eq!(rounds_for_stream(2, 4, 3), 0);
    }

    #[test]
    fn zero_hands_is_a_configuration_error() {
        let profile = RunProfile {
            hands_to_simulate: 0,
            ..Default::default()
        };
        assert!(matches!(
            run_simulation(&Rule::default(), &profile),
            Err(ConfigError::NoHands)
        ));
    }

    #[test]
    fn small_run_counts_are_consistent() {
        let mut rule = Rule::default();
        rule.number_of_players = 2;
        let profile = RunProfile {
            hands_to_simulate: 500,
            number_of_threads: 2,
            seed: Some(7),
        };
        let report = run_simulation(&rule, &profile).unwrap();
        assert_eq!(report.stats.hands(), 500 * 2);
        assert_eq!(report.seed, 7);
        let edge = report.edge;
        assert!((edge.win_rate + edge.loss_rate + edge.push_rate - 1.0).abs() < 1e-12);
    }

    #[test]
    fn same_seed_reproduces_the_report() {
        let rule = Rule::default();
        let profile = RunProfile {
            hands_to_simulate: 2_000,
            number_of_threads: 3,
            seed: Some(42),
        };
        let first = run_simulation(&rule, &profile).unwrap();
        let second = run_simulation(&rule, &profile).unwrap();
        assert_eq!(first.edge, second.edge);
    }

    #[test]
    fn reference_rules_land_near_the_documented_edge() {
        // 6 decks, 5% commission, even-money naturals, stand on soft 17:
        // both win rates sit near 0.41, pushes near 0.18, true edge near 2%.
        let rule = Rule::default();
        let profile = RunProfile {
            hands_to_simulate: 40_000,
            number_of_threads: 4,
            seed: Some(20_240_817),
        };
        let edge = run_simulation(&rule, &profile).unwrap().edge;
        assert!((0.35..0.47).contains(&edge.win_rate), "{:?}", edge);
        assert!((0.35..0.47).contains(&edge.loss_rate), "{:?}", edge);
        assert!((0.12..0.24).contains(&edge.push_rate), "{:?}", edge);
        assert!((0.0..0.05).contains(&edge.true_house_edge), "{:?}", edge);
    }
}
