use crate::simulation::{HandSummary, Outcome, PushKind, RoundResult};
use crate::{Rule, SidebetMode};

pub const TOTAL_BUCKETS: usize = 8;
pub const PUSH_CATEGORIES: usize = 7;
pub const CARD_BUCKETS: usize = 9;

/// Row/column of the outcome matrix: where a finished hand landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalBucket {
    UnderSeventeen,
    Seventeen,
    Eighteen,
    Nineteen,
    Twenty,
    TwentyOne,
    Bust,
    Natural,
}

impl TotalBucket {
    pub const ALL: [TotalBucket; TOTAL_BUCKETS] = [
        TotalBucket::UnderSeventeen,
        TotalBucket::Seventeen,
        TotalBucket::Eighteen,
        TotalBucket::Nineteen,
        TotalBucket::Twenty,
        TotalBucket::TwentyOne,
        TotalBucket::Bust,
        TotalBucket::Natural,
    ];

    pub fn of(summary: &HandSummary) -> TotalBucket {
        if summary.natural {
            TotalBucket::Natural
        } else if summary.bust {
            TotalBucket::Bust
        } else {
            match summary.total {
                17 => TotalBucket::Seventeen,
                18 => TotalBucket::Eighteen,
                19 => TotalBucket::Nineteen,
                20 => TotalBucket::Twenty,
                21 => TotalBucket::TwentyOne,
                _ => TotalBucket::UnderSeventeen,
            }
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn label(&self) -> &'static str {
        match self {
            TotalBucket::UnderSeventeen => "<=16",
            TotalBucket::Seventeen => "17",
            TotalBucket::Eighteen => "18",
            TotalBucket::Nineteen => "19",
            TotalBucket::Twenty => "20",
            TotalBucket::TwentyOne => "21",
            TotalBucket::Bust => "22+",
            TotalBucket::Natural => "BJ",
        }
    }
}

/// Row of the push detail matrix. Ties below 17 are possible under custom
/// stand-early tables but carry no sidebet category; they count as pushes
/// everywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushCategory {
    Tie17,
    Tie18,
    Tie19,
    Tie20,
    Tie21,
    BustBust,
    NaturalNatural,
}

impl PushCategory {
    pub const ALL: [PushCategory; PUSH_CATEGORIES] = [
        PushCategory::Tie17,
        PushCategory::Tie18,
        PushCategory::Tie19,
        PushCategory::Tie20,
        PushCategory::Tie21,
        PushCategory::BustBust,
        PushCategory::NaturalNatural,
    ];

    pub fn of(kind: PushKind) -> Option<PushCategory> {
        match kind {
            PushKind::TotalTie(17) => Some(PushCategory::Tie17),
            PushKind::TotalTie(18) => Some(PushCategory::Tie18),
            PushKind::TotalTie(19) => Some(PushCategory::Tie19),
            PushKind::TotalTie(20) => Some(PushCategory::Tie20),
            PushKind::TotalTie(21) => Some(PushCategory::Tie21),
            PushKind::TotalTie(_) => None,
            PushKind::BustBust => Some(PushCategory::BustBust),
            PushKind::NaturalNatural => Some(PushCategory::NaturalNatural),
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn label(&self) -> &'static str {
        match self {
            PushCategory::Tie17 => "17",
            PushCategory::Tie18 => "18",
            PushCategory::Tie19 => "19",
            PushCategory::Tie20 => "20",
            PushCategory::Tie21 => "21",
            PushCategory::BustBust => "bust-bust",
            PushCategory::NaturalNatural => "natural-natural",
        }
    }
}

/// Column of the push detail matrix: combined cards in both hands, 4..=11
/// then 12+.
pub fn card_bucket(total_cards: u8) -> usize {
    (total_cards.clamp(4, 12) - 4) as usize
}

pub fn card_bucket_label(index: usize) -> &'static str {
    const LABELS: [&str; CARD_BUCKETS] = ["4", "5", "6", "7", "8", "9", "10", "11", "12+"];
    LABELS[index]
}

/// Running counters for one simulation stream.
///
/// Everything in here is an unsigned integer; floating ratios appear only in
/// [`StatsAccumulator::finalize`], so nothing drifts over millions of
/// increments. Merging two accumulators is plain counter addition, which is
/// what lets independent worker streams combine after the fact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsAccumulator {
    hands: u64,
    player_wins: u64,
    dealer_wins: u64,
    dealer_natural_wins: u64,
    pushes: u64,
    player_busts: u64,
    dealer_busts: u64,
    player_naturals: u64,
    dealer_naturals: u64,
    outcome_matrix: [[u64; TOTAL_BUCKETS]; TOTAL_BUCKETS],
    push_matrix: [[u64; CARD_BUCKETS]; PUSH_CATEGORIES],
}

impl StatsAccumulator {
    pub fn record(&mut self, outcome: &Outcome) {
        self.hands += 1;
        match outcome.result {
            RoundResult::PlayerWin => self.player_wins += 1,
            RoundResult::DealerWin => {
                self.dealer_wins += 1;
                if outcome.dealer.natural {
                    self.dealer_natural_wins += 1;
                }
            }
            RoundResult::Push => self.pushes += 1,
        }
        if outcome.player.bust {
            self.player_busts += 1;
        }
        if outcome.dealer.bust {
            self.dealer_busts += 1;
        }
        if outcome.player.natural {
            self.player_naturals += 1;
        }
        if outcome.dealer.natural {
            self.dealer_naturals += 1;
        }

        let player_bucket = TotalBucket::of(&outcome.player).index();
        let dealer_bucket = TotalBucket::of(&outcome.dealer).index();
        self.outcome_matrix[player_bucket][dealer_bucket] += 1;

        if let Some(category) = outcome.push.and_then(PushCategory::of) {
            let cards = card_bucket(outcome.player.cards + outcome.dealer.cards);
            self.push_matrix[category.index()][cards] += 1;
        }
    }

    /// Adds another stream's counters into this one.
    pub fn merge(&mut self, other: &StatsAccumulator) {
        self.hands += other.hands;
        self.player_wins += other.player_wins;
        self.dealer_wins += other.dealer_wins;
        self.dealer_natural_wins += other.dealer_natural_wins;
        self.pushes += other.pushes;
        self.player_busts += other.player_busts;
        self.dealer_busts += other.dealer_busts;
        self.player_naturals += other.player_naturals;
        self.dealer_naturals += other.dealer_naturals;
        for (row, other_row) in self
            .outcome_matrix
            .iter_mut()
            .zip(other.outcome_matrix.iter())
        {
            for (cell, other_cell) in row.iter_mut().zip(other_row.iter()) {
                *cell += other_cell;
            }
        }
        for (row, other_row) in self.push_matrix.iter_mut().zip(other.push_matrix.iter()) {
            for (cell, other_cell) in row.iter_mut().zip(other_row.iter()) {
                *cell += other_cell;
            }
        }
    }

    pub fn hands(&self) -> u64 {
        self.hands
    }

    /// Table-relative counters: `player_wins` are hands the tracked player
    /// hand won, which the bet loses.
    pub fn player_wins(&self) -> u64 {
        self.player_wins
    }

    pub fn dealer_wins(&self) -> u64 {
        self.dealer_wins
    }

    /// Wins settled by a dealer natural, paid at the blackjack ratio.
    pub fn dealer_natural_wins(&self) -> u64 {
        self.dealer_natural_wins
    }

    pub fn pushes(&self) -> u64 {
        self.pushes
    }

    pub fn player_busts(&self) -> u64 {
        self.player_busts
    }

    pub fn dealer_busts(&self) -> u64 {
        self.dealer_busts
    }

    pub fn player_naturals(&self) -> u64 {
        self.player_naturals
    }

    pub fn dealer_naturals(&self) -> u64 {
        self.dealer_naturals
    }

    /// Counts of finished hands by (player bucket, dealer bucket).
    pub fn outcome_matrix(&self) -> &[[u64; TOTAL_BUCKETS]; TOTAL_BUCKETS] {
        &self.outcome_matrix
    }

    /// Counts of pushes by (category, combined card count).
    pub fn push_matrix(&self) -> &[[u64; CARD_BUCKETS]; PUSH_CATEGORIES] {
        &self.push_matrix
    }

    /// Derives the edge figures from the counters. Pure: calling it twice
    /// without further records yields the same report. With zero hands every
    /// rate is NaN, never a panic.
    pub fn finalize(&self, rule: &Rule) -> EdgeReport {
        let hands = self.hands as f64;
        let regular_wins = (self.dealer_wins - self.dealer_natural_wins) as f64;
        let natural_wins = self.dealer_natural_wins as f64;
        let losses = self.player_wins as f64;

        let win_rate = self.dealer_wins as f64 / hands;
        let loss_rate = losses / hands;
        let push_rate = self.pushes as f64 / hands;

        // Expected value per unit staked: even-money wins are trimmed by the
        // commission, dealer naturals pay the blackjack ratio untouched,
        // losses forfeit the stake, pushes return it.
        let expected_value = (regular_wins * rule.commission_multiplier()
            + natural_wins * rule.payout_blackjack
            - losses)
            / hands;

        let sidebet_edge = rule.sidebet.as_ref().map(|sidebet| {
            let payout_sum: f64 = match sidebet.mode {
                SidebetMode::Total => PushCategory::ALL
                    .iter()
                    .map(|category| {
                        let row_sum: u64 = self.push_matrix[category.index()].iter().sum();
                        sidebet.by_total[category.index()] * row_sum as f64
                    })
                    .sum(),
                SidebetMode::Cards => (0..CARD_BUCKETS)
                    .map(|cards| {
                        let column_sum: u64 = self
                            .push_matrix
                            .iter()
                            .map(|row| row[cards])
                            .sum();
                        sidebet.by_cards[cards] * column_sum as f64
                    })
                    .sum(),
            };
            (payout_sum - hands) / hands
        });

        EdgeReport {
            hands: self.hands,
            win_rate,
            loss_rate,
            push_rate,
            natural_win_rate: natural_wins / hands,
            player_bust_rate: self.player_busts as f64 / hands,
            dealer_bust_rate: self.dealer_busts as f64 / hands,
            raw_edge: win_rate - loss_rate,
            true_house_edge: -expected_value,
            sidebet_edge,
        }
    }
}

/// Final figures for the bettor, who wins when the dealer hand prevails.
/// All rates are fractions of the total hands, pushes included in the
/// denominator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeReport {
    pub hands: u64,
    /// Rate at which the bet wins (the dealer hand prevailed).
    pub win_rate: f64,
    /// Rate at which the bet loses (the tracked player hand prevailed).
    pub loss_rate: f64,
    pub push_rate: f64,
    /// Rate of wins settled by a dealer natural, paid without commission.
    pub natural_win_rate: f64,
    pub player_bust_rate: f64,
    pub dealer_bust_rate: f64,
    /// Win rate minus loss rate, before commission and payout ratios.
    pub raw_edge: f64,
    /// Expected fractional loss per unit wagered once commission and the
    /// natural payout ratio are applied. Positive favors the house.
    pub true_house_edge: f64,
    /// Expected gain per unit staked on the push sidebet, when configured.
    pub sidebet_edge: Option<f64>,
}
