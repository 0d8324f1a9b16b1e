use dealerjack::statistics::{CARD_BUCKETS, PUSH_CATEGORIES};
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub rule: ConfigRule,
    pub edge_simulator: ConfigEdgeSimulator,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigRule {
    pub number_of_decks: u8,
    pub reshuffle_cutoff: u16,
    pub continuous_shuffle: bool,
    pub player_hit_soft17: bool,
    pub dealer_hit_soft17: bool,
    #[serde(default)]
    pub hit_against_blackjack: bool,
    pub commission_pct: f64,
    pub payout_blackjack: f64,
    pub number_of_players: u8,
    /// Custom player table in the wire format, e.g.
    /// `hard:16:10,hit;soft:17:hit`. Empty means the default policy alone.
    #[serde(default)]
    pub hit_rules: String,
    #[serde(default)]
    pub sidebet: Option<ConfigSidebet>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSidebet {
    /// "Total" or "Cards".
    pub mode: String,
    /// Multipliers for ties on 17..21, bust-bust and natural-natural.
    #[serde(default = "even_money_totals")]
    pub payouts_by_total: [f64; PUSH_CATEGORIES],
    /// Multipliers for 4..=11 combined cards, then 12+.
    #[serde(default = "even_money_cards")]
    pub payouts_by_cards: [f64; CARD_BUCKETS],
}

fn even_money_totals() -> [f64; PUSH_CATEGORIES] {
    [1.0; PUSH_CATEGORIES]
}

fn even_money_cards() -> [f64; CARD_BUCKETS] {
    [1.0; CARD_BUCKETS]
}

impl TryInto<dealerjack::Rule> for ConfigRule {
    type Error = dealerjack::ConfigError;

    fn try_into(self) -> Result<dealerjack::Rule, Self::Error> {
        let player_rules = self.hit_rules.parse()?;
        let sidebet = match self.sidebet {
            Some(sidebet) => Some(dealerjack::SidebetPayouts {
                mode: sidebet
                    .mode
                    .parse()
                    .map_err(|_| dealerjack::ConfigError::InvalidSidebetMode(sidebet.mode))?,
                by_total: sidebet.payouts_by_total,
                by_cards: sidebet.payouts_by_cards,
            }),
            None => None,
        };
        let rule = dealerjack::Rule {
            number_of_decks: self.number_of_decks,
            reshuffle_cutoff: self.reshuffle_cutoff,
            continuous_shuffle: self.continuous_shuffle,
            player_hit_soft17: self.player_hit_soft17,
            dealer_hit_soft17: self.dealer_hit_soft17,
            hit_against_blackjack: self.hit_against_blackjack,
            commission_pct: self.commission_pct,
            payout_blackjack: self.payout_blackjack,
            number_of_players: self.number_of_players,
            player_rules,
            sidebet,
        };
        rule.validate()?;
        Ok(rule)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigEdgeSimulator {
    pub hands_to_simulate: u64,
    /// Zero means one worker per available core.
    pub number_of_threads: usize,
    /// Omit for a fresh seed each run; the report echoes the seed used.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Play this many hands through a printing handler before the bulk run.
    #[serde(default)]
    pub trace_hands: u64,
    /// Directory for the summary and CSV matrix reports. Empty disables
    /// report files.
    #[serde(default)]
    pub report_directory: String,
}

impl ConfigEdgeSimulator {
    pub fn run_profile(&self) -> dealerjack::RunProfile {
        dealerjack::RunProfile {
            hands_to_simulate: self.hands_to_simulate,
            number_of_threads: self.number_of_threads,
            seed: self.seed,
        }
    }
}

/// Reads the content of a given config file and parses it to a Config.
///
/// Panics if any error occurs.
pub fn parse_config_from_file(filename: &str) -> Config {
    let file_content = fs::read_to_string(filename).unwrap();
    serde_yaml::from_str(&file_content).unwrap()
}
