use std::str::FromStr;

use crate::simulation::hand::Hand;
use crate::{ConfigError, Decision, HandType};

/// Upcard values run from 2 through 11; 11 is the ace.
pub const MIN_UPCARD: u8 = 2;
pub const MAX_UPCARD: u8 = 11;

/// The dealer upcard values a rule applies to, stored as a bitmask so the
/// hot decision loop never touches strings or heap sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpcardSet(u16);

impl UpcardSet {
    /// The wildcard: matches every upcard, and matches even when no upcard
    /// is in play (the dealer deciding for itself).
    pub const ANY: UpcardSet = UpcardSet(!0);

    pub fn empty() -> UpcardSet {
        UpcardSet(0)
    }

    pub fn of(values: &[u8]) -> UpcardSet {
        let mut set = UpcardSet::empty();
        for &value in values {
            set.insert(value);
        }
        set
    }

    pub fn insert(&mut self, value: u8) {
        debug_assert!((MIN_UPCARD..=MAX_UPCARD).contains(&value));
        self.0 |= 1 << value;
    }

    pub fn contains(&self, value: u8) -> bool {
        self.0 & (1 << value) != 0
    }

    pub fn is_any(&self) -> bool {
        *self == UpcardSet::ANY
    }
}

/// A single decision-table entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRule {
    pub hand_type: HandType,
    pub total: u16,
    pub upcards: UpcardSet,
    pub decision: Decision,
}

/// An ordered decision table. Declaration order is significant: the first
/// matching rule wins, ahead of the default stand-on-17 policy. Overlapping
/// upcard sets are legal; the earlier entry shadows the later one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleTable {
    rules: Vec<HitRule>,
}

impl RuleTable {
    pub fn new(rules: Vec<HitRule>) -> RuleTable {
        RuleTable { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// First rule matching the hand shape and the upcard in play. Rules with
    /// a concrete upcard set never match when no upcard is supplied.
    fn first_match(&self, hand_type: HandType, total: u16, upcard: Option<u8>) -> Option<Decision> {
        self.rules
            .iter()
            .find(|rule| {
                rule.hand_type == hand_type
                    && rule.total == total
                    && match upcard {
                        Some(value) => rule.upcards.contains(value),
                        None => rule.upcards.is_any(),
                    }
            })
            .map(|rule| rule.decision)
    }
}

/// Parses the wire format consumed from configuration text:
/// semicolon-separated entries `hand_type:total:upcards,action`, where
/// `upcards` is a `|`-separated list of values 2..=11 and is omitted for
/// "any". Example: `hard:16:10|11,hit;soft:17:hit`.
///
/// Malformed entries are rejected outright; nothing is skipped or clamped.
impl FromStr for RuleTable {
    type Err = ConfigError;

    fn from_str(text: &str) -> Result<RuleTable, ConfigError> {
        let mut rules = Vec::new();
        for entry in text.split(';') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let rule = parse_entry(entry).map_err(|reason| ConfigError::InvalidHitRule {
                entry: entry.to_string(),
                reason,
            })?;
            rules.push(rule);
        }
        Ok(RuleTable::new(rules))
    }
}

fn parse_entry(entry: &str) -> Result<HitRule, String> {
    let mut parts = entry.split(':');
    let (hand_type, total, tail) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(hand_type), Some(total), Some(tail), None) => (hand_type, total, tail),
        _ => return Err(String::from("expected hand_type:total:upcards,action")),
    };

    let hand_type = match hand_type {
        "hard" => HandType::Hard,
        "soft" => HandType::Soft,
        other => return Err(format!("`{other}` is not a hand type (hard or soft)")),
    };

    let total: u16 = total
        .parse()
        .map_err(|_| format!("`{total}` is not a hand total"))?;
    if !(2..=21).contains(&total) {
        return Err(format!("hand total {total} is outside 2..=21"));
    }

    let (upcards, action) = match tail.split_once(',') {
        Some((upcards, action)) => (parse_upcards(upcards)?, action),
        None => (UpcardSet::ANY, tail),
    };

    let decision = match action {
        "hit" | "h" => Decision::Hit,
        "stand" | "s" => Decision::Stand,
        other => return Err(format!("`{other}` is not an action (hit or stand)")),
    };

    Ok(HitRule {
        hand_type,
        total,
        upcards,
        decision,
    })
}

fn parse_upcards(text: &str) -> Result<UpcardSet, String> {
    let mut set = UpcardSet::empty();
    for value in text.split('|') {
        let value: u8 = value
            .parse()
            .map_err(|_| format!("`{value}` is not an upcard value"))?;
        if !(MIN_UPCARD..=MAX_UPCARD).contains(&value) {
            return Err(format!("upcard value {value} is outside 2..=11"));
        }
        set.insert(value);
    }
    Ok(set)
}

pub trait Strategy {
    /// Decides hit or stand for a hand. `dealer_upcard` carries the dealer's
    /// face-up value when a player seat is deciding and is `None` when the
    /// dealer plays its own hand.
    fn decide(&self, hand: &Hand, dealer_upcard: Option<u8>) -> Decision;
}

/// The rule-table strategy both sides run: an ordered custom table in front
/// of the default stand-on-17 policy. The dealer uses one with an empty
/// table and its own soft-17 flag.
#[derive(Debug, Clone, Default)]
pub struct TableStrategy {
    table: RuleTable,
    hit_soft17: bool,
}

impl TableStrategy {
    pub fn new(table: RuleTable, hit_soft17: bool) -> TableStrategy {
        TableStrategy { table, hit_soft17 }
    }
}

impl Strategy for TableStrategy {
    fn decide(&self, hand: &Hand, dealer_upcard: Option<u8>) -> Decision {
        // A busted or natural hand has no further action.
        if hand.is_bust() || hand.is_natural() {
            return Decision::Stand;
        }

        let hand_type = if hand.is_soft() {
            HandType::Soft
        } else {
            HandType::Hard
        };
        let total = hand.total();

        if let Some(decision) = self.table.first_match(hand_type, total, dealer_upcard) {
            return decision;
        }

        if total >= 17 {
            if total == 17 && hand_type == HandType::Soft && self.hit_soft17 {
                Decision::Hit
            } else {
                Decision::Stand
            }
        } else {
            Decision::Hit
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{Card, Suit};

    fn hand_of(face_values: &[u8]) -> Hand {
        let mut hand = Hand::new();
        for &face_value in face_values {
            hand.add_card(Card {
                face_value,
                suit: Suit::Heart,
            });
        }
        hand
    }

    fn stand_on_17() -> TableStrategy {
        TableStrategy::new(RuleTable::default(), false)
    }

    #[test]
    fn default_policy_hits_sixteen_and_stands_seventeen() {
        let strategy = stand_on_17();
        assert_eq!(strategy.decide(&hand_of(&[10, 6]), Some(10)), Decision::Hit);
        assert_eq!(strategy.decide(&hand_of(&[10, 7]), Some(10)), Decision::Stand);
        assert_eq!(strategy.decide(&hand_of(&[10, 2]), None), Decision::Hit);
        assert_eq!(strategy.decide(&hand_of(&[10, 10]), None), Decision::Stand);
    }

    #[test]
    fn soft_seventeen_follows_the_flag() {
        let soft_17 = [1, 6];
        assert_eq!(
            stand_on_17().decide(&hand_of(&soft_17), None),
            Decision::Stand
        );
        let hit_soft = TableStrategy::new(RuleTable::default(), true);
        assert_eq!(hit_soft.decide(&hand_of(&soft_17), None), Decision::Hit);
        // Hard 17 stands regardless of the flag.
        assert_eq!(hit_soft.decide(&hand_of(&[10, 7]), None), Decision::Stand);
        // Soft 18 stands regardless of the flag.
        assert_eq!(hit_soft.decide(&hand_of(&[1, 7]), None), Decision::Stand);
    }

    #[test]
    fn busted_and_natural_hands_are_forced_stands() {
        let always_hit = TableStrategy::new(
            "hard:21:hit".parse().unwrap(),
            true,
        );
        assert_eq!(
            always_hit.decide(&hand_of(&[10, 9, 8]), Some(5)),
            Decision::Stand
        );
        assert_eq!(
            always_hit.decide(&hand_of(&[1, 10]), Some(5)),
            Decision::Stand
        );
        // A three-card 21 is no natural; the explicit rule reaches it.
        assert_eq!(
            always_hit.decide(&hand_of(&[5, 6, 10]), Some(5)),
            Decision::Hit
        );
    }

    #[test]
    fn explicit_rule_overrides_the_default_policy() {
        // The documented scenario: hit hard 16 against a ten, hit soft 17
        // always, with both soft-17 flags off.
        let strategy = TableStrategy::new(
            "hard:16:10,hit;soft:17:hit".parse().unwrap(),
            false,
        );
        assert_eq!(strategy.decide(&hand_of(&[10, 6]), Some(10)), Decision::Hit);
        assert_eq!(strategy.decide(&hand_of(&[1, 6]), Some(10)), Decision::Hit);
        assert_eq!(strategy.decide(&hand_of(&[1, 6]), Some(2)), Decision::Hit);
    }

    #[test]
    fn upcard_set_restricts_the_rule() {
        let strategy = TableStrategy::new(
            "hard:16:9|10|11,stand".parse().unwrap(),
            false,
        );
        let hard_16 = [10, 6];
        assert_eq!(strategy.decide(&hand_of(&hard_16), Some(10)), Decision::Stand);
        assert_eq!(strategy.decide(&hand_of(&hard_16), Some(11)), Decision::Stand);
        // Outside the set the default policy hits sixteen.
        assert_eq!(strategy.decide(&hand_of(&hard_16), Some(6)), Decision::Hit);
        // No upcard in play: a concrete set never matches.
        assert_eq!(strategy.decide(&hand_of(&hard_16), None), Decision::Hit);
    }

    #[test]
    fn first_declared_rule_wins_on_overlap() {
        let table: RuleTable = "hard:16:10,stand;hard:16,hit".parse().unwrap();
        assert_eq!(table.len(), 2);
        let strategy = TableStrategy::new(table, false);
        assert_eq!(
            strategy.decide(&hand_of(&[10, 6]), Some(10)),
            Decision::Stand
        );
        assert_eq!(strategy.decide(&hand_of(&[10, 6]), Some(4)), Decision::Hit);

        // Reversed order: the wildcard entry shadows the narrow one.
        let shadowed = TableStrategy::new(
            "hard:16,hit;hard:16:10,stand".parse().unwrap(),
            false,
        );
        assert_eq!(shadowed.decide(&hand_of(&[10, 6]), Some(10)), Decision::Hit);
    }

    #[test]
    fn parses_the_wire_format() {
        let table: RuleTable = "hard:16:10|11,hit; soft:18:9,stand ;".parse().unwrap();
        assert_eq!(table.len(), 2);
        let expected = HitRule {
            hand_type: HandType::Hard,
            total: 16,
            upcards: UpcardSet::of(&[10, 11]),
            decision: Decision::Hit,
        };
        assert_eq!(table.rules[0], expected);
        assert!(!table.rules[1].upcards.is_any());
        assert!("".parse::<RuleTable>().unwrap().is_empty());
    }

    #[test]
    fn malformed_entries_are_rejected() {
        for text in [
            "hard:16",              // missing action
            "hard:16:10,hit:extra", // too many fields
            "firm:16:hit",          // unknown hand type
            "hard:banana:hit",      // unparseable total
            "hard:25:hit",          // total out of range
            "hard:16:1,hit",        // upcard out of range
            "hard:16:10|x,hit",     // unparseable upcard
            "hard:16:10,fold",      // unknown action
        ] {
            let result = text.parse::<RuleTable>();
            assert!(
                matches!(result, Err(ConfigError::InvalidHitRule { .. })),
                "`{text}` parsed to {result:?}"
            );
        }
    }
}
