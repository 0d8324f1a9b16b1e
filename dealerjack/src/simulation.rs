pub mod hand;
pub mod shoe;

use crate::strategy::{Strategy, TableStrategy};
use crate::{ConfigError, Decision, Rule};
use dealerjack_macros::require_phase;
use strum_macros::EnumIter;

use self::hand::Hand;
use self::shoe::Shoe;

static FACE_VALUE_TO_BLACKJACK_VALUE: [u8; 13] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 10, 10, 10];

/// A hand drawing more cards than this is a broken decision table, not play.
/// Twenty-one aces reach a hard 21 and the next card busts, so no legal hand
/// comes close.
const MAX_CARDS_PER_HAND: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, EnumIter)]
pub enum Suit {
    Diamond = 0,
    Club,
    Heart,
    Spade,
}

/// Represents a card in the real world with a suit and a face value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Card {
    pub face_value: u8,
    pub suit: Suit,
}

impl Card {
    /// Ace counts 1 here; the hand model decides when it plays as 11.
    pub fn blackjack_value(&self) -> u8 {
        FACE_VALUE_TO_BLACKJACK_VALUE[(self.face_value - 1) as usize]
    }

    /// The value a decision table sees when this card is the dealer upcard:
    /// the ace shows as 11.
    pub fn upcard_value(&self) -> u8 {
        match self.blackjack_value() {
            1 => 11,
            value => value,
        }
    }
}

impl Default for Card {
    fn default() -> Self {
        Card {
            face_value: 1,
            suit: Suit::Diamond,
        }
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let suit = match self.suit {
            Suit::Diamond => 'D',
            Suit::Club => 'C',
            Suit::Heart => 'H',
            Suit::Spade => 'S',
        };
        let value = match self.face_value {
            1 => 'A',
            2 => '2',
            3 => '3',
            4 => '4',
            5 => '5',
            6 => '6',
            7 => '7',
            8 => '8',
            9 => '9',
            10 => 'T',
            11 => 'J',
            12 => 'Q',
            13 => 'K',
            _ => panic!("Invalid card face value!"),
        };
        write!(f, "{}{}", suit, value)
    }
}

impl From<Card> for u8 {
    fn from(card: Card) -> u8 {
        card.suit as u8 * 13 + card.face_value - 1
    }
}

impl TryFrom<u8> for Card {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value >= 52 {
            Err(())
        } else {
            let suit = match value / 13 {
                0 => Suit::Diamond,
                1 => Suit::Club,
                2 => Suit::Heart,
                3 => Suit::Spade,
                _ => unreachable!(),
            };
            Ok(Card {
                suit,
                face_value: value % 13 + 1,
            })
        }
    }
}

/// The per-hand state machine. Methods on [`Simulator`] are each guarded to
/// one phase, so a step-wise front end cannot drive the hand out of order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HandPhase {
    DealInitial,
    PlayerActing,
    DealerActing,
    Resolved,
}

/// Who prevailed, relative to the table hands. Under the dealer-bet variant
/// the bet pays when the *dealer* hand wins; the statistics layer makes that
/// translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundResult {
    PlayerWin,
    DealerWin,
    Push,
}

/// Why a push happened. Total ties carry the tied total for the sidebet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushKind {
    TotalTie(u16),
    BustBust,
    NaturalNatural,
}

/// Snapshot of one side's finished hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandSummary {
    pub total: u16,
    pub cards: u8,
    pub natural: bool,
    pub bust: bool,
}

impl HandSummary {
    fn of(hand: &Hand) -> HandSummary {
        HandSummary {
            total: hand.total(),
            cards: hand.number_of_cards() as u8,
            natural: hand.is_natural(),
            bust: hand.is_bust(),
        }
    }
}

/// One seat's resolved hand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    pub player: HandSummary,
    pub dealer: HandSummary,
    pub result: RoundResult,
    pub push: Option<PushKind>,
}

/// Simulates one table of the dealer-bet variant: up to [`crate::MAX_PLAYERS`]
/// passive player seats against the dealer, all drawing from one shoe.
pub struct Simulator {
    rule: Rule,
    player_strategy: TableStrategy,
    dealer_strategy: TableStrategy,
    shoe: Shoe,
    phase: HandPhase,
    player_hands: Vec<Hand>,
    dealer_hand: Hand,
}

impl Simulator {
    pub fn new(rule: &Rule, seed: u64) -> Result<Simulator, ConfigError> {
        rule.validate()?;
        let mut shoe = Shoe::new(
            rule.number_of_decks,
            rule.reshuffle_cutoff,
            rule.continuous_shuffle,
            seed,
        );
        shoe.shuffle();
        let player_hands = (0..rule.number_of_players).map(|_| Hand::new()).collect();
        Ok(Simulator {
            player_strategy: TableStrategy::new(rule.player_rules.clone(), rule.player_hit_soft17),
            dealer_strategy: TableStrategy::new(Default::default(), rule.dealer_hit_soft17),
            rule: rule.clone(),
            shoe,
            phase: HandPhase::DealInitial,
            player_hands,
            dealer_hand: Hand::new(),
        })
    }

    /// Runs the shoe's hand-boundary reshuffle policy, then deals two rounds
    /// of cards: each seat in order, then the dealer. The dealer's first
    /// card is the upcard.
    #[require_phase(DealInitial)]
    pub fn deal_initial_cards(&mut self) -> Result<(), String> {
        self.shoe.begin_hand();
        for hand in &mut self.player_hands {
            hand.clear();
        }
        self.dealer_hand.clear();

        for _ in 0..2 {
            for seat in 0..self.player_hands.len() {
                let card = self.draw();
                self.player_hands[seat].add_card(card);
            }
            let card = self.draw();
            self.dealer_hand.add_card(card);
        }

        self.phase = HandPhase::PlayerActing;
        Ok(())
    }

    /// Plays every seat to completion against the upcard. A seat holding a
    /// natural never draws; against a dealer natural seats draw only when
    /// the rule allows hitting into a decided hand.
    #[require_phase(PlayerActing)]
    pub fn play_player_seats<H: SimulatorEventHandler>(
        &mut self,
        handler: &mut H,
    ) -> Result<(), String> {
        let upcard = self.dealer_hand.cards()[0].upcard_value();
        let seats_may_draw = !self.dealer_hand.is_natural() || self.rule.hit_against_blackjack;

        for seat in 0..self.player_hands.len() {
            if self.player_hands[seat].is_natural() || !seats_may_draw {
                continue;
            }
            loop {
                let decision = self.player_strategy.decide(&self.player_hands[seat], Some(upcard));
                handler.on_player_decision(seat, decision);
                match decision {
                    Decision::Stand => break,
                    Decision::Hit => {
                        let card = self.draw();
                        self.player_hands[seat].add_card(card);
                        assert!(
                            self.player_hands[seat].number_of_cards() <= MAX_CARDS_PER_HAND,
                            "player hit loop failed to terminate"
                        );
                    }
                }
            }
        }

        self.phase = HandPhase::DealerActing;
        Ok(())
    }

    /// Plays the dealer hand to completion. The dealer consults no upcard.
    /// It does not draw when it holds a natural, nor when every seat already
    /// resolved by naturals.
    #[require_phase(DealerActing)]
    pub fn play_dealer_hand<H: SimulatorEventHandler>(
        &mut self,
        handler: &mut H,
    ) -> Result<(), String> {
        let any_live_seat = self.player_hands.iter().any(|hand| !hand.is_natural());
        if !self.dealer_hand.is_natural() && any_live_seat {
            loop {
                let decision = self.dealer_strategy.decide(&self.dealer_hand, None);
                handler.on_dealer_decision(decision);
                match decision {
                    Decision::Stand => break,
                    Decision::Hit => {
                        let card = self.draw();
                        self.dealer_hand.add_card(card);
                        assert!(
                            self.dealer_hand.number_of_cards() <= MAX_CARDS_PER_HAND,
                            "dealer hit loop failed to terminate"
                        );
                    }
                }
            }
        }

        self.phase = HandPhase::Resolved;
        Ok(())
    }

    /// Compares every seat against the dealer hand and re-arms the machine
    /// for the next deal. Returns one outcome per seat.
    #[require_phase(Resolved)]
    pub fn resolve(&mut self) -> Result<Vec<Outcome>, String> {
        let dealer = HandSummary::of(&self.dealer_hand);
        let outcomes = self
            .player_hands
            .iter()
            .map(|hand| resolve_seat(HandSummary::of(hand), dealer))
            .collect();
        self.phase = HandPhase::DealInitial;
        Ok(outcomes)
    }

    /// Drives one complete hand through all four phases.
    pub fn run_hand<H: SimulatorEventHandler>(
        &mut self,
        handler: &mut H,
    ) -> Result<Vec<Outcome>, String> {
        handler.on_hand_begin(&self.shoe);
        self.deal_initial_cards()?;
        handler.on_deal(&self.player_hands, &self.dealer_hand);
        self.play_player_seats(handler)?;
        self.play_dealer_hand(handler)?;
        let outcomes = self.resolve()?;
        for outcome in &outcomes {
            handler.on_outcome(outcome);
        }
        Ok(outcomes)
    }

    /// Pins the next cards to deal, in blackjack values. Diagnostic and test
    /// helper; see [`Shoe::shuffle_with_firsts`].
    pub fn stack_shoe(&mut self, firsts: &[u8]) {
        self.shoe.shuffle_with_firsts(firsts);
    }

    pub fn shoe(&self) -> &Shoe {
        &self.shoe
    }

    fn draw(&mut self) -> Card {
        // The reshuffle check runs before every hand, so running dry here is
        // a broken configuration, not a table condition.
        self.shoe.deal_card().expect("shoe exhausted mid-hand")
    }
}

/// Resolves one seat under the variant rules. Naturals settle first, as at a
/// live table: a lone natural wins outright and is never out-drawn.
fn resolve_seat(player: HandSummary, dealer: HandSummary) -> Outcome {
    let (result, push) = if player.natural && dealer.natural {
        (RoundResult::Push, Some(PushKind::NaturalNatural))
    } else if dealer.natural {
        (RoundResult::DealerWin, None)
    } else if player.natural {
        (RoundResult::PlayerWin, None)
    } else if player.bust && dealer.bust {
        (RoundResult::Push, Some(PushKind::BustBust))
    } else if player.bust {
        (RoundResult::DealerWin, None)
    } else if dealer.bust {
        (RoundResult::PlayerWin, None)
    } else if player.total > dealer.total {
        (RoundResult::PlayerWin, None)
    } else if dealer.total > player.total {
        (RoundResult::DealerWin, None)
    } else {
        (RoundResult::Push, Some(PushKind::TotalTie(player.total)))
    };
    Outcome {
        player,
        dealer,
        result,
        push,
    }
}

/// Hooks for front ends that want to watch hands as they play out. All
/// methods default to doing nothing.
pub trait SimulatorEventHandler {
    fn on_hand_begin(&mut self, _shoe: &Shoe) {}
    fn on_deal(&mut self, _player_hands: &[Hand], _dealer_hand: &Hand) {}
    fn on_player_decision(&mut self, _seat: usize, _decision: Decision) {}
    fn on_dealer_decision(&mut self, _decision: Decision) {}
    fn on_outcome(&mut self, _outcome: &Outcome) {}
}

/// Handler for the bulk simulation loops, which only want the outcomes.
pub struct SilentHandler;

impl SimulatorEventHandler for SilentHandler {}
