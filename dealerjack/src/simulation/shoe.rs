use super::{Card, Suit};

use strum::IntoEnumIterator;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Represents a shoe in the real world: the full card supply plus a cursor.
/// Dealt cards never leave the vector, so a rebuild is a cursor reset
/// followed by a full shuffle.
///
/// Each shoe owns its RNG, seeded at construction, so independent simulation
/// streams stay reproducible without sharing any global state.
#[derive(Debug, Clone)]
pub struct Shoe {
    number_of_decks: u8,
    reshuffle_cutoff: u16,
    continuous_shuffle: bool,
    cards: Vec<Card>,
    current_index: usize,
    rng: StdRng,
}

impl Shoe {
    /// Creates a new shoe with ordered cards. Call [`Shoe::shuffle`] before
    /// dealing the first hand.
    pub fn new(
        number_of_decks: u8,
        reshuffle_cutoff: u16,
        continuous_shuffle: bool,
        seed: u64,
    ) -> Shoe {
        let mut cards = Vec::with_capacity(number_of_decks as usize * 52);
        for _ in 0..number_of_decks {
            for suit in Suit::iter() {
                for face_value in 1..=13 {
                    cards.push(Card { face_value, suit });
                }
            }
        }
        Shoe {
            number_of_decks,
            reshuffle_cutoff,
            continuous_shuffle,
            cards,
            current_index: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Returns the dealt cards to the shoe and shuffles the whole card
    /// supply. Panics on an empty shoe; that is a construction bug, not a
    /// runtime condition.
    pub fn shuffle(&mut self) {
        assert!(!self.cards.is_empty(), "cannot shuffle an empty shoe");
        self.current_index = 0;
        self.cards.shuffle(&mut self.rng);
    }

    /// Shuffles, then pins the next cards to deal to the given blackjack
    /// values (1 stands for A; 10 stands for 10, J, Q and K). Panics if the
    /// shoe cannot supply them. Diagnostic and test helper.
    pub fn shuffle_with_firsts(&mut self, firsts: &[u8]) {
        self.shuffle();
        for (position, &blackjack_value) in firsts.iter().enumerate() {
            let found = (position..self.cards.len())
                .find(|&index| self.cards[index].blackjack_value() == blackjack_value)
                .expect("the requested first cards are not all in the shoe");
            self.cards.swap(position, found);
        }
    }

    /// Hand-boundary reshuffle policy: a continuous shuffler rebuilds after
    /// every hand, a traditional shoe once the cutoff is reached. Never
    /// called mid-hand; a hand in progress may deplete the shoe below the
    /// cutoff.
    pub fn begin_hand(&mut self) {
        if self.continuous_shuffle || self.remaining() <= self.reshuffle_cutoff {
            log::trace!("reshuffling with {} cards left", self.remaining());
            self.shuffle();
        }
    }

    /// Deals the card at the cursor. Returns None on an exhausted shoe;
    /// inside a hand the callers treat that as a contract violation, since
    /// the cutoff check runs before every hand.
    pub fn deal_card(&mut self) -> Option<Card> {
        if self.current_index == self.cards.len() {
            None
        } else {
            let card = self.cards[self.current_index];
            self.current_index += 1;
            Some(card)
        }
    }

    /// Count of undealt cards.
    pub fn remaining(&self) -> u16 {
        (self.cards.len() - self.current_index) as u16
    }

    pub fn number_of_decks(&self) -> u8 {
        self.number_of_decks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_shoe(number_of_decks: u8) -> Shoe {
        Shoe::new(number_of_decks, 52, false, 99)
    }

    fn card_multiset_is_correct(shoe: &Shoe) -> bool {
        let mut counts = [0u8; 52];
        for card in &shoe.cards {
            let card_integer: u8 = (*card).into();
            counts[card_integer as usize] += 1;
        }
        counts.iter().all(|&count| count == shoe.number_of_decks)
    }

    #[test]
    fn new_shoe_is_ordered_and_complete() {
        let shoe = fresh_shoe(3);
        assert_eq!(shoe.cards.len(), 3 * 52);
        assert_eq!(shoe.remaining(), 3 * 52);
        assert!(card_multiset_is_correct(&shoe));
        // Ordered: the first deck starts with the ace of the first suit.
        assert_eq!(shoe.cards[0].blackjack_value(), 1);
        assert_eq!(shoe.cards[13].blackjack_value(), 1);
    }

    #[test]
    fn shuffle_preserves_the_multiset() {
        let mut shoe = fresh_shoe(2);
        for _ in 0..30 {
            let _ = shoe.deal_card();
        }
        shoe.shuffle();
        assert_eq!(shoe.remaining(), 2 * 52);
        assert!(card_multiset_is_correct(&shoe));
    }

    #[test]
    fn same_seed_gives_the_same_order() {
        let mut left = Shoe::new(2, 52, false, 7);
        let mut right = Shoe::new(2, 52, false, 7);
        left.shuffle();
        right.shuffle();
        for _ in 0..(2 * 52) {
            assert_eq!(left.deal_card(), right.deal_card());
        }
    }

    #[test]
    fn shuffle_with_firsts_pins_the_top_cards() {
        let mut shoe = fresh_shoe(1);
        let firsts = [1, 2, 6, 6, 9];
        shoe.shuffle_with_firsts(&firsts);
        assert!(card_multiset_is_correct(&shoe));
        for &blackjack_value in &firsts {
            assert_eq!(shoe.deal_card().unwrap().blackjack_value(), blackjack_value);
        }

        let tens = [9, 10, 10, 10, 10, 10];
        shoe.shuffle_with_firsts(&tens);
        assert!(card_multiset_is_correct(&shoe));
        for &blackjack_value in &tens {
            assert_eq!(shoe.deal_card().unwrap().blackjack_value(), blackjack_value);
        }
    }

    #[test]
    #[should_panic]
    fn impossible_firsts_panic() {
        let mut shoe = fresh_shoe(1);
        shoe.shuffle_with_firsts(&[6, 6, 6, 6, 6]); // only four sixes exist
    }

    #[test]
    fn traditional_shoe_reshuffles_at_the_cutoff() {
        let mut shoe = fresh_shoe(2);
        shoe.shuffle();
        while shoe.remaining() > 53 {
            let _ = shoe.deal_card();
        }
        shoe.begin_hand();
        assert_eq!(shoe.remaining(), 53); // above the cutoff, untouched
        let _ = shoe.deal_card();
        shoe.begin_hand();
        assert_eq!(shoe.remaining(), 2 * 52); // at the cutoff, rebuilt in full
    }

    #[test]
    fn continuous_shuffler_rebuilds_every_hand() {
        let mut shoe = Shoe::new(1, 0, true, 5);
        shoe.shuffle();
        for _ in 0..10 {
            let _ = shoe.deal_card();
        }
        shoe.begin_hand();
        assert_eq!(shoe.remaining(), 52);
    }

    #[test]
    fn dealing_past_the_end_returns_none() {
        let mut shoe = fresh_shoe(1);
        shoe.shuffle();
        for _ in 0..52 {
            assert!(shoe.deal_card().is_some());
        }
        assert!(shoe.deal_card().is_none());
    }

    #[test]
    #[should_panic]
    fn shuffling_an_empty_shoe_panics() {
        let mut shoe = Shoe::new(0, 0, false, 0);
        shoe.shuffle();
    }
}
