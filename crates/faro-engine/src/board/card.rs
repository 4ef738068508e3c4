/// Card rank, with jokers below the regular run.
///
/// Discriminants match the pack-file encoding: A..K are 1..13, jokers are
/// negative.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(i8)]
pub enum CardRank {
    Ace = 1,
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
    Ten = 10,
    Jack = 11,
    Queen = 12,
    King = 13,
    BlackJoker = -1,
    RedJoker = -2,
}

impl CardRank {
    /// The thirteen regular ranks, ace-low order.
    pub const REGULAR: [CardRank; 13] = [
        CardRank::Ace,
        CardRank::Two,
        CardRank::Three,
        CardRank::Four,
        CardRank::Five,
        CardRank::Six,
        CardRank::Seven,
        CardRank::Eight,
        CardRank::Nine,
        CardRank::Ten,
        CardRank::Jack,
        CardRank::Queen,
        CardRank::King,
    ];
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum CardSuit {
    Spade = 1,
    Club = 2,
    Diamond = 3,
    Heart = 4,
}

impl CardSuit {
    pub const ALL: [CardSuit; 4] = [
        CardSuit::Spade,
        CardSuit::Club,
        CardSuit::Diamond,
        CardSuit::Heart,
    ];
}

/// One playing card.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Card {
    pub rank: CardRank,
    pub suit: CardSuit,
}

impl Card {
    #[inline]
    pub const fn new(rank: CardRank, suit: CardSuit) -> Self {
        Self { rank, suit }
    }
}

/// A 52-card deck, suit-major, ace-low within each suit.
pub fn standard_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(52);
    for suit in CardSuit::ALL {
        for rank in CardRank::REGULAR {
            deck.push(Card::new(rank, suit));
        }
    }
    deck
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_deck_has_52_distinct_cards() {
        let deck = standard_deck();
        assert_eq!(deck.len(), 52);

        let mut seen = std::collections::HashSet::new();
        for card in &deck {
            assert!(seen.insert(*card), "duplicate card {card:?}");
        }
    }

    #[test]
    fn rank_discriminants_match_pack_encoding() {
        assert_eq!(CardRank::Ace as i8, 1);
        assert_eq!(CardRank::King as i8, 13);
        assert_eq!(CardRank::BlackJoker as i8, -1);
        assert_eq!(CardRank::RedJoker as i8, -2);
    }
}
