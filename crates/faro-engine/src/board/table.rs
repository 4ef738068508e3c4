use super::Card;

/// One board cell holding at most one card.
#[derive(Debug, Clone, Default)]
pub struct Block {
    card: Option<Card>,
}

impl Block {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.card.is_none()
    }

    #[inline]
    pub fn card(&self) -> Option<Card> {
        self.card
    }

    /// Places `card` in this block. Returns `false` (and leaves the block
    /// unchanged) when it is already occupied.
    pub fn put(&mut self, card: Card) -> bool {
        if self.card.is_some() {
            return false;
        }
        self.card = Some(card);
        true
    }

    /// Removes and returns the held card, if any.
    pub fn take(&mut self) -> Option<Card> {
        self.card.take()
    }
}

/// The table: a grid of blocks plus the loose card piles around it.
#[derive(Debug, Clone)]
pub struct Board {
    blocks: Vec<Vec<Block>>,
    pub hand_cards: Vec<Card>,
    pub rival_cards: Vec<Card>,
    pub card_deck: Vec<Card>,
}

impl Board {
    /// Creates an empty `columns x rows` board with no cards anywhere.
    pub fn new(columns: usize, rows: usize) -> Self {
        Self {
            blocks: vec![vec![Block::default(); rows]; columns],
            hand_cards: Vec::new(),
            rival_cards: Vec::new(),
            card_deck: Vec::new(),
        }
    }

    pub fn columns(&self) -> usize {
        self.blocks.len()
    }

    pub fn rows(&self) -> usize {
        self.blocks.first().map_or(0, Vec::len)
    }

    pub fn block(&self, column: usize, row: usize) -> Option<&Block> {
        self.blocks.get(column)?.get(row)
    }

    /// Places `card` at `(column, row)`. Returns `false` when the position
    /// is out of range or the block is occupied.
    pub fn place(&mut self, column: usize, row: usize, card: Card) -> bool {
        match self.blocks.get_mut(column).and_then(|c| c.get_mut(row)) {
            Some(block) => block.put(card),
            None => false,
        }
    }

    /// Draws the top card of the deck.
    pub fn draw_from_deck(&mut self) -> Option<Card> {
        self.card_deck.pop()
    }

    /// Iterates occupied positions as `(column, row, card)`.
    pub fn placed_cards(&self) -> impl Iterator<Item = (usize, usize, Card)> + '_ {
        self.blocks.iter().enumerate().flat_map(|(col, rows)| {
            rows.iter()
                .enumerate()
                .filter_map(move |(row, block)| block.card().map(|card| (col, row, card)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{standard_deck, CardRank, CardSuit};

    fn card() -> Card {
        Card::new(CardRank::Queen, CardSuit::Heart)
    }

    #[test]
    fn block_rejects_second_card() {
        let mut block = Block::default();
        assert!(block.put(card()));
        assert!(!block.put(Card::new(CardRank::Two, CardSuit::Spade)));
        assert_eq!(block.card(), Some(card()));
    }

    #[test]
    fn block_take_empties() {
        let mut block = Block::default();
        block.put(card());
        assert_eq!(block.take(), Some(card()));
        assert!(block.is_empty());
    }

    #[test]
    fn place_respects_bounds() {
        let mut board = Board::new(3, 2);
        assert!(board.place(2, 1, card()));
        assert!(!board.place(3, 0, card()));
        assert!(!board.place(0, 2, card()));
    }

    #[test]
    fn placed_cards_reports_positions() {
        let mut board = Board::new(2, 2);
        board.place(0, 1, card());
        board.place(1, 0, Card::new(CardRank::Ace, CardSuit::Spade));

        let mut placed: Vec<_> = board.placed_cards().collect();
        placed.sort_by_key(|&(c, r, _)| (c, r));

        assert_eq!(placed.len(), 2);
        assert_eq!(placed[0], (0, 1, card()));
        assert_eq!(placed[1], (1, 0, Card::new(CardRank::Ace, CardSuit::Spade)));
    }

    #[test]
    fn deck_draw_is_lifo() {
        let mut board = Board::new(1, 1);
        board.card_deck = standard_deck();
        let top = *board.card_deck.last().unwrap();
        assert_eq!(board.draw_from_deck(), Some(top));
        assert_eq!(board.card_deck.len(), 51);
    }
}
