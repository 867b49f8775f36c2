use anyhow::{Context, Result, bail};
use smallvec::SmallVec;

use std::hash::Hasher;

pub const HEIGHT: usize = 7;
pub const PYRAMID_SIZE: usize = HEIGHT * (HEIGHT + 1) / 2;
pub const STOCK_SIZE: usize = 24;
pub const MAX_RANK: u8 = 13;
pub const MAX_SUIT: u8 = 4;
pub const MAX_CARD: u8 = MAX_SUIT * MAX_RANK;
pub const KING_VALUE: u8 = 13;
pub const TOTAL_RESHUFFLES: u8 = 3;

const RANKS: [&str; 13] = [
    "A", "2", "3", "4", "5", "6", "7", "8", "9", "10", "J", "Q", "K",
];
const SUIT_LETTERS: [char; 4] = ['S', 'C', 'H', 'D'];
const SUIT_GLYPHS: [char; 4] = ['♠', '♣', '♥', '♦'];

/// A pyramid cell position as (col, row); row 0 is the tip.
pub type Pos = (usize, usize);

type PosList = SmallVec<[Pos; HEIGHT]>;
type ValueList = SmallVec<[u8; HEIGHT]>;

/// A removable pair of pyramid positions. Equality is unordered:
/// `{a, b}` and `{b, a}` are the same pair.
#[derive(Debug, Copy, Clone)]
pub struct Pair {
    pub first: Pos,
    pub second: Pos,
}

impl PartialEq for Pair {
    fn eq(&self, other: &Self) -> bool {
        (self.first == other.first && self.second == other.second)
            || (self.first == other.second && self.second == other.first)
    }
}

impl Eq for Pair {}

/// A playing card packed into a single byte: `suit * 13 + (value - 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Card(u8);

impl Card {
    pub fn new_with_value_suit(value: u8, suit: u8) -> Self {
        Self(suit * MAX_RANK + (value - 1))
    }

    /// Parses a token like `7H`, `as` or `10d`. Rank and suit letters are
    /// case-insensitive; everything before the final character is the rank.
    pub fn parse(token: &str) -> Result<Self> {
        let mut chars = token.chars();
        let suit_char = chars.next_back().unwrap_or_default();
        let rank_part = chars.as_str();
        if rank_part.is_empty() {
            bail!("Invalid card '{token}'");
        }
        let rank_upper = rank_part.to_uppercase();
        let rank = RANKS
            .iter()
            .position(|&r| r == rank_upper)
            .with_context(|| format!("Invalid rank at card '{token}'"))?;
        let suit_upper = suit_char.to_ascii_uppercase();
        let suit = SUIT_LETTERS
            .iter()
            .position(|&s| s == suit_upper)
            .with_context(|| format!("Invalid suit at card '{token}'"))?;
        Ok(Self(suit as u8 * MAX_RANK + rank as u8))
    }

    pub fn id(&self) -> u8 {
        self.0
    }

    /// 1-based rank value: A=1 .. K=13.
    pub fn value(&self) -> u8 {
        self.0 % MAX_RANK + 1
    }

    pub fn suit(&self) -> u8 {
        self.0 / MAX_RANK
    }

    pub fn is_king(&self) -> bool {
        self.value() == KING_VALUE
    }

    pub fn is_red(&self) -> bool {
        self.suit() >= 2
    }

    /// The value a card must have to pair with a card of value `value`.
    /// A King's counterpart is 0, i.e. no card at all.
    pub fn counterpart_value(value: u8) -> u8 {
        KING_VALUE - value
    }

    /// Whether this card and `other` can be removed together. A lone King
    /// (value 13) is complete on its own, so it pairs with `None`.
    pub fn is_counterpart(&self, other: Option<Card>) -> bool {
        match other {
            None => self.value() == KING_VALUE,
            Some(other) => self.value() + other.value() == KING_VALUE,
        }
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}",
            RANKS[(self.value() - 1) as usize],
            SUIT_GLYPHS[self.suit() as usize]
        )
    }
}

/// A full Pyramid Solitaire position: the triangular grid, the stock (draw
/// stack, front = next to draw), the waste (discard stack, front = most
/// recently drawn) and the remaining reshuffle count.
///
/// `Clone` performs a full structural copy; the solver clones one board per
/// expansion edge so branches never share mutable state.
#[derive(Debug, Clone)]
pub struct Board {
    /// Row `r` uses cols `0..=r`; unused cells stay `None`.
    pub pyramid: [[Option<Card>; HEIGHT]; HEIGHT],
    pub stock: SmallVec<[Card; STOCK_SIZE]>,
    pub waste: SmallVec<[Card; STOCK_SIZE]>,
    pub reshuffles_left: u8,
}

impl Default for Board {
    fn default() -> Self {
        Self {
            pyramid: [[None; HEIGHT]; HEIGHT],
            stock: SmallVec::new(),
            waste: SmallVec::new(),
            reshuffles_left: TOTAL_RESHUFFLES,
        }
    }
}

impl Board {
    /// Parses a layout file: one line of whitespace-separated card tokens.
    /// The first 28 fill the pyramid row by row from the tip; the rest form
    /// the stock in file order (first = top).
    pub fn parse(content: &str) -> Result<Self> {
        let mut cards = Vec::new();
        for token in content.split_whitespace() {
            cards.push(Card::parse(token)?);
        }
        if cards.len() < PYRAMID_SIZE {
            bail!(
                "Expected at least {PYRAMID_SIZE} cards, got {}",
                cards.len()
            );
        }
        if cards.len() > MAX_CARD as usize {
            bail!("Expected at most {MAX_CARD} cards, got {}", cards.len());
        }
        let mut seen = [false; MAX_CARD as usize];
        for &card in &cards {
            if seen[card.id() as usize] {
                bail!("Duplicate card {card}");
            }
            seen[card.id() as usize] = true;
        }

        let mut board = Self::default();
        let mut iter = cards.into_iter();
        for row in 0..HEIGHT {
            for col in 0..=row {
                board.pyramid[row][col] = iter.next();
            }
        }
        board.stock.extend(iter);
        Ok(board)
    }

    pub fn top_of_stock(&self) -> Option<Card> {
        self.stock.first().copied()
    }

    pub fn top_of_waste(&self) -> Option<Card> {
        self.waste.first().copied()
    }

    pub fn card_at(&self, pos: Pos) -> Option<Card> {
        self.pyramid[pos.1][pos.0]
    }

    pub fn is_complete(&self) -> bool {
        self.pyramid
            .iter()
            .all(|row| row.iter().all(|cell| cell.is_none()))
    }

    /// All exposed positions in row-major order. A cell above the base row is
    /// free when both cells directly below it are empty; base-row cells are
    /// free whenever occupied.
    pub fn free_cells(&self) -> PosList {
        let mut res = PosList::new();
        for row in 0..HEIGHT {
            for col in 0..=row {
                if self.pyramid[row][col].is_none() {
                    continue;
                }
                if row == HEIGHT - 1
                    || (self.pyramid[row + 1][col].is_none()
                        && self.pyramid[row + 1][col + 1].is_none())
                {
                    res.push((col, row));
                }
            }
        }
        res
    }

    /// Every removable pair among the free cells, deduplicated as unordered
    /// pairs. For each free cell the first free cell holding its complement
    /// is taken; 13 is odd so a complement is never the cell itself.
    pub fn matches_in_pyramid(&self) -> Vec<Pair> {
        let free = self.free_cells();
        let values: ValueList = free
            .iter()
            .map(|&pos| self.card_at(pos).map(|c| c.value()).unwrap_or_default())
            .collect();
        let mut res: Vec<Pair> = Vec::new();
        for (idx, &value) in values.iter().enumerate() {
            let counterpart = Card::counterpart_value(value);
            if let Some(counter_idx) = values.iter().position(|&v| v == counterpart) {
                let pair = Pair {
                    first: free[idx],
                    second: free[counter_idx],
                };
                if !res.contains(&pair) {
                    res.push(pair);
                }
            }
        }
        res
    }

    /// Free cells holding a King, removable without a counterpart.
    pub fn open_kings(&self) -> PosList {
        self.free_cells()
            .into_iter()
            .filter(|&pos| self.card_at(pos).is_some_and(|c| c.is_king()))
            .collect()
    }

    /// Whether the stock and waste tops pair with each other.
    pub fn stack_match_exists(&self) -> bool {
        match (self.top_of_stock(), self.top_of_waste()) {
            (Some(stock), Some(waste)) => stock.is_counterpart(Some(waste)),
            _ => false,
        }
    }

    pub fn matches_with_stock(&self) -> PosList {
        self.matches_with_top(self.top_of_stock())
    }

    pub fn matches_with_waste(&self) -> PosList {
        self.matches_with_top(self.top_of_waste())
    }

    /// Free cells whose card is complementary to the given stack top.
    fn matches_with_top(&self, top: Option<Card>) -> PosList {
        let Some(top) = top else {
            return PosList::new();
        };
        self.free_cells()
            .into_iter()
            .filter(|&pos| {
                self.card_at(pos)
                    .is_some_and(|c| top.value() == Card::counterpart_value(c.value()))
            })
            .collect()
    }

    pub fn remove_pair(&mut self, pair: Pair) {
        self.pyramid[pair.first.1][pair.first.0] = None;
        self.pyramid[pair.second.1][pair.second.0] = None;
    }

    pub fn remove_king_at(&mut self, pos: Pos) {
        self.pyramid[pos.1][pos.0] = None;
    }

    /// Moves the top of the stock onto the waste. The drawn card must not
    /// already sit in the waste; that would mean the single-occupancy
    /// invariant broke earlier.
    pub fn draw_top_card(&mut self) -> Result<()> {
        if self.stock.is_empty() {
            bail!("Cannot draw from an empty stock");
        }
        let card = self.stock.remove(0);
        if self.waste.contains(&card) {
            bail!("Invariant violation: {card} is already in the waste");
        }
        self.waste.insert(0, card);
        Ok(())
    }

    /// Exchanges the stacks: the reversed waste becomes the new stock and the
    /// old stock becomes the waste.
    pub fn reshuffle(&mut self) -> Result<()> {
        if self.reshuffles_left == 0 {
            bail!("No reshuffles left");
        }
        self.waste.reverse();
        std::mem::swap(&mut self.stock, &mut self.waste);
        self.reshuffles_left -= 1;
        Ok(())
    }

    /// Canonical identity for search dedup: a hash over the pyramid grid and
    /// the stock contents. The waste is deliberately left out; two positions
    /// that differ only in their waste are treated as the same search node.
    pub fn state_key(&self) -> u64 {
        let mut state = [0u8; PYRAMID_SIZE + STOCK_SIZE + 1];
        let mut idx = 0;
        for row in 0..HEIGHT {
            for col in 0..=row {
                state[idx] = match self.pyramid[row][col] {
                    Some(card) => card.id(),
                    None => MAX_CARD,
                };
                idx += 1;
            }
        }
        state[idx] = self.stock.len() as u8;
        idx += 1;
        for &card in &self.stock {
            state[idx] = card.id();
            idx += 1;
        }

        let mut hasher = ahash::AHasher::default();
        hasher.write(&state[..idx]);
        hasher.finish()
    }

    pub fn pretty_print(&self) -> String {
        let mut output = String::new();
        for row in 0..HEIGHT {
            for _ in 0..(HEIGHT - 1 - row) {
                output.push_str("  ");
            }
            for col in 0..=row {
                match self.pyramid[row][col] {
                    Some(card) => output.push_str(&format!("{card:<3} ")),
                    None => output.push_str("--  "),
                }
            }
            while output.ends_with(' ') {
                output.pop();
            }
            output.push('\n');
        }
        output.push_str("Stock: ");
        for card in &self.stock {
            output.push_str(&format!("{card} "));
        }
        output.push_str("\nWaste: ");
        for card in &self.waste {
            output.push_str(&format!("{card} "));
        }
        output.push_str(&format!("\nReshuffles: {}", self.reshuffles_left));
        output
    }
}
