use crate::board::Card;

/// One expansion step of the search, carried forward in each frontier
/// entry's log. The card payloads are what the step removed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Move {
    /// Two free pyramid cards removed together.
    Match(Card, Card),
    /// The stock and waste tops removed together.
    MatchStacks(Card, Card),
    /// The stock top removed together with a free pyramid card.
    MatchWithStock(Card, Card),
    /// The waste top removed together with a free pyramid card.
    MatchWithWaste(Card, Card),
    /// Every currently exposed King cleared from the pyramid at once.
    PopKingPyramid,
    /// A King removed from the top of the stock.
    PopKingStock,
    /// A King removed from the top of the waste.
    PopKingWaste,
    /// The stock top moved onto the waste.
    Draw,
    /// The stacks exchanged (reversed waste becomes the new stock).
    Reshuffle,
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Move::Match(a, b) => write!(f, "Match {a} {b}"),
            Move::MatchStacks(a, b) => write!(f, "Match {a} {b} on the stacks"),
            Move::MatchWithStock(a, b) => write!(f, "Match with use of stock: {a} {b}"),
            Move::MatchWithWaste(a, b) => write!(f, "Match with use of waste: {a} {b}"),
            Move::PopKingPyramid => write!(f, "Pop kings from pyramid"),
            Move::PopKingStock => write!(f, "Pop king from stock"),
            Move::PopKingWaste => write!(f, "Pop king from waste"),
            Move::Draw => write!(f, "Draw top of stock"),
            Move::Reshuffle => write!(f, "Reshuffle the stacks"),
        }
    }
}

const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Renders a numbered move log, coloring the red-suit glyphs when `color`
/// is set.
pub fn format_moves(moves: &[Move], color: bool) -> String {
    let mut output = String::new();
    for (num, mov) in moves.iter().enumerate() {
        output.push_str(&format!("{}. ", num + 1));
        let line = mov.to_string();
        if color {
            for c in line.chars() {
                if c == '♥' || c == '♦' {
                    output.push_str(&format!("{RED}{c}{RESET}"));
                } else {
                    output.push(c);
                }
            }
        } else {
            output.push_str(&line);
        }
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Card;

    #[test]
    fn test_move_display() {
        let seven = Card::parse("7H").unwrap();
        let six = Card::parse("6S").unwrap();
        assert_eq!(Move::Match(seven, six).to_string(), "Match 7♥ 6♠");
        assert_eq!(
            Move::MatchStacks(seven, six).to_string(),
            "Match 7♥ 6♠ on the stacks"
        );
        assert_eq!(Move::PopKingPyramid.to_string(), "Pop kings from pyramid");
    }

    #[test]
    fn test_format_moves_plain() {
        let seven = Card::parse("7H").unwrap();
        let six = Card::parse("6S").unwrap();
        let log = [Move::Match(seven, six), Move::Draw];
        assert_eq!(
            format_moves(&log, false),
            "1. Match 7♥ 6♠\n2. Draw top of stock\n"
        );
    }

    #[test]
    fn test_format_moves_colors_red_suits() {
        let seven = Card::parse("7D").unwrap();
        let six = Card::parse("6S").unwrap();
        let out = format_moves(&[Move::Match(seven, six)], true);
        assert_eq!(out, "1. Match 7\x1b[31m♦\x1b[0m 6♠\n");
    }
}
