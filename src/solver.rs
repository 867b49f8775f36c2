use crate::action::Move;
use crate::board::Board;

use anyhow::{Result, bail};
use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};

/// A frontier entry: one board snapshot plus the move log that produced it.
/// The log is carried forward rather than reconstructed from parent links.
#[derive(Debug, Clone)]
struct Node {
    board: Board,
    log: Vec<Move>,
}

#[derive(Debug, Clone)]
pub struct SolveResult {
    /// The winning move log, or `None` when the frontier exhausted without
    /// clearing the pyramid. An unsolvable layout is not an error.
    pub solution: Option<Vec<Move>>,
    /// Number of states dequeued and expanded.
    pub states: usize,
    pub elapsed: Duration,
}

/// Breadth-first search for a move sequence that clears the pyramid.
///
/// The frontier is a FIFO queue, so the first solution found uses the fewest
/// expansion steps. Revisited states are pruned with a seen-set keyed by the
/// board's canonical state key; without that the branching factor makes the
/// search intractable.
///
/// Exposed Kings are handled by forced rules evaluated in strict priority
/// order before any other move kind: a King has no counterpart, so removing
/// it at once never forecloses a future match. This is a deliberate
/// branch-reduction heuristic, not an exhaustive search.
pub fn solve(board: Board, max_states: usize) -> Result<SolveResult> {
    let timer = Instant::now();
    let mut queue: VecDeque<Node> = VecDeque::new();
    let mut seen: HashSet<u64, ahash::RandomState> = HashSet::default();
    queue.push_back(Node {
        board,
        log: Vec::new(),
    });
    let mut states = 0;

    while let Some(Node { board, log }) = queue.pop_front() {
        if !seen.insert(board.state_key()) {
            continue;
        }
        states += 1;
        if states > max_states {
            bail!("Unable to solve the game; reached max states {max_states}.");
        }

        if board.is_complete() {
            return Ok(SolveResult {
                solution: Some(log),
                states,
                elapsed: timer.elapsed(),
            });
        }

        // Forced King rules, short-circuiting top to bottom.
        let open_kings = board.open_kings();
        if !open_kings.is_empty() {
            let mut moved = board.clone();
            for &pos in &open_kings {
                moved.remove_king_at(pos);
            }
            queue.push_back(extend(moved, &log, Move::PopKingPyramid));
            continue;
        }
        if board.top_of_stock().is_some_and(|c| c.is_king()) {
            let mut moved = board.clone();
            moved.stock.remove(0);
            queue.push_back(extend(moved, &log, Move::PopKingStock));
            continue;
        }
        if board.top_of_waste().is_some_and(|c| c.is_king()) {
            let mut moved = board.clone();
            moved.waste.remove(0);
            queue.push_back(extend(moved, &log, Move::PopKingWaste));
            continue;
        }

        // Full fan-out: one successor per legal move.
        for pair in board.matches_in_pyramid() {
            let mut moved = board.clone();
            let (Some(first), Some(second)) = (moved.card_at(pair.first), moved.card_at(pair.second))
            else {
                continue;
            };
            moved.remove_pair(pair);
            queue.push_back(extend(moved, &log, Move::Match(first, second)));
        }
        if board.stack_match_exists() {
            let mut moved = board.clone();
            let stock_card = moved.stock.remove(0);
            let waste_card = moved.waste.remove(0);
            queue.push_back(extend(moved, &log, Move::MatchStacks(stock_card, waste_card)));
        }
        for pos in board.matches_with_stock() {
            let mut moved = board.clone();
            let stock_card = moved.stock.remove(0);
            let Some(cell_card) = moved.card_at(pos) else {
                continue;
            };
            moved.pyramid[pos.1][pos.0] = None;
            queue.push_back(extend(moved, &log, Move::MatchWithStock(stock_card, cell_card)));
        }
        for pos in board.matches_with_waste() {
            let mut moved = board.clone();
            let waste_card = moved.waste.remove(0);
            let Some(cell_card) = moved.card_at(pos) else {
                continue;
            };
            moved.pyramid[pos.1][pos.0] = None;
            queue.push_back(extend(moved, &log, Move::MatchWithWaste(waste_card, cell_card)));
        }
        if !board.stock.is_empty() {
            let mut moved = board.clone();
            moved.draw_top_card()?;
            queue.push_back(extend(moved, &log, Move::Draw));
        }
        if board.stock.is_empty() && board.reshuffles_left > 0 {
            let mut moved = board.clone();
            moved.reshuffle()?;
            queue.push_back(extend(moved, &log, Move::Reshuffle));
        }
    }

    Ok(SolveResult {
        solution: None,
        states,
        elapsed: timer.elapsed(),
    })
}

fn extend(board: Board, log: &[Move], mov: Move) -> Node {
    let mut log = log.to_vec();
    log.push(mov);
    Node { board, log }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Card;

    const MAX_STATES: usize = 1_000_000;

    fn card(token: &str) -> Card {
        Card::parse(token).unwrap()
    }

    #[test]
    fn test_lone_king_is_one_step() {
        let mut board = Board::default();
        board.pyramid[0][0] = Some(card("KS"));
        let result = solve(board, MAX_STATES).unwrap();
        assert_eq!(result.solution.unwrap(), vec![Move::PopKingPyramid]);
    }

    #[test]
    fn test_flat_pair_is_one_match() {
        let mut board = Board::default();
        board.pyramid[6][0] = Some(card("7S"));
        board.pyramid[6][1] = Some(card("6C"));
        let result = solve(board, MAX_STATES).unwrap();
        assert_eq!(
            result.solution.unwrap(),
            vec![Move::Match(card("7S"), card("6C"))]
        );
    }

    #[test]
    fn test_unsolvable_layout() {
        let mut board = Board::default();
        board.pyramid[0][0] = Some(card("2S"));
        let result = solve(board, MAX_STATES).unwrap();
        assert!(result.solution.is_none());
        assert!(result.states >= 1);
    }

    #[test]
    fn test_match_via_stock() {
        let mut board = Board::default();
        board.pyramid[0][0] = Some(card("AS"));
        board.stock.push(card("QH"));
        let result = solve(board, MAX_STATES).unwrap();
        assert_eq!(
            result.solution.unwrap(),
            vec![Move::MatchWithStock(card("QH"), card("AS"))]
        );
    }

    #[test]
    fn test_reshuffle_then_match() {
        let mut board = Board::default();
        board.pyramid[0][0] = Some(card("AS"));
        board.waste.push(card("5D"));
        board.waste.push(card("QH"));
        board.reshuffles_left = 1;
        let result = solve(board, MAX_STATES).unwrap();
        assert_eq!(
            result.solution.unwrap(),
            vec![
                Move::Reshuffle,
                Move::MatchWithStock(card("QH"), card("AS"))
            ]
        );
    }

    #[test]
    fn test_stack_match_then_stock_match() {
        let mut board = Board::default();
        board.pyramid[0][0] = Some(card("AS"));
        board.stock.push(card("6H"));
        board.stock.push(card("QD"));
        board.waste.push(card("7C"));
        let result = solve(board, MAX_STATES).unwrap();
        assert_eq!(
            result.solution.unwrap(),
            vec![
                Move::MatchStacks(card("6H"), card("7C")),
                Move::MatchWithStock(card("QD"), card("AS"))
            ]
        );
    }

    #[test]
    fn test_forced_king_rules_priority() {
        // A King on the stock is popped before any fan-out move.
        let mut board = Board::default();
        board.pyramid[6][0] = Some(card("7S"));
        board.pyramid[6][1] = Some(card("6C"));
        board.stock.push(card("KD"));
        let result = solve(board, MAX_STATES).unwrap();
        assert_eq!(
            result.solution.unwrap(),
            vec![Move::PopKingStock, Move::Match(card("7S"), card("6C"))]
        );

        // Same for a King on the waste.
        let mut board = Board::default();
        board.pyramid[6][0] = Some(card("7S"));
        board.pyramid[6][1] = Some(card("6C"));
        board.waste.push(card("KD"));
        let result = solve(board, MAX_STATES).unwrap();
        assert_eq!(
            result.solution.unwrap(),
            vec![Move::PopKingWaste, Move::Match(card("7S"), card("6C"))]
        );
    }

    #[test]
    fn test_all_open_kings_cleared_at_once() {
        let mut board = Board::default();
        board.pyramid[6][0] = Some(card("KS"));
        board.pyramid[6][3] = Some(card("KH"));
        board.pyramid[6][6] = Some(card("KD"));
        let result = solve(board, MAX_STATES).unwrap();
        assert_eq!(result.solution.unwrap(), vec![Move::PopKingPyramid]);
    }

    #[test]
    fn test_empty_pyramid_solves_immediately() {
        let board = Board::default();
        let result = solve(board, MAX_STATES).unwrap();
        assert_eq!(result.solution.unwrap(), Vec::<Move>::new());
        assert_eq!(result.states, 1);
    }

    #[test]
    fn test_max_states_budget() {
        let mut board = Board::default();
        board.pyramid[0][0] = Some(card("2S"));
        for token in ["3S", "4S", "5S", "6S", "7S", "8S"] {
            board.stock.push(card(token));
        }
        let err = solve(board, 2).unwrap_err();
        assert!(err.to_string().contains("max states"));
    }

    #[test]
    fn test_deterministic_solution() {
        let mut board = Board::default();
        // Several interchangeable pairs: the search must pick the same
        // branch every run.
        board.pyramid[6][0] = Some(card("7S"));
        board.pyramid[6][1] = Some(card("6C"));
        board.pyramid[6][2] = Some(card("8H"));
        board.pyramid[6][3] = Some(card("5D"));
        board.stock.push(card("AC"));
        board.stock.push(card("QS"));

        let first = solve(board.clone(), MAX_STATES).unwrap();
        let second = solve(board, MAX_STATES).unwrap();
        assert_eq!(first.solution, second.solution);
        assert_eq!(first.states, second.states);
        assert!(first.solution.is_some());
    }
}
