//! A Pyramid Solitaire solver: breadth-first search over the move graph of a
//! 28-card pyramid plus draw and discard stacks.

pub mod action;
pub mod board;
pub mod solver;
