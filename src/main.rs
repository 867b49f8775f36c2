mod utils;

use crate::utils::*;

use anyhow::{Context, Result};
use clap::Parser;
use pyramid_solver::{
    action::format_moves,
    board::Board,
    solver::{SolveResult, solve},
};

use std::{
    io::{IsTerminal, stdout},
    path::PathBuf,
};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Max states to explore before giving up
    #[arg(short = 's', long, default_value_t = 50_000_000, value_name = "NUM")]
    max_states: usize,
    /// Preview the initial layout without solving
    #[arg(short, long)]
    preview: bool,
    /// Path to a card layout file
    file: PathBuf,
}

fn main() -> Result<()> {
    let Cli {
        max_states,
        preview,
        file,
    } = Cli::parse();

    let content = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let board = Board::parse(&content).context("Failed to parse layout")?;
    if preview {
        println!("{}", board.pretty_print());
        return Ok(());
    }

    let SolveResult {
        solution,
        states,
        elapsed,
    } = with_spinner("Solving the game...", move || solve(board, max_states))?;

    let elapsed_str = format_elapsed(elapsed);
    match solution {
        Some(moves) => {
            print!("{}", format_moves(&moves, stdout().is_terminal()));
            println!(
                "✓ Solved in {} steps — Time: {elapsed_str}, States: {states}",
                moves.len()
            );
        }
        None => {
            println!("No result found! — Time: {elapsed_str}, States: {states}");
        }
    }

    Ok(())
}
