use std::fmt::Write as _;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::style::{style, Stylize};
use rand::{rngs::StdRng, SeedableRng};

use slider_solver::{Board, Solver, SolverConfig};

/// Solve an n×n sliding-tile puzzle with A*.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Read the board from a file (`-` for stdin): dimension, then tiles row-major
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Dimension of a generated board
    #[arg(short, long, default_value_t = 3)]
    size: usize,

    /// Generate by sliding this many random moves away from the goal
    /// instead of shuffling (shuffled boards may be unsolvable)
    #[arg(long)]
    scramble: Option<usize>,

    /// Seed for board generation
    #[arg(long)]
    seed: Option<u64>,

    /// Abort after expanding this many search nodes
    #[arg(long)]
    max_expansions: Option<usize>,

    /// Never expand the same board twice
    #[arg(long)]
    closed_set: bool,

    /// Only print the move count
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let initial = initial_board(&args)?;
    println!("Initial Puzzle:\n{}", render(&initial));

    let config = SolverConfig {
        max_expansions: args.max_expansions,
        closed_set: args.closed_set,
    };
    let solver = Solver::with_config(initial.clone(), config)?;
    let stats = solver.stats();
    log::info!(
        "expanded {}, inserted {}, largest frontier {}",
        stats.expanded,
        stats.inserted,
        stats.max_frontier
    );

    let (Some(moves), Some(path)) = (solver.solution_moves(), solver.solution()) else {
        println!("No solution possible");
        return Ok(());
    };

    println!("Minimum number of moves = {}", moves.len());
    if args.quiet {
        return Ok(());
    }

    for (item, board) in moves.iter().zip(path.into_iter().skip(1)) {
        println!("{}\n{}", item, render(board));
    }

    Ok(())
}

fn initial_board(args: &Args) -> Result<Board> {
    if let Some(path) = &args.file {
        let text = if path.as_os_str() == "-" {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            text
        } else {
            std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?
        };
        return text.parse::<Board>().context("parsing board");
    }

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let board = match args.scramble {
        Some(steps) => Board::scrambled(args.size, steps, &mut rng)?,
        None => Board::shuffled(args.size, &mut rng)?,
    };
    Ok(board)
}

// Tiles already in place are green, misplaced ones yellow.
fn render(board: &Board) -> String {
    let size = board.dimension();
    let mut out = String::new();

    for row in 0..size {
        for col in 0..size {
            let value = board.tile(row, col);
            let cell = if value == 0 {
                style("   ".to_string()).dark_grey()
            } else if value as usize == row * size + col + 1 {
                style(format!("{:2} ", value)).green()
            } else {
                style(format!("{:2} ", value)).yellow()
            };
            let _ = write!(out, "{}", cell);
        }
        out.push('\n');
    }
    out
}
