pub mod puzzle;
pub mod solver;

pub use puzzle::{Board, BoardError, Move};
pub use solver::{SearchStats, SolveError, Solver, SolverConfig};
