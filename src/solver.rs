use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};
use std::iter;
use std::rc::Rc;

use log::{debug, trace};
use thiserror::Error;

use crate::puzzle::{Board, BoardError, Move};

const TRACE_INTERVAL: usize = 10_000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolveError {
    #[error("invalid board: {0}")]
    InvalidBoard(#[from] BoardError),
    #[error("search aborted after expanding {expanded} nodes")]
    Aborted { expanded: usize },
}

/// Knobs for a single search. The default runs unbounded with parent pruning
/// only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolverConfig {
    /// Give up with [`SolveError::Aborted`] after this many expansions.
    pub max_expansions: Option<usize>,
    /// Skip nodes whose board was already expanded in the same search tree.
    pub closed_set: bool,
}

impl SolverConfig {
    pub fn with_max_expansions(mut self, limit: usize) -> Self {
        self.max_expansions = Some(limit);
        self
    }

    pub fn with_closed_set(mut self, enabled: bool) -> Self {
        self.closed_set = enabled;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Nodes whose neighbors were generated.
    pub expanded: usize,
    /// Nodes pushed onto the frontier, roots included.
    pub inserted: usize,
    pub max_frontier: usize,
}

struct SearchNode {
    board: Board,
    moves: usize,
    priority: usize,
    twin: bool,
    last_move: Option<Move>,
    parent: Option<Rc<SearchNode>>,
}

impl SearchNode {
    fn root(board: Board, twin: bool) -> Self {
        Self {
            priority: board.heuristic(),
            board,
            moves: 0,
            twin,
            last_move: None,
            parent: None,
        }
    }

    fn child(parent: &Rc<SearchNode>, mv: Move, board: Board) -> Self {
        let moves = parent.moves + 1;
        Self {
            priority: board.heuristic() + moves,
            board,
            moves,
            twin: parent.twin,
            last_move: Some(mv),
            parent: Some(Rc::clone(parent)),
        }
    }

    fn is_parent_board(&self, board: &Board) -> bool {
        self.parent.as_ref().is_some_and(|parent| parent.board == *board)
    }
}

// Ordered by priority, then by insertion so equal priorities pop first-in
// first-out.
struct Entry {
    priority: usize,
    seq: u64,
    node: Rc<SearchNode>,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.priority, self.seq).cmp(&(other.priority, other.seq))
    }
}

#[derive(Default)]
struct Frontier {
    heap: BinaryHeap<Reverse<Entry>>,
    next_seq: u64,
    inserted: usize,
    max_len: usize,
}

impl Frontier {
    fn push(&mut self, node: SearchNode) {
        let entry = Entry {
            priority: node.priority,
            seq: self.next_seq,
            node: Rc::new(node),
        };
        self.next_seq += 1;
        self.inserted += 1;
        self.heap.push(Reverse(entry));
        self.max_len = self.max_len.max(self.heap.len());
    }

    fn pop(&mut self) -> Option<Rc<SearchNode>> {
        self.heap.pop().map(|Reverse(entry)| entry.node)
    }

    fn len(&self) -> usize {
        self.heap.len()
    }
}

/// A* over a board and its twin at once.
///
/// Both roots share one frontier; whichever search tree reaches the goal first
/// decides solvability. Exactly one of a board and its twin is solvable, so
/// the race always ends.
pub struct Solver {
    terminal: Rc<SearchNode>,
    stats: SearchStats,
}

impl Solver {
    pub fn new(initial: Board) -> Result<Self, SolveError> {
        Self::with_config(initial, SolverConfig::default())
    }

    /// Validates `grid` and solves it with the default configuration.
    pub fn from_grid(grid: &[Vec<u32>]) -> Result<Self, SolveError> {
        Self::new(Board::new(grid)?)
    }

    pub fn with_config(initial: Board, config: SolverConfig) -> Result<Self, SolveError> {
        let twin = initial.twin();
        debug!(
            "Searching {0}x{0} board: heuristic {1}, twin heuristic {2}, {3:?}",
            initial.dimension(),
            initial.heuristic(),
            twin.heuristic(),
            config
        );

        let mut frontier = Frontier::default();
        frontier.push(SearchNode::root(initial, false));
        frontier.push(SearchNode::root(twin, true));

        // Indexed by the twin tag
        let mut closed: [HashSet<Board>; 2] = Default::default();
        let mut expanded = 0;

        while let Some(node) = frontier.pop() {
            if node.board.is_goal() {
                let stats = SearchStats {
                    expanded,
                    inserted: frontier.inserted,
                    max_frontier: frontier.max_len,
                };
                debug!(
                    "Goal reached by {} search in {} moves, {:?}",
                    if node.twin { "twin" } else { "original" },
                    node.moves,
                    stats
                );
                return Ok(Solver {
                    terminal: node,
                    stats,
                });
            }

            if config.closed_set && !closed[node.twin as usize].insert(node.board.clone()) {
                continue;
            }

            if config.max_expansions.is_some_and(|limit| expanded >= limit) {
                debug!("Expansion budget exhausted after {expanded} nodes");
                return Err(SolveError::Aborted { expanded });
            }

            expanded += 1;
            if expanded % TRACE_INTERVAL == 0 {
                trace!(
                    "Expanded {expanded} nodes, frontier {}, current priority {}",
                    frontier.len(),
                    node.priority
                );
            }

            for (mv, board) in node.board.successors() {
                // Undoing the previous slide is never part of a shortest path
                if node.is_parent_board(&board) {
                    continue;
                }
                if config.closed_set && closed[node.twin as usize].contains(&board) {
                    continue;
                }
                frontier.push(SearchNode::child(&node, mv, board));
            }
        }

        // Both trees always contain unexplored boards until one hits the goal
        panic!("frontier emptied before either search reached the goal");
    }

    pub fn is_solvable(&self) -> bool {
        !self.terminal.twin
    }

    /// Length of a shortest solution, `None` if the board is unsolvable.
    pub fn moves(&self) -> Option<usize> {
        self.is_solvable().then_some(self.terminal.moves)
    }

    /// Boards from the initial one to the goal, `None` if unsolvable.
    pub fn solution(&self) -> Option<Vec<&Board>> {
        if !self.is_solvable() {
            return None;
        }
        let mut boards: Vec<&Board> = self.path().map(|node| &node.board).collect();
        boards.reverse();
        Some(boards)
    }

    /// Slides that take the initial board to the goal, `None` if unsolvable.
    pub fn solution_moves(&self) -> Option<Vec<Move>> {
        if !self.is_solvable() {
            return None;
        }
        let mut moves: Vec<Move> = self.path().filter_map(|node| node.last_move).collect();
        moves.reverse();
        Some(moves)
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    // Terminal node first, root last.
    fn path(&self) -> impl Iterator<Item = &SearchNode> + '_ {
        iter::successors(Some(&*self.terminal), |node| node.parent.as_deref())
    }
}
