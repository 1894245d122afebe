use rand::{seq::SliceRandom, Rng};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Direction a tile slides into the blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    Up,
    Left,
    Down,
    Right,
}

impl Move {
    /// Expansion order: blank moves right, down, up, left.
    pub const NEIGHBOR_ORDER: [Move; 4] = [Move::Left, Move::Up, Move::Down, Move::Right];

    /// Offset applied to the blank when this move is played.
    pub fn as_offset(&self) -> (isize, isize) {
        match self {
            Move::Up => (1, 0),
            Move::Left => (0, 1),
            Move::Down => (-1, 0),
            Move::Right => (0, -1),
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Move::Up => Move::Down,
            Move::Down => Move::Up,
            Move::Left => Move::Right,
            Move::Right => Move::Left,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            Move::Up => "Up",
            Move::Left => "Left",
            Move::Down => "Down",
            Move::Right => "Right",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("board dimension must be at least 2, got {size}")]
    TooSmall { size: usize },
    #[error("row {row} has {len} cells, expected {size}")]
    NotSquare { row: usize, len: usize, size: usize },
    #[error("tile {value} is out of range (largest allowed is {max})")]
    OutOfRange { value: u32, max: u32 },
    #[error("tile {value} appears more than once")]
    Duplicate { value: u32 },
    #[error("malformed board text: {0}")]
    Parse(String),
}

/// One immutable configuration of the n×n sliding puzzle.
///
/// Tiles are stored row-major with `0` as the blank. The Manhattan distance to
/// the goal is cached and carried along by every derived board, so expanding a
/// neighbor costs a grid copy but no rescan.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    size: usize,
    tiles: Vec<u32>,
    blank: usize,
    distance: usize,
}

impl Board {
    /// Builds a board from rows of tiles, checking that it is a square
    /// permutation of `0..n²` with `n >= 2`.
    pub fn new(grid: &[Vec<u32>]) -> Result<Self, BoardError> {
        let size = grid.len();
        for (row, cells) in grid.iter().enumerate() {
            if cells.len() != size {
                return Err(BoardError::NotSquare {
                    row,
                    len: cells.len(),
                    size,
                });
            }
        }
        Self::from_tiles(size, grid.iter().flatten().copied().collect())
    }

    /// Same as [`Board::new`] but takes the tiles already flattened row-major.
    pub fn from_tiles(size: usize, tiles: Vec<u32>) -> Result<Self, BoardError> {
        if size < 2 {
            return Err(BoardError::TooSmall { size });
        }
        if tiles.len() != size * size {
            return Err(BoardError::Parse(format!(
                "expected {} tiles for a {size}x{size} board, got {}",
                size * size,
                tiles.len()
            )));
        }

        let max = (size * size - 1) as u32;
        let mut seen = vec![false; size * size];
        for &value in &tiles {
            if value > max {
                return Err(BoardError::OutOfRange { value, max });
            }
            if std::mem::replace(&mut seen[value as usize], true) {
                return Err(BoardError::Duplicate { value });
            }
        }

        Ok(Self::assemble(size, tiles))
    }

    /// The solved board: tiles ascending row-major, blank last.
    pub fn goal(size: usize) -> Result<Self, BoardError> {
        let count = (size * size) as u32;
        Self::from_tiles(size, (1..count).chain(std::iter::once(0)).collect())
    }

    /// A uniformly random arrangement. Half of these are unsolvable.
    pub fn shuffled<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Result<Self, BoardError> {
        let mut tiles: Vec<u32> = (0..(size * size) as u32).collect();
        tiles.shuffle(rng);
        Self::from_tiles(size, tiles)
    }

    /// A random walk of `steps` slides away from the goal, never undoing the
    /// previous slide. Always solvable.
    pub fn scrambled<R: Rng + ?Sized>(
        size: usize,
        steps: usize,
        rng: &mut R,
    ) -> Result<Self, BoardError> {
        let mut board = Self::goal(size)?;
        let mut last: Option<Move> = None;

        for _ in 0..steps {
            let options: Vec<(Move, Board)> = board
                .successors()
                .filter(|(mv, _)| last.map_or(true, |prev| *mv != prev.opposite()))
                .collect();
            // Every cell has at least two neighbors when size >= 2
            let Some((mv, next)) = options.choose(rng).cloned() else {
                break;
            };
            board = next;
            last = Some(mv);
        }

        Ok(board)
    }

    // Callers guarantee `tiles` is a valid permutation.
    fn assemble(size: usize, tiles: Vec<u32>) -> Self {
        let blank = tiles.iter().position(|&value| value == 0).unwrap_or_default();
        let mut board = Self {
            size,
            tiles,
            blank,
            distance: 0,
        };
        board.distance = board.manhattan();
        board
    }

    pub fn dimension(&self) -> usize {
        self.size
    }

    pub fn tiles(&self) -> &[u32] {
        &self.tiles
    }

    pub fn tile(&self, row: usize, col: usize) -> u32 {
        self.tiles[row * self.size + col]
    }

    /// Row and column of the blank.
    pub fn blank(&self) -> (usize, usize) {
        (self.blank / self.size, self.blank % self.size)
    }

    /// Cached sum of Manhattan distances; O(1).
    pub fn heuristic(&self) -> usize {
        self.distance
    }

    /// Sum of Manhattan distances recomputed from the grid.
    pub fn manhattan(&self) -> usize {
        self.tiles
            .iter()
            .enumerate()
            .map(|(index, &value)| tile_distance(self.size, value, index))
            .sum()
    }

    /// Number of tiles out of place, blank excluded.
    pub fn hamming(&self) -> usize {
        self.tiles
            .iter()
            .enumerate()
            .filter(|&(index, &value)| value != 0 && value as usize != index + 1)
            .count()
    }

    pub fn is_goal(&self) -> bool {
        self.hamming() == 0
    }

    /// The board after sliding a tile in direction `mv`, if that tile exists.
    pub fn slide(&self, mv: Move) -> Option<Self> {
        let (dx, dy) = mv.as_offset();
        let (row, col) = self.blank();

        let new_x = row as isize + dx;
        let new_y = col as isize + dy;
        let size = self.size as isize;

        if new_x >= 0 && new_x < size && new_y >= 0 && new_y < size {
            let target = new_x as usize * self.size + new_y as usize;
            Some(self.swap(self.blank, target))
        } else {
            None
        }
    }

    /// Every legal slide with its resulting board, in [`Move::NEIGHBOR_ORDER`].
    pub fn successors(&self) -> impl Iterator<Item = (Move, Board)> + '_ {
        Move::NEIGHBOR_ORDER
            .into_iter()
            .filter_map(move |mv| self.slide(mv).map(|board| (mv, board)))
    }

    pub fn neighbors(&self) -> impl Iterator<Item = Board> + '_ {
        self.successors().map(|(_, board)| board)
    }

    /// The board with the first horizontally adjacent pair of tiles (row-major
    /// scan, blank excluded) exchanged. A board and its twin have opposite
    /// solvability.
    ///
    /// # Panics
    ///
    /// If no such pair exists, which cannot happen for a validated board.
    pub fn twin(&self) -> Self {
        for row in 0..self.size {
            for col in 0..self.size - 1 {
                let left = row * self.size + col;
                if self.tiles[left] != 0 && self.tiles[left + 1] != 0 {
                    let mut tiles = self.tiles.clone();
                    tiles.swap(left, left + 1);
                    return Self::assemble(self.size, tiles);
                }
            }
        }
        panic!("no adjacent pair of tiles to swap in board:\n{self}");
    }

    /// Inversion-parity test for solvability, independent of any search.
    pub fn has_solvable_parity(&self) -> bool {
        let inversions = count_inversions(&self.tiles);
        let (empty_row, _) = self.blank();

        if self.size % 2 == 1 {
            // Odd width: solvable iff inversion count is even
            inversions % 2 == 0
        } else {
            // Even width: the blank's row joins the parity
            (inversions + empty_row) % 2 == 1
        }
    }

    // Exchanges two cells and patches the cached distance using only the
    // contributions of those two cells.
    fn swap(&self, a: usize, b: usize) -> Self {
        let (first, second) = (self.tiles[a], self.tiles[b]);
        let before = tile_distance(self.size, first, a) + tile_distance(self.size, second, b);
        let after = tile_distance(self.size, first, b) + tile_distance(self.size, second, a);

        let mut tiles = self.tiles.clone();
        tiles.swap(a, b);

        let blank = if a == self.blank {
            b
        } else if b == self.blank {
            a
        } else {
            self.blank
        };

        Self {
            size: self.size,
            tiles,
            blank,
            distance: self.distance + after - before,
        }
    }
}

fn tile_distance(size: usize, value: u32, index: usize) -> usize {
    if value == 0 {
        return 0;
    }
    let goal = value as usize - 1;
    (index / size).abs_diff(goal / size) + (index % size).abs_diff(goal % size)
}

fn count_inversions(flattened: &[u32]) -> usize {
    flattened
        .iter()
        .enumerate()
        .filter(|&(_, &val)| val != 0)
        .map(|(i, &val)| {
            flattened[i + 1..]
                .iter()
                .filter(|&&next| next != 0 && next < val)
                .count()
        })
        .sum()
}

/// Reads `n` followed by `n²` whitespace-separated tiles, row-major.
impl FromStr for Board {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = s.split_whitespace().map(|token| {
            token
                .parse::<u32>()
                .map_err(|_| BoardError::Parse(format!("`{token}` is not a tile number")))
        });

        let size = tokens
            .next()
            .ok_or_else(|| BoardError::Parse("missing board dimension".to_string()))??
            as usize;
        let tiles = tokens.collect::<Result<Vec<_>, _>>()?;

        Self::from_tiles(size, tiles)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.size)?;
        for row in self.tiles.chunks(self.size) {
            for &val in row {
                write!(f, "{:2} ", val)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn board(grid: &[Vec<u32>]) -> Board {
        Board::new(grid).expect("valid board")
    }

    #[test]
    fn distances_of_textbook_board() {
        let b = board(&[vec![8, 1, 3], vec![4, 0, 2], vec![7, 6, 5]]);
        assert_eq!(b.dimension(), 3);
        assert_eq!(b.hamming(), 5);
        assert_eq!(b.heuristic(), 10);
        assert_eq!(b.manhattan(), 10);
        assert_eq!(b.blank(), (1, 1));
        assert!(!b.is_goal());
    }

    #[test]
    fn goal_board() {
        let goal = Board::goal(4).unwrap();
        assert!(goal.is_goal());
        assert_eq!(goal.heuristic(), 0);
        assert_eq!(goal.blank(), (3, 3));
        assert_eq!(goal.tile(0, 0), 1);
        assert_eq!(goal.tile(3, 2), 15);
    }

    #[test]
    fn blank_position_does_not_affect_goal() {
        // Blank is never counted as misplaced
        let b = board(&[vec![1, 2], vec![0, 3]]);
        assert_eq!(b.hamming(), 1);
        assert!(!b.is_goal());
    }

    #[test]
    fn rejects_invalid_grids() {
        assert_eq!(
            Board::new(&[vec![0]]),
            Err(BoardError::TooSmall { size: 1 })
        );
        assert_eq!(
            Board::new(&[vec![1, 2], vec![0]]),
            Err(BoardError::NotSquare {
                row: 1,
                len: 1,
                size: 2
            })
        );
        assert_eq!(
            Board::new(&[vec![1, 2], vec![4, 0]]),
            Err(BoardError::OutOfRange { value: 4, max: 3 })
        );
        assert_eq!(
            Board::new(&[vec![1, 1], vec![3, 0]]),
            Err(BoardError::Duplicate { value: 1 })
        );
    }

    #[test]
    fn neighbor_order_is_right_down_up_left() {
        let b = board(&[vec![1, 2, 3], vec![4, 0, 5], vec![6, 7, 8]]);
        let blanks: Vec<_> = b.neighbors().map(|n| n.blank()).collect();
        assert_eq!(blanks, vec![(1, 2), (2, 1), (0, 1), (1, 0)]);

        let moves: Vec<_> = b.successors().map(|(mv, _)| mv).collect();
        assert_eq!(moves, Move::NEIGHBOR_ORDER.to_vec());
    }

    #[test]
    fn corner_blank_has_two_neighbors() {
        let b = Board::goal(3).unwrap();
        let neighbors: Vec<_> = b.neighbors().collect();
        assert_eq!(neighbors.len(), 2);
        assert_eq!(neighbors[0].blank(), (1, 2));
        assert_eq!(neighbors[1].blank(), (2, 1));
        assert!(b.slide(Move::Left).is_none());
        assert!(b.slide(Move::Up).is_none());
    }

    #[test]
    fn slide_moves_tile_and_updates_heuristic() {
        let b = board(&[vec![8, 1, 3], vec![4, 0, 2], vec![7, 6, 5]]);
        // Tile 2 slides left into the blank
        let next = b.slide(Move::Left).unwrap();
        assert_eq!(next.tiles(), &[8, 1, 3, 4, 2, 0, 7, 6, 5]);
        assert_eq!(next.heuristic(), next.manhattan());
        assert_eq!(next.heuristic(), 9);
        // The original is untouched
        assert_eq!(b.tiles(), &[8, 1, 3, 4, 0, 2, 7, 6, 5]);
    }

    #[test]
    fn swaps_that_cancel_compare_equal() {
        let b = board(&[vec![8, 1, 3], vec![4, 0, 2], vec![7, 6, 5]]);
        let back = b
            .slide(Move::Up)
            .and_then(|n| n.slide(Move::Down))
            .unwrap();
        assert_eq!(back, b);
        assert_eq!(back.heuristic(), b.heuristic());
    }

    #[test]
    fn twin_swaps_first_adjacent_tiles() {
        let b = board(&[vec![0, 1, 3], vec![4, 2, 5], vec![7, 8, 6]]);
        let twin = b.twin();
        assert_eq!(twin.tiles(), &[0, 3, 1, 4, 2, 5, 7, 8, 6]);
        assert_eq!(twin.heuristic(), twin.manhattan());

        let b = board(&[vec![1, 0], vec![3, 2]]);
        assert_eq!(b.twin().tiles(), &[1, 0, 2, 3]);
    }

    #[test]
    fn parity_flips_under_twin() {
        let solvable = board(&[vec![8, 1, 3], vec![4, 0, 2], vec![7, 6, 5]]);
        let unsolvable = board(&[vec![1, 2, 3], vec![4, 5, 6], vec![8, 7, 0]]);
        assert!(solvable.has_solvable_parity());
        assert!(!unsolvable.has_solvable_parity());
        assert!(!solvable.twin().has_solvable_parity());
        assert!(Board::goal(4).unwrap().has_solvable_parity());
    }

    #[test]
    fn parses_and_prints_text_format() {
        let b: Board = "3\n 8 1 3\n 4 0 2\n 7 6 5\n".parse().unwrap();
        assert_eq!(b.tiles(), &[8, 1, 3, 4, 0, 2, 7, 6, 5]);
        assert_eq!(b.to_string(), "3\n 8  1  3 \n 4  0  2 \n 7  6  5 \n");
        assert_eq!(b.to_string().parse::<Board>().unwrap(), b);
    }

    #[test]
    fn rejects_malformed_text() {
        assert!(matches!("".parse::<Board>(), Err(BoardError::Parse(_))));
        assert!(matches!("2 1 2 x 0".parse::<Board>(), Err(BoardError::Parse(_))));
        assert!(matches!("2 1 2 3".parse::<Board>(), Err(BoardError::Parse(_))));
    }

    #[test]
    fn scrambled_boards_are_solvable() {
        let mut rng = StdRng::seed_from_u64(7);
        for size in 2..=4 {
            for steps in [0, 1, 5, 40] {
                let b = Board::scrambled(size, steps, &mut rng).unwrap();
                assert!(b.has_solvable_parity());
                assert_eq!(b.heuristic(), b.manhattan());
            }
        }
    }

    #[test]
    fn shuffled_boards_are_permutations() {
        let mut rng = StdRng::seed_from_u64(11);
        let b = Board::shuffled(4, &mut rng).unwrap();
        let mut tiles = b.tiles().to_vec();
        tiles.sort_unstable();
        assert_eq!(tiles, (0..16).collect::<Vec<u32>>());
        assert_eq!(b.heuristic(), b.manhattan());
    }
}
