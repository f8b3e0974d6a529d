//! Reference placement provider backed by a rectangular board.

use std::collections::HashSet;

use code_defence_core::{PlacementProvider, Position, UnitSnapshot};

use crate::config::BoardSize;

/// Places units on the first free cell of a board, scanning row by row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridPlacement {
    columns: u32,
    rows: u32,
}

impl GridPlacement {
    /// Creates a provider for a board with the provided dimensions.
    #[must_use]
    pub const fn new(board: BoardSize) -> Self {
        Self {
            columns: board.columns,
            rows: board.rows,
        }
    }

    /// Number of cells on the board.
    #[must_use]
    pub const fn capacity(&self) -> u64 {
        self.columns as u64 * self.rows as u64
    }
}

impl PlacementProvider for GridPlacement {
    fn find_open_placement(&mut self, existing: &[UnitSnapshot]) -> Option<Position> {
        let occupied: HashSet<Position> = existing.iter().map(|unit| unit.position).collect();
        (0..self.rows)
            .flat_map(|y| (0..self.columns).map(move |x| Position::new(x, y)))
            .find(|cell| !occupied.contains(cell))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use code_defence_core::{ArchetypeName, UnitId};

    fn unit_at(x: u32, y: u32) -> UnitSnapshot {
        UnitSnapshot {
            id: UnitId::default(),
            archetype: ArchetypeName::new("javascript"),
            position: Position::new(x, y),
        }
    }

    #[test]
    fn scans_rows_before_columns() {
        let mut grid = GridPlacement::new(BoardSize {
            columns: 2,
            rows: 2,
        });

        assert_eq!(grid.find_open_placement(&[]), Some(Position::new(0, 0)));
        assert_eq!(
            grid.find_open_placement(&[unit_at(0, 0)]),
            Some(Position::new(1, 0))
        );
        assert_eq!(
            grid.find_open_placement(&[unit_at(0, 0), unit_at(1, 0)]),
            Some(Position::new(0, 1))
        );
    }

    #[test]
    fn reuses_cells_vacated_by_relocation() {
        let mut grid = GridPlacement::new(BoardSize {
            columns: 2,
            rows: 1,
        });

        assert_eq!(
            grid.find_open_placement(&[unit_at(1, 0), unit_at(5, 5)]),
            Some(Position::new(0, 0))
        );
    }

    #[test]
    fn full_board_has_no_placement() {
        let mut grid = GridPlacement::new(BoardSize {
            columns: 2,
            rows: 1,
        });

        assert_eq!(grid.capacity(), 2);
        assert_eq!(grid.find_open_placement(&[unit_at(0, 0), unit_at(1, 0)]), None);
    }
}
