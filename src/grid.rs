use std::collections::hash_set;
use std::collections::HashSet;
use std::sync::Arc;

/// A grid position. Coordinates are unbounded apart from the `i32` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns this cell shifted by `(dx, dy)`.
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Like [`Cell::offset`], but `None` when the result leaves the `i32` range.
    pub fn checked_offset(self, dx: i32, dy: i32) -> Option<Self> {
        Some(Self {
            x: self.x.checked_add(dx)?,
            y: self.y.checked_add(dy)?,
        })
    }
}

impl From<(i32, i32)> for Cell {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Set-based storage of the currently alive cells.
///
/// Memory is proportional to the number of alive cells, never to an area.
/// The set sits behind an `Arc` so [`SparseGrid::snapshot`] is a cheap handle
/// clone; mutating while a snapshot is alive copies the set first, so a
/// snapshot never observes later edits.
#[derive(Debug, Clone, Default)]
pub struct SparseGrid {
    cells: Arc<HashSet<Cell>>,
}

impl SparseGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.cells.contains(&cell)
    }

    /// Marks `cell` alive. Returns `false` if it already was.
    pub fn insert(&mut self, cell: Cell) -> bool {
        Arc::make_mut(&mut self.cells).insert(cell)
    }

    pub fn insert_all<I>(&mut self, cells: I)
    where
        I: IntoIterator<Item = Cell>,
    {
        let mut cells = cells.into_iter().peekable();
        if cells.peek().is_none() {
            return;
        }
        Arc::make_mut(&mut self.cells).extend(cells);
    }

    pub fn clear(&mut self) {
        // A fresh set is cheaper than clearing a shared one.
        self.cells = Arc::new(HashSet::new());
    }

    /// Replaces the whole live set with the next generation.
    pub fn replace(&mut self, next: HashSet<Cell>) {
        self.cells = Arc::new(next);
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            cells: Arc::clone(&self.cells),
        }
    }

    /// True if nothing has been written since `snapshot` was taken.
    pub fn is_current(&self, snapshot: &GridSnapshot) -> bool {
        Arc::ptr_eq(&self.cells, &snapshot.cells)
    }
}

/// Immutable view of one fully formed generation.
#[derive(Debug, Clone, Default)]
pub struct GridSnapshot {
    cells: Arc<HashSet<Cell>>,
}

impl GridSnapshot {
    pub fn contains(&self, cell: Cell) -> bool {
        self.cells.contains(&cell)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> hash_set::Iter<'_, Cell> {
        self.cells.iter()
    }

    /// Borrow the underlying set, e.g. to evolve it.
    pub fn as_set(&self) -> &HashSet<Cell> {
        &self.cells
    }

    /// Alive cells inside the inclusive rectangle `min..=max`.
    pub fn cells_in(&self, min: Cell, max: Cell) -> impl Iterator<Item = Cell> + '_ {
        self.cells
            .iter()
            .copied()
            .filter(move |c| c.x >= min.x && c.x <= max.x && c.y >= min.y && c.y <= max.y)
    }
}

impl<'a> IntoIterator for &'a GridSnapshot {
    type Item = &'a Cell;
    type IntoIter = hash_set::Iter<'a, Cell>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_ignores_duplicates() {
        let mut grid = SparseGrid::new();
        assert!(grid.insert(Cell::new(1, 2)));
        assert!(!grid.insert(Cell::new(1, 2)));
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn test_negative_and_extreme_coordinates() {
        let mut grid = SparseGrid::new();
        grid.insert_all([
            Cell::new(-5, -7),
            Cell::new(i32::MAX, i32::MIN),
            Cell::new(0, 0),
        ]);
        assert!(grid.contains(Cell::new(-5, -7)));
        assert!(grid.contains(Cell::new(i32::MAX, i32::MIN)));
        assert!(!grid.contains(Cell::new(5, 7)));
        assert_eq!(grid.len(), 3);
    }

    #[test]
    fn test_clear() {
        let mut grid = SparseGrid::new();
        grid.insert_all((0..10).map(|i| Cell::new(i, -i)));
        assert_eq!(grid.len(), 10);
        grid.clear();
        assert!(grid.is_empty());
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_edits() {
        let mut grid = SparseGrid::new();
        grid.insert(Cell::new(0, 0));
        let snap = grid.snapshot();

        grid.insert(Cell::new(1, 1));
        grid.clear();

        assert_eq!(snap.len(), 1);
        assert!(snap.contains(Cell::new(0, 0)));
        assert!(!snap.contains(Cell::new(1, 1)));
        assert!(grid.is_empty());
        assert!(!grid.is_current(&snap));
    }

    #[test]
    fn test_snapshot_current_until_written() {
        let mut grid = SparseGrid::new();
        grid.insert(Cell::new(0, 0));
        let snap = grid.snapshot();
        assert!(grid.is_current(&snap));
        grid.insert(Cell::new(3, 3));
        assert!(!grid.is_current(&snap));
    }

    #[test]
    fn test_replace_swaps_whole_generation() {
        let mut grid = SparseGrid::new();
        grid.insert(Cell::new(9, 9));
        let next: HashSet<Cell> = [Cell::new(1, 0), Cell::new(2, 0)].into_iter().collect();
        grid.replace(next);
        assert!(!grid.contains(Cell::new(9, 9)));
        assert_eq!(grid.len(), 2);
    }

    #[test]
    fn test_cells_in_rectangle() {
        let mut grid = SparseGrid::new();
        grid.insert_all([Cell::new(0, 0), Cell::new(5, 5), Cell::new(-3, 2), Cell::new(11, 0)]);
        let snap = grid.snapshot();
        let mut inside: Vec<Cell> = snap.cells_in(Cell::new(-3, 0), Cell::new(10, 10)).collect();
        inside.sort();
        assert_eq!(inside, vec![Cell::new(-3, 2), Cell::new(0, 0), Cell::new(5, 5)]);
    }
}
