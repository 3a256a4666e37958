use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::grid::Cell;

/// User paint events waiting to be merged into the grid.
///
/// Guarded by its own lock, independent of the grid lock, so painting never
/// waits on a generation being computed.
#[derive(Debug, Default)]
pub struct InputBuffer {
    cells: Mutex<Vec<Cell>>,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Cell>> {
        self.cells.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn append(&self, cell: Cell) {
        self.lock().push(cell);
    }

    /// Append a whole batch under a single lock acquisition.
    pub fn extend<I>(&self, cells: I)
    where
        I: IntoIterator<Item = Cell>,
    {
        self.lock().extend(cells);
    }

    /// Take every buffered cell, leaving the buffer empty.
    pub fn drain_all(&self) -> Vec<Cell> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Cells along the segment `from -> to`, without gaps.
///
/// Takes `max(|dx|, |dy|)` equal steps, rounds each intermediate point to the
/// nearest cell and always ends on `to` exactly.
pub fn line_cells(from: Cell, to: Cell) -> Vec<Cell> {
    let dx = to.x as i64 - from.x as i64;
    let dy = to.y as i64 - from.y as i64;
    let steps = dx.abs().max(dy.abs());

    let mut cells = Vec::with_capacity(steps as usize + 1);
    if steps > 0 {
        let step_x = dx as f64 / steps as f64;
        let step_y = dy as f64 / steps as f64;
        for i in 0..steps {
            let x = from.x as f64 + step_x * i as f64;
            let y = from.y as f64 + step_y * i as f64;
            cells.push(Cell::new(x.round() as i32, y.round() as i32));
        }
    }
    cells.push(to);
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    fn is_connected(cells: &[Cell]) -> bool {
        cells
            .windows(2)
            .all(|w| (w[1].x - w[0].x).abs() <= 1 && (w[1].y - w[0].y).abs() <= 1)
    }

    #[test]
    fn test_drain_clears_buffer() {
        let buffer = InputBuffer::new();
        buffer.append(Cell::new(1, 1));
        buffer.extend([Cell::new(2, 2), Cell::new(3, 3)]);
        assert_eq!(buffer.len(), 3);

        let drained = buffer.drain_all();
        assert_eq!(drained, vec![Cell::new(1, 1), Cell::new(2, 2), Cell::new(3, 3)]);
        assert!(buffer.is_empty());
        assert!(buffer.drain_all().is_empty());
    }

    #[test]
    fn test_line_single_point() {
        assert_eq!(line_cells(Cell::new(4, -2), Cell::new(4, -2)), vec![Cell::new(4, -2)]);
    }

    #[test]
    fn test_line_horizontal() {
        let cells = line_cells(Cell::new(0, 0), Cell::new(4, 0));
        assert_eq!(cells, (0..=4).map(|x| Cell::new(x, 0)).collect::<Vec<_>>());
    }

    #[test]
    fn test_line_diagonal_reversed() {
        let cells = line_cells(Cell::new(3, 3), Cell::new(0, 0));
        assert_eq!(
            cells,
            vec![Cell::new(3, 3), Cell::new(2, 2), Cell::new(1, 1), Cell::new(0, 0)]
        );
    }

    #[test]
    fn test_line_steep_has_no_gaps() {
        let from = Cell::new(-7, 20);
        let to = Cell::new(5, -31);
        let cells = line_cells(from, to);
        assert_eq!(cells.len(), 52);
        assert_eq!(cells.first(), Some(&from));
        assert_eq!(cells.last(), Some(&to));
        assert!(is_connected(&cells));
    }

    #[test]
    fn test_line_rounds_to_nearest() {
        // Half steps round away from zero.
        let cells = line_cells(Cell::new(0, 0), Cell::new(2, 1));
        assert_eq!(cells, vec![Cell::new(0, 0), Cell::new(1, 1), Cell::new(2, 1)]);
    }

    #[test]
    fn test_concurrent_appends_and_drains_lose_nothing() {
        const WRITERS: i32 = 4;
        const PER_WRITER: i32 = 2_000;

        let buffer = Arc::new(InputBuffer::new());
        let writers: Vec<_> = (0..WRITERS)
            .map(|w| {
                let buffer = Arc::clone(&buffer);
                thread::spawn(move || {
                    for i in 0..PER_WRITER {
                        buffer.append(Cell::new(w, i));
                    }
                })
            })
            .collect();

        let mut seen = Vec::new();
        while writers.iter().any(|h| !h.is_finished()) {
            seen.extend(buffer.drain_all());
        }
        for handle in writers {
            handle.join().unwrap();
        }
        seen.extend(buffer.drain_all());

        let unique: HashSet<Cell> = seen.iter().copied().collect();
        assert_eq!(seen.len(), (WRITERS * PER_WRITER) as usize);
        assert_eq!(unique.len(), seen.len());
    }
}
