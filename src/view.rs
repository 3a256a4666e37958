use crate::grid::Cell;

pub const MIN_CELL_SIZE: i32 = 2;
pub const CELL_SIZE_STEP: i32 = 2;
pub const DEFAULT_CELL_SIZE: i32 = 50;

/// Grid-to-screen transform. Purely visual; never touches the simulation.
///
/// Screen coordinates are physical pixels with the origin at the top-left
/// corner, y growing downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct View {
    pub cell_size: i32,
    pub offset: [i32; 2],
}

impl Default for View {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            offset: [0, 0],
        }
    }
}

impl View {
    pub fn new(cell_size: i32) -> Self {
        Self {
            cell_size: cell_size.max(MIN_CELL_SIZE),
            offset: [0, 0],
        }
    }

    /// The cell under a screen pixel.
    pub fn screen_to_cell(&self, screen_x: f64, screen_y: f64) -> Cell {
        let x = (screen_x.floor() as i64 - self.offset[0] as i64).div_euclid(self.cell_size as i64);
        let y = (screen_y.floor() as i64 - self.offset[1] as i64).div_euclid(self.cell_size as i64);
        Cell::new(x as i32, y as i32)
    }

    /// Top-left pixel of a cell.
    pub fn cell_to_screen(&self, cell: Cell) -> [f32; 2] {
        [
            (cell.x as i64 * self.cell_size as i64 + self.offset[0] as i64) as f32,
            (cell.y as i64 * self.cell_size as i64 + self.offset[1] as i64) as f32,
        ]
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.offset[0] = self.offset[0].saturating_add(dx);
        self.offset[1] = self.offset[1].saturating_add(dy);
    }

    /// Grow or shrink cells by one step, keeping the cell under the pointer
    /// in place. Returns `false` if the size was already at its minimum.
    pub fn zoom_at(&mut self, screen_x: f64, screen_y: f64, zoom_in: bool) -> bool {
        let anchor = self.screen_to_cell(screen_x, screen_y);
        let new_size = if zoom_in {
            self.cell_size.saturating_add(CELL_SIZE_STEP)
        } else {
            (self.cell_size - CELL_SIZE_STEP).max(MIN_CELL_SIZE)
        };
        if new_size == self.cell_size {
            return false;
        }
        self.cell_size = new_size;
        self.offset = [
            screen_x as i32 - anchor.x.saturating_mul(new_size),
            screen_y as i32 - anchor.y.saturating_mul(new_size),
        ];
        true
    }

    /// Inclusive cell range covering a `width` x `height` pixel viewport.
    pub fn visible_cells(&self, width: u32, height: u32) -> (Cell, Cell) {
        let min = self.screen_to_cell(0.0, 0.0);
        let max = self.screen_to_cell(width as f64, height as f64);
        (min, max)
    }

    pub fn reset(&mut self) {
        self.offset = [0, 0];
    }
}
