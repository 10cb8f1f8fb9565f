//! The grid of cells
//!
//! A fixed-size rectangular table created once and living for the
//! process. A cell exists only after an explicit write; writes are total:
//! the formula is evaluated and serialized first, and any failure leaves
//! the previously stored record untouched.

use crate::ast::Expr;
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::{evaluate, EvaluationContext};
use crate::serializer::serialize;
use lattice_core::{CellAddress, CellRange, Value, DEFAULT_COLS, DEFAULT_ROWS};

/// A written cell: the complete record stored by [`Grid::set_cell`]
#[derive(Debug, Clone)]
pub struct Cell {
    /// The source text the formula was entered as
    pub source: String,
    /// The parsed formula
    pub ast: Expr,
    /// The evaluated value
    pub value: Value,
    /// The serializer's canonical rendering of `ast`
    pub canonical: String,
    /// Row index of this cell
    pub row: u32,
    /// Column index of this cell
    pub col: u16,
}

/// A cell slot within a range iteration
///
/// `cell` is `None` for addresses that were never written.
#[derive(Debug)]
pub struct RangeCell<'a> {
    /// The slot's address
    pub address: CellAddress,
    /// The stored record, if any
    pub cell: Option<&'a Cell>,
}

/// A fixed-size rectangular table of cells
///
/// Overwrites replace the whole cell record; cells are never deleted.
/// There is no dependency tracking: writing a cell re-evaluates only that
/// cell, and other cells referencing it keep their previously computed
/// values until explicitly rewritten.
#[derive(Debug)]
pub struct Grid {
    rows: u32,
    cols: u16,
    cells: Vec<Option<Cell>>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(DEFAULT_ROWS, DEFAULT_COLS)
    }
}

impl Grid {
    /// Create a grid with the given dimensions
    ///
    /// # Panics
    /// Panics if either dimension is zero.
    pub fn new(rows: u32, cols: u16) -> Self {
        assert!(rows > 0 && cols > 0, "grid dimensions must be non-zero");
        let cells = vec![None; rows as usize * cols as usize];
        Self { rows, cols, cells }
    }

    /// Number of rows
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns
    pub fn cols(&self) -> u16 {
        self.cols
    }

    fn index(&self, addr: CellAddress) -> usize {
        addr.row as usize * self.cols as usize + addr.col as usize
    }

    /// Validate possibly-signed indices against this grid's bounds
    ///
    /// Returns `None` for addresses outside the grid; consumers decide
    /// whether an absent address is an error.
    pub fn cell_address(&self, row: i64, col: i64) -> Option<CellAddress> {
        let addr = CellAddress::from_signed(row, col).ok()?;
        (addr.row < self.rows && addr.col < self.cols).then_some(addr)
    }

    /// The stored record at an address, if the address is in bounds and
    /// was ever written
    pub fn cell(&self, row: u32, col: u16) -> Option<&Cell> {
        let addr = self.cell_address(row as i64, col as i64)?;
        self.cell_at(addr)
    }

    /// The stored record at a validated address
    pub fn cell_at(&self, addr: CellAddress) -> Option<&Cell> {
        self.cells[self.index(addr)].as_ref()
    }

    /// The evaluated value stored at an address
    ///
    /// Reading a never-written address is an error, not a default value.
    pub fn value(&self, row: u32, col: u16) -> FormulaResult<&Value> {
        self.written_cell(row, col).map(|cell| &cell.value)
    }

    /// The canonical text stored at an address
    pub fn text(&self, row: u32, col: u16) -> FormulaResult<&str> {
        self.written_cell(row, col).map(|cell| cell.canonical.as_str())
    }

    fn written_cell(&self, row: u32, col: u16) -> FormulaResult<&Cell> {
        let addr = self
            .cell_address(row as i64, col as i64)
            .ok_or(FormulaError::InvalidAddress {
                row: row as i64,
                col: col as i64,
            })?;
        self.cell_at(addr)
            .ok_or(FormulaError::UndefinedCell { row, col })
    }

    /// Evaluate and serialize a formula, then store the complete cell
    /// record at the address
    ///
    /// The write is atomic: on any failure the previously stored cell (if
    /// any) is left in place.
    pub fn set_cell(
        &mut self,
        row: u32,
        col: u16,
        source: impl Into<String>,
        ast: Expr,
    ) -> FormulaResult<()> {
        let addr = self
            .cell_address(row as i64, col as i64)
            .ok_or(FormulaError::InvalidAddress {
                row: row as i64,
                col: col as i64,
            })?;

        let value = evaluate(&ast, &EvaluationContext::new(self))?;
        let canonical = serialize(&ast);

        let index = self.index(addr);
        self.cells[index] = Some(Cell {
            source: source.into(),
            ast,
            value,
            canonical,
            row,
            col,
        });
        Ok(())
    }

    /// Every cell slot in the inclusive rectangle between two addresses,
    /// in row-major order
    ///
    /// Both endpoints must lie inside the grid and `start` must not be
    /// below or right of `end`; either violation is an explicit error
    /// rather than silent out-of-range indexing.
    pub fn cells_between(
        &self,
        start: CellAddress,
        end: CellAddress,
    ) -> FormulaResult<Vec<RangeCell<'_>>> {
        for endpoint in [start, end] {
            if self
                .cell_address(endpoint.row as i64, endpoint.col as i64)
                .is_none()
            {
                return Err(FormulaError::InvalidRange(format!(
                    "endpoint {} is outside the grid",
                    endpoint
                )));
            }
        }

        let range = CellRange::ordered(start, end)
            .map_err(|e| FormulaError::InvalidRange(e.to_string()))?;

        Ok(range
            .cells()
            .map(|address| RangeCell {
                address,
                cell: self.cell_at(address),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_formula;

    /// Parse and store a formula the way a front end would
    fn write(grid: &mut Grid, row: u32, col: u16, source: &str) -> FormulaResult<()> {
        let ast = parse_formula(source)?;
        grid.set_cell(row, col, source, ast)
    }

    #[test]
    fn test_set_and_get() {
        let mut grid = Grid::default();
        write(&mut grid, 0, 0, "1 + 2").unwrap();

        assert_eq!(grid.value(0, 0).unwrap(), &Value::Int(3));
        assert_eq!(grid.text(0, 0).unwrap(), "(1 + 2)");

        let cell = grid.cell(0, 0).unwrap();
        assert_eq!(cell.source, "1 + 2");
        assert_eq!((cell.row, cell.col), (0, 0));
    }

    #[test]
    fn test_undefined_cell_read() {
        let grid = Grid::default();
        assert_eq!(
            grid.value(3, 3).unwrap_err(),
            FormulaError::UndefinedCell { row: 3, col: 3 }
        );
        assert_eq!(
            grid.text(3, 3).unwrap_err(),
            FormulaError::UndefinedCell { row: 3, col: 3 }
        );
    }

    #[test]
    fn test_out_of_bounds_access() {
        let grid = Grid::new(2, 2);
        assert_eq!(
            grid.value(2, 0).unwrap_err(),
            FormulaError::InvalidAddress { row: 2, col: 0 }
        );
        assert!(grid.cell(5, 5).is_none());
        assert!(grid.cell_address(1, 1).is_some());
        assert!(grid.cell_address(-1, 0).is_none());
        assert!(grid.cell_address(0, 2).is_none());
    }

    #[test]
    fn test_overwrite_replaces_record() {
        let mut grid = Grid::default();
        write(&mut grid, 1, 1, "10").unwrap();
        write(&mut grid, 1, 1, "20 + 1").unwrap();

        assert_eq!(grid.value(1, 1).unwrap(), &Value::Int(21));
        assert_eq!(grid.cell(1, 1).unwrap().source, "20 + 1");
    }

    #[test]
    fn test_failed_write_keeps_previous_cell() {
        let mut grid = Grid::default();
        write(&mut grid, 0, 0, "7").unwrap();

        // evaluation fails: reads an unwritten cell
        let err = write(&mut grid, 0, 0, "#[5, 5] + 1").unwrap_err();
        assert_eq!(err, FormulaError::UndefinedCell { row: 5, col: 5 });

        // the prior record survives
        assert_eq!(grid.value(0, 0).unwrap(), &Value::Int(7));
        assert_eq!(grid.cell(0, 0).unwrap().source, "7");
    }

    #[test]
    fn test_set_cell_out_of_bounds() {
        let mut grid = Grid::new(2, 2);
        let err = write(&mut grid, 2, 0, "1").unwrap_err();
        assert_eq!(err, FormulaError::InvalidAddress { row: 2, col: 0 });
    }

    #[test]
    fn test_formulas_reference_other_cells() {
        let mut grid = Grid::default();
        write(&mut grid, 0, 0, "5").unwrap();
        write(&mut grid, 0, 1, "#[0, 0] * 3").unwrap();

        assert_eq!(grid.value(0, 1).unwrap(), &Value::Int(15));
    }

    #[test]
    fn test_no_dependency_tracking() {
        // rewriting a referenced cell leaves dependents stale
        let mut grid = Grid::default();
        write(&mut grid, 0, 0, "5").unwrap();
        write(&mut grid, 0, 1, "#[0, 0] * 3").unwrap();
        write(&mut grid, 0, 0, "100").unwrap();

        assert_eq!(grid.value(0, 0).unwrap(), &Value::Int(100));
        // the dependent keeps its previously computed value
        assert_eq!(grid.value(0, 1).unwrap(), &Value::Int(15));
    }

    #[test]
    fn test_cells_between_row_major() {
        let mut grid = Grid::default();
        write(&mut grid, 0, 0, "1").unwrap();
        write(&mut grid, 1, 1, "2").unwrap();

        let cells = grid
            .cells_between(CellAddress::new(0, 0), CellAddress::new(1, 1))
            .unwrap();
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[0].address, CellAddress::new(0, 0));
        assert_eq!(cells[1].address, CellAddress::new(0, 1));
        assert_eq!(cells[2].address, CellAddress::new(1, 0));
        assert_eq!(cells[3].address, CellAddress::new(1, 1));

        assert!(cells[0].cell.is_some());
        assert!(cells[1].cell.is_none());
        assert!(cells[3].cell.is_some());
    }

    #[test]
    fn test_cells_between_rejects_bad_ranges() {
        let grid = Grid::new(4, 4);

        // unordered endpoints
        let err = grid
            .cells_between(CellAddress::new(2, 2), CellAddress::new(0, 0))
            .unwrap_err();
        assert!(matches!(err, FormulaError::InvalidRange(_)));

        // out-of-bounds endpoint
        let err = grid
            .cells_between(CellAddress::new(0, 0), CellAddress::new(4, 0))
            .unwrap_err();
        assert!(matches!(err, FormulaError::InvalidRange(_)));
    }
}
