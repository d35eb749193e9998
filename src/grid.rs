use std::fmt;
use std::io::Cursor;

use calamine::{Data, Range, Reader, Xlsx, open_workbook_from_rs};
use camino::Utf8Path;

use crate::domain::Cell;
use crate::error::ArcIndexError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    rows: Vec<Vec<Cell>>,
}

impl Grid {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    pub fn from_strs(rows: &[&[&str]]) -> Self {
        Self::new(
            rows.iter()
                .map(|row| {
                    row.iter()
                        .map(|cell| (!cell.is_empty()).then(|| cell.to_string()))
                        .collect()
                })
                .collect(),
        )
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }
}

pub fn first_cell(row: &[Cell]) -> Option<&str> {
    row.first().and_then(|cell| cell.as_deref())
}

pub fn cell_at(row: &[Cell], column: usize) -> Option<&str> {
    row.get(column).and_then(|cell| cell.as_deref())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Investigation,
    Study,
}

impl DocumentKind {
    fn sheet_hint(self) -> &'static str {
        match self {
            DocumentKind::Investigation => "investigation",
            DocumentKind::Study => "study",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sheet_hint())
    }
}

pub trait GridReader: Send + Sync {
    fn read(&self, bytes: &[u8], kind: DocumentKind) -> Result<Grid, ArcIndexError>;

    fn read_path(&self, path: &Utf8Path, kind: DocumentKind) -> Result<Grid, ArcIndexError> {
        let bytes = std::fs::read(path.as_std_path())
            .map_err(|err| ArcIndexError::Filesystem(format!("read {path}: {err}")))?;
        self.read(&bytes, kind)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxGridReader;

impl GridReader for XlsxGridReader {
    fn read(&self, bytes: &[u8], kind: DocumentKind) -> Result<Grid, ArcIndexError> {
        let mut workbook = open_workbook_from_rs::<Xlsx<_>, _>(Cursor::new(bytes.to_vec()))
            .map_err(|err| ArcIndexError::Grid(err.to_string()))?;
        let sheet = pick_sheet(&workbook.sheet_names(), kind)
            .ok_or_else(|| ArcIndexError::Grid(format!("no worksheet in {kind} document")))?;
        let range = workbook
            .worksheet_range(&sheet)
            .map_err(|err| ArcIndexError::Grid(err.to_string()))?;
        Ok(range_to_grid(&range))
    }
}

fn pick_sheet(names: &[String], kind: DocumentKind) -> Option<String> {
    let hint = kind.sheet_hint();
    names
        .iter()
        .find(|name| name.to_lowercase().contains(hint))
        .or_else(|| names.first())
        .cloned()
}

fn range_to_grid(range: &Range<Data>) -> Grid {
    // Re-anchor at A1 so column indices stay positional.
    let (row_offset, col_offset) = range
        .start()
        .map(|(row, col)| (row as usize, col as usize))
        .unwrap_or((0, 0));
    let mut rows = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells: Vec<Cell> = vec![None; col_offset];
        cells.extend(row.iter().map(data_to_cell));
        rows.push(cells);
    }
    Grid::new(rows)
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => None,
        Data::String(value) => Some(value.clone()),
        other => Some(other.to_string()),
    }
}
