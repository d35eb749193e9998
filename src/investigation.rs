use tracing::warn;

use crate::domain::{Cell, FieldRecord, InvestigationResult};
use crate::grid::{Grid, cell_at, first_cell};

pub const CONTACT_FIELDS: usize = 11;
pub const PUBLICATION_FIELDS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    Investigation,
    Study,
}

impl Scope {
    fn identifier_marker(self) -> &'static str {
        match self {
            Scope::Investigation => "Investigation Identifier",
            Scope::Study => "Study Identifier",
        }
    }

    fn contacts_marker(self) -> &'static str {
        match self {
            Scope::Investigation => "INVESTIGATION CONTACTS",
            Scope::Study => "STUDY CONTACTS",
        }
    }

    fn publications_marker(self) -> &'static str {
        match self {
            Scope::Investigation => "INVESTIGATION PUBLICATIONS",
            Scope::Study => "STUDY PUBLICATIONS",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InvestigationParser {
    scope: Scope,
}

enum State {
    Seeking,
    InContactBlock(BlockScan),
    InPublicationBlock(BlockScan),
}

struct BlockScan {
    header_row: usize,
    header_width: usize,
    expected_rows: usize,
    seen_rows: usize,
    columns: Vec<usize>,
    records: Vec<FieldRecord>,
}

impl BlockScan {
    fn open(header_row: usize, header: &[Cell], expected_rows: usize) -> Self {
        Self {
            header_row,
            header_width: header.len(),
            expected_rows,
            seen_rows: 0,
            columns: Vec::new(),
            records: Vec::new(),
        }
    }

    fn feed(&mut self, row: &[Cell]) -> bool {
        if self.seen_rows == 0 {
            self.columns = (1..self.header_width)
                .filter(|&column| cell_at(row, column).is_some_and(|value| !value.is_empty()))
                .collect();
            self.records = vec![FieldRecord::new(); self.columns.len()];
        }
        if let Some(label) = first_cell(row) {
            for (record, &column) in self.records.iter_mut().zip(&self.columns) {
                record.insert(label.to_string(), row.get(column).cloned().flatten());
            }
        }
        self.seen_rows += 1;
        self.seen_rows == self.expected_rows
    }
}

impl InvestigationParser {
    pub fn new(scope: Scope) -> Self {
        Self { scope }
    }

    pub fn parse(&self, grid: &Grid) -> InvestigationResult {
        let mut result = InvestigationResult::empty();
        let mut identifier_seen = false;
        let mut state = State::Seeking;

        for (index, row) in grid.rows().iter().enumerate() {
            state = match state {
                State::Seeking => {
                    let marker = first_cell(row);
                    if marker == Some(self.scope.identifier_marker()) {
                        if !identifier_seen {
                            result.identifier = cell_at(row, 1).unwrap_or_default().to_string();
                            identifier_seen = true;
                        }
                        State::Seeking
                    } else if marker == Some(self.scope.contacts_marker()) {
                        State::InContactBlock(BlockScan::open(index, row, CONTACT_FIELDS))
                    } else if marker == Some(self.scope.publications_marker()) {
                        State::InPublicationBlock(BlockScan::open(index, row, PUBLICATION_FIELDS))
                    } else {
                        State::Seeking
                    }
                }
                State::InContactBlock(mut scan) => {
                    if scan.feed(row) {
                        result.contacts.extend(scan.records);
                        State::Seeking
                    } else {
                        State::InContactBlock(scan)
                    }
                }
                State::InPublicationBlock(mut scan) => {
                    if scan.feed(row) {
                        result.publications.extend(scan.records);
                        State::Seeking
                    } else {
                        State::InPublicationBlock(scan)
                    }
                }
            };
        }

        match state {
            State::Seeking => {}
            State::InContactBlock(scan) | State::InPublicationBlock(scan) => {
                warn!(
                    header_row = scan.header_row,
                    expected = scan.expected_rows,
                    found = scan.seen_rows,
                    "block runs past the end of the sheet; dropping it"
                );
            }
        }

        result
    }
}

pub fn parse(grid: &Grid) -> InvestigationResult {
    InvestigationParser::default().parse(grid)
}
