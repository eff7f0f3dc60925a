use std::fmt::Debug;

use m2ma::prelude::*;
use owo_colors::OwoColorize;
use tracing::trace;

/// An observation table (a finite piece of the Hankel matrix) with prefix words indexing the
/// rows and suffix words indexing the columns. The cell for prefix `u` and suffix `v` holds the
/// label of `u·v`, which may be unknown.
///
/// Rows and columns are only ever appended and never duplicated. The only way to get rid of
/// rows or columns is [`ObservationTable::restrict`], which builds a new table.
#[derive(Clone)]
pub struct ObservationTable {
    prefixes: math::Set<Word>,
    suffixes: math::Set<Word>,
    cells: Vec<Vec<Label>>,
}

impl ObservationTable {
    /// Fills a table for the given prefixes and suffixes by asking `label` for every cell.
    /// Duplicates in either list are skipped.
    pub fn build<F>(prefixes: Vec<Word>, suffixes: Vec<Word>, mut label: F) -> Self
    where
        F: FnMut(&Word) -> Label,
    {
        let start = std::time::Instant::now();
        let mut table = Self {
            prefixes: math::Set::default(),
            suffixes: suffixes.into_iter().collect(),
            cells: vec![],
        };
        for prefix in prefixes {
            table.add_row(prefix, &mut label);
        }
        trace!(
            "built {}x{} table in {}µs",
            table.height(),
            table.width(),
            start.elapsed().as_micros()
        );
        table
    }

    /// The number of rows.
    pub fn height(&self) -> usize {
        self.prefixes.len()
    }

    /// The number of columns.
    pub fn width(&self) -> usize {
        self.suffixes.len()
    }

    /// The prefixes in row order.
    pub fn prefixes(&self) -> impl Iterator<Item = &Word> + '_ {
        self.prefixes.iter()
    }

    /// The suffixes in column order.
    pub fn suffixes(&self) -> impl Iterator<Item = &Word> + '_ {
        self.suffixes.iter()
    }

    /// The prefix of row `i`.
    pub fn prefix(&self, i: usize) -> &Word {
        &self.prefixes[i]
    }

    /// The suffix of column `j`.
    pub fn suffix(&self, j: usize) -> &Word {
        &self.suffixes[j]
    }

    /// The row index of `prefix`, if it has a row.
    pub fn row_index(&self, prefix: &Word) -> Option<usize> {
        self.prefixes.get_index_of(prefix)
    }

    /// The column index of `suffix`, if it has a column.
    pub fn column_index(&self, suffix: &Word) -> Option<usize> {
        self.suffixes.get_index_of(suffix)
    }

    /// Adds a row for `prefix` unless it already exists, returns its index.
    pub fn add_row<F>(&mut self, prefix: Word, mut label: F) -> usize
    where
        F: FnMut(&Word) -> Label,
    {
        if let Some(index) = self.row_index(&prefix) {
            return index;
        }
        let row = self
            .suffixes
            .iter()
            .map(|suffix| label(&prefix.concat(suffix)))
            .collect();
        self.cells.push(row);
        self.prefixes.insert_full(prefix).0
    }

    /// Adds a column for `suffix` unless it already exists, returns its index.
    pub fn add_column<F>(&mut self, suffix: Word, mut label: F) -> usize
    where
        F: FnMut(&Word) -> Label,
    {
        if let Some(index) = self.column_index(&suffix) {
            return index;
        }
        for (prefix, row) in self.prefixes.iter().zip(self.cells.iter_mut()) {
            row.push(label(&prefix.concat(&suffix)));
        }
        self.suffixes.insert_full(suffix).0
    }

    /// The label in row `i` and column `j`.
    pub fn label(&self, i: usize, j: usize) -> Label {
        self.cells[i][j]
    }

    /// Row `i` as a partial bit vector.
    pub fn row(&self, i: usize) -> PartialVector {
        PartialVector::from_labels(self.cells[i].iter().copied())
    }

    /// The row of `prefix`, if it has one.
    pub fn row_of(&self, prefix: &Word) -> Option<PartialVector> {
        self.row_index(prefix).map(|i| self.row(i))
    }

    /// The words `prefix·suffix` of all unknown cells in row `i`.
    pub fn unknown_words(&self, i: usize) -> impl Iterator<Item = Word> + '_ {
        let prefix = &self.prefixes[i];
        self.cells[i]
            .iter()
            .zip(self.suffixes.iter())
            .filter(|(label, _)| !label.is_known())
            .map(move |(_, suffix)| prefix.concat(suffix))
    }

    /// The number of known cells in column `j`.
    pub fn known_in_column(&self, j: usize) -> usize {
        self.cells.iter().filter(|row| row[j].is_known()).count()
    }

    /// Returns `true` if row `i` is known on all the given columns.
    pub fn is_known_on(&self, i: usize, columns: &[usize]) -> bool {
        columns.iter().all(|&j| self.cells[i][j].is_known())
    }

    /// Prunes the table to the given rows and columns, in the given order.
    pub fn restrict(&self, rows: &[usize], columns: &[usize]) -> ObservationTable {
        ObservationTable {
            prefixes: rows.iter().map(|&i| self.prefixes[i].clone()).collect(),
            suffixes: columns.iter().map(|&j| self.suffixes[j].clone()).collect(),
            cells: rows
                .iter()
                .map(|&i| columns.iter().map(|&j| self.cells[i][j]).collect())
                .collect(),
        }
    }

    /// Renders the table, words are written with the names from `alphabet`.
    pub fn show(&self, alphabet: &Alphabet) -> String {
        let mut builder = tabled::builder::Builder::default();
        builder.push_record(
            std::iter::once(String::new()).chain(self.suffixes.iter().map(|s| alphabet.show(s))),
        );
        for (prefix, row) in self.prefixes.iter().zip(&self.cells) {
            builder.push_record(std::iter::once(alphabet.show(prefix)).chain(row.iter().map(
                |label| match label {
                    Label::Unknown => label.symbol().red().to_string(),
                    _ => label.symbol().to_string(),
                },
            )));
        }
        builder
            .build()
            .with(tabled::settings::Style::rounded())
            .to_string()
    }
}

impl Debug for ObservationTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut builder = tabled::builder::Builder::default();
        builder.push_record(
            std::iter::once("MR".to_string()).chain(self.suffixes.iter().map(|s| format!("{s:?}"))),
        );
        for (prefix, row) in self.prefixes.iter().zip(&self.cells) {
            builder.push_record(
                std::iter::once(format!("{prefix:?}"))
                    .chain(row.iter().map(|label| label.symbol().to_string())),
            );
        }
        write!(f, "{}", builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn even_a(word: &Word) -> Label {
        Label::from_bit(word.symbols().filter(|s| s.index() == 0).count() % 2 == 0)
    }

    #[test_log::test]
    fn growing_tables() {
        let alphabet = Alphabet::new(["a", "b"]).unwrap();
        let mut table = ObservationTable::build(
            alphabet.words_up_to(1),
            vec![Word::epsilon(), Word::epsilon()],
            even_a,
        );
        assert_eq!((table.height(), table.width()), (3, 1));

        let a = alphabet.parse_word("a").unwrap();
        assert_eq!(table.add_column(a.clone(), even_a), 1);
        assert_eq!(table.add_column(a.clone(), even_a), 1);
        assert_eq!(table.add_row(a.clone(), even_a), 1);
        assert_eq!(
            table.row_of(&a).unwrap().to_complete(),
            BitVector::parse("01")
        );
        let shown = table.show(&alphabet);
        assert!(shown.contains('ε'));
    }

    #[test_log::test]
    fn unknown_cells() {
        let alphabet = Alphabet::new(["a", "b"]).unwrap();
        let known = |word: &Word| {
            if word.len() <= 1 {
                even_a(word)
            } else {
                Label::Unknown
            }
        };
        let table = ObservationTable::build(alphabet.words_up_to(1), alphabet.words_up_to(1), known);
        assert!(table.row(0).is_complete());
        let b = alphabet.parse_word("b").unwrap();
        let i = table.row_index(&b).unwrap();
        assert_eq!(
            table
                .unknown_words(i)
                .map(|w| alphabet.show(&w))
                .collect::<Vec<_>>(),
            vec!["b a", "b b"]
        );
        assert_eq!(table.known_in_column(0), 3);
        assert_eq!(table.known_in_column(1), 1);

        let pruned = table.restrict(&[2, 0], &[0]);
        assert_eq!(pruned.prefix(0), &b);
        assert!(pruned.row(0).is_complete());
    }
}
