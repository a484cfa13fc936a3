//! Column type inference over a full pass of the data rows.

use std::io::Read;

use csv::ByteRecord;

use super::tsv::{TsvReader, field, is_blank_record};
use crate::types::ColumnType;

#[derive(Debug, Clone, Copy)]
struct Candidates {
    integer: bool,
    real: bool,
    seen_value: bool,
}

impl Default for Candidates {
    fn default() -> Self {
        Self {
            integer: true,
            real: true,
            seen_value: false,
        }
    }
}

impl Candidates {
    fn observe(&mut self, value: &str) {
        self.seen_value = true;
        if self.integer && value.parse::<i64>().is_err() {
            self.integer = false;
        }
        if self.real && !is_real(value) {
            self.real = false;
        }
    }

    fn resolve(self) -> ColumnType {
        if !self.seen_value {
            ColumnType::Text
        } else if self.integer {
            ColumnType::Integer
        } else if self.real {
            ColumnType::Real
        } else {
            ColumnType::Text
        }
    }
}

/// A finite float, or one of the literal `inf`/`infinity`/`nan` spellings. Values that only reach
/// infinity by overflowing (`1e400`) are not numbers.
fn is_real(value: &str) -> bool {
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => true,
        Ok(_) => {
            let word = value.trim_start_matches(['+', '-']).to_ascii_lowercase();
            matches!(word.as_str(), "inf" | "infinity" | "nan")
        }
        Err(_) => false,
    }
}

/// Per-column type candidates accumulated over one scan.
///
/// Empty values never disqualify a type, and a disqualified type is never re-admitted, so the
/// outcome does not depend on row order.
#[derive(Debug, Clone)]
pub struct TypeInference {
    columns: Vec<Candidates>,
}

impl TypeInference {
    pub fn new(column_count: usize) -> Self {
        Self {
            columns: vec![Candidates::default(); column_count],
        }
    }

    /// Fold one data row into the candidates. Blank rows are ignored; returns whether the row
    /// counted.
    pub fn observe(&mut self, record: &ByteRecord) -> bool {
        if is_blank_record(record) {
            return false;
        }
        for (idx, column) in self.columns.iter_mut().enumerate() {
            let value = field(record, idx);
            if !value.is_empty() {
                column.observe(&value);
            }
        }
        true
    }

    pub fn finish(self) -> Vec<ColumnType> {
        self.columns.into_iter().map(Candidates::resolve).collect()
    }
}

/// Consume the remaining records of `rdr` and return one type per column.
///
/// The reader should already be positioned past the header.
pub fn infer_column_types<R: Read>(
    rdr: &mut TsvReader<R>,
    column_count: usize,
) -> csv::Result<Vec<ColumnType>> {
    let mut inference = TypeInference::new(column_count);
    let mut record = ByteRecord::new();
    while rdr.read_record(&mut record)? {
        inference.observe(&record);
    }
    Ok(inference.finish())
}

#[cfg(test)]
mod tests {
    use super::{TypeInference, infer_column_types};
    use crate::ingestion::tsv::TsvReader;
    use crate::types::ColumnType;

    fn infer(input: &str) -> Vec<ColumnType> {
        let mut rdr = TsvReader::from_reader(input.as_bytes());
        let header = rdr.read_header().unwrap();
        infer_column_types(&mut rdr, header.len()).unwrap()
    }

    #[test]
    fn integer_real_and_text_columns() {
        let types = infer("id\tscore\tlabel\n1\t3.5\tA\n2\t\tB\n");
        assert_eq!(
            types,
            vec![ColumnType::Integer, ColumnType::Real, ColumnType::Text]
        );
    }

    #[test]
    fn one_non_numeric_value_makes_text() {
        assert_eq!(infer("v\n1\n2\nx\n"), vec![ColumnType::Text]);
    }

    #[test]
    fn integers_and_reals_mix_to_real() {
        assert_eq!(infer("v\n1\n2.5\n-3\n1e3\n"), vec![ColumnType::Real]);
    }

    #[test]
    fn column_without_values_is_text() {
        assert_eq!(
            infer("id\tempty\n1\t\n2\t  \n"),
            vec![ColumnType::Integer, ColumnType::Text]
        );
        assert_eq!(infer("id\n"), vec![ColumnType::Text]);
    }

    #[test]
    fn whitespace_around_values_is_ignored() {
        assert_eq!(infer("n\n 42 \n\t7\n"), vec![ColumnType::Integer]);
    }

    #[test]
    fn short_rows_leave_missing_columns_untouched() {
        let types = infer("a\tb\tc\n1\n2\t2.5\n");
        assert_eq!(
            types,
            vec![ColumnType::Integer, ColumnType::Real, ColumnType::Text]
        );
    }

    #[test]
    fn extra_fields_are_ignored() {
        assert_eq!(infer("a\n1\tnot-a-number\n"), vec![ColumnType::Integer]);
    }

    #[test]
    fn integer_overflow_falls_back_to_real() {
        assert_eq!(infer("big\n99999999999999999999\n"), vec![ColumnType::Real]);
    }

    #[test]
    fn overflowing_float_is_text() {
        assert_eq!(infer("v\n1e400\n"), vec![ColumnType::Text]);
        assert_eq!(infer("v\n1.5\n-1e400\n"), vec![ColumnType::Text]);
    }

    #[test]
    fn spelled_out_infinity_is_real() {
        assert_eq!(infer("v\n1.5\ninf\n-Infinity\nNaN\n"), vec![ColumnType::Real]);
    }

    #[test]
    fn invalid_utf8_values_are_text() {
        let input: &[u8] = b"n\tname\n1\tJos\xe9\n";
        let mut rdr = TsvReader::from_reader(input);
        let header = rdr.read_header().unwrap();
        assert_eq!(
            infer_column_types(&mut rdr, header.len()).unwrap(),
            vec![ColumnType::Integer, ColumnType::Text]
        );
    }

    #[test]
    fn row_order_does_not_matter() {
        let forward = infer("a\tb\n1\tx\n2.5\t3\n");
        let backward = infer("a\tb\n2.5\t3\n1\tx\n");
        assert_eq!(forward, backward);
        assert_eq!(forward, vec![ColumnType::Real, ColumnType::Text]);
    }

    #[test]
    fn blank_rows_are_not_counted() {
        let mut inference = TypeInference::new(2);
        assert!(!inference.observe(&csv::ByteRecord::from(vec!["", " "])));
        assert!(inference.observe(&csv::ByteRecord::from(vec!["1", ""])));
        assert_eq!(
            inference.finish(),
            vec![ColumnType::Integer, ColumnType::Text]
        );
    }
}
