//! LCOV file parser - the imperative shell.
//!
//! Opens the tracefile, iterates its records and dispatches each one to the
//! pure handlers in [`super::handlers`].

use super::handlers::{
    handle_end_of_record, handle_function_data, handle_function_name, handle_incomplete_file,
    handle_line_data, handle_lines_found, handle_lines_hit, handle_source_file, LcovParserState,
};
use super::types::LcovData;
use crate::errors::{Error, Result};
use ::lcov::{Reader, Record};
use std::io::BufRead;
use std::path::Path;
use tracing::debug;

/// Parse an LCOV tracefile from disk.
///
/// # Errors
///
/// Returns [`Error::Coverage`] carrying the path when the file cannot be
/// opened or contains a malformed record.
pub fn parse_lcov_file(path: &Path) -> Result<LcovData> {
    let reader = Reader::open_file(path).map_err(|e| {
        Error::coverage_with_path(
            format!("Failed to open LCOV file {}: {}", path.display(), e),
            path,
        )
    })?;

    let data = parse_records(reader).map_err(|e| match e {
        Error::Coverage { message, .. } => Error::coverage_with_path(message, path),
        other => other,
    })?;

    debug!(
        path = %path.display(),
        files = data.files.len(),
        total_lines = data.total_lines,
        "Parsed LCOV tracefile"
    );
    Ok(data)
}

/// Parse LCOV records from any buffered reader.
pub fn parse_lcov_reader<B: BufRead>(input: B) -> Result<LcovData> {
    parse_records(Reader::new(input))
}

fn parse_records<B: BufRead>(reader: Reader<B>) -> Result<LcovData> {
    let mut state = LcovParserState::new();

    for record in reader {
        let record =
            record.map_err(|e| Error::coverage(format!("Failed to parse LCOV record: {}", e)))?;

        match record {
            Record::SourceFile { path } => handle_source_file(&mut state, path),
            Record::FunctionName { start_line, name } => {
                handle_function_name(&mut state, start_line, name)
            }
            Record::FunctionData { name, count } => handle_function_data(&mut state, name, count),
            Record::LineData { line, count, .. } => handle_line_data(&mut state, line, count),
            Record::LinesFound { found } => handle_lines_found(&mut state, found),
            Record::LinesHit { hit } => handle_lines_hit(&mut state, hit),
            Record::EndOfRecord => handle_end_of_record(&mut state),
            _ => {} // Branch and test-name records carry nothing we report
        }
    }

    handle_incomplete_file(&mut state);

    Ok(state.data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_lcov_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            indoc! {"
                TN:
                SF:/repo/src/calc.ts
                FN:1,add
                FN:5,divide
                FNDA:3,add
                FNDA:0,divide
                DA:1,3
                DA:2,3
                DA:5,0
                DA:6,0
                LF:4
                LH:2
                end_of_record
            "}
        )
        .unwrap();

        let data = parse_lcov_file(file.path()).unwrap();
        let calc = &data.files[&PathBuf::from("/repo/src/calc.ts")];

        assert_eq!(calc.functions.len(), 2);
        assert_eq!(calc.functions[0].coverage_percentage, Some(100.0));
        assert_eq!(calc.functions[1].coverage_percentage, Some(0.0));
        assert_eq!(calc.functions[1].uncovered_lines, vec![5, 6]);
        assert_eq!(data.overall_percentage(), Some(50.0));
    }

    #[test]
    fn test_parse_without_trailing_end_of_record() {
        let input = indoc! {"
            SF:src/a.ts
            FN:1,first
            DA:1,1
            end_of_record
            SF:src/b.ts
            FN:3,second
            DA:3,0
        "};

        let data = parse_lcov_reader(input.as_bytes()).unwrap();
        assert_eq!(data.files.len(), 2);
        assert!(data.files.contains_key(&PathBuf::from("src/b.ts")));
        assert_eq!(data.total_lines, 2);
        assert_eq!(data.lines_hit, 1);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = parse_lcov_file(Path::new("/definitely/not/here/lcov.info")).unwrap_err();
        assert_eq!(
            err.path(),
            Some(&PathBuf::from("/definitely/not/here/lcov.info"))
        );
    }

    #[test]
    fn test_malformed_record_is_an_error() {
        let input = "SF:src/a.ts\nDA:not-a-number,1\nend_of_record\n";
        assert!(parse_lcov_reader(input.as_bytes()).is_err());
    }
}
