//! Pure handler functions for LCOV record types.
//!
//! The parser reads records and dispatches here; each handler only mutates
//! [`LcovParserState`], so the whole state machine can be driven from tests
//! without a tracefile on disk.
//!
//! - `handle_source_file` - SF: records
//! - `handle_function_name` - FN: records
//! - `handle_function_data` - FNDA: records
//! - `handle_line_data` - DA: records
//! - `handle_lines_found` - LF: records
//! - `handle_lines_hit` - LH: records
//! - `handle_end_of_record` - end_of_record markers
//!
//! A source file named by more than one `SF` block is folded into one
//! [`LcovFile`] by [`merge_file`].

use super::types::{FunctionCoverage, LcovData, LcovFile};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Mutable state during LCOV parsing.
///
/// Accumulates data for the current file until an end_of_record marker (or
/// the next SF record, or EOF) flushes it into `data`.
pub(crate) struct LcovParserState {
    pub data: LcovData,
    pub current_file: Option<PathBuf>,
    /// Functions for the current file, keyed by name, in declaration order
    pub file_functions: IndexMap<String, FunctionCoverage>,
    /// Line execution counts for the current file
    pub file_lines: BTreeMap<u32, u64>,
    pub lines_found: Option<u32>,
    pub lines_hit: Option<u32>,
    pub file_count: usize,
}

impl LcovParserState {
    pub fn new() -> Self {
        Self {
            data: LcovData::default(),
            current_file: None,
            file_functions: IndexMap::new(),
            file_lines: BTreeMap::new(),
            lines_found: None,
            lines_hit: None,
            file_count: 0,
        }
    }
}

impl Default for LcovParserState {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute a function's line coverage from the file's `DA` records.
///
/// The function spans from its start line up to (not including) the next
/// distinct function start. Without any `DA` line in range, the `FNDA`
/// count decides: hit means 100%, zero means 0%, absent means unmeasured.
pub fn calculate_function_coverage(
    func: &FunctionCoverage,
    boundaries: &[u32],
    lines: &BTreeMap<u32, u64>,
) -> (Option<f64>, Vec<u32>) {
    let end = boundaries
        .iter()
        .copied()
        .find(|start| *start > func.start_line)
        .unwrap_or(u32::MAX);

    let in_range: Vec<(u32, u64)> = lines
        .range(func.start_line..end)
        .map(|(line, count)| (*line, *count))
        .collect();

    if in_range.is_empty() {
        let percentage = func
            .execution_count
            .map(|count| if count > 0 { 100.0 } else { 0.0 });
        return (percentage, Vec::new());
    }

    let covered = in_range.iter().filter(|(_, count)| *count > 0).count();
    let uncovered = in_range
        .iter()
        .filter(|(_, count)| *count == 0)
        .map(|(line, _)| *line)
        .collect();

    (
        Some(covered as f64 / in_range.len() as f64 * 100.0),
        uncovered,
    )
}

/// Drain the current file's functions, computing their coverage.
pub fn finalize_file_functions(
    file_functions: &mut IndexMap<String, FunctionCoverage>,
    file_lines: &BTreeMap<u32, u64>,
) -> Vec<FunctionCoverage> {
    let mut boundaries: Vec<u32> = file_functions.values().map(|f| f.start_line).collect();
    boundaries.sort_unstable();
    boundaries.dedup();

    file_functions
        .drain(..)
        .map(|(_, mut func)| {
            let (percentage, uncovered) =
                calculate_function_coverage(&func, &boundaries, file_lines);
            func.coverage_percentage = percentage;
            func.uncovered_lines = uncovered;
            func
        })
        .collect()
}

/// Fold `other` into `into`, both describing the same source file.
///
/// Functions merge by name (first declaration's start line, highest `FNDA`
/// count) and lines merge by number (highest `DA` count). Function coverage
/// is then recomputed from the merged lines. Line totals come from the
/// merged `DA` records, or from the larger `LF`/`LH` when neither side had any.
pub fn merge_file(into: &mut LcovFile, other: LcovFile) {
    let mut functions: IndexMap<String, FunctionCoverage> = into
        .functions
        .drain(..)
        .map(|f| (f.name.clone(), f))
        .collect();
    for func in other.functions {
        match functions.get_mut(&func.name) {
            Some(existing) => {
                existing.execution_count = existing.execution_count.max(func.execution_count);
            }
            None => {
                functions.insert(func.name.clone(), func);
            }
        }
    }

    for (line, count) in other.lines {
        let entry = into.lines.entry(line).or_insert(0);
        *entry = (*entry).max(count);
    }

    if into.lines.is_empty() {
        into.lines_found = into.lines_found.max(other.lines_found);
        into.lines_hit = into.lines_hit.max(other.lines_hit);
    } else {
        into.lines_found = into.lines.len() as u32;
        into.lines_hit = into.lines.values().filter(|c| **c > 0).count() as u32;
    }

    into.functions = finalize_file_functions(&mut functions, &into.lines);
}

fn flush_current_file(state: &mut LcovParserState) {
    let Some(path) = state.current_file.take() else {
        return;
    };

    let lines = std::mem::take(&mut state.file_lines);
    let functions = finalize_file_functions(&mut state.file_functions, &lines);
    let measured_found = lines.len() as u32;
    let measured_hit = lines.values().filter(|c| **c > 0).count() as u32;

    // LF/LH are authoritative when present; DA records otherwise.
    let file = LcovFile {
        functions,
        lines,
        lines_found: state.lines_found.take().unwrap_or(measured_found),
        lines_hit: state.lines_hit.take().unwrap_or(measured_hit),
    };

    let data = &mut state.data;
    match data.files.get_mut(&path) {
        Some(existing) => {
            data.total_lines -= u64::from(existing.lines_found);
            data.lines_hit -= u64::from(existing.lines_hit);
            merge_file(existing, file);
            data.total_lines += u64::from(existing.lines_found);
            data.lines_hit += u64::from(existing.lines_hit);
        }
        None => {
            data.total_lines += u64::from(file.lines_found);
            data.lines_hit += u64::from(file.lines_hit);
            data.files.insert(path, file);
        }
    }

    state.file_count += 1;
}

/// Handle SourceFile record - save previous file and start new one.
pub(crate) fn handle_source_file(state: &mut LcovParserState, path: PathBuf) {
    flush_current_file(state);
    state.current_file = Some(path);
    state.file_functions.clear();
    state.file_lines.clear();
    state.lines_found = None;
    state.lines_hit = None;
}

/// Handle FunctionName record - register a function definition.
///
/// A name seen twice in one file keeps its first declaration.
pub(crate) fn handle_function_name(state: &mut LcovParserState, start_line: u32, name: String) {
    state
        .file_functions
        .entry(name.clone())
        .or_insert_with(|| FunctionCoverage::new(name, start_line));
}

/// Handle FunctionData record - update execution count.
///
/// Repeated records for one function keep the maximum count.
pub(crate) fn handle_function_data(state: &mut LcovParserState, name: String, count: u64) {
    if let Some(func) = state.file_functions.get_mut(&name) {
        func.execution_count = Some(func.execution_count.map_or(count, |c| c.max(count)));
    }
}

/// Handle LineData record - track line execution counts.
pub(crate) fn handle_line_data(state: &mut LcovParserState, line: u32, count: u64) {
    let entry = state.file_lines.entry(line).or_insert(0);
    *entry = (*entry).max(count);
}

pub(crate) fn handle_lines_found(state: &mut LcovParserState, found: u32) {
    state.lines_found = Some(found);
}

pub(crate) fn handle_lines_hit(state: &mut LcovParserState, hit: u32) {
    state.lines_hit = Some(hit);
}

/// Handle end_of_record - flush the current file.
pub(crate) fn handle_end_of_record(state: &mut LcovParserState) {
    flush_current_file(state);
    state.file_functions.clear();
    state.lines_found = None;
    state.lines_hit = None;
}

/// Flush a trailing file when the tracefile does not end with end_of_record.
pub(crate) fn handle_incomplete_file(state: &mut LcovParserState) {
    flush_current_file(state);
}
