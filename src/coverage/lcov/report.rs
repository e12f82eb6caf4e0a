//! Conversion from parsed LCOV data to a [`CoverageReport`].

use super::handlers::merge_file;
use super::types::{FunctionCoverage, LcovData, LcovFile};
use crate::coverage::types::{CoverageReport, FileCoverageEntry, TestableCoverage, ROOT_KEY};
use indexmap::map::Entry;
use indexmap::IndexMap;
use std::path::{Component, Path};

/// Report key for an `SF` path.
///
/// Paths inside `root` become root-relative with a leading `/`. Relative
/// paths are taken as already relative to `root`. Absolute paths outside
/// `root` are kept as written.
pub fn report_key(source: &Path, root: &Path) -> String {
    let relative = if source.is_absolute() {
        match source.strip_prefix(root) {
            Ok(rel) => rel,
            Err(_) => return source.to_string_lossy().replace('\\', "/"),
        }
    } else {
        source
    };

    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    format!("/{}", parts.join("/"))
}

/// Files grouped by [`report_key`], merging paths that land on one key.
pub fn files_by_key(data: &LcovData, root: &Path) -> IndexMap<String, LcovFile> {
    let mut grouped: IndexMap<String, LcovFile> = IndexMap::new();
    for (path, file) in &data.files {
        match grouped.entry(report_key(path, root)) {
            Entry::Occupied(mut slot) => merge_file(slot.get_mut(), file.clone()),
            Entry::Vacant(slot) => {
                slot.insert(file.clone());
            }
        }
    }
    grouped
}

/// Build a report keyed by [`report_key`], with the aggregate under
/// [`ROOT_KEY`] as the first entry.
pub fn build_report(data: &LcovData, root: &Path) -> CoverageReport {
    let files = files_by_key(data, root);

    let (found, hit) = files.values().fold((0u64, 0u64), |(found, hit), file| {
        (found + u64::from(file.lines_found), hit + u64::from(file.lines_hit))
    });
    let root_entry = (
        ROOT_KEY.to_string(),
        FileCoverageEntry {
            percentage: (found > 0).then(|| hit as f64 / found as f64 * 100.0),
            testables: Vec::new(),
        },
    );

    let entries = files.into_iter().map(|(key, file)| {
        let testables = file
            .functions
            .iter()
            .map(|f| TestableCoverage::new(f.name.clone(), f.coverage_percentage))
            .collect();
        (
            key,
            FileCoverageEntry {
                percentage: file.percentage(),
                testables,
            },
        )
    });

    std::iter::once(root_entry).chain(entries).collect()
}

/// Function records per report key.
pub fn functions_by_key(
    data: &LcovData,
    root: &Path,
) -> IndexMap<String, Vec<FunctionCoverage>> {
    files_by_key(data, root)
        .into_iter()
        .map(|(key, file)| (key, file.functions))
        .collect()
}
