use std::collections::HashSet;

use crate::domain::{OTHER_ASSAYS, StudyAssayMap};
use crate::grid::{Grid, first_cell};

pub const ASSAY_FILE_MARKER: &str = "Study Assay File Name";

pub fn resolve(study: &Grid) -> Vec<String> {
    let Some(row) = study
        .rows()
        .iter()
        .find(|row| first_cell(row) == Some(ASSAY_FILE_MARKER))
    else {
        return Vec::new();
    };

    let files: Vec<&str> = row.iter().skip(1).filter_map(|cell| cell.as_deref()).collect();
    let Some(first) = files.first() else {
        return Vec::new();
    };
    let separator = if first.contains('/') {
        '/'
    } else if first.contains('\\') {
        '\\'
    } else {
        return Vec::new();
    };

    files
        .iter()
        .filter_map(|file| parent_dir_name(file, separator))
        .collect()
}

fn parent_dir_name(file: &str, separator: char) -> Option<String> {
    let mut segments = file.rsplit(separator);
    segments.next()?;
    segments.next().map(str::to_string)
}

/// Each study claims the listed assays no earlier study took; the rest go under `"other"`.
pub fn relate<F>(assay_dirs: &[String], studies: &[String], mut study_assays: F) -> StudyAssayMap
where
    F: FnMut(&str) -> Vec<String>,
{
    let mut unclaimed: Vec<String> = Vec::with_capacity(assay_dirs.len());
    for assay in assay_dirs {
        if !unclaimed.contains(assay) {
            unclaimed.push(assay.clone());
        }
    }

    let mut relation = StudyAssayMap::new();
    for study in studies {
        if relation.get(study).is_some() {
            continue;
        }
        let mut seen = HashSet::new();
        let owned: Vec<String> = study_assays(study)
            .into_iter()
            .filter(|assay| seen.insert(assay.clone()))
            .filter(|assay| match unclaimed.iter().position(|name| name == assay) {
                Some(index) => {
                    unclaimed.remove(index);
                    true
                }
                None => false,
            })
            .collect();
        relation.insert(study.clone(), owned);
    }

    if !unclaimed.is_empty() {
        relation.extend(OTHER_ASSAYS, unclaimed);
    }
    relation
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn backslash_paths_resolve() {
        let grid = Grid::from_strs(&[&[
            ASSAY_FILE_MARKER,
            "assays\\Proteomics\\isa.assay.xlsx",
        ]]);
        assert_eq!(resolve(&grid), names(&["Proteomics"]));
    }

    #[test]
    fn bare_file_names_resolve_to_nothing() {
        let grid = Grid::from_strs(&[&[ASSAY_FILE_MARKER, "isa.assay.xlsx", "a/b/c.xlsx"]]);
        assert!(resolve(&grid).is_empty());
    }

    #[test]
    fn only_first_marker_row_counts() {
        let grid = Grid::from_strs(&[
            &["Study Identifier", "s1"],
            &[ASSAY_FILE_MARKER, "assays/A/isa.assay.xlsx"],
            &[ASSAY_FILE_MARKER, "assays/B/isa.assay.xlsx"],
        ]);
        assert_eq!(resolve(&grid), names(&["A"]));
    }

    #[test]
    fn missing_marker_resolves_to_nothing() {
        let grid = Grid::from_strs(&[&["Study Identifier", "s1"]]);
        assert!(resolve(&grid).is_empty());
    }

    #[test]
    fn study_keeps_resolver_order_and_drops_unknown_assays() {
        let relation = relate(&names(&["A", "B", "C"]), &names(&["S1"]), |_| {
            names(&["C", "ghost", "A", "C"])
        });
        assert_eq!(relation.get("S1").unwrap(), names(&["C", "A"]).as_slice());
        assert_eq!(relation.other().unwrap(), names(&["B"]).as_slice());
    }

    #[test]
    fn repeated_study_keeps_its_first_claim() {
        let relation = relate(&names(&["A"]), &names(&["S", "S"]), |_| names(&["A"]));
        assert_eq!(relation.get("S").unwrap(), names(&["A"]).as_slice());
        assert_eq!(relation.len(), 1);
        assert!(relation.other().is_none());
    }

    #[test]
    fn no_other_key_when_everything_is_claimed() {
        let relation = relate(&names(&["A"]), &names(&["S1", "S2"]), |study| {
            if study == "S1" { names(&["A"]) } else { Vec::new() }
        });
        assert_eq!(relation.other(), None);
        assert_eq!(relation.get("S2").unwrap(), &[] as &[String]);
        assert_eq!(relation.len(), 2);
    }
}
