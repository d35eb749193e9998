use std::collections::{BTreeSet, HashMap};

use arc_index::assays::{relate, resolve};
use arc_index::grid::Grid;

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn resolve_skips_absent_cells_and_takes_parent_dir() {
    let grid = Grid::new(vec![
        vec![Some("Study Identifier".to_string()), Some("s1".to_string())],
        vec![
            Some("Study Assay File Name".to_string()),
            None,
            Some("assays/AssayA/isa.assay.xlsx".to_string()),
            Some("assays/AssayB/isa.assay.xlsx".to_string()),
        ],
    ]);
    assert_eq!(resolve(&grid), names(&["AssayA", "AssayB"]));
}

#[test]
fn relate_puts_unclaimed_assays_under_other() {
    let studies: HashMap<&str, Vec<String>> =
        HashMap::from([("S1", names(&["A"])), ("S2", names(&["B"]))]);
    let relation = relate(&names(&["A", "B", "C"]), &names(&["S1", "S2"]), |study| {
        studies[study].clone()
    });

    assert_eq!(relation.get("S1").unwrap(), names(&["A"]).as_slice());
    assert_eq!(relation.get("S2").unwrap(), names(&["B"]).as_slice());
    assert_eq!(relation.other().unwrap(), names(&["C"]).as_slice());
    assert_eq!(relation.len(), 3);
}

#[test]
fn relate_is_a_partition_of_the_assay_listing() {
    let cases: Vec<(Vec<String>, Vec<(&str, Vec<String>)>)> = vec![
        (names(&[]), vec![]),
        (names(&["A"]), vec![("S1", names(&[]))]),
        (
            names(&["A", "B", "C", "D"]),
            vec![
                ("S1", names(&["B", "A"])),
                ("S2", names(&["A", "D", "X"])),
                ("S3", names(&["D", "D"])),
            ],
        ),
        (
            names(&["A", "A", "B"]),
            vec![("S1", names(&["Z"])), ("S2", names(&[]))],
        ),
        (names(&["A"]), vec![("S", names(&["A"])), ("S", names(&["A"]))]),
        (
            names(&["A", "B", "C"]),
            vec![("S", names(&["B"])), ("T", names(&["C"])), ("S", names(&["A"]))],
        ),
    ];

    for (assay_dirs, study_assays) in cases {
        let study_names: Vec<String> = study_assays.iter().map(|(name, _)| name.to_string()).collect();
        let lookup: HashMap<&str, &Vec<String>> =
            study_assays.iter().map(|(name, assays)| (*name, assays)).collect();
        let relation = relate(&assay_dirs, &study_names, |study| lookup[study].clone());

        let all: Vec<&String> = relation.iter().flat_map(|(_, assays)| assays).collect();
        let unique: BTreeSet<&String> = all.iter().copied().collect();
        let expected: BTreeSet<&String> = assay_dirs.iter().collect();
        assert_eq!(all.len(), unique.len(), "assay listed twice in {relation:?}");
        assert_eq!(unique, expected);
    }
}

#[test]
fn study_order_within_key_follows_resolver_output() {
    let relation = relate(&names(&["A", "B", "C"]), &names(&["S1"]), |_| {
        names(&["C", "B", "A"])
    });
    assert_eq!(relation.get("S1").unwrap(), names(&["C", "B", "A"]).as_slice());
    assert!(relation.other().is_none());
}
