use familytree_core::{FamilyDocument, PersonRecord};
use std::fs;
use tempfile::TempDir;

const FIRST: &[&str] = &[
    "Anna", "Bishnu", "Carol", "Dipak", "Joanne", "Hari", "Sita", "Ram", "Gita", "Kamal",
];

/// Flat document with `people` members where person `i` is the child of
/// `(i - 1) / fanout`.
pub fn synthetic_family(people: usize, fanout: usize) -> FamilyDocument {
    let fanout = fanout.max(1);
    let mut members: Vec<PersonRecord> = (0..people)
        .map(|i| {
            let name = format!("{} {}", FIRST[i % FIRST.len()], i);
            PersonRecord::new(i as i64, name)
        })
        .collect();
    for i in 1..people {
        let parent = (i - 1) / fanout;
        members[parent].children.push((i as i64).into());
    }
    FamilyDocument::flat(members)
}

/// Outline text for a full tree of the given depth and fanout.
pub fn synthetic_outline(depth: usize, fanout: usize) -> String {
    let mut out = String::new();
    let mut level: Vec<String> = (1..=fanout).map(|n| n.to_string()).collect();
    for d in 0..depth {
        let mut next = Vec::with_capacity(level.len() * fanout);
        for (i, id) in level.iter().enumerate() {
            out.push_str(&format!("{} {}\n", FIRST[(i + d) % FIRST.len()], id));
            next.extend((1..=fanout).map(|n| format!("{id}-{n}")));
        }
        level = next;
    }
    out
}

pub fn write_outline(depth: usize, fanout: usize) -> anyhow::Result<(TempDir, std::path::PathBuf)> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("names.txt");
    fs::write(&path, synthetic_outline(depth, fanout))?;
    Ok((dir, path))
}
