//! Plain-text outline import.
//!
//! Each line reads `<name> <dashed-id>`, e.g. `Hari Prasad 2-1-3`. The id
//! minus its last segment names the parent, so `2-1-3` is the third child
//! of `2-1`. Ids with no dash hang off a synthetic top node.

use crate::error::OutlineError;
use familytree_core::{FamilyDocument, NestedPerson, RecordId};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineOptions {
    pub top_name: String,
    pub top_id: String,
}

impl Default for OutlineOptions {
    fn default() -> Self {
        Self {
            top_name: "Top of Family".to_string(),
            top_id: "0".to_string(),
        }
    }
}

/// A child as listed in a discrepancy report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedChild {
    pub number: String,
    pub name: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discrepancy {
    /// The numbered children of a parent skip some of `1..=max`.
    MissingChildNumbers {
        parent_id: String,
        parent_name: String,
        missing: Vec<u32>,
        existing: Vec<ListedChild>,
        /// Line of the highest-numbered child.
        source_line: String,
    },
    /// A child number far beyond the parent's child count, usually a typo.
    /// It is left out of the gap check.
    ChildNumberOutOfRange {
        parent_id: String,
        parent_name: String,
        child_id: String,
        number: u32,
        limit: u32,
        source_line: String,
    },
    /// A parent id is referenced but never gets a line of its own.
    MissingParent {
        parent_id: String,
        children: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutlineImport {
    pub root: NestedPerson,
    pub discrepancies: Vec<Discrepancy>,
    /// Lines that produced a person.
    pub people: usize,
}

impl OutlineImport {
    pub fn document(&self) -> FamilyDocument {
        FamilyDocument::nested(self.root.clone())
    }

    pub fn write_json(&self, path: &Path) -> Result<(), OutlineError> {
        let json = serde_json::to_string_pretty(&self.document())?;
        fs::write(path, json).map_err(|source| OutlineError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn write_report(&self, path: &Path) -> Result<(), OutlineError> {
        let io_err = |source: io::Error| OutlineError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut file = fs::File::create(path).map_err(io_err)?;
        write_discrepancy_report(&self.discrepancies, &mut file).map_err(io_err)
    }
}

struct Entry {
    id: String,
    name: String,
    children: Vec<usize>,
    source_line: Option<String>,
}

struct OutlineBuilder {
    entries: Vec<Entry>,
    by_id: HashMap<String, usize>,
    names: HashMap<String, String>,
}

impl OutlineBuilder {
    const TOP: usize = 0;
    const GAP_CHECK_FLOOR: u32 = 100;
    const GAP_CHECK_FACTOR: u32 = 4;

    fn new(options: &OutlineOptions) -> Self {
        let top = Entry {
            id: options.top_id.clone(),
            name: options.top_name.clone(),
            children: Vec::new(),
            source_line: Some(String::new()),
        };
        Self {
            entries: vec![top],
            by_id: HashMap::from([(options.top_id.clone(), Self::TOP)]),
            names: HashMap::new(),
        }
    }

    fn parent_id(id: &str) -> Option<&str> {
        id.rsplit_once('-')
            .map(|(parent, _)| parent)
            .filter(|parent| !parent.trim().is_empty())
    }

    /// Index of `id`, creating it and any missing ancestors as placeholders.
    fn ensure(&mut self, id: &str) -> usize {
        if let Some(&index) = self.by_id.get(id) {
            return index;
        }
        let parent = match Self::parent_id(id) {
            Some(parent_id) => self.ensure(parent_id),
            None => Self::TOP,
        };
        let index = self.entries.len();
        self.entries.push(Entry {
            id: id.to_string(),
            name: self.names.get(id).cloned().unwrap_or_default(),
            children: Vec::new(),
            source_line: None,
        });
        self.by_id.insert(id.to_string(), index);
        self.entries[parent].children.push(index);
        index
    }

    fn add_line(&mut self, line: &str) -> bool {
        let Some((name, id)) = line.rsplit_once(' ') else {
            return false;
        };
        let (name, id) = (name.trim(), id.trim());
        if name.is_empty() || id.is_empty() || id.starts_with("Section") {
            return false;
        }
        self.names.insert(id.to_string(), name.to_string());
        let index = self.ensure(id);
        let entry = &mut self.entries[index];
        if entry.source_line.is_some() && index != Self::TOP {
            tracing::debug!("Repeated outline id {}, updating name", id);
        }
        entry.name = name.to_string();
        entry.source_line = Some(line.to_string());
        true
    }

    fn child_number(id: &str) -> Option<u32> {
        id.rsplit('-').next().and_then(|last| last.parse().ok())
    }

    fn listed(child: &Entry) -> ListedChild {
        let number = child.id.rsplit('-').next().unwrap_or_default();
        ListedChild {
            number: number.to_string(),
            name: child.name.clone(),
            id: child.id.clone(),
        }
    }

    fn discrepancies(&self) -> Vec<Discrepancy> {
        let mut found = Vec::new();
        for entry in &self.entries {
            let numbered: Vec<(u32, &Entry)> = entry
                .children
                .iter()
                .map(|&c| &self.entries[c])
                .filter_map(|child| Self::child_number(&child.id).map(|n| (n, child)))
                .collect();
            // Gaps are only listed up to a bound tied to the child count.
            let limit = u32::try_from(numbered.len())
                .unwrap_or(u32::MAX)
                .saturating_mul(Self::GAP_CHECK_FACTOR)
                .max(Self::GAP_CHECK_FLOOR);
            let (in_range, out_of_range): (Vec<_>, Vec<_>) =
                numbered.into_iter().partition(|(n, _)| *n <= limit);

            let present: BTreeSet<u32> = in_range.iter().map(|(n, _)| *n).collect();
            if let Some((_, last)) = in_range.iter().max_by_key(|(n, _)| *n) {
                let max = present.last().copied().unwrap_or_default();
                let missing: Vec<u32> = (1..=max).filter(|n| !present.contains(n)).collect();
                if !missing.is_empty() {
                    found.push(Discrepancy::MissingChildNumbers {
                        parent_id: entry.id.clone(),
                        parent_name: entry.name.clone(),
                        missing,
                        existing: entry
                            .children
                            .iter()
                            .map(|&c| Self::listed(&self.entries[c]))
                            .collect(),
                        source_line: last.source_line.clone().unwrap_or_default(),
                    });
                }
            }

            for (number, child) in out_of_range {
                tracing::warn!(
                    "Child number {} of {} is above the gap check limit {}",
                    number,
                    entry.id,
                    limit
                );
                found.push(Discrepancy::ChildNumberOutOfRange {
                    parent_id: entry.id.clone(),
                    parent_name: entry.name.clone(),
                    child_id: child.id.clone(),
                    number,
                    limit,
                    source_line: child.source_line.clone().unwrap_or_default(),
                });
            }

            if entry.source_line.is_none() {
                found.push(Discrepancy::MissingParent {
                    parent_id: entry.id.clone(),
                    children: entry
                        .children
                        .iter()
                        .map(|&c| self.entries[c].id.clone())
                        .collect(),
                });
            }
        }
        found
    }

    fn nested(&self, index: usize) -> NestedPerson {
        let entry = &self.entries[index];
        NestedPerson {
            id: Some(RecordId::new(entry.id.clone())),
            name: entry.name.clone(),
            spouse: None,
            children: entry.children.iter().map(|&c| self.nested(c)).collect(),
        }
    }
}

/// Convert outline text into a single nested tree under the top node.
pub fn import_outline(text: &str, options: &OutlineOptions) -> OutlineImport {
    let mut builder = OutlineBuilder::new(options);
    let people = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| builder.add_line(line))
        .count();
    let discrepancies = builder.discrepancies();
    tracing::info!(
        "Imported {} outline lines, {} discrepancies",
        people,
        discrepancies.len()
    );
    OutlineImport {
        root: builder.nested(OutlineBuilder::TOP),
        discrepancies,
        people,
    }
}

pub fn import_outline_file(
    path: &Path,
    options: &OutlineOptions,
) -> Result<OutlineImport, OutlineError> {
    let text = fs::read_to_string(path).map_err(|source| OutlineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(import_outline(&text, options))
}

pub fn write_discrepancy_report<W: Write>(
    discrepancies: &[Discrepancy],
    out: &mut W,
) -> io::Result<()> {
    writeln!(out, "FAMILY TREE DISCREPANCY REPORT")?;
    writeln!(out, "============================")?;
    writeln!(out)?;

    for (i, discrepancy) in discrepancies.iter().enumerate() {
        writeln!(out, "Discrepancy #{}:", i + 1)?;
        writeln!(out, "{}", "-".repeat(50))?;
        match discrepancy {
            Discrepancy::MissingChildNumbers {
                parent_id,
                parent_name,
                missing,
                existing,
                source_line,
            } => {
                writeln!(out, "MISSING CHILD NUMBERS:")?;
                writeln!(out, "Parent: {} (ID: {})", parent_name, parent_id)?;
                writeln!(out, "Source: {}", source_line)?;
                writeln!(out, "Missing numbers: {:?}", missing)?;
                writeln!(out, "Existing children:")?;
                for child in existing {
                    writeln!(out, "  - #{}: {} (ID: {})", child.number, child.name, child.id)?;
                }
            }
            Discrepancy::ChildNumberOutOfRange {
                parent_id,
                parent_name,
                child_id,
                number,
                limit,
                source_line,
            } => {
                writeln!(out, "CHILD NUMBER OUT OF RANGE:")?;
                writeln!(out, "Parent: {} (ID: {})", parent_name, parent_id)?;
                writeln!(out, "Source: {}", source_line)?;
                writeln!(
                    out,
                    "Child {} has number {}, above the limit {}",
                    child_id, number, limit
                )?;
            }
            Discrepancy::MissingParent {
                parent_id,
                children,
            } => {
                writeln!(out, "MISSING PARENT LINE:")?;
                writeln!(out, "Parent ID: {}", parent_id)?;
                writeln!(out, "Referenced by: {}", children.join(", "))?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}
