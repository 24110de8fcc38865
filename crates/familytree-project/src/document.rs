use crate::error::LoadError;
use familytree_core::FamilyDocument;
use familytree_graph::{BuildReport, FamilyTree, HierarchyBuilder};
use std::fs;
use std::path::Path;

pub fn parse_document(json: &str) -> Result<FamilyDocument, LoadError> {
    Ok(serde_json::from_str(json)?)
}

pub fn load_document(path: &Path) -> Result<FamilyDocument, LoadError> {
    let json = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let document = parse_document(&json)?;
    tracing::info!(
        "Loaded {} people from {}",
        document.person_count(),
        path.display()
    );
    Ok(document)
}

/// Read `path` and build its tree in one step.
pub fn load_tree(
    path: &Path,
    builder: &HierarchyBuilder,
) -> Result<(FamilyTree, BuildReport), LoadError> {
    let document = load_document(path)?;
    Ok(builder.build(&document)?)
}

pub fn save_document(path: &Path, document: &FamilyDocument) -> Result<(), LoadError> {
    let json = serde_json::to_string_pretty(document)?;
    fs::write(path, json).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}
