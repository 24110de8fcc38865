use crate::RecordId;
use thiserror::Error;

/// The input document does not describe a single rooted tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("Document has no members")]
    Empty,
    #[error("No root member: every member is listed as someone's child")]
    NoRoot,
    #[error("Multiple root members: {0:?}")]
    MultipleRoots(Vec<RecordId>),
    #[error("Duplicate member id: {0}")]
    DuplicateId(RecordId),
    #[error("Member {parent} lists unknown child {child}")]
    UnresolvedChild { parent: RecordId, child: RecordId },
    #[error("Member {child} is listed under both {first} and {second}")]
    MultipleParents {
        child: RecordId,
        first: RecordId,
        second: RecordId,
    },
    #[error("Members unreachable from the root: {0:?}")]
    Unreachable(Vec<RecordId>),
    #[error("Nested document must hold exactly one top-level person, found {0}")]
    NestedRootCount(usize),
}
