use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

pub mod error;

pub use error::HierarchyError;

/// Stable identity of a node inside a built tree.
///
/// Nodes are never created or destroyed after construction, so the arena
/// index doubles as the diffing key across re-renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a person in the source document.
///
/// Documents use numbers (`1`) as well as strings (`"0-1-2"`); both are kept
/// in their textual form so `1` and `"1"` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "RawRecordId", into = "String")]
pub struct RecordId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRecordId {
    Number(i64),
    Text(String),
}

impl From<RawRecordId> for RecordId {
    fn from(raw: RawRecordId) -> Self {
        match raw {
            RawRecordId::Number(n) => Self(n.to_string()),
            RawRecordId::Text(s) => Self(s),
        }
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<i32> for RecordId {
    fn from(id: i32) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Marriage marker: either a plain flag or a reference to the partner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Spouse {
    Flag(bool),
    Partner(RecordId),
}

impl Spouse {
    pub fn is_married(&self) -> bool {
        match self {
            Spouse::Flag(flag) => *flag,
            Spouse::Partner(partner) => !partner.as_str().is_empty(),
        }
    }
}

/// One member of the flat document form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
    pub id: RecordId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spouse: Option<Spouse>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub children: Vec<RecordId>,
}

impl PersonRecord {
    pub fn new(id: impl Into<RecordId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            spouse: None,
            children: Vec::new(),
        }
    }

    pub fn with_children<I, T>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<RecordId>,
    {
        self.children = children.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_spouse(mut self, spouse: Spouse) -> Self {
        self.spouse = Some(spouse);
        self
    }
}

/// One person of the nested document form, children inline.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NestedPerson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spouse: Option<Spouse>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub children: Vec<NestedPerson>,
}

impl NestedPerson {
    pub fn new(id: impl Into<RecordId>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn child(mut self, child: NestedPerson) -> Self {
        self.children.push(child);
        self
    }

    /// Number of people in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(NestedPerson::subtree_len)
            .sum::<usize>()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FamilyMembers {
    #[serde(default)]
    pub members: Vec<PersonRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FlatDocument {
    pub family: FamilyMembers,
}

/// The two accepted input shapes.
///
/// - Flat: `{ "family": { "members": [ ... ] } }`
/// - Nested: `[ { "name": ..., "children": [ ... ] } ]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FamilyDocument {
    Flat(FlatDocument),
    Nested(Vec<NestedPerson>),
}

impl FamilyDocument {
    pub fn flat(members: Vec<PersonRecord>) -> Self {
        FamilyDocument::Flat(FlatDocument {
            family: FamilyMembers { members },
        })
    }

    pub fn nested(root: NestedPerson) -> Self {
        FamilyDocument::Nested(vec![root])
    }

    /// Number of people described by the document.
    pub fn person_count(&self) -> usize {
        match self {
            FamilyDocument::Flat(doc) => doc.family.members.len(),
            FamilyDocument::Nested(roots) => roots.iter().map(NestedPerson::subtree_len).sum(),
        }
    }
}

// Untagged deserialization reports "did not match any variant" for every
// mistake, so the shape is picked first and the inner error kept.
impl<'de> Deserialize<'de> for FamilyDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::Array(_) => serde_json::from_value(value)
                .map(FamilyDocument::Nested)
                .map_err(D::Error::custom),
            serde_json::Value::Object(ref map) if map.contains_key("family") => {
                serde_json::from_value(value)
                    .map(FamilyDocument::Flat)
                    .map_err(D::Error::custom)
            }
            _ => Err(D::Error::custom(
                "expected a list holding the nested root person or an object with a `family` key",
            )),
        }
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LayoutDirection {
    /// Depth grows to the right.
    Horizontal,
    /// Depth grows downwards.
    #[default]
    Vertical,
}

/// Which nodes start out collapsed after the tree is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CollapsePolicy {
    /// Root shows its children, everything below is collapsed.
    #[default]
    RootExpanded,
    /// Every node, the root included, starts collapsed.
    AllCollapsed,
}
