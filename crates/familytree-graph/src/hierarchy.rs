use crate::tree::{Children, FamilyTree, TreeNode};
use familytree_core::{
    FamilyDocument, HierarchyError, NestedPerson, NodeId, PersonRecord, RecordId,
};
use std::collections::{HashMap, HashSet, VecDeque};

/// Non-fatal findings from building a tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// `(parent, child)` references that named no member and were skipped.
    pub dropped_children: Vec<(RecordId, RecordId)>,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.dropped_children.is_empty()
    }
}

/// Turns an input document into a [`FamilyTree`] with every child visible.
///
/// Initial collapsing is a separate step, see [`FamilyTree::initialize`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HierarchyBuilder {
    /// Reject child references that name no member instead of dropping them.
    pub strict: bool,
}

impl HierarchyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn build(
        &self,
        document: &FamilyDocument,
    ) -> Result<(FamilyTree, BuildReport), HierarchyError> {
        match document {
            FamilyDocument::Flat(flat) => self.build_flat(&flat.family.members),
            FamilyDocument::Nested(roots) => {
                let tree = self.build_nested(roots)?;
                Ok((tree, BuildReport::default()))
            }
        }
    }

    /// Build from the flat member list. Node ids follow record order.
    pub fn build_flat(
        &self,
        records: &[PersonRecord],
    ) -> Result<(FamilyTree, BuildReport), HierarchyError> {
        if records.is_empty() {
            return Err(HierarchyError::Empty);
        }

        let mut index: HashMap<&RecordId, usize> = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            if index.insert(&record.id, i).is_some() {
                return Err(HierarchyError::DuplicateId(record.id.clone()));
            }
        }

        let mut report = BuildReport::default();
        let mut parent_of: Vec<Option<usize>> = vec![None; records.len()];
        let mut children_of: Vec<Vec<NodeId>> = vec![Vec::new(); records.len()];

        for (i, record) in records.iter().enumerate() {
            for child_id in &record.children {
                let Some(&child) = index.get(child_id) else {
                    if self.strict {
                        return Err(HierarchyError::UnresolvedChild {
                            parent: record.id.clone(),
                            child: child_id.clone(),
                        });
                    }
                    tracing::warn!(
                        "Member {} lists unknown child {}, skipping",
                        record.id,
                        child_id
                    );
                    report
                        .dropped_children
                        .push((record.id.clone(), child_id.clone()));
                    continue;
                };

                match parent_of[child] {
                    Some(existing) if existing == i => {
                        tracing::debug!("Member {} lists child {} twice", record.id, child_id);
                        continue;
                    }
                    Some(existing) => {
                        return Err(HierarchyError::MultipleParents {
                            child: child_id.clone(),
                            first: records[existing].id.clone(),
                            second: record.id.clone(),
                        });
                    }
                    None => {}
                }
                parent_of[child] = Some(i);
                children_of[i].push(NodeId(child));
            }
        }

        let roots: Vec<usize> = (0..records.len())
            .filter(|&i| parent_of[i].is_none())
            .collect();
        let root = match roots.as_slice() {
            [] => return Err(HierarchyError::NoRoot),
            [root] => *root,
            _ => {
                return Err(HierarchyError::MultipleRoots(
                    roots.iter().map(|&i| records[i].id.clone()).collect(),
                ));
            }
        };

        let depths = depths_from(root, &children_of);
        let unreachable: Vec<RecordId> = depths
            .iter()
            .enumerate()
            .filter(|(_, depth)| depth.is_none())
            .map(|(i, _)| records[i].id.clone())
            .collect();
        if !unreachable.is_empty() {
            return Err(HierarchyError::Unreachable(unreachable));
        }

        let nodes = records
            .iter()
            .zip(children_of)
            .enumerate()
            .map(|(i, (record, children))| {
                let mut node = TreeNode::new(
                    NodeId(i),
                    Some(record.id.clone()),
                    record.name.clone(),
                    record.spouse.clone(),
                );
                node.parent = parent_of[i].map(NodeId);
                node.depth = depths[i].unwrap_or_default();
                node.set_children(Children::from_ids(children));
                node
            })
            .collect();

        tracing::info!(
            "Built hierarchy of {} members rooted at {}",
            records.len(),
            records[root].id
        );
        Ok((FamilyTree::from_parts(nodes, NodeId(root)), report))
    }

    /// Build from an already nested document. Node ids follow pre-order.
    pub fn build_nested(&self, roots: &[NestedPerson]) -> Result<FamilyTree, HierarchyError> {
        let [root] = roots else {
            return Err(HierarchyError::NestedRootCount(roots.len()));
        };

        let mut nodes: Vec<TreeNode> = Vec::with_capacity(root.subtree_len());
        let mut children_of: Vec<Vec<NodeId>> = Vec::with_capacity(nodes.capacity());
        let mut stack: Vec<(&NestedPerson, Option<NodeId>, usize)> = vec![(root, None, 0)];
        let mut seen: HashSet<&RecordId> = HashSet::new();

        while let Some((person, parent, depth)) = stack.pop() {
            // Anonymous members cannot collide.
            if let Some(record) = &person.id
                && !seen.insert(record)
            {
                return Err(HierarchyError::DuplicateId(record.clone()));
            }
            let id = NodeId(nodes.len());
            let mut node = TreeNode::new(
                id,
                person.id.clone(),
                person.name.clone(),
                person.spouse.clone(),
            );
            node.parent = parent;
            node.depth = depth;
            nodes.push(node);
            children_of.push(Vec::new());
            if let Some(parent) = parent {
                children_of[parent.0].push(id);
            }
            for child in person.children.iter().rev() {
                stack.push((child, Some(id), depth + 1));
            }
        }

        for (node, children) in nodes.iter_mut().zip(children_of) {
            node.set_children(Children::from_ids(children));
        }

        tracing::info!("Built nested hierarchy of {} members", nodes.len());
        Ok(FamilyTree::from_parts(nodes, NodeId(0)))
    }
}

fn depths_from(root: usize, children_of: &[Vec<NodeId>]) -> Vec<Option<usize>> {
    let mut depths = vec![None; children_of.len()];
    depths[root] = Some(0);
    let mut queue = VecDeque::from([root]);
    while let Some(current) = queue.pop_front() {
        let depth = depths[current].unwrap_or_default();
        for child in &children_of[current] {
            if depths[child.0].is_none() {
                depths[child.0] = Some(depth + 1);
                queue.push_back(child.0);
            }
        }
    }
    depths
}
