use familytree_core::NodeId;
use familytree_graph::FamilyTree;
use nucleo_matcher::{Config, Matcher, Utf32String};

pub const DEFAULT_MIN_TERM_LEN: usize = 2;

/// Case-insensitive substring search over every person name in the tree,
/// collapsed or not.
///
/// Names and terms are lowercased up front and compared char by char, so
/// combining marks (Devanagari vowel signs, decomposed accents) take part
/// in the match.
pub struct SearchIndex {
    matcher: Matcher,
    // Pre-order, so matches come back in traversal order.
    names: Vec<(Utf32String, NodeId)>,
    min_term_len: usize,
}

impl SearchIndex {
    pub fn new(tree: &FamilyTree, min_term_len: usize) -> Self {
        let mut config = Config::DEFAULT;
        // Folding already happened in `fold`.
        config.ignore_case = false;
        config.normalize = false;
        let mut index = Self {
            matcher: Matcher::new(config),
            names: Vec::new(),
            min_term_len,
        };
        index.rebuild(tree);
        index
    }

    /// Lowercase `text` into a matcher string that keeps every char.
    /// `Utf32String::from` would keep only the first char of each grapheme.
    fn fold(text: &str) -> Utf32String {
        let lower = text.to_lowercase();
        if lower.is_ascii() {
            Utf32String::Ascii(lower.into_boxed_str())
        } else {
            Utf32String::Unicode(lower.chars().collect())
        }
    }

    pub fn rebuild(&mut self, tree: &FamilyTree) {
        self.names = tree
            .pre_order()
            .into_iter()
            .filter_map(|id| tree.node(id).map(|n| (Self::fold(&n.name), id)))
            .collect();
        tracing::debug!("Indexed {} names for search", self.names.len());
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn min_term_len(&self) -> usize {
        self.min_term_len
    }

    /// True when `term` is long enough to run a search.
    pub fn accepts(&self, term: &str) -> bool {
        term.chars().count() >= self.min_term_len.max(1)
    }

    /// Nodes whose name contains `term`, ignoring case. Terms shorter than
    /// the minimum length match nothing.
    pub fn search(&mut self, term: &str) -> Vec<NodeId> {
        if !self.accepts(term) {
            return Vec::new();
        }
        let needle = Self::fold(term);
        let mut results = Vec::new();
        for (name, id) in &self.names {
            if name.len() < needle.len() {
                continue;
            }
            if self
                .matcher
                .substring_match(name.slice(..), needle.slice(..))
                .is_some()
            {
                results.push(*id);
            }
        }
        results
    }
}

/// The active search and the user's position within it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    term: String,
    results: Vec<NodeId>,
    current: Option<usize>,
    highlighted: Option<NodeId>,
}

impl SearchResults {
    pub fn new(term: impl Into<String>, results: Vec<NodeId>) -> Self {
        Self {
            term: term.into(),
            results,
            current: None,
            highlighted: None,
        }
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn results(&self) -> &[NodeId] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn highlighted(&self) -> Option<NodeId> {
        self.highlighted
    }

    /// Move to result `index`: reveal it in the tree and make it the only
    /// highlighted node. Out-of-range indices change nothing.
    pub fn navigate(&mut self, tree: &mut FamilyTree, index: usize) -> Option<NodeId> {
        let target = *self.results.get(index)?;
        let revealed = tree.expand_path_to(Some(target))?;
        self.current = Some(index);
        self.highlighted = Some(revealed);
        tracing::debug!("Navigated to result {} of {}", index + 1, self.len());
        Some(revealed)
    }

    pub fn can_next(&self) -> bool {
        match self.current {
            Some(i) => i + 1 < self.len(),
            None => !self.is_empty(),
        }
    }

    pub fn can_prev(&self) -> bool {
        matches!(self.current, Some(i) if i > 0)
    }

    /// Step forward, stopping at the last result.
    pub fn next(&mut self, tree: &mut FamilyTree) -> Option<NodeId> {
        if !self.can_next() {
            return None;
        }
        let index = self.current.map_or(0, |i| i + 1);
        self.navigate(tree, index)
    }

    /// Step back, stopping at the first result.
    pub fn prev(&mut self, tree: &mut FamilyTree) -> Option<NodeId> {
        if !self.can_prev() {
            return None;
        }
        let index = self.current.map_or(0, |i| i - 1);
        self.navigate(tree, index)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use familytree_core::{CollapsePolicy, PersonRecord, RecordId};
    use familytree_graph::HierarchyBuilder;
    use proptest::prelude::*;

    fn family() -> FamilyTree {
        let records = vec![
            PersonRecord::new(1, "Root").with_children([2, 3]),
            PersonRecord::new(2, "Alice").with_children([5]),
            PersonRecord::new(3, "Bob").with_children([4, 6]),
            PersonRecord::new(4, "Carol"),
            PersonRecord::new(5, "Anna"),
            PersonRecord::new(6, "Joanne"),
        ];
        let (mut tree, _) = HierarchyBuilder::new().build_flat(&records).unwrap();
        tree.initialize(CollapsePolicy::RootExpanded);
        tree
    }

    fn id(tree: &FamilyTree, record: i64) -> NodeId {
        tree.find_by_record(&RecordId::from(record)).unwrap()
    }

    #[test]
    fn test_substring_ignores_case_and_visibility() {
        let tree = family();
        let mut index = SearchIndex::new(&tree, DEFAULT_MIN_TERM_LEN);
        assert_eq!(index.len(), 6);

        let hits = index.search("ann");
        assert_eq!(hits, vec![id(&tree, 5), id(&tree, 6)]);
        assert_eq!(index.search("CAROL"), vec![id(&tree, 4)]);
        assert!(index.search("zz").is_empty());
    }

    #[test]
    fn test_short_terms_match_nothing() {
        let tree = family();
        let mut index = SearchIndex::new(&tree, DEFAULT_MIN_TERM_LEN);
        assert!(index.search("").is_empty());
        assert!(index.search("a").is_empty());
        assert!(!index.accepts("é"));
        assert!(index.accepts("éa"));
    }

    #[test]
    fn test_results_in_pre_order() {
        let tree = family();
        let mut wide = SearchIndex::new(&tree, 1);
        assert_eq!(
            wide.search("o"),
            vec![id(&tree, 1), id(&tree, 3), id(&tree, 4), id(&tree, 6)]
        );
    }

    #[test]
    fn test_navigate_reveals_and_highlights() {
        let mut tree = family();
        let mut index = SearchIndex::new(&tree, DEFAULT_MIN_TERM_LEN);
        let carol = id(&tree, 4);
        let mut results = SearchResults::new("carol", index.search("carol"));
        assert!(!tree.is_visible(carol));

        assert_eq!(results.navigate(&mut tree, 0), Some(carol));
        assert!(tree.is_visible(carol));
        assert_eq!(results.highlighted(), Some(carol));
        assert_eq!(results.current(), Some(0));
        // Alice stays collapsed.
        assert!(tree.node(id(&tree, 2)).unwrap().children().is_collapsed());
    }

    #[test]
    fn test_out_of_range_navigation_is_noop() {
        let mut tree = family();
        let before = tree.visible_nodes();
        let mut results = SearchResults::new("zz", Vec::new());
        assert_eq!(results.navigate(&mut tree, 0), None);
        assert_eq!(results.current(), None);
        assert_eq!(tree.visible_nodes(), before);
    }

    #[test]
    fn test_next_prev_clamp() {
        let mut tree = family();
        let mut index = SearchIndex::new(&tree, DEFAULT_MIN_TERM_LEN);
        let mut results = SearchResults::new("ann", index.search("ann"));
        assert!(!results.can_prev());
        assert!(results.can_next());

        assert_eq!(results.next(&mut tree), Some(id(&tree, 5)));
        assert_eq!(results.next(&mut tree), Some(id(&tree, 6)));
        assert!(!results.can_next());
        assert_eq!(results.next(&mut tree), None);
        assert_eq!(results.current(), Some(1));
        // Only the latest target is highlighted.
        assert_eq!(results.highlighted(), Some(id(&tree, 6)));

        assert_eq!(results.prev(&mut tree), Some(id(&tree, 5)));
        assert!(!results.can_prev());
        assert_eq!(results.prev(&mut tree), None);

        results.clear();
        assert!(results.is_empty());
        assert_eq!(results.highlighted(), None);
    }

    fn tree_of_names(names: &[String]) -> FamilyTree {
        let children = 1..=names.len() as i64;
        let mut records = vec![PersonRecord::new(0, "Root").with_children(children)];
        records.extend(
            names
                .iter()
                .enumerate()
                .map(|(i, name)| PersonRecord::new(i as i64 + 1, name.as_str())),
        );
        HierarchyBuilder::new().build_flat(&records).unwrap().0
    }

    fn lowercase_contains(tree: &FamilyTree, term: &str) -> Vec<NodeId> {
        let term = term.to_lowercase();
        tree.pre_order()
            .into_iter()
            .filter(|id| tree.node(*id).unwrap().name.to_lowercase().contains(&term))
            .collect()
    }

    #[test]
    fn test_non_ascii_names_keep_combining_marks() {
        let names: Vec<String> = ["राम बहादुर", "ÅSA Öberg", "Straße", "Ana\u{301}"]
            .iter()
            .map(|n| n.to_string())
            .collect();
        let tree = tree_of_names(&names);
        let mut index = SearchIndex::new(&tree, DEFAULT_MIN_TERM_LEN);
        for term in ["बहादुर", "öberg", "åsa", "STRASSE", "straße", "a\u{301}", "राम"] {
            assert_eq!(index.search(term), lowercase_contains(&tree, term), "term {term:?}");
        }
        assert_eq!(index.search("बहादुर").len(), 1);
        assert_eq!(index.search("öberg").len(), 1);
        assert!(index.search("STRASSE").is_empty());
    }

    proptest! {
        #[test]
        fn prop_unicode_matches_agree_with_lowercase_contains(
            names in proptest::collection::vec("\\PC{0,12}", 1..8),
            term in "\\PC{2,6}",
        ) {
            let tree = tree_of_names(&names);
            let mut index = SearchIndex::new(&tree, DEFAULT_MIN_TERM_LEN);
            prop_assert_eq!(index.search(&term), lowercase_contains(&tree, &term));
        }

        #[test]
        fn prop_short_terms_always_empty(term in "\\PC{0,1}") {
            let tree = family();
            let mut index = SearchIndex::new(&tree, DEFAULT_MIN_TERM_LEN);
            prop_assert!(index.search(&term).is_empty());
        }

        #[test]
        fn prop_slices_of_names_agree_with_lowercase_contains(
            names in proptest::collection::vec("\\PC{2,12}", 1..8),
            pick in any::<prop::sample::Index>(),
            start in any::<prop::sample::Index>(),
            width in 2usize..5,
        ) {
            let tree = tree_of_names(&names);
            let mut index = SearchIndex::new(&tree, DEFAULT_MIN_TERM_LEN);
            let chars: Vec<char> = pick.get(&names).chars().collect();
            let width = width.min(chars.len());
            let from = start.index(chars.len() - width + 1);
            let term: String = chars[from..from + width].iter().collect();
            prop_assert_eq!(index.search(&term), lowercase_contains(&tree, &term));
        }

        #[test]
        fn prop_ascii_matches_agree_with_lowercase_contains(term in "[a-zA-Z]{2,4}") {
            let tree = family();
            let mut index = SearchIndex::new(&tree, DEFAULT_MIN_TERM_LEN);
            prop_assert_eq!(index.search(&term), lowercase_contains(&tree, &term));
        }
    }
}
