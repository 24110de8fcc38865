use familytree_core::{FamilyDocument, NodeId};
use familytree_events::{Command, Event, EventBus};
use familytree_graph::{
    BuildReport, FamilyTree, HitTester, Layouter, Phase, RenderPlanner, RenderSink,
    TidyTreeLayouter, TreeLayout, Vec2, Viewport,
};
use familytree_project::{LoadError, ViewerSettings, load_tree};
use familytree_search::{SearchIndex, SearchResults};
use std::path::Path;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("Unknown node {0}")]
    UnknownNode(NodeId),
}

struct PendingSearch {
    term: String,
    due: Instant,
}

/// One open family tree and everything derived from it.
///
/// All state changes go through [`TreeSession::dispatch`], which applies the
/// command and then renders exactly once.
pub struct TreeSession<R: RenderSink> {
    tree: FamilyTree,
    report: BuildReport,
    settings: ViewerSettings,
    index: SearchIndex,
    results: SearchResults,
    layouter: TidyTreeLayouter,
    layout: TreeLayout,
    planner: RenderPlanner,
    hits: HitTester,
    viewport: Viewport,
    pending_search: Option<PendingSearch>,
    sink: R,
    events: EventBus,
}

impl<R: RenderSink> TreeSession<R> {
    /// Load a document from disk. Failures are logged and published as
    /// [`Event::LoadFailed`] before being returned.
    pub fn open(
        path: &Path,
        settings: ViewerSettings,
        sink: R,
        events: EventBus,
    ) -> Result<Self, SessionError> {
        match load_tree(path, &settings.hierarchy_builder()) {
            Ok((tree, report)) => Ok(Self::new(tree, report, settings, sink, events)),
            Err(e) => Err(Self::fail(e, &events)),
        }
    }

    pub fn from_document(
        document: &FamilyDocument,
        settings: ViewerSettings,
        sink: R,
        events: EventBus,
    ) -> Result<Self, SessionError> {
        match settings.hierarchy_builder().build(document) {
            Ok((tree, report)) => Ok(Self::new(tree, report, settings, sink, events)),
            Err(e) => Err(Self::fail(e.into(), &events)),
        }
    }

    fn fail(error: LoadError, events: &EventBus) -> SessionError {
        tracing::error!("Failed to load family tree: {}", error);
        events.publish(Event::LoadFailed {
            error: error.to_string(),
        });
        error.into()
    }

    pub fn new(
        mut tree: FamilyTree,
        report: BuildReport,
        settings: ViewerSettings,
        sink: R,
        events: EventBus,
    ) -> Self {
        tree.initialize(settings.initial_collapse);
        for (parent, child) in &report.dropped_children {
            events.publish(Event::ShowWarning {
                message: format!("Member {parent} lists unknown child {child}"),
            });
        }
        events.publish(Event::TreeLoaded {
            node_count: tree.len(),
            root: tree.root(),
        });
        tracing::info!("Opened family tree with {} people", tree.len());

        Self {
            index: SearchIndex::new(&tree, settings.min_search_len),
            results: SearchResults::default(),
            layouter: TidyTreeLayouter::new(settings.layout_config()),
            layout: TreeLayout::default(),
            planner: RenderPlanner::new(settings.transition_ms),
            hits: HitTester::new(settings.node_radius),
            viewport: settings.viewport(),
            pending_search: None,
            tree,
            report,
            settings,
            sink,
            events,
        }
    }

    /// Draw the initial frame.
    pub fn start(&mut self) {
        self.planner.reset();
        let root = self.tree.root();
        self.render(root);
    }

    pub fn tree(&self) -> &FamilyTree {
        &self.tree
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    pub fn settings(&self) -> &ViewerSettings {
        &self.settings
    }

    pub fn results(&self) -> &SearchResults {
        &self.results
    }

    pub fn layout(&self) -> &TreeLayout {
        &self.layout
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn sink(&self) -> &R {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut R {
        &mut self.sink
    }

    pub fn dispatch(&mut self, command: Command) -> Result<(), SessionError> {
        tracing::debug!("Dispatching {:?}", command);
        let root = self.tree.root();
        let anchor = match command {
            Command::ToggleNode(id) => {
                self.tree
                    .toggle(id, self.settings.tree_behavior())
                    .ok_or(SessionError::UnknownNode(id))?;
                id
            }
            Command::Click { x, y } => {
                match self.hits.hit_test_screen(Vec2::new(x, y), &self.viewport) {
                    Some(id) => {
                        self.tree.toggle(id, self.settings.tree_behavior());
                        id
                    }
                    None => root,
                }
            }
            Command::Search(term) => {
                self.pending_search = None;
                self.run_search(&term)
            }
            Command::Navigate(index) => {
                let target = self.results.navigate(&mut self.tree, index);
                self.navigated(target)
            }
            Command::NextResult => {
                let target = self.results.next(&mut self.tree);
                self.navigated(target)
            }
            Command::PrevResult => {
                let target = self.results.prev(&mut self.tree);
                self.navigated(target)
            }
            Command::CollapseAll => {
                self.tree.collapse_all();
                root
            }
            Command::ExpandAll => {
                self.tree.expand_all();
                root
            }
            Command::Resize { width, height } => {
                self.settings.viewport_width = width;
                self.settings.viewport_height = height;
                self.layouter.config = self.settings.layout_config();
                self.viewport.resize(Vec2::new(width, height));
                root
            }
            Command::Pan { dx, dy } => {
                self.viewport.pan_by(Vec2::new(dx, dy));
                self.viewport_changed();
                root
            }
            Command::Zoom { factor, x, y } => {
                if self.viewport.zoom_by(factor, Vec2::new(x, y)) {
                    self.viewport_changed();
                }
                root
            }
            Command::ZoomReset => {
                self.viewport.reset();
                self.viewport_changed();
                root
            }
            Command::ZoomToFit => {
                if let Some(bounds) = self.layout.bounds() {
                    self.viewport
                        .zoom_to_fit(bounds, self.settings.node_radius * 2.0);
                    self.viewport_changed();
                }
                root
            }
        };
        self.render(anchor);
        Ok(())
    }

    /// Queue a search from text input. Runs at once when debouncing is off,
    /// otherwise after `search_debounce_ms` of quiet, via [`Self::poll`].
    /// Returns whether the search ran.
    pub fn submit_search(&mut self, term: impl Into<String>, now: Instant) -> bool {
        let term = term.into();
        if self.settings.search_debounce_ms == 0 {
            let anchor = self.run_search(&term);
            self.render(anchor);
            return true;
        }
        self.pending_search = Some(PendingSearch {
            term,
            due: now + Duration::from_millis(self.settings.search_debounce_ms),
        });
        false
    }

    /// Run a queued search whose quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.pending_search.take() {
            Some(pending) if pending.due <= now => {
                let anchor = self.run_search(&pending.term);
                self.render(anchor);
                true
            }
            other => {
                self.pending_search = other;
                false
            }
        }
    }

    pub fn has_pending_search(&self) -> bool {
        self.pending_search.is_some()
    }

    /// Returns the node the next render should anchor at.
    fn run_search(&mut self, term: &str) -> NodeId {
        let root = self.tree.root();
        if !self.index.accepts(term) {
            self.results.clear();
            self.tree.initialize(self.settings.initial_collapse);
            self.events.publish(Event::SearchCleared);
            return root;
        }

        let hits = self.index.search(term);
        tracing::debug!("Search {:?} matched {} people", term, hits.len());
        self.results = SearchResults::new(term, hits);
        self.events.publish(Event::SearchComplete {
            term: term.to_string(),
            matches: self.results.len(),
        });
        let target = self.results.navigate(&mut self.tree, 0);
        self.navigated(target)
    }

    fn navigated(&mut self, target: Option<NodeId>) -> NodeId {
        match (target, self.results.current()) {
            (Some(target), Some(index)) => {
                self.events.publish(Event::NavigationChanged {
                    index,
                    total: self.results.len(),
                    target,
                });
                target
            }
            _ => self.tree.root(),
        }
    }

    fn viewport_changed(&self) {
        self.events.publish(Event::ViewportChanged {
            zoom: self.viewport.zoom,
            pan_x: self.viewport.pan.x,
            pan_y: self.viewport.pan.y,
        });
    }

    fn render(&mut self, anchor: NodeId) {
        let layout = self.layouter.layout(&self.tree);
        self.hits.update(&layout);
        let frame = self
            .planner
            .plan(&mut self.tree, &layout, anchor, self.results.highlighted());
        self.sink.render(&frame);
        self.events.publish(Event::Rendered {
            anchor,
            visible: frame.visible_count(),
            entered: frame.nodes_in(Phase::Enter).count(),
            exited: frame.nodes_in(Phase::Exit).count(),
        });
        self.layout = layout;
    }
}
