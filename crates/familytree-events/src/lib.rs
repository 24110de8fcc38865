use crossbeam_channel::{Receiver, Sender, unbounded};
use familytree_core::NodeId;
use serde::{Deserialize, Serialize};

/// User actions. Each one is applied synchronously by the session and
/// followed by a render pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    ToggleNode(NodeId),
    /// Pointer click in screen coordinates.
    Click {
        x: f32,
        y: f32,
    },
    Search(String),
    Navigate(usize),
    NextResult,
    PrevResult,
    CollapseAll,
    ExpandAll,
    Resize {
        width: f32,
        height: f32,
    },
    Pan {
        dx: f32,
        dy: f32,
    },
    /// Zoom by `factor` around the screen point `(x, y)`.
    Zoom {
        factor: f32,
        x: f32,
        y: f32,
    },
    ZoomReset,
    ZoomToFit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // Loading
    TreeLoaded {
        node_count: usize,
        root: NodeId,
    },
    LoadFailed {
        error: String,
    },

    // Rendering
    Rendered {
        anchor: NodeId,
        visible: usize,
        entered: usize,
        exited: usize,
    },
    ViewportChanged {
        zoom: f32,
        pan_x: f32,
        pan_y: f32,
    },

    // Search
    SearchComplete {
        term: String,
        matches: usize,
    },
    SearchCleared,
    NavigationChanged {
        index: usize,
        total: usize,
        target: NodeId,
    },

    ShowWarning {
        message: String,
    },
}

#[derive(Clone)]
pub struct EventBus {
    tx: Sender<Event>,
    rx: Receiver<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<Event> {
        self.tx.clone()
    }

    pub fn receiver(&self) -> Receiver<Event> {
        self.rx.clone()
    }

    pub fn publish(&self, event: Event) {
        if self.tx.send(event).is_err() {
            tracing::warn!("Event bus disconnected, dropping event");
        }
    }

    /// Hand every pending event to `listener`, oldest first.
    pub fn dispatch_to<L: EventListener>(&self, listener: &mut L) {
        while let Ok(event) = self.rx.try_recv() {
            listener.handle_event(&event);
        }
    }

    /// Take every pending event.
    pub fn drain(&self) -> Vec<Event> {
        self.rx.try_iter().collect()
    }
}

pub trait EventListener {
    fn handle_event(&mut self, event: &Event);
}

impl EventListener for Vec<Event> {
    fn handle_event(&mut self, event: &Event) {
        self.push(event.clone());
    }
}
