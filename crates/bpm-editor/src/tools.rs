//! Tool system for canvas interactions.
//!
//! Each tool translates input events into `ToolAction`s that the editor
//! applies through the document store and the command stack.
//!
//! ## Modifier behaviors
//!
//! | Modifier | Select Tool | Connect Tool | Place Tool |
//! |----------|-------------|--------------|------------|
//! | **Shift** | Axis-constrain drag | - | - |

use crate::hit::Hit;
use crate::input::InputEvent;
use bpm_core::id::ElementId;
use bpm_core::model::*;
use smallvec::{SmallVec, smallvec};

/// The active tool determines how input events are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Select,
    Connect,
    /// Place one palette node, then return to `Select`.
    Place(NodeType),
}

impl ToolKind {
    /// Parse the bridge name: `select`, `connect`, or a node kind.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "select" => Some(ToolKind::Select),
            "connect" => Some(ToolKind::Connect),
            other => NodeType::parse(other).map(ToolKind::Place),
        }
    }
}

/// What a tool asks the editor to do.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolAction {
    Select(Hit),
    ClearSelection,
    /// A drag gesture started on a node.
    BeginDrag,
    Move { id: ElementId, dx: f32, dy: f32 },
    /// The dragged node was released.
    Drop { id: ElementId },
    EndDrag,
    Connect { source: ElementId, target: ElementId },
    Place { ty: NodeType, at: Point },
}

pub type Actions = SmallVec<[ToolAction; 2]>;

/// Trait for tools that turn input into editor actions.
pub trait Tool {
    fn kind(&self) -> ToolKind;

    /// Handle an input event given what the pointer is over.
    fn handle(&mut self, event: &InputEvent, hit: Option<Hit>) -> Actions;

    /// Rubber-band line being drawn: source node and pointer position.
    fn preview(&self) -> Option<(ElementId, Point)> {
        None
    }

    /// Abandon the gesture in progress. Returns the actions that close it,
    /// so the tool can be swapped out between pointer down and pointer up.
    fn cancel(&mut self) -> Actions {
        SmallVec::new()
    }
}

// ─── Select Tool ─────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct SelectTool {
    /// Node being dragged.
    dragging: Option<ElementId>,
    moved: bool,
    last_x: f32,
    last_y: f32,
}

impl SelectTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging.is_some()
    }

    /// A moved node is dropped where it is now.
    fn finish_drag(&mut self) -> Actions {
        match self.dragging.take() {
            Some(id) if std::mem::take(&mut self.moved) => {
                smallvec![ToolAction::Drop { id }, ToolAction::EndDrag]
            }
            Some(_) => smallvec![ToolAction::EndDrag],
            None => SmallVec::new(),
        }
    }
}

impl Tool for SelectTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Select
    }

    fn handle(&mut self, event: &InputEvent, hit: Option<Hit>) -> Actions {
        match event {
            InputEvent::PointerDown { x, y, .. } => match hit {
                Some(Hit::Node(id)) => {
                    self.dragging = Some(id);
                    self.moved = false;
                    self.last_x = *x;
                    self.last_y = *y;
                    smallvec![ToolAction::Select(Hit::Node(id)), ToolAction::BeginDrag]
                }
                Some(edge) => smallvec![ToolAction::Select(edge)],
                None => smallvec![ToolAction::ClearSelection],
            },
            InputEvent::PointerMove { x, y, modifiers } => {
                let Some(id) = self.dragging else {
                    return SmallVec::new();
                };
                let mut dx = x - self.last_x;
                let mut dy = y - self.last_y;
                self.last_x = *x;
                self.last_y = *y;

                // Shift: constrain to dominant axis
                if modifiers.shift {
                    if dx.abs() > dy.abs() {
                        dy = 0.0;
                    } else {
                        dx = 0.0;
                    }
                }
                if dx == 0.0 && dy == 0.0 {
                    return SmallVec::new();
                }
                self.moved = true;
                smallvec![ToolAction::Move { id, dx, dy }]
            }
            InputEvent::PointerUp { .. } => self.finish_drag(),
            InputEvent::Key { .. } => SmallVec::new(),
        }
    }

    fn cancel(&mut self) -> Actions {
        self.finish_drag()
    }
}

// ─── Connect Tool ────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct ConnectTool {
    source: Option<ElementId>,
    /// Rubber-band line end while connecting.
    pub preview_end: Option<Point>,
}

impl ConnectTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(&self) -> Option<ElementId> {
        self.source
    }
}

impl Tool for ConnectTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Connect
    }

    fn handle(&mut self, event: &InputEvent, hit: Option<Hit>) -> Actions {
        match event {
            InputEvent::PointerDown { x, y, .. } => {
                if let Some(Hit::Node(id)) = hit {
                    self.source = Some(id);
                    self.preview_end = Some(Point::new(*x, *y));
                }
                SmallVec::new()
            }
            InputEvent::PointerMove { x, y, .. } => {
                if self.source.is_some() {
                    self.preview_end = Some(Point::new(*x, *y));
                }
                SmallVec::new()
            }
            InputEvent::PointerUp { .. } => {
                self.preview_end = None;
                match (self.source.take(), hit) {
                    (Some(source), Some(Hit::Node(target))) if source != target => {
                        smallvec![ToolAction::Connect { source, target }]
                    }
                    _ => SmallVec::new(),
                }
            }
            InputEvent::Key { .. } => SmallVec::new(),
        }
    }

    fn preview(&self) -> Option<(ElementId, Point)> {
        self.source.zip(self.preview_end)
    }

    fn cancel(&mut self) -> Actions {
        self.source = None;
        self.preview_end = None;
        SmallVec::new()
    }
}

// ─── Place Tool ──────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct PlaceTool {
    ty: NodeType,
}

impl PlaceTool {
    pub fn new(ty: NodeType) -> Self {
        Self { ty }
    }
}

impl Tool for PlaceTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Place(self.ty)
    }

    /// The click point becomes the node's center.
    fn handle(&mut self, event: &InputEvent, _hit: Option<Hit>) -> Actions {
        match event {
            InputEvent::PointerDown { x, y, .. } => {
                let size = self.ty.default_size();
                smallvec![ToolAction::Place {
                    ty: self.ty,
                    at: Point::new(x - size.width / 2.0, y - size.height / 2.0),
                }]
            }
            _ => SmallVec::new(),
        }
    }
}

/// Build the tool for `kind`.
pub fn make_tool(kind: ToolKind) -> Box<dyn Tool> {
    match kind {
        ToolKind::Select => Box::new(SelectTool::new()),
        ToolKind::Connect => Box::new(ConnectTool::new()),
        ToolKind::Place(ty) => Box::new(PlaceTool::new(ty)),
    }
}

/// Parse the bridge name of an edge mode.
pub fn parse_edge_mode(s: &str) -> Option<EdgeType> {
    match s {
        "sequenceFlow" => Some(EdgeType::SequenceFlow),
        "messageFlow" => Some(EdgeType::MessageFlow),
        other => EdgeType::parse(other),
    }
}
