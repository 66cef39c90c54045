//! The editor controller.
//!
//! Owns the document store, the undo stack, the selection, the active tool
//! and the save session, and routes input events between them. It is the
//! only writer of the document.

use crate::commands::CommandStack;
use crate::hit::{Hit, hit_test};
use crate::input::InputEvent;
use crate::selection::{PropertyField, Selection, SelectionView, properties, property_mutation};
use crate::session::{Feedback, ModelRecord, SaveError, SaveRequest, SaveSession};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::store::{Change, DocumentStore, EditError, GraphMutation};
use crate::tools::{Actions, Tool, ToolAction, ToolKind, make_tool};
use bpm_core::config::GeometryConfig;
use bpm_core::error::ModelViolation;
use bpm_core::export::validate_model;
use bpm_core::id::ElementId;
use bpm_core::model::*;

#[derive(Debug, Clone)]
pub struct EditorConfig {
    pub undo_depth: usize,
    pub geometry: GeometryConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            undo_depth: 200,
            geometry: GeometryConfig::default(),
        }
    }
}

/// What the host should do after an input event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventOutcome {
    pub redraw: bool,
    /// ⌘S was pressed: the host should call `begin_save`.
    pub save_requested: bool,
}

pub struct Editor {
    store: DocumentStore,
    commands: CommandStack,
    selection: Selection,
    tool: Box<dyn Tool>,
    edge_mode: EdgeType,
    session: SaveSession,
    pub name: String,
    pub description: String,
    feedback: Option<Feedback>,
}

impl Editor {
    pub fn new(model_id: impl Into<String>, config: EditorConfig) -> Self {
        Self {
            store: DocumentStore::new(config.geometry),
            commands: CommandStack::new(config.undo_depth),
            selection: Selection::None,
            tool: make_tool(ToolKind::Select),
            edge_mode: EdgeType::SequenceFlow,
            session: SaveSession::new(model_id),
            name: String::new(),
            description: String::new(),
            feedback: None,
        }
    }

    /// Open a record fetched from the backend. History is discarded.
    pub fn load_record(&mut self, record: ModelRecord) -> Result<(), EditError> {
        self.name = record.name.clone();
        self.description = record.description.clone().unwrap_or_default();
        let graph = record.into_graph(&self.store.config)?;
        self.store.replace(graph);
        self.commands.clear();
        self.selection = Selection::None;
        self.tool = make_tool(ToolKind::Select);
        Ok(())
    }

    pub fn graph(&self) -> &ProcessGraph {
        &self.store.graph
    }

    pub fn config(&self) -> &GeometryConfig {
        &self.store.config
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&Change) + 'static) {
        self.store.subscribe(listener);
    }

    pub fn model_path(&self) -> String {
        self.session.model_path()
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn selection_view(&self) -> SelectionView {
        SelectionView::of(&self.store.graph, self.selection)
    }

    pub fn select(&mut self, hit: Hit) {
        self.selection = match hit {
            Hit::Node(id) => Selection::Node(id),
            Hit::Edge(id) => Selection::Edge(id),
        };
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::None;
    }

    pub fn properties(&self) -> Vec<PropertyField> {
        properties(&self.store.graph, self.selection)
    }

    /// Live write-through of a properties-panel edit.
    pub fn set_property(&mut self, key: &str, value: &str) -> Result<(), EditError> {
        let mutation = property_mutation(&self.store.graph, self.selection, key, value)?;
        self.commands
            .execute(&mut self.store, mutation, &format!("Edit {key}"))
    }

    // ─── Tools ───────────────────────────────────────────────────────────

    pub fn tool_kind(&self) -> ToolKind {
        self.tool.kind()
    }

    pub fn set_tool(&mut self, kind: ToolKind) {
        if let Err(e) = self.finish_gesture() {
            log::warn!("could not close gesture: {e}");
        }
        self.tool = make_tool(kind);
    }

    /// Close the pointer gesture in progress, dropping a dragged node where
    /// it is. The drag batch is always closed, even when the drop fails.
    fn finish_gesture(&mut self) -> Result<(), EditError> {
        let actions = self.tool.cancel();
        self.run_actions(actions)
    }

    pub fn edge_mode(&self) -> EdgeType {
        self.edge_mode
    }

    pub fn set_edge_mode(&mut self, mode: EdgeType) {
        self.edge_mode = mode;
    }

    /// Rubber-band line of the connect tool, in canvas space.
    pub fn connect_preview(&self) -> Option<(Point, Point)> {
        let (source, end) = self.tool.preview()?;
        let node = self.store.graph.get_by_id(source)?;
        Some((node.center(), end))
    }

    // ─── Edits ───────────────────────────────────────────────────────────

    /// Place a palette node at `at` and select it. A lane goes into the pool
    /// of the current selection.
    pub fn add_node(&mut self, ty: NodeType, at: Point) -> Result<ElementId, EditError> {
        let (id, mutation) = self.store.plan_add_node(ty, at, self.selection.node())?;
        self.commands
            .execute(&mut self.store, mutation, &format!("Add {}", ty.as_str()))?;
        self.selection = Selection::Node(id);
        Ok(id)
    }

    /// Connect two nodes with an edge of the active edge mode.
    pub fn connect(&mut self, source: ElementId, target: ElementId) -> Result<ElementId, EditError> {
        let (id, mutation) = self.store.plan_connect(source, target, self.edge_mode)?;
        self.commands.execute(&mut self.store, mutation, "Connect")?;
        Ok(id)
    }

    /// Delete the selected node (with everything it owns) or edge.
    pub fn delete_selected(&mut self) -> Result<bool, EditError> {
        self.finish_gesture()?;
        let mutation = match self.selection {
            Selection::Node(id) => GraphMutation::RemoveNode { id },
            Selection::Edge(id) => GraphMutation::RemoveEdge { id },
            Selection::None => return Ok(false),
        };
        self.commands.execute(&mut self.store, mutation, "Delete")?;
        self.selection = Selection::None;
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        self.commands.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.commands.can_redo()
    }

    pub fn undo(&mut self) -> Result<Option<String>, EditError> {
        self.finish_gesture()?;
        let description = self.commands.undo(&mut self.store)?;
        self.selection.retain_existing(&self.store.graph);
        Ok(description)
    }

    pub fn redo(&mut self) -> Result<Option<String>, EditError> {
        self.finish_gesture()?;
        let description = self.commands.redo(&mut self.store)?;
        self.selection.retain_existing(&self.store.graph);
        Ok(description)
    }

    // ─── Input ───────────────────────────────────────────────────────────

    pub fn handle_event(&mut self, event: &InputEvent) -> Result<EventOutcome, EditError> {
        if let InputEvent::Key {
            key,
            modifiers,
            text_focused,
        } = event
        {
            return match ShortcutMap::resolve(key, *modifiers, *text_focused) {
                Some(action) => self.run_shortcut(action),
                None => Ok(EventOutcome::default()),
            };
        }

        let hit = event
            .position()
            .and_then(|(x, y)| hit_test(&self.store.graph, x, y, &self.store.config));
        let actions = self.tool.handle(event, hit);
        let mut outcome = EventOutcome {
            redraw: self.tool.preview().is_some() || matches!(event, InputEvent::PointerUp { .. }),
            ..EventOutcome::default()
        };
        outcome.redraw |= !actions.is_empty();
        self.run_actions(actions)?;
        Ok(outcome)
    }

    /// Run tool actions in order. `EndDrag` still runs after a failed
    /// action, and the first failure is returned.
    fn run_actions(&mut self, actions: Actions) -> Result<(), EditError> {
        let mut first_error = None;
        for action in actions {
            if first_error.is_some() && action != ToolAction::EndDrag {
                continue;
            }
            if let Err(e) = self.run_action(action) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn run_action(&mut self, action: ToolAction) -> Result<(), EditError> {
        match action {
            ToolAction::Select(hit) => self.select(hit),
            ToolAction::ClearSelection => self.clear_selection(),
            ToolAction::BeginDrag => self.commands.begin_batch(&self.store)?,
            ToolAction::Move { id, dx, dy } => {
                self.commands
                    .execute(&mut self.store, GraphMutation::MoveNode { id, dx, dy }, "Move")?;
            }
            // Nothing to settle when the node went away mid-gesture.
            ToolAction::Drop { id } if self.store.graph.get_by_id(id).is_none() => {
                log::debug!("dropped node {id} no longer exists");
            }
            ToolAction::Drop { id } => {
                self.commands
                    .execute(&mut self.store, GraphMutation::DropNode { id }, "Move")?;
            }
            ToolAction::EndDrag => self.commands.end_batch(&self.store, "Move")?,
            ToolAction::Connect { source, target } => {
                let connected = self.connect(source, target);
                self.report(connected)?;
            }
            ToolAction::Place { ty, at } => {
                let placed = self.add_node(ty, at);
                self.report(placed)?;
                self.set_tool(ToolKind::Select);
            }
        }
        Ok(())
    }

    /// Show user-correctable refusals as feedback; pass anything else on.
    fn report<T>(&mut self, result: Result<T, EditError>) -> Result<(), EditError> {
        match result {
            Ok(_) => Ok(()),
            Err(e @ (EditError::Connection(_) | EditError::NoContainerSelected)) => {
                log::debug!("refused: {e}");
                self.feedback = Some(Feedback::Error(e.to_string()));
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn run_shortcut(&mut self, action: ShortcutAction) -> Result<EventOutcome, EditError> {
        let mut outcome = EventOutcome {
            redraw: true,
            ..EventOutcome::default()
        };
        match action {
            ShortcutAction::ToolSelect => self.set_tool(ToolKind::Select),
            ShortcutAction::ToolConnect => self.set_tool(ToolKind::Connect),
            ShortcutAction::EdgeSequence => self.set_edge_mode(EdgeType::SequenceFlow),
            ShortcutAction::EdgeMessage => self.set_edge_mode(EdgeType::MessageFlow),
            ShortcutAction::EdgeAssociation => self.set_edge_mode(EdgeType::Association),
            ShortcutAction::Undo => outcome.redraw = self.undo()?.is_some(),
            ShortcutAction::Redo => outcome.redraw = self.redo()?.is_some(),
            ShortcutAction::Delete => outcome.redraw = self.delete_selected()?,
            ShortcutAction::Save => {
                outcome.redraw = false;
                outcome.save_requested = true;
            }
            ShortcutAction::Deselect => {
                // Drops a dragged node in place and abandons a half-drawn
                // connection.
                self.finish_gesture()?;
                self.clear_selection();
            }
        }
        Ok(outcome)
    }

    // ─── Save ────────────────────────────────────────────────────────────

    /// Current validation findings; empty when the model can be saved.
    pub fn validate(&self) -> Vec<ModelViolation> {
        validate_model(&self.store.graph).err().unwrap_or_default()
    }

    /// Fill default gateway conditions, validate, and build the PUT body.
    pub fn begin_save(&mut self) -> Result<SaveRequest, SaveError> {
        if self.session.is_saving() {
            return Err(SaveError::InFlight);
        }
        self.store.fill_default_conditions();
        let result = self
            .session
            .begin_save(&self.store.graph, &self.name, &self.description);
        if let Err(e) = &result {
            self.feedback = Some(Feedback::Error(e.to_string()));
        }
        result
    }

    pub fn is_saving(&self) -> bool {
        self.session.is_saving()
    }

    /// Record the PUT outcome. The document is left as it is either way.
    pub fn finish_save(&mut self, result: Result<(), String>) -> Feedback {
        let feedback = self.session.finish_save(result);
        self.feedback = Some(feedback.clone());
        feedback
    }

    /// The pending feedback message, if any. Cleared on read.
    pub fn take_feedback(&mut self) -> Option<Feedback> {
        self.feedback.take()
    }
}
