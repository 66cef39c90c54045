//! Undo/Redo command stack.
//!
//! New edges, edge edits and plain moves are undone by an inverse mutation.
//! Everything else is recorded as a pair of MessagePack document snapshots:
//! node insertion and removal cascade, a lane role is handed down to members,
//! and an edge removal must come back at its old position in the edge list.
//!
//! Drag gestures are batched: the document is captured when the gesture
//! starts and when it ends, so one undo step reverts the whole drag.

use crate::store::{DocumentStore, EdgePatch, EditError, GraphMutation};

/// One undoable step.
#[derive(Debug, Clone)]
pub enum Command {
    Single {
        forward: Box<GraphMutation>,
        inverse: Box<GraphMutation>,
        description: String,
    },
    Snapshot {
        before: Vec<u8>,
        after: Vec<u8>,
        description: String,
    },
}

/// Undo/redo stacks with batch grouping for drag gestures.
pub struct CommandStack {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    max_depth: usize,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    batch_snapshot: Option<Vec<u8>>,
    batch_dirty: bool,
}

impl CommandStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::with_capacity(max_depth.min(256)),
            redo_stack: Vec::new(),
            max_depth,
            batch_depth: 0,
            batch_snapshot: None,
            batch_dirty: false,
        }
    }

    /// Start a batch group. Mutations until the matching `end_batch` are
    /// applied live and recorded as one step.
    pub fn begin_batch(&mut self, store: &DocumentStore) -> Result<(), EditError> {
        if self.batch_depth == 0 {
            self.batch_snapshot = Some(store.snapshot()?);
            self.batch_dirty = false;
        }
        self.batch_depth += 1;
        Ok(())
    }

    pub fn end_batch(&mut self, store: &DocumentStore, description: &str) -> Result<(), EditError> {
        if self.batch_depth == 0 {
            return Ok(());
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return Ok(());
        }

        let before = self.batch_snapshot.take();
        let dirty = std::mem::take(&mut self.batch_dirty);
        if let Some(before) = before
            && dirty
        {
            let after = store.snapshot()?;
            // A drag that ends where it started is not a step.
            if before != after {
                self.push(Command::Snapshot {
                    before,
                    after,
                    description: description.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn is_batching(&self) -> bool {
        self.batch_depth > 0
    }

    /// Apply `mutation` and record it. A refused mutation records nothing.
    pub fn execute(
        &mut self,
        store: &mut DocumentStore,
        mutation: GraphMutation,
        description: &str,
    ) -> Result<(), EditError> {
        if self.batch_depth > 0 {
            store.apply(mutation)?;
            self.batch_dirty = true;
            return Ok(());
        }

        let command = match compute_inverse(store, &mutation) {
            Some(inverse) => {
                store.apply(mutation.clone())?;
                Command::Single {
                    forward: Box::new(mutation),
                    inverse: Box::new(inverse),
                    description: description.to_string(),
                }
            }
            None => {
                let before = store.snapshot()?;
                store.apply(mutation)?;
                Command::Snapshot {
                    before,
                    after: store.snapshot()?,
                    description: description.to_string(),
                }
            }
        };
        self.push(command);
        Ok(())
    }

    fn push(&mut self, command: Command) {
        self.undo_stack.push(command);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    /// Undo the last step, returning its description.
    pub fn undo(&mut self, store: &mut DocumentStore) -> Result<Option<String>, EditError> {
        let Some(command) = self.undo_stack.pop() else {
            return Ok(None);
        };
        let description = match &command {
            Command::Single {
                inverse,
                description,
                ..
            } => {
                store.apply(*inverse.clone())?;
                description.clone()
            }
            Command::Snapshot {
                before,
                description,
                ..
            } => {
                store.restore(before)?;
                description.clone()
            }
        };
        self.redo_stack.push(command);
        Ok(Some(description))
    }

    /// Redo the last undone step, returning its description.
    pub fn redo(&mut self, store: &mut DocumentStore) -> Result<Option<String>, EditError> {
        let Some(command) = self.redo_stack.pop() else {
            return Ok(None);
        };
        let description = match &command {
            Command::Single {
                forward,
                description,
                ..
            } => {
                store.apply(*forward.clone())?;
                description.clone()
            }
            Command::Snapshot {
                after, description, ..
            } => {
                store.restore(after)?;
                description.clone()
            }
        };
        self.undo_stack.push(command);
        Ok(Some(description))
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Forget all history (after loading another model).
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.batch_depth = 0;
        self.batch_snapshot = None;
        self.batch_dirty = false;
    }
}

/// The inverse of `mutation`, when one exists without a snapshot.
fn compute_inverse(store: &DocumentStore, mutation: &GraphMutation) -> Option<GraphMutation> {
    match mutation {
        GraphMutation::MoveNode { id, dx, dy } => Some(GraphMutation::MoveNode {
            id: *id,
            dx: -dx,
            dy: -dy,
        }),
        GraphMutation::AddEdge { edge } => Some(GraphMutation::RemoveEdge { id: edge.id }),
        GraphMutation::UpdateEdge { id, .. } => {
            store.graph.edge(*id).map(|edge| GraphMutation::UpdateEdge {
                id: *id,
                patch: EdgePatch::capture(edge),
            })
        }
        _ => None,
    }
}
