//! WASM bridge for the process editor: exposes the Rust editor to the
//! browser host.
//!
//! Compiled via `wasm-pack build --target web`. The host performs the two
//! HTTP calls (`GET`/`PUT /process-models/{id}`); the bridge consumes and
//! produces their JSON bodies. Every structured result is a JSON string.

mod render2d;

use bpm_core::model::{EdgeType, NodeType, Point};
use bpm_editor::input::{InputEvent, Modifiers};
use bpm_editor::tools::{ToolKind, parse_edge_mode};
use bpm_editor::{EditError, Editor, EditorConfig, EventOutcome, ModelRecord, SaveError};
use serde_json::{Value, json};
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

/// The main WASM-facing canvas controller.
///
/// All interaction from the host page goes through this struct.
#[wasm_bindgen]
pub struct ProcessCanvas {
    editor: Editor,
    width: f64,
    height: f64,
}

#[wasm_bindgen]
impl ProcessCanvas {
    /// Create a controller for backend record `model_id`.
    #[wasm_bindgen(constructor)]
    pub fn new(model_id: &str, width: f64, height: f64) -> Self {
        console_error_panic_hook_setup();
        Self {
            editor: Editor::new(model_id, EditorConfig::default()),
            width,
            height,
        }
    }

    /// Load the body of `GET /process-models/{id}`.
    /// Returns `{"ok":true,"name":"..."}` or `{"ok":false,"error":"..."}`.
    pub fn load_record(&mut self, json: &str) -> String {
        let loaded = ModelRecord::from_json(json)
            .map_err(EditError::from)
            .and_then(|record| self.editor.load_record(record));
        match loaded {
            Ok(()) => json!({
                "ok": true,
                "name": self.editor.name,
                "description": self.editor.description,
            })
            .to_string(),
            Err(e) => error_json(&e.to_string()),
        }
    }

    /// Render the diagram to a Canvas2D context.
    pub fn render(&self, ctx: &CanvasRenderingContext2d) {
        let frame = render2d::Frame {
            graph: self.editor.graph(),
            config: self.editor.config(),
            selection: self.editor.selection(),
            preview: self.editor.connect_preview(),
            width: self.width,
            height: self.height,
        };
        render2d::render_frame(ctx, &frame);
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    // ─── Pointer ─────────────────────────────────────────────────────────

    /// Handle pointer down. Modifier bits: 1 shift, 2 ctrl, 4 alt, 8 meta.
    pub fn handle_pointer_down(&mut self, x: f32, y: f32, modifiers: u8) -> String {
        let event = InputEvent::from_pointer_down(x, y, Modifiers::from_bits(modifiers));
        self.dispatch(&event)
    }

    pub fn handle_pointer_move(&mut self, x: f32, y: f32, modifiers: u8) -> String {
        let event = InputEvent::from_pointer_move(x, y, Modifiers::from_bits(modifiers));
        self.dispatch(&event)
    }

    pub fn handle_pointer_up(&mut self, x: f32, y: f32, modifiers: u8) -> String {
        let event = InputEvent::from_pointer_up(x, y, Modifiers::from_bits(modifiers));
        self.dispatch(&event)
    }

    // ─── Keyboard Shortcut API ───────────────────────────────────────────

    /// Handle a keyboard event. `text_focused` is true while a text input
    /// of the properties panel has focus.
    pub fn handle_key(
        &mut self,
        key: &str,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
        text_focused: bool,
    ) -> String {
        let modifiers = Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        };
        self.dispatch(&InputEvent::key(key, modifiers, text_focused))
    }

    // ─── Tools ───────────────────────────────────────────────────────────

    /// Switch the active tool: `select`, `connect`, or a palette node kind.
    pub fn set_tool(&mut self, name: &str) -> bool {
        match ToolKind::parse(name) {
            Some(kind) => {
                self.editor.set_tool(kind);
                true
            }
            None => false,
        }
    }

    pub fn get_tool_name(&self) -> String {
        tool_kind_to_name(self.editor.tool_kind()).to_string()
    }

    /// Switch the edge type new connections get.
    pub fn set_edge_mode(&mut self, name: &str) -> bool {
        match parse_edge_mode(name) {
            Some(mode) => {
                self.editor.set_edge_mode(mode);
                true
            }
            None => false,
        }
    }

    pub fn get_edge_mode(&self) -> String {
        edge_mode_to_name(self.editor.edge_mode()).to_string()
    }

    // ─── Edits ───────────────────────────────────────────────────────────

    /// Place a palette node with its top-left corner at (`x`, `y`).
    /// Returns `{"ok":true,"id":"..."}` or `{"ok":false,"error":"..."}`.
    pub fn add_node(&mut self, kind: &str, x: f32, y: f32) -> String {
        let Some(ty) = NodeType::parse(kind) else {
            return error_json(&format!("unknown node kind {kind}"));
        };
        match self.editor.add_node(ty, Point::new(x, y)) {
            Ok(id) => json!({ "ok": true, "id": id }).to_string(),
            Err(e) => error_json(&e.to_string()),
        }
    }

    /// The current selection: `{"kind":"none"}`, `{"kind":"node",...}` or
    /// `{"kind":"edge",...}`.
    pub fn selection_json(&self) -> String {
        serde_json::to_string(&self.editor.selection_view())
            .unwrap_or_else(|_| r#"{"kind":"none"}"#.to_string())
    }

    /// The properties-panel fields of the selection.
    pub fn properties_json(&self) -> String {
        serde_json::to_string(&self.editor.properties()).unwrap_or_else(|_| "[]".to_string())
    }

    /// Write one properties-panel field through to the model.
    pub fn set_property(&mut self, key: &str, value: &str) -> String {
        match self.editor.set_property(key, value) {
            Ok(()) => r#"{"ok":true}"#.to_string(),
            Err(e) => error_json(&e.to_string()),
        }
    }

    pub fn delete_selected(&mut self) -> bool {
        self.editor.delete_selected().unwrap_or_else(|e| {
            log::warn!("delete failed: {e}");
            false
        })
    }

    pub fn undo(&mut self) -> bool {
        matches!(self.editor.undo(), Ok(Some(_)))
    }

    pub fn redo(&mut self) -> bool {
        matches!(self.editor.redo(), Ok(Some(_)))
    }

    pub fn can_undo(&self) -> bool {
        self.editor.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.editor.can_redo()
    }

    // ─── Save ────────────────────────────────────────────────────────────

    /// Validation findings as a JSON array of messages; empty when valid.
    pub fn validate_json(&self) -> String {
        let messages: Vec<String> = self.editor.validate().iter().map(ToString::to_string).collect();
        serde_json::to_string(&messages).unwrap_or_else(|_| "[]".to_string())
    }

    /// Prepare the `PUT` request. Returns
    /// `{"ok":true,"path":"/process-models/{id}","body":"<json>"}`, or
    /// `{"ok":false,"error":"...","violations":[...]}` when nothing is sent.
    pub fn begin_save(&mut self, name: &str, description: &str) -> String {
        self.editor.name = name.to_string();
        self.editor.description = description.to_string();
        let body = self
            .editor
            .begin_save()
            .and_then(|request| request.to_json());
        match body {
            Ok(body) => json!({
                "ok": true,
                "path": self.editor.model_path(),
                "body": body,
            })
            .to_string(),
            Err(e) => {
                let violations: Vec<String> = match &e {
                    SaveError::Invalid(list) => list.iter().map(ToString::to_string).collect(),
                    _ => Vec::new(),
                };
                json!({
                    "ok": false,
                    "error": e.to_string(),
                    "violations": violations,
                })
                .to_string()
            }
        }
    }

    /// Report the `PUT` outcome. Returns the feedback to show.
    pub fn finish_save(&mut self, ok: bool, message: &str) -> String {
        let result = if ok { Ok(()) } else { Err(message.to_string()) };
        let feedback = self.editor.finish_save(result);
        serde_json::to_string(&feedback).unwrap_or_default()
    }

    pub fn is_saving(&self) -> bool {
        self.editor.is_saving()
    }

    pub fn model_path(&self) -> String {
        self.editor.model_path()
    }
}

impl ProcessCanvas {
    /// Run one input event and describe the result for the host:
    /// `{"changed":bool,"save":bool,"tool":"...","feedback":...}`.
    fn dispatch(&mut self, event: &InputEvent) -> String {
        let outcome = match self.editor.handle_event(event) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("input event failed: {e}");
                return error_json(&e.to_string());
            }
        };
        self.outcome_json(outcome).to_string()
    }

    fn outcome_json(&mut self, outcome: EventOutcome) -> Value {
        let feedback = self
            .editor
            .take_feedback()
            .and_then(|f| serde_json::to_value(f).ok())
            .unwrap_or(Value::Null);
        json!({
            "changed": outcome.redraw,
            "save": outcome.save_requested,
            "tool": tool_kind_to_name(self.editor.tool_kind()),
            "feedback": feedback,
        })
    }
}

fn error_json(message: &str) -> String {
    json!({ "ok": false, "error": message }).to_string()
}

fn tool_kind_to_name(kind: ToolKind) -> &'static str {
    match kind {
        ToolKind::Select => "select",
        ToolKind::Connect => "connect",
        ToolKind::Place(ty) => ty.as_str(),
    }
}

fn edge_mode_to_name(mode: EdgeType) -> &'static str {
    match mode {
        EdgeType::SequenceFlow => "sequenceFlow",
        EdgeType::MessageFlow => "messageFlow",
        EdgeType::Association => "association",
    }
}

/// Set up a panic hook that logs to the browser console.
fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("BPM WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}
