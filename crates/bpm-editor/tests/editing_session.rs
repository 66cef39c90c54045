//! Integration tests: the editor controller driven by pointer and keyboard
//! events, from loading a backend record to building the save request.

use bpm_core::*;
use bpm_editor::input::{InputEvent, Modifiers};
use bpm_editor::session::SaveError;
use bpm_editor::tools::ToolKind;
use bpm_editor::{Editor, EditorConfig, Feedback, Hit, ModelRecord, Selection};
use pretty_assertions::assert_eq;

const NONE: Modifiers = Modifiers::NONE;

fn id(s: &str) -> ElementId {
    ElementId::intern(s)
}

fn editor() -> Editor {
    let _ = env_logger::builder().is_test(true).try_init();
    Editor::new("17", EditorConfig::default())
}

fn loaded() -> Editor {
    let mut ed = editor();
    let record = ModelRecord::from_json(include_str!("fixtures/ticket_record.json")).expect("fixture parses");
    ed.load_record(record).expect("fixture loads");
    ed
}

fn click(ed: &mut Editor, x: f32, y: f32) {
    ed.handle_event(&InputEvent::from_pointer_down(x, y, NONE)).unwrap();
    ed.handle_event(&InputEvent::from_pointer_up(x, y, NONE)).unwrap();
}

fn drag(ed: &mut Editor, from: (f32, f32), to: (f32, f32)) {
    ed.handle_event(&InputEvent::from_pointer_down(from.0, from.1, NONE)).unwrap();
    ed.handle_event(&InputEvent::from_pointer_move(to.0, to.1, NONE)).unwrap();
    ed.handle_event(&InputEvent::from_pointer_up(to.0, to.1, NONE)).unwrap();
}

fn key(ed: &mut Editor, k: &str, modifiers: Modifiers) {
    ed.handle_event(&InputEvent::key(k, modifiers, false)).unwrap();
}

fn cmd() -> Modifiers {
    Modifiers { meta: true, ..NONE }
}

fn position(ed: &Editor, node: &str) -> Point {
    ed.graph().get_by_id(id(node)).unwrap().position
}

// ─── End-to-end scenario ─────────────────────────────────────────────────

#[test]
fn task_dropped_into_lane_then_pool_moved() {
    let mut ed = editor();
    let pool = ed.add_node(NodeType::Pool, Point::new(0.0, 0.0)).unwrap();
    // The new pool is selected, so the lane lands in it.
    let lane = ed.add_node(NodeType::Lane, Point::default()).unwrap();
    assert_eq!(ed.graph().container_id(lane), Some(pool));
    ed.set_property("role", "Finance").unwrap();

    let task = ed.add_node(NodeType::Task, Point::new(700.0, 50.0)).unwrap();
    assert_eq!(ed.graph().container_id(task), None);

    drag(&mut ed, (780.0, 80.0), (180.0, 100.0));
    let t = ed.graph().get_by_id(task).unwrap();
    assert_eq!(ed.graph().container_id(task), Some(lane));
    assert_eq!(t.role(), Some("Finance"));
    assert_eq!(t.position, Point::new(100.0, 70.0));

    let before = [pool, lane, task].map(|n| ed.graph().get_by_id(n).unwrap().position);
    // Grab the pool by its header band.
    drag(&mut ed, (300.0, 10.0), (337.0, 65.0));
    let after = [pool, lane, task].map(|n| ed.graph().get_by_id(n).unwrap().position);
    for (b, a) in before.iter().zip(after) {
        assert_eq!(a, b.offset(37.0, 55.0));
    }

    // One undo per drag gesture.
    key(&mut ed, "z", cmd());
    assert_eq!(ed.graph().get_by_id(task).unwrap().position, Point::new(100.0, 70.0));
    key(&mut ed, "z", cmd());
    assert_eq!(ed.graph().get_by_id(task).unwrap().position, Point::new(700.0, 50.0));
    assert_eq!(ed.graph().container_id(task), None);
}

// ─── Selection ───────────────────────────────────────────────────────────

#[test]
fn selection_is_exclusive() {
    let mut ed = loaded();

    click(&mut ed, 220.0, 90.0);
    assert_eq!(ed.selection(), Selection::Node(id("t_check")));

    // Between the task and the gateway: only the s2 segment is there.
    click(&mut ed, 320.0, 90.0);
    assert_eq!(ed.selection(), Selection::Edge(id("s2")));
    assert_eq!(ed.selection().node(), None);

    click(&mut ed, 220.0, 90.0);
    assert_eq!(ed.selection().edge(), None);

    click(&mut ed, 2000.0, 2000.0);
    assert_eq!(ed.selection(), Selection::None);
}

#[test]
fn properties_panel_writes_through() {
    let mut ed = loaded();
    click(&mut ed, 220.0, 90.0);
    let employee = ed.properties().into_iter().find(|f| f.key == "employee").unwrap();
    assert_eq!(employee.value, "Сидоров");

    ed.set_property("role", "Director").unwrap();
    let task = ed.graph().get_by_id(id("t_check")).unwrap();
    assert_eq!(task.role(), Some("Director"));
    match &task.kind {
        NodeKind::Task(t) => assert_eq!(t.employee, None),
        _ => panic!("expected task"),
    }

    ed.select(Hit::Edge(id("s4")));
    ed.set_property("condition", "${!resolved}").unwrap();
    assert_eq!(ed.graph().edge(id("s4")).unwrap().condition(), Some("${!resolved}"));
}

// ─── Rejected edits ──────────────────────────────────────────────────────

#[test]
fn lane_needs_a_selected_pool() {
    let mut ed = loaded();
    ed.set_tool(ToolKind::Place(NodeType::Lane));
    click(&mut ed, 900.0, 600.0);

    assert_eq!(
        ed.take_feedback(),
        Some(Feedback::Error("select a pool before adding a lane".into()))
    );
    assert_eq!(ed.graph().of_type(NodeType::Lane).len(), 1);
    assert_eq!(ed.tool_kind(), ToolKind::Select);
}

#[test]
fn illegal_connection_is_reported_not_applied() {
    let mut ed = loaded();
    key(&mut ed, "c", NONE);
    assert_eq!(ed.tool_kind(), ToolKind::Connect);

    drag(&mut ed, (220.0, 90.0), (84.0, 84.0));
    assert_eq!(ed.graph().edges.len(), 4);
    assert_eq!(
        ed.take_feedback(),
        Some(Feedback::Error(ConnectionError::IntoStartEvent.to_string()))
    );

    key(&mut ed, "3", NONE);
    assert_eq!(ed.edge_mode(), EdgeType::Association);
}

// ─── Delete and undo ─────────────────────────────────────────────────────

#[test]
fn deleting_the_pool_cascades_and_undo_restores() {
    let mut ed = loaded();
    let before = GraphDocument::from_graph(ed.graph());

    click(&mut ed, 300.0, 10.0);
    assert_eq!(ed.selection(), Selection::Node(id("pool_main")));
    // Typing in a field never deletes.
    ed.handle_event(&InputEvent::key("Backspace", NONE, true)).unwrap();
    assert_eq!(ed.graph().node_count(), 7);

    key(&mut ed, "Delete", NONE);
    assert_eq!(ed.graph().node_count(), 0);
    assert!(ed.graph().edges.is_empty());
    assert_eq!(ed.selection(), Selection::None);

    key(&mut ed, "z", cmd());
    assert_eq!(GraphDocument::from_graph(ed.graph()), before);
    key(&mut ed, "Z", Modifiers { shift: true, ..cmd() });
    assert_eq!(ed.graph().node_count(), 0);
}

// ─── Interrupted drags ───────────────────────────────────────────────────

/// Press on `t_check` and drag it far outside the lane, leaving the
/// pointer down.
fn start_dragging_task_out(ed: &mut Editor) {
    ed.handle_event(&InputEvent::from_pointer_down(220.0, 90.0, NONE)).unwrap();
    ed.handle_event(&InputEvent::from_pointer_move(1500.0, 900.0, NONE)).unwrap();
}

fn release(ed: &mut Editor) {
    ed.handle_event(&InputEvent::from_pointer_up(1500.0, 900.0, NONE)).unwrap();
}

/// A later edit must still land in the history.
fn assert_history_records(ed: &mut Editor) {
    ed.select(Hit::Node(id("gw")));
    ed.set_property("label", "renamed").unwrap();
    assert!(ed.can_undo());
    ed.undo().unwrap();
    assert_eq!(ed.graph().get_by_id(id("gw")).unwrap().label, "Решено?");
}

fn assert_back_in_lane(ed: &Editor) {
    assert_eq!(ed.graph().container_id(id("t_check")), Some(id("lane_ops")));
    assert_eq!(position(ed, "t_check"), Point::new(140.0, 60.0));
}

#[test]
fn escape_mid_drag_drops_the_node_where_it_is() {
    let mut ed = loaded();
    start_dragging_task_out(&mut ed);
    key(&mut ed, "Escape", NONE);
    assert_eq!(ed.selection(), Selection::None);
    release(&mut ed);

    let task = ed.graph().get_by_id(id("t_check")).unwrap();
    assert_eq!(task.position, Point::new(1420.0, 870.0));
    assert_eq!(ed.graph().container_id(id("t_check")), None);
    let lane = ed.graph().get_by_id(id("lane_ops")).unwrap();
    assert!(!lane.bounds().contains(1500.0, 900.0));

    assert_history_records(&mut ed);
    ed.undo().unwrap();
    assert_back_in_lane(&ed);
}

#[test]
fn tool_switch_mid_drag_closes_the_gesture() {
    let mut ed = loaded();
    start_dragging_task_out(&mut ed);
    key(&mut ed, "c", NONE);
    release(&mut ed);

    assert_eq!(ed.tool_kind(), ToolKind::Connect);
    assert_eq!(ed.graph().container_id(id("t_check")), None);
    assert_eq!(ed.graph().edges.len(), 4);

    assert_history_records(&mut ed);
    ed.undo().unwrap();
    assert_back_in_lane(&ed);
}

#[test]
fn delete_mid_drag_removes_the_dropped_node() {
    let mut ed = loaded();
    start_dragging_task_out(&mut ed);
    key(&mut ed, "Delete", NONE);
    release(&mut ed);
    assert!(!ed.graph().contains(id("t_check")));

    assert_history_records(&mut ed);
    // The drop and the delete are separate steps.
    ed.undo().unwrap();
    assert_eq!(position(&ed, "t_check"), Point::new(1420.0, 870.0));
    ed.undo().unwrap();
    assert_back_in_lane(&ed);
}

#[test]
fn undo_mid_drag_reverts_the_whole_drag() {
    let mut ed = loaded();
    start_dragging_task_out(&mut ed);
    key(&mut ed, "z", cmd());
    release(&mut ed);

    assert_back_in_lane(&ed);
    assert!(ed.can_redo());
    assert_history_records(&mut ed);
}

// ─── Save ────────────────────────────────────────────────────────────────

#[test]
fn save_fills_conditions_and_blocks_while_in_flight() {
    let mut ed = loaded();
    assert_eq!(
        ed.validate(),
        vec![ModelViolation::MissingCondition { edge: id("s4") }]
    );

    let outcome = ed.handle_event(&InputEvent::key("s", cmd(), false)).unwrap();
    assert!(outcome.save_requested);

    let request = ed.begin_save().unwrap();
    let json: serde_json::Value = serde_json::from_str(&request.to_json().unwrap()).unwrap();
    assert_eq!(json["name"], "Обработка заявки");
    assert_eq!(json["status"], "draft");
    assert!(json["bpmnXml"].as_str().unwrap().contains(r#"<bpmn:process id="Process_1">"#));
    assert_eq!(json["data"]["nodes"].as_array().unwrap().len(), 7);
    assert_eq!(json["data"]["edges"][3]["data"]["condition"], "${True}");
    assert_eq!(json["data"]["export"]["pools"][0]["lanes"][0]["role"], "IT Operations");
    assert_eq!(ed.model_path(), "/process-models/17");

    assert!(ed.is_saving());
    assert!(matches!(ed.begin_save(), Err(SaveError::InFlight)));

    let failed = ed.finish_save(Err("connection reset".into()));
    assert!(matches!(failed, Feedback::Error(_)));
    assert!(!ed.is_saving());
    assert_eq!(ed.graph().node_count(), 7);

    ed.begin_save().unwrap();
    assert_eq!(ed.finish_save(Ok(())), Feedback::Success("Model saved".into()));
}

#[test]
fn invalid_model_lists_every_violation() {
    let mut ed = loaded();
    for end in ["end_ok", "end_escalated"] {
        ed.select(Hit::Node(id(end)));
        ed.delete_selected().unwrap();
    }

    match ed.begin_save() {
        Err(SaveError::Invalid(violations)) => {
            assert!(violations.contains(&ModelViolation::NoEndEvent));
            assert!(violations.iter().any(|v| matches!(v, ModelViolation::GatewayBranches { .. })));
        }
        other => panic!("expected Invalid, got {other:?}"),
    }
    assert!(!ed.is_saving());
    assert!(matches!(ed.take_feedback(), Some(Feedback::Error(msg)) if msg.contains("end event")));
}

#[test]
fn loading_resets_history() {
    let mut ed = loaded();
    ed.select(Hit::Node(id("gw")));
    ed.delete_selected().unwrap();
    assert!(ed.can_undo());

    ed.load_record(ModelRecord::from_json(include_str!("fixtures/ticket_record.json")).unwrap())
        .unwrap();
    assert!(!ed.can_undo());
    assert_eq!(position(&ed, "gw"), Point::new(340.0, 60.0));
}
