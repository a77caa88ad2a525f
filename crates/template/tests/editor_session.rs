//! End-to-end editing sessions: palette drag, drop onto the canvas, timeline clicks, undo.
use template::*;

fn session() -> EditorStore {
    let mut store = EditorStore::new(Template::with_default_sections("product launch"));
    store
        .set_viewport(CanvasViewport::new(BoundingBox::new(100.0, 50.0, 540.0, 960.0), 0.5).unwrap())
        .unwrap();
    store
}

#[test]
fn test_drag_from_palette_and_drop_on_clicked_section() {
    let mut store = session();

    // User clicks halfway along the timeline: 10s of 20s is inside the body.
    let body = store.click_timeline(0.5).expect("body section");
    assert_eq!(store.template().section(body).unwrap().kind, SectionKind::Body);

    let payload = store.palette().payload_for("emoji").unwrap().encode();
    let element_id = store.drop_element(&payload, body, 200.0, 150.0).unwrap();

    let (owner, element) = store.template().find_element(element_id).unwrap();
    assert_eq!(owner.id, body);
    assert_eq!((element.position.x, element.position.y), (200.0, 200.0));
    assert_eq!(element.kind.type_name(), "sticker");
    assert_eq!(element.size, Size::new(96.0, 96.0));
}

#[test]
fn test_section_edits_keep_timeline_consistent() {
    let mut store = session();
    let hook = store.template().sections[1].id;

    store
        .apply(EditorCommand::ResizeSection {
            section_id: hook,
            duration: 8.0,
        })
        .unwrap();
    let starts: Vec<_> = store.template().sections.iter().map(|s| s.start_time).collect();
    assert_eq!(starts, vec![0.0, 2.0, 10.0, 20.0]);

    let layout = section_layout(&store.template().sections);
    let sum: f64 = layout.iter().map(|l| l.width_percent).sum();
    assert!((sum - 100.0).abs() < 1e-9);
    assert_eq!(layout[1].width_percent, 32.0);

    store.dispatch(EditorAction::Undo).unwrap();
    assert_eq!(store.template().total_duration(), 20.0);
}

#[test]
fn test_template_survives_json_round_trip() {
    let mut store = session();
    let intro = store.template().sections[0].id;
    let element_id = store
        .drop_element(r#"{"id":"caption","type":"text"}"#, intro, 300.0, 250.0)
        .unwrap();
    store
        .apply(EditorCommand::SetElementVisibility {
            element_id,
            visible_from: Some(0.5),
            visible_to: Some(1.5),
        })
        .unwrap();

    let json = serde_json::to_string_pretty(store.template()).unwrap();
    let restored: Template = serde_json::from_str(&json).unwrap();
    assert_eq!(&restored, store.template());
}

#[test]
fn test_rejected_actions_do_not_touch_history() {
    let mut store = session();
    assert_eq!(
        store.dispatch(EditorAction::Undo),
        Err(TemplateError::HistoryEmpty("undo stack"))
    );
    let ghost = SectionId::new();
    assert!(store
        .drop_element(r#"{"id":"image","type":"image"}"#, ghost, 0.0, 0.0)
        .is_err());
    assert!(!store.state().history.can_undo());
}
