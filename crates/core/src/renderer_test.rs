use super::*;
use serde_json::Value;

#[test]
fn test_message_renderer_emits_event_only() {
    let renderer = MessageRenderer::new();
    let event = EventData::for_log("app", Level::Info, "hello");

    assert_eq!(
        renderer.render(&event).unwrap(),
        Rendered::Payload("hello".to_string())
    );
}

#[test]
fn test_message_renderer_min_level_drops() {
    let renderer = MessageRenderer::new().with_min_level(Level::Warning);
    let event = EventData::for_log("app", Level::Info, "hello");

    assert_eq!(renderer.render(&event).unwrap(), Rendered::Drop);
}

#[test]
fn test_plain_renderer_layout() {
    let mut event = EventData::for_log("app.db", Level::Warning, "slow query");
    event.insert("timestamp", "2026-08-02T10:30:45.123456Z");
    event
        .context_mut()
        .insert("elapsed_ms".into(), Value::from(412));

    let Rendered::Payload(line) = renderer_output(&PlainRenderer::new(), &event) else {
        panic!("expected payload");
    };
    assert_eq!(
        line,
        "2026-08-02T10:30:45.123456Z [WARNING] app.db: slow query elapsed_ms=412"
    );
}

#[test]
fn test_plain_renderer_string_context_unquoted() {
    let mut event = EventData::for_log("app", Level::Info, "login");
    event.insert("timestamp", "2026-08-02T10:30:45Z");
    event
        .context_mut()
        .insert("user".into(), Value::from("ada"));

    let Rendered::Payload(line) = renderer_output(&PlainRenderer::new(), &event) else {
        panic!("expected payload");
    };
    assert!(line.ends_with("login user=ada"), "got: {line}");
}

#[test]
fn test_json_renderer_round_trips() {
    let event = EventData::for_log("app", Level::Error, "boom");

    let Rendered::Payload(line) = renderer_output(&JsonRenderer::new(), &event) else {
        panic!("expected payload");
    };
    let parsed: Value = serde_json::from_str(&line).unwrap();
    assert_eq!(parsed["event"], "boom");
    assert_eq!(parsed["level"], "ERROR");
    assert_eq!(parsed["name"], "app");
}

#[test]
fn test_json_renderer_min_level_drops() {
    let renderer = JsonRenderer::new().with_min_level(Level::Error);
    let event = EventData::for_log("app", Level::Debug, "noise");

    assert_eq!(renderer.render(&event).unwrap(), Rendered::Drop);
}

#[test]
fn test_renderer_fn_adapter() {
    let renderer = RendererFn::new("upcase", |event: &EventData| {
        Ok(Rendered::Payload(
            event.event().unwrap_or_default().to_uppercase(),
        ))
    });
    let event = EventData::for_log("app", Level::Info, "quiet");

    assert_eq!(
        renderer.render(&event).unwrap(),
        Rendered::Payload("QUIET".to_string())
    );
}

fn renderer_output(renderer: &dyn Renderer, event: &EventData) -> Rendered {
    renderer.render(event).unwrap()
}
