use super::*;
use kolog_core::{EventData, Level, MessageRenderer, Processed, ProcessorFn};

fn record(level: Level, event: &str) -> Record {
    Record::from_event(EventData::for_log("app", level, event))
}

fn handler() -> NullHandler {
    NullHandler::new(Arc::new(MessageRenderer::new()))
}

#[test]
fn test_sink_observes_pipeline_output() {
    let handler = handler();
    let sink = Sink::new();
    handler.attach_sink(sink.clone());

    handler.emit_sync(&record(Level::Info, "hello")).unwrap();

    assert_eq!(sink.events(), vec!["hello\n"]);
}

#[test]
fn test_no_sink_no_observable_output() {
    let handler = handler();
    handler.emit_sync(&record(Level::Info, "hello")).unwrap();
    assert_eq!(handler.dropped(), 0);
}

#[tokio::test]
async fn test_async_path_matches_sync() {
    let handler = handler();
    let sink = Sink::new();
    handler.attach_sink(sink.clone());

    handler.emit_sync(&record(Level::Info, "one")).unwrap();
    handler.emit_async(&record(Level::Info, "two")).await.unwrap();

    assert_eq!(sink.events(), vec!["one\n", "two\n"]);
}

#[tokio::test]
async fn test_processor_drop_counted() {
    let drop_debug: Arc<dyn kolog_core::Processor> =
        Arc::new(ProcessorFn::new("drop_debug", |event: EventData| {
            if event.level() == Some(Level::Debug) {
                Ok(Processed::Drop)
            } else {
                Ok(Processed::Event(event))
            }
        }));
    let handler = NullHandler::with_processors(Arc::new(MessageRenderer::new()), vec![drop_debug]);
    let sink = Sink::new();
    handler.attach_sink(sink.clone());

    handler.emit_async(&record(Level::Debug, "noise")).await.unwrap();
    handler.emit_async(&record(Level::Info, "signal")).await.unwrap();

    assert_eq!(sink.events(), vec!["signal\n"]);
    assert_eq!(handler.dropped(), 1);
}

#[tokio::test]
async fn test_close_is_idempotent_and_blocks_writes() {
    let handler = handler();
    handler.close().await.unwrap();
    handler.close().await.unwrap();

    let err = handler.emit_sync(&record(Level::Info, "late")).unwrap_err();
    assert!(matches!(err, HandlerError::Closed { .. }));
}

#[tokio::test]
async fn test_sink_detach_restores_state() {
    let handler = handler();
    let sink = Sink::new();

    handler.attach_sink(sink.clone());
    handler.detach_sink();
    handler.emit_async(&record(Level::Info, "unseen")).await.unwrap();

    assert!(sink.is_empty());
}
