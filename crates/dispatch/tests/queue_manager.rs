//! End-to-end dispatch tests: queue manager + real handlers
//!
//! Each test builds the full path a record travels: logger-assembled event
//! data -> record -> queue -> worker -> handler pipeline -> destination.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use kolog_core::{EventData, Level, MessageRenderer, Processed, Processor, ProcessorFn, Record};
use kolog_dispatch::{
    BackpressurePolicy, DispatchError, FallbackChannel, QueueConfig, QueueManager,
};
use kolog_handlers::{
    FileConfig, Handler, HandlerError, NullHandler, RotatingFileHandler, RotationPolicy, Sink,
};

/// Route internal diagnostics through `RUST_LOG` when debugging a test
fn init_diagnostics() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn record(logger: &str, level: Level, event: &str) -> Record {
    Record::from_event(EventData::for_log(logger, level, event))
}

fn null_handler() -> Arc<dyn Handler> {
    Arc::new(NullHandler::new(Arc::new(MessageRenderer::new())))
}

/// Handler whose every write fails with an I/O error
struct FailingHandler;

#[async_trait]
impl Handler for FailingHandler {
    fn name(&self) -> &str {
        "flaky"
    }

    fn emit_sync(&self, _record: &Record) -> Result<(), HandlerError> {
        Err(HandlerError::Write {
            handler: self.name().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "injected failure"),
        })
    }

    async fn emit_async(&self, record: &Record) -> Result<(), HandlerError> {
        self.emit_sync(record)
    }

    async fn flush(&self) -> Result<(), HandlerError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), HandlerError> {
        Ok(())
    }

    fn attach_sink(&self, _sink: Sink) {}

    fn detach_sink(&self) {}

    fn dropped(&self) -> u64 {
        0
    }
}

#[tokio::test]
async fn test_basic_dispatch() {
    init_diagnostics();
    let manager = QueueManager::new(QueueConfig::default()).unwrap();
    let sink = Sink::new();
    manager.register("app", vec![null_handler()]);
    manager.add_sink("app", sink.clone());
    manager.start();

    manager
        .enqueue(record("app", Level::Info, "hello"))
        .await
        .unwrap();
    manager.shutdown().await.unwrap();

    assert_eq!(sink.events(), vec!["hello\n"]);
}

#[tokio::test]
async fn test_backpressure_drop_returns_immediately() {
    let manager = QueueManager::new(
        QueueConfig::default()
            .with_max_queue_size(2)
            .with_policy(BackpressurePolicy::Drop),
    )
    .unwrap();
    let sink = Sink::new();
    manager.register("app", vec![null_handler()]);
    manager.add_sink("app", sink.clone());
    manager.start();
    manager.pause_worker();

    manager.enqueue(record("app", Level::Info, "one")).await.unwrap();
    manager.enqueue(record("app", Level::Info, "two")).await.unwrap();
    // Queue is full; the third returns immediately with no error.
    manager.enqueue(record("app", Level::Info, "three")).await.unwrap();

    assert_eq!(manager.dropped("app").queue_full, 1);

    manager.resume_worker();
    manager.shutdown().await.unwrap();

    assert_eq!(sink.events(), vec!["one\n", "two\n"]);
}

#[tokio::test]
async fn test_backpressure_block_suspends_until_drained() {
    let manager = Arc::new(
        QueueManager::new(
            QueueConfig::default()
                .with_max_queue_size(1)
                .with_policy(BackpressurePolicy::Block),
        )
        .unwrap(),
    );
    manager.register("app", vec![null_handler()]);
    manager.start();
    manager.pause_worker();

    manager.enqueue(record("app", Level::Info, "filler")).await.unwrap();

    let producer = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.enqueue(record("app", Level::Info, "blocked")).await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(!producer.is_finished());

    manager.resume_worker();
    producer.await.unwrap().unwrap();
    manager.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_size_rotation_through_dispatch() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("app.log");
    let handler: Arc<dyn Handler> = Arc::new(
        RotatingFileHandler::new(
            FileConfig::new(&path),
            RotationPolicy::new().with_max_bytes(10).with_backup_count(2),
            Arc::new(MessageRenderer::new()),
            Vec::new(),
        )
        .unwrap(),
    );

    let manager = QueueManager::new(QueueConfig::default()).unwrap();
    manager.register("app", vec![handler]);
    manager.start();

    manager.enqueue(record("app", Level::Info, "aaaaa")).await.unwrap();
    manager.enqueue(record("app", Level::Info, "bbbbb")).await.unwrap();
    manager.shutdown().await.unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "bbbbb\n");
    let backup = path.with_extension("log.1");
    assert_eq!(std::fs::read_to_string(&backup).unwrap(), "aaaaa\n");
    assert!(!path.with_extension("log.2").exists());
}

#[tokio::test]
async fn test_processor_drop_filters_per_handler() {
    let drop_debug: Arc<dyn Processor> = Arc::new(ProcessorFn::new("drop_debug", |event: EventData| {
        if event.level() == Some(Level::Debug) {
            Ok(Processed::Drop)
        } else {
            Ok(Processed::Event(event))
        }
    }));
    let handler: Arc<dyn Handler> = Arc::new(NullHandler::with_processors(
        Arc::new(MessageRenderer::new()),
        vec![drop_debug],
    ));

    let manager = QueueManager::new(QueueConfig::default()).unwrap();
    let sink = Sink::new();
    manager.register("app", vec![Arc::clone(&handler)]);
    manager.add_sink("app", sink.clone());
    manager.start();

    manager.enqueue(record("app", Level::Debug, "noise")).await.unwrap();
    manager.enqueue(record("app", Level::Info, "signal")).await.unwrap();
    manager.shutdown().await.unwrap();

    assert_eq!(sink.events(), vec!["signal\n"]);
    assert_eq!(handler.dropped(), 1);
}

#[tokio::test]
async fn test_shutdown_drains_full_backlog() {
    let manager = QueueManager::new(
        QueueConfig::default()
            .with_max_queue_size(200)
            .with_drain_timeout(Duration::from_secs(5)),
    )
    .unwrap();
    let sink = Sink::new();
    let handler = null_handler();
    manager.register("app", vec![Arc::clone(&handler)]);
    manager.add_sink("app", sink.clone());
    manager.start();
    manager.pause_worker();

    for i in 0..100 {
        manager
            .enqueue(record("app", Level::Info, &format!("event {i}")))
            .await
            .unwrap();
    }
    assert_eq!(manager.queue_len(), 100);

    manager.resume_worker();
    manager.shutdown().await.unwrap();

    assert_eq!(sink.len(), 100);
    assert_eq!(manager.queue_len(), 0);
    // Handlers were closed as the final shutdown step.
    assert!(matches!(
        handler.emit_sync(&record("app", Level::Info, "late")),
        Err(HandlerError::Closed { .. })
    ));
}

#[tokio::test]
async fn test_handler_isolation_and_fallback_channel() {
    init_diagnostics();
    let (fallback, capture) = FallbackChannel::capture();
    let manager = QueueManager::with_fallback(QueueConfig::default(), fallback).unwrap();
    let sink = Sink::new();

    let healthy = null_handler();
    healthy.attach_sink(sink.clone());
    manager.register("app", vec![Arc::new(FailingHandler), healthy]);
    manager.start();

    for i in 0..5 {
        manager
            .enqueue(record("app", Level::Info, &format!("event {i}")))
            .await
            .unwrap();
    }
    manager.shutdown().await.unwrap();

    // The healthy sibling observed every record.
    assert_eq!(sink.len(), 5);

    // The fallback channel holds one coded line per failure.
    let lines = capture.lines();
    assert_eq!(lines.len(), 5);
    for line in &lines {
        assert!(
            line.starts_with("[ko-log:error] HANDLER::flaky::IO::ERROR"),
            "unexpected fallback line: {line}"
        );
    }
}

#[tokio::test]
async fn test_sync_path_collects_composite_error() {
    let manager = QueueManager::new(QueueConfig::default()).unwrap();
    let sink = Sink::new();
    let healthy = null_handler();
    healthy.attach_sink(sink.clone());
    manager.register("app", vec![Arc::new(FailingHandler), healthy]);

    let err = manager
        .push_sync(&record("app", Level::Info, "direct"))
        .unwrap_err();

    match err {
        DispatchError::Emit {
            logger,
            attempted,
            failures,
        } => {
            assert_eq!(logger, "app");
            assert_eq!(attempted, 2);
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].handler, "flaky");
        }
        other => panic!("expected Emit, got {other}"),
    }
    // The failing sibling did not stop the healthy one.
    assert_eq!(sink.events(), vec!["direct\n"]);
}

#[tokio::test]
async fn test_shutdown_with_empty_queue_is_fast() {
    let manager = QueueManager::new(
        QueueConfig::default().with_drain_timeout(Duration::from_secs(5)),
    )
    .unwrap();
    manager.register("app", vec![null_handler()]);
    manager.start();

    let started = Instant::now();
    manager.shutdown().await.unwrap();

    assert!(
        started.elapsed() < Duration::from_secs(1),
        "shutdown waited the full drain timeout"
    );
}

#[tokio::test]
async fn test_enqueue_after_shutdown_fails_queue_closed() {
    let manager = QueueManager::new(QueueConfig::default()).unwrap();
    manager.register("app", vec![null_handler()]);
    manager.start();
    manager.shutdown().await.unwrap();

    let err = manager
        .enqueue(record("app", Level::Info, "late"))
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::QueueClosed));
}

#[tokio::test]
async fn test_sink_payload_matches_destination_bytes() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("app.log");
    let handler: Arc<dyn Handler> = Arc::new(
        kolog_handlers::FileHandler::new(
            FileConfig::new(&path),
            Arc::new(MessageRenderer::new()),
            Vec::new(),
        )
        .unwrap(),
    );

    let manager = QueueManager::new(QueueConfig::default()).unwrap();
    let sink = Sink::new();
    manager.register("app", vec![handler]);
    manager.add_sink("app", sink.clone());
    manager.start();

    manager.enqueue(record("app", Level::Info, "mirrored")).await.unwrap();
    manager.shutdown().await.unwrap();

    assert_eq!(
        sink.events().concat(),
        std::fs::read_to_string(&path).unwrap()
    );
}
