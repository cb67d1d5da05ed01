//! Integration tests for handler resolution, classification, and fan-out.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dispatch::{
    AnyQuery, BoxError, Command, DispatchContext, DispatchError, Dispatcher, Event, EventHandler,
    Query, ValidationError, handler_fn,
};

struct PlaceOrder {
    sku: &'static str,
}

impl Command for PlaceOrder {}

struct OrderCount;

impl Query for OrderCount {
    type Output = usize;
}

#[derive(Debug, PartialEq)]
struct OrderPlaced {
    order_id: u64,
}

impl Event for OrderPlaced {}

/// Counts observed events and optionally fails.
struct CountingHandler {
    seen: Arc<AtomicUsize>,
    fail: bool,
}

#[async_trait]
impl EventHandler<OrderPlaced> for CountingHandler {
    async fn handle(
        &self,
        event: &OrderPlaced,
        _ctx: &DispatchContext,
    ) -> Result<(), BoxError> {
        assert_eq!(event.order_id, 42);
        self.seen.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(Box::new(ValidationError::new("always", "handler refused")))
        } else {
            Ok(())
        }
    }
}

#[tokio::test]
async fn command_reaches_its_single_handler() {
    let handled = Arc::new(AtomicUsize::new(0));
    let observer = handled.clone();
    let dispatcher = Dispatcher::builder()
        .register_command::<PlaceOrder>(handler_fn(move |cmd: PlaceOrder| {
            let observer = observer.clone();
            async move {
                assert_eq!(cmd.sku, "SKU-1");
                observer.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }))
        .build();

    dispatcher
        .dispatch_command(PlaceOrder { sku: "SKU-1" }, &DispatchContext::new())
        .await
        .unwrap();
    assert_eq!(handled.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn missing_command_handler_is_a_missing_handler_error() {
    let dispatcher = Dispatcher::builder().build();
    let err = dispatcher
        .dispatch_command(PlaceOrder { sku: "SKU-1" }, &DispatchContext::new())
        .await
        .unwrap_err();
    match err {
        DispatchError::MissingHandler { type_name, .. } => {
            assert!(type_name.contains("PlaceOrder"));
        }
        other => panic!("expected MissingHandler, got {other}"),
    }
}

#[tokio::test]
async fn query_returns_its_value() {
    let dispatcher = Dispatcher::builder()
        .register_query::<OrderCount>(handler_fn(|_query: OrderCount| async { Ok(7usize) }))
        .build();

    let count = dispatcher
        .dispatch_query(OrderCount, &DispatchContext::new())
        .await
        .unwrap();
    assert_eq!(count, 7);
}

#[tokio::test]
async fn dyn_query_resolves_from_runtime_type() {
    let dispatcher = Dispatcher::builder()
        .register_query::<OrderCount>(handler_fn(|_query: OrderCount| async { Ok(3usize) }))
        .build();

    // The call site only knows the result type.
    let query: Box<dyn AnyQuery<usize>> = Box::new(OrderCount);
    let count = dispatcher
        .dispatch_dyn_query(query, &DispatchContext::new())
        .await
        .unwrap();
    assert_eq!(count, 3);
}

#[tokio::test]
async fn dyn_query_without_handler_reports_the_runtime_type() {
    let dispatcher = Dispatcher::builder().build();
    let query: Box<dyn AnyQuery<usize>> = Box::new(OrderCount);
    let err = dispatcher
        .dispatch_dyn_query(query, &DispatchContext::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::MissingHandler { .. }));
}

#[tokio::test]
async fn handler_failure_is_classified_as_operation() {
    let dispatcher = Dispatcher::builder()
        .register_command::<PlaceOrder>(handler_fn(|_cmd: PlaceOrder| async {
            Err::<(), BoxError>(Box::new(std::io::Error::other("backend down")))
        }))
        .build();

    let err = dispatcher
        .dispatch_command(PlaceOrder { sku: "SKU-1" }, &DispatchContext::new())
        .await
        .unwrap_err();
    match err {
        DispatchError::Operation { source } => {
            assert_eq!(source.to_string(), "backend down");
        }
        other => panic!("expected Operation, got {other}"),
    }
}

#[tokio::test]
async fn validation_failures_keep_their_kind() {
    let dispatcher = Dispatcher::builder()
        .register_command::<PlaceOrder>(handler_fn(|_cmd: PlaceOrder| async {
            Err::<(), BoxError>(Box::new(ValidationError::new("sku", "sku must not be empty")))
        }))
        .build();

    let err = dispatcher
        .dispatch_command(PlaceOrder { sku: "" }, &DispatchContext::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::Validation(_)));
}

#[tokio::test]
async fn cancelled_context_short_circuits() {
    let dispatcher = Dispatcher::builder()
        .register_command::<PlaceOrder>(handler_fn(|_cmd: PlaceOrder| async {
            panic!("handler must not run")
        }))
        .build();

    let ctx = DispatchContext::new();
    ctx.cancellation().cancel();
    let err = dispatcher
        .dispatch_command(PlaceOrder { sku: "SKU-1" }, &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::Cancelled));
}

#[tokio::test]
async fn event_with_zero_handlers_completes() {
    let dispatcher = Dispatcher::builder().build();
    dispatcher
        .dispatch_event(OrderPlaced { order_id: 42 }, &DispatchContext::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn event_fans_out_to_every_handler_once() {
    let seen = Arc::new(AtomicUsize::new(0));
    let dispatcher = Dispatcher::builder()
        .register_event::<OrderPlaced>(Arc::new(CountingHandler {
            seen: seen.clone(),
            fail: false,
        }))
        .register_event::<OrderPlaced>(Arc::new(CountingHandler {
            seen: seen.clone(),
            fail: false,
        }))
        .build();

    assert_eq!(dispatcher.event_handler_count::<OrderPlaced>(), 2);
    dispatcher
        .dispatch_event(OrderPlaced { order_id: 42 }, &DispatchContext::new())
        .await
        .unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn one_failing_event_handler_does_not_stop_the_others() {
    let seen = Arc::new(AtomicUsize::new(0));
    let dispatcher = Dispatcher::builder()
        .register_event::<OrderPlaced>(Arc::new(CountingHandler {
            seen: seen.clone(),
            fail: true,
        }))
        .register_event::<OrderPlaced>(Arc::new(CountingHandler {
            seen: seen.clone(),
            fail: false,
        }))
        .register_event::<OrderPlaced>(Arc::new(CountingHandler {
            seen: seen.clone(),
            fail: false,
        }))
        .build();

    let err = dispatcher
        .dispatch_event(OrderPlaced { order_id: 42 }, &DispatchContext::new())
        .await
        .unwrap_err();

    // All three ran; the joined failure carries the first fault.
    assert_eq!(seen.load(Ordering::SeqCst), 3);
    assert!(matches!(err, DispatchError::Validation(_)));
}

#[tokio::test]
async fn reregistering_a_handler_replaces_it() {
    let dispatcher = Dispatcher::builder()
        .register_query::<OrderCount>(handler_fn(|_q: OrderCount| async { Ok(1usize) }))
        .register_query::<OrderCount>(handler_fn(|_q: OrderCount| async { Ok(2usize) }))
        .build();

    let count = dispatcher
        .dispatch_query(OrderCount, &DispatchContext::new())
        .await
        .unwrap();
    assert_eq!(count, 2);
}
