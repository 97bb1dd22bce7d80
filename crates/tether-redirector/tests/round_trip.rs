use jiff::{SignedDuration, Timestamp};
use std::sync::Arc;
use tether_binder::BinderService;
use tether_core::{
    BindRequest, BindingSettings, Enforcement, Error, LifecycleState, ManualClock, Opcode,
};
use tether_events::{EventQueue, OpCounters};
use tether_generator::RandomGenerator;
use tether_redirector::RedirectorService;
use tether_storage::InMemoryStore;

fn start() -> Timestamp {
    Timestamp::from_second(1_700_000_000).unwrap()
}

#[tokio::test]
async fn generated_binding_counts_reads() {
    let store = Arc::new(InMemoryStore::new());
    let settings = BindingSettings::default();
    let events = OpCounters::new();
    let binder = BinderService::new(
        Arc::clone(&store),
        RandomGenerator::new(),
        events.clone(),
        settings.clone(),
    );
    let redirector = RedirectorService::new(Arc::clone(&store), events.clone(), settings);

    let id = binder
        .bind_simple(BindRequest::new("https://example.com/landing"))
        .await
        .unwrap();

    let stored = redirector.peek(&id).await.unwrap();
    assert_eq!(stored.url, "https://example.com/landing");
    assert_eq!(stored.counter, 0);

    let redirect = redirector.resolve_redirect(&id).await.unwrap();
    assert_eq!(redirect.target.as_deref(), Some("https://example.com/landing"));
    assert_eq!(redirector.peek(&id).await.unwrap().counter, 1);

    assert_eq!(events.count(Opcode::Insert), 1);
    assert_eq!(events.count(Opcode::Get), 1);
}

#[tokio::test]
async fn global_ttl_expires_bindings_through_the_queue() {
    let store = Arc::new(InMemoryStore::new());
    let settings = BindingSettings::builder()
        .ttl(60)
        .expired_redirect_url("https://example.com/too-late")
        .build();
    let counters = OpCounters::new();
    let (events, worker) = EventQueue::spawn(16, counters.clone());
    let clock = ManualClock::new(start());

    let binder = BinderService::new(
        Arc::clone(&store),
        RandomGenerator::new(),
        events.clone(),
        settings.clone(),
    );
    let redirector =
        RedirectorService::new(Arc::clone(&store), events, settings).with_clock(clock.clone());

    let id = binder
        .bind(BindRequest::new("https://example.com"), Enforcement::STRICT, start())
        .await
        .unwrap();

    clock.advance(SignedDuration::from_secs(60));
    assert!(redirector.resolve_redirect(&id).await.unwrap().is_active());

    clock.advance(SignedDuration::from_secs(1));
    let redirect = redirector.resolve_redirect(&id).await.unwrap();
    assert_eq!(redirect.state, LifecycleState::Expired);
    assert_eq!(redirect.error(), Some(Error::UrlExpired));
    assert_eq!(redirect.target.as_deref(), Some("https://example.com/too-late"));

    drop(binder);
    drop(redirector);
    worker.join().await;
    assert_eq!(counters.count(Opcode::Insert), 1);
    assert_eq!(counters.count(Opcode::Get), 1);
    assert_eq!(counters.count(Opcode::Expired), 1);
}
