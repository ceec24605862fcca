//! Integration tests for the session store and its change fan-out.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use claude_monitor::store::{
    MessageRole, ModelRates, PricingTable, PricingTier, SessionStatus, SessionStore, StoreConfig,
    TokenDelta,
};

type EventLog = Arc<Mutex<Vec<(String, String)>>>;

fn at(offset_secs: i64) -> DateTime<Utc> {
    "2026-08-24T12:00:00Z".parse::<DateTime<Utc>>().unwrap() + Duration::seconds(offset_secs)
}

/// Register a collector that records (kind, session id) for every event.
fn collect_events(store: &mut SessionStore) -> EventLog {
    let collected: EventLog = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&collected);
    store.subscribe(move |event| {
        sink.lock()
            .unwrap()
            .push((event.kind().to_string(), event.session_id().to_string()));
        Ok(())
    });
    collected
}

#[test]
fn test_full_lifecycle_event_sequence() {
    let mut store = SessionStore::new(StoreConfig::default());
    let collected = collect_events(&mut store);

    store.get_or_create("sess-1", at(0));
    store.set_prompt("sess-1", "run the benchmarks", at(1));
    store.start_tool("sess-1", "Bash", Some("cargo bench".to_string()), at(2));
    store.complete_tool("sess-1", false, at(3));
    store.complete_session("sess-1", at(4));

    let events = collected.lock().unwrap();
    let kinds: Vec<&str> = events.iter().map(|(kind, _)| kind.as_str()).collect();
    assert_eq!(
        kinds,
        ["created", "updated", "tool-started", "tool-completed", "completed"]
    );
    assert!(events.iter().all(|(_, id)| id == "sess-1"));

    let session = store.get("sess-1").unwrap();
    assert_eq!(session.status, SessionStatus::Completed);
    assert!(session.current_tool.is_none());
    assert_eq!(session.tool_history.len(), 1);
    assert_eq!(session.last_activity, at(4));
}

#[test]
fn test_sweep_idles_removes_and_revival() {
    let config = StoreConfig {
        idle_threshold: Duration::seconds(10),
        removal_timeout: Duration::seconds(60),
        ..StoreConfig::default()
    };
    let mut store = SessionStore::new(config);
    store.get_or_create("ancient", at(-120));
    store.get_or_create("dozing", at(-15));
    store.get_or_create("fresh", at(0));

    let collected = collect_events(&mut store);
    store.sweep(at(0));

    {
        let events = collected.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                ("removed".to_string(), "ancient".to_string()),
                ("updated".to_string(), "dozing".to_string()),
            ]
        );
    }
    assert!(!store.contains("ancient"));
    assert_eq!(store.get("dozing").unwrap().status, SessionStatus::Idle);
    assert_eq!(store.get("fresh").unwrap().status, SessionStatus::Active);

    // Fresh activity flips the idle session straight back to active
    store.keep_alive("dozing", at(5));
    assert_eq!(store.get("dozing").unwrap().status, SessionStatus::Active);
}

#[test]
fn test_open_tool_defers_idling() {
    let config = StoreConfig {
        idle_threshold: Duration::seconds(10),
        ..StoreConfig::default()
    };
    let mut store = SessionStore::new(config);
    store.get_or_create("sess-1", at(0));
    store.start_tool("sess-1", "Bash", Some("sleep 600".to_string()), at(0));

    // Well past the idle threshold, but the tool is still running
    store.sweep(at(45));
    assert_eq!(store.get("sess-1").unwrap().status, SessionStatus::Active);

    store.complete_tool("sess-1", false, at(0));
    store.sweep(at(45));
    assert_eq!(store.get("sess-1").unwrap().status, SessionStatus::Idle);
}

#[test]
fn test_failing_subscriber_leaves_state_and_later_subscribers_intact() {
    let mut store = SessionStore::new(StoreConfig::default());
    store.subscribe(|_| Err("sink unavailable".into()));
    let collected = collect_events(&mut store);

    store.get_or_create("sess-1", at(0));
    store.set_prompt("sess-1", "inspect the cache layer", at(1));

    let session = store.get("sess-1").unwrap();
    assert_eq!(
        session.last_prompt.as_deref(),
        Some("inspect the cache layer")
    );

    let events = collected.lock().unwrap();
    let kinds: Vec<&str> = events.iter().map(|(kind, _)| kind.as_str()).collect();
    assert_eq!(kinds, ["created", "updated"]);
}

#[test]
fn test_custom_pricing_table_drives_cost() {
    let pricing = PricingTable {
        tiers: vec![PricingTier {
            needle: "sonnet".to_string(),
            rates: ModelRates {
                input_cost_per_token: 2e-6,
                output_cost_per_token: 4e-6,
                cache_read_cost_per_token: 1e-7,
                cache_creation_cost_per_token: 5e-7,
            },
        }],
        fallback: ModelRates::default(),
    };
    let config = StoreConfig {
        pricing,
        ..StoreConfig::default()
    };
    let mut store = SessionStore::new(config);
    store.get_or_create("sess-1", at(0));
    store.set_model("sess-1", "claude-sonnet-4-5", at(0));

    let delta = TokenDelta {
        input: 1_000,
        output: 500,
        cache_read: 10_000,
        cache_creation: 2_000,
    };
    store.add_tokens("sess-1", delta, at(1));

    let session = store.get("sess-1").unwrap();
    // 0.002 + 0.002 + 0.001 + 0.001 dollars
    assert!((session.estimated_cost - 0.006).abs() < 1e-9);
    // Cache counters never inflate the displayed total
    assert_eq!(session.tokens.total, 1_500);

    store.add_tokens("sess-1", delta, at(2));
    let session = store.get("sess-1").unwrap();
    assert!((session.estimated_cost - 0.012).abs() < 1e-9);
    assert_eq!(session.tokens.total, 3_000);
}

#[test]
fn test_bounded_logs_under_sustained_load() {
    let config = StoreConfig {
        max_tool_history: 3,
        max_messages: 4,
        ..StoreConfig::default()
    };
    let mut store = SessionStore::new(config);
    store.get_or_create("sess-1", at(0));

    for i in 0..10 {
        store.append_message("sess-1", MessageRole::User, &format!("message {i}"), at(i));
        store.start_tool("sess-1", &format!("Tool{i}"), None, at(i));
        store.complete_tool("sess-1", false, at(i));
    }

    let session = store.get("sess-1").unwrap();
    // Messages read oldest-first and evict from the front
    assert_eq!(session.messages.len(), 4);
    assert_eq!(session.messages.front().unwrap().content, "message 6");
    assert_eq!(session.messages.back().unwrap().content, "message 9");
    // Tool history reads newest-first and evicts from the back
    assert_eq!(session.tool_history.len(), 3);
    assert_eq!(session.tool_history.front().unwrap().name, "Tool9");
    assert_eq!(session.tool_history.back().unwrap().name, "Tool7");
}

#[test]
fn test_listings_order_by_recency_and_status() {
    let mut store = SessionStore::new(StoreConfig::default());
    store.get_or_create("alpha", at(0));
    store.get_or_create("beta", at(10));
    store.get_or_create("gamma", at(5));
    store.complete_session("beta", at(10));

    let all: Vec<String> = store
        .list_all()
        .into_iter()
        .map(|session| session.id)
        .collect();
    assert_eq!(all, ["beta", "gamma", "alpha"]);

    let active: Vec<String> = store
        .list_active()
        .into_iter()
        .map(|session| session.id)
        .collect();
    assert_eq!(active, ["gamma", "alpha"]);
}
