//! Presence evaluation through the wired engine.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tempfile::TempDir;

use continuity_engine::{ContinuityEngine, KeywordOverlapClassifier};
use continuity_graph::InMemorySessionStore;
use continuity_retrieval::NoRelevanceSearch;
use continuity_storage::Storage;
use continuity_topics::UpsertTopic;
use continuity_types::{ContinuityConfig, QuietHours};

fn engine() -> (ContinuityEngine, TempDir) {
    let temp = TempDir::new().unwrap();
    let storage = Arc::new(Storage::open(temp.path()).unwrap());
    let engine = ContinuityEngine::new(
        storage,
        Arc::new(InMemorySessionStore::new()),
        Arc::new(KeywordOverlapClassifier),
        Arc::new(NoRelevanceSearch),
        ContinuityConfig::default(),
    );
    (engine, temp)
}

#[test]
fn idle_tenant_with_salient_topic_gets_queued_message() {
    let (engine, _temp) = engine();
    let now = Utc::now();

    engine
        .presence()
        .record_activity("t1", now - Duration::hours(6))
        .unwrap();
    // Engagement weight (1.0 + 0.1) / 2 = 0.55 clears the 0.5 gate.
    engine
        .topics()
        .upsert(
            "t1",
            UpsertTopic::new("the garden", "interest").with_personal_weight(1.0),
        )
        .unwrap();

    let queued = engine.evaluate_presence("t1", now).unwrap();
    let queued = queued.expect("expected a proactive message");
    assert!(queued.message.contains("the garden"));

    // The message landed on the pending queue.
    let due = engine.presence().drain_due("t1", now).unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].message, queued.message);
}

#[test]
fn recently_active_tenant_is_left_alone() {
    let (engine, _temp) = engine();
    let now = Utc::now();

    engine
        .presence()
        .record_activity("t1", now - Duration::hours(1))
        .unwrap();
    engine
        .topics()
        .upsert(
            "t1",
            UpsertTopic::new("rust", "interest").with_personal_weight(0.9),
        )
        .unwrap();

    assert!(engine.evaluate_presence("t1", now).unwrap().is_none());
}

#[test]
fn no_salient_topics_means_no_contact() {
    let (engine, _temp) = engine();
    let now = Utc::now();

    engine
        .presence()
        .record_activity("t1", now - Duration::hours(12))
        .unwrap();
    // Fresh topic: engagement weight (0 + 0.1) / 2 = 0.05, under the bar.
    engine
        .topics()
        .upsert("t1", UpsertTopic::new("rust", "interest"))
        .unwrap();

    assert!(engine.evaluate_presence("t1", now).unwrap().is_none());
}

#[test]
fn quiet_hours_suppress_contact() {
    let (engine, _temp) = engine();
    let now = Utc::now();

    engine
        .presence()
        .record_activity("t1", now - Duration::hours(12))
        .unwrap();
    // A window straddling the current UTC time.
    let start = (now - Duration::hours(2)).format("%H:%M").to_string();
    let end = (now + Duration::hours(2)).format("%H:%M").to_string();
    engine
        .presence()
        .configure_quiet_hours("t1", Some(QuietHours::new(start, end, "UTC")))
        .unwrap();
    engine
        .topics()
        .upsert(
            "t1",
            UpsertTopic::new("rust", "interest").with_personal_weight(0.9),
        )
        .unwrap();

    assert!(engine.evaluate_presence("t1", now).unwrap().is_none());
}

#[test]
fn unknown_tenant_evaluates_to_nothing() {
    let (engine, _temp) = engine();
    assert!(engine.evaluate_presence("ghost", Utc::now()).unwrap().is_none());
}

#[test]
fn evaluate_all_tenants_counts_initiations() {
    let (engine, _temp) = engine();
    let now = Utc::now();

    // Tenant a: idle and salient. Tenant b: recently active.
    engine
        .presence()
        .record_activity("a", now - Duration::hours(9))
        .unwrap();
    engine
        .topics()
        .upsert(
            "a",
            UpsertTopic::new("boats", "interest").with_personal_weight(1.0),
        )
        .unwrap();
    engine.presence().record_activity("b", now).unwrap();

    let initiated = engine.evaluate_all_tenants(now).unwrap();
    assert_eq!(initiated, 1);
}

#[test]
fn decay_runs_across_tenants() {
    let (engine, _temp) = engine();

    engine
        .topics()
        .upsert("a", UpsertTopic::new("boats", "interest"))
        .unwrap();
    engine
        .topics()
        .upsert("b", UpsertTopic::new("trains", "interest"))
        .unwrap();

    // Fresh topics have nothing to decay yet.
    let updated = engine.decay_all_topics(Utc::now()).unwrap();
    assert_eq!(updated, 0);

    // A year from now everything has decayed.
    let updated = engine
        .decay_all_topics(Utc::now() + Duration::days(365))
        .unwrap();
    assert_eq!(updated, 2);
}
