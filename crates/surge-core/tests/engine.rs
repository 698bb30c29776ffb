//! End-to-end scenarios through the public client API.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rstest::rstest;
use serde_json::{Value, json};

use surge_core::app::{RunKind, SurgeClientBuilder};
use surge_core::domain::HookKind;
use surge_core::impls::NoopSleeper;
use surge_core::ports::{FixedClock, Sleeper};
use surge_core::{
    ApiCategory, BatchRange, CallError, HookError, Operation, OperationKey, SurgeClient,
    SurgeError,
};

/// Counts waits and resets instead of sleeping.
#[derive(Clone, Default)]
struct CountingSleeper {
    waits: Arc<AtomicUsize>,
    resets: Arc<AtomicUsize>,
}

impl CountingSleeper {
    fn waits(&self) -> usize {
        self.waits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sleeper for CountingSleeper {
    async fn wait(&mut self) {
        self.waits.fetch_add(1, Ordering::SeqCst);
    }

    fn reset(&mut self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

/// Echoes the variables back, fails when they are the string "fail".
async fn echo_or_fail(_query: String, variables: Value) -> Result<Value, CallError> {
    if variables == json!("fail") {
        Err(CallError::new("backend unavailable").with_status(503, "Service Unavailable"))
    } else {
        Ok(variables)
    }
}

fn range_recorder() -> (
    Arc<Mutex<Vec<BatchRange>>>,
    impl Fn(BatchRange) -> Result<(), HookError> + Send + Sync + 'static,
) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    (seen, move |range: BatchRange| {
        sink.lock().unwrap().push(range);
        Ok(())
    })
}

fn search_builder() -> SurgeClientBuilder {
    SurgeClient::builder()
        .caller(ApiCategory::SearchApi, echo_or_fail)
        .unwrap()
}

fn enqueue_all(client: &mut SurgeClient, variables: &[Value]) -> Vec<OperationKey> {
    variables
        .iter()
        .map(|v| client.enqueue().search_api("query Search", v.clone()).unwrap())
        .collect()
}

#[tokio::test]
async fn ten_successes_ramp_one_two_three_four() {
    let (ranges, on_batch_done) = range_recorder();
    let mut client = search_builder()
        .max_spawn(5)
        .initial_spawn(1)
        .sleeper(NoopSleeper)
        .on_batch_done(on_batch_done)
        .build()
        .unwrap();

    let vars: Vec<Value> = (0..10).map(|i| json!(i)).collect();
    enqueue_all(&mut client, &vars);

    let results = client.execute().await.unwrap();

    let sizes: Vec<usize> = ranges.lock().unwrap().iter().map(|r| r.len()).collect();
    assert_eq!(sizes, vec![1, 2, 3, 4]);
    assert_eq!(client.increment(), 4);
    assert_eq!(results.len(), 10);
    assert!(!client.has_failed());
    assert_eq!(client.pending(), 0);
}

#[tokio::test]
async fn failing_first_batch_backs_off_once() {
    let (ranges, on_batch_done) = range_recorder();
    let sleeper = CountingSleeper::default();
    let mut client = search_builder()
        .sleeper(sleeper.clone())
        .on_batch_done(on_batch_done)
        .build()
        .unwrap();

    let mut vars = vec![json!("fail")];
    vars.extend((1..6).map(|i| json!(i)));
    let keys = enqueue_all(&mut client, &vars);

    let results = client.execute().await.unwrap();

    let ranges = ranges.lock().unwrap();
    assert_eq!(ranges[0], BatchRange::new(0, 1));
    assert_eq!(ranges[1], BatchRange::new(1, 2));
    assert_eq!(sleeper.waits(), 1);

    assert_eq!(client.failure_count(), 1);
    assert_eq!(client.failures()[0].key(), &keys[0]);
    assert_eq!(results.len(), 5);
    assert!(!results.contains_key(keys[0].as_str()));
}

#[tokio::test]
async fn on_failure_false_suppresses_retry() {
    let mut client = search_builder()
        .sleeper(NoopSleeper)
        .on_failure(|_range: BatchRange, _error: CallError, _op: Operation| async {
            Ok::<bool, HookError>(false)
        })
        .build()
        .unwrap();

    enqueue_all(&mut client, &[json!("fail"), json!(1), json!("fail")]);
    client.execute().await.unwrap();

    assert!(!client.has_failed());
    assert_eq!(client.failure_count(), 0);
    assert_eq!(client.last_summary().unwrap().tally.failed, 2);
    assert_eq!(client.last_summary().unwrap().tally.requeued, 0);
}

#[tokio::test]
async fn on_failure_sees_error_and_original() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let mut client = search_builder()
        .sleeper(NoopSleeper)
        .before_request(|_range: BatchRange, op: Operation| async move {
            Ok::<Option<Operation>, HookError>(Some(op.with_query("mutation Replaced")))
        })
        .on_failure(move |_range: BatchRange, error: CallError, op: Operation| {
            sink.lock()
                .unwrap()
                .push((error.code, op.query().to_string()));
            async { Ok::<bool, HookError>(true) }
        })
        .build()
        .unwrap();

    enqueue_all(&mut client, &[json!("fail")]);
    client.execute().await.unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![(Some(503), "query Search".to_string())]
    );
    assert_eq!(client.failures()[0].query(), "query Search");
}

#[tokio::test]
async fn thousand_enqueues_get_distinct_keys_and_callers() {
    let mut builder = SurgeClient::builder();
    for category in ApiCategory::ALL {
        builder = builder
            .caller(category, move |_q: String, _v: Value| async move {
                Ok::<Value, CallError>(json!(category.as_str()))
            })
            .unwrap();
    }
    let mut client = builder
        .max_spawn(50)
        .sleeper(NoopSleeper)
        .expect_categories(&ApiCategory::ALL)
        .build()
        .unwrap();

    let mut keys = Vec::new();
    for i in 0..1000 {
        let mut enqueue = client.enqueue();
        let key = match i % 7 {
            0 => enqueue.catalogue_api("q", json!(i)),
            1 => enqueue.discovery_api("q", json!(i)),
            2 => enqueue.search_api("q", json!(i)),
            3 => enqueue.order_api("q", json!(i)),
            4 => enqueue.subscription_api("q", json!(i)),
            5 => enqueue.pim_api("q", json!(i)),
            _ => enqueue.next_pim_api("q", json!(i)),
        }
        .unwrap();
        keys.push(key);
    }

    let distinct: HashSet<&OperationKey> = keys.iter().collect();
    assert_eq!(distinct.len(), 1000);

    let results = client.execute().await.unwrap();
    assert_eq!(results.len(), 1000);
    for (key, value) in results.iter() {
        let category = value.as_str().unwrap();
        assert!(key.as_str().starts_with(&format!("{category}-")));
    }
}

#[tokio::test]
async fn retry_with_nothing_failed_is_a_no_op() {
    let sleeper = CountingSleeper::default();
    let mut client = search_builder()
        .sleeper(sleeper.clone())
        .build()
        .unwrap();

    enqueue_all(&mut client, &[json!(1), json!(2), json!(3)]);
    client.execute().await.unwrap();
    let increment = client.increment();

    let retried = client.retry().await.unwrap();

    assert!(retried.is_empty());
    assert!(client.last_results().is_empty());
    assert_eq!(client.increment(), increment);
    assert_eq!(sleeper.waits(), 0);
    assert_eq!(client.last_summary().unwrap().tally.batches, 0);
}

#[tokio::test]
async fn total_collapse_waits_every_batch() {
    let sleeper = CountingSleeper::default();
    let mut client = search_builder()
        .initial_spawn(2)
        .sleeper(sleeper.clone())
        .build()
        .unwrap();

    enqueue_all(&mut client, &vec![json!("fail"); 5]);
    client.execute().await.unwrap();

    // 0..2, 2..3, 3..4, 4..5
    assert_eq!(sleeper.waits(), 4);
    assert_eq!(client.increment(), 1);
    assert_eq!(client.failure_count(), 5);
    assert_eq!(client.last_summary().unwrap().tally.backoffs, 4);
}

#[tokio::test]
async fn collapse_in_the_last_batch_resets_increment() {
    let sleeper = CountingSleeper::default();
    let mut client = search_builder()
        .initial_spawn(3)
        .sleeper(sleeper.clone())
        .build()
        .unwrap();

    enqueue_all(&mut client, &vec![json!("fail"); 3]);
    client.execute().await.unwrap();

    assert_eq!(client.increment(), 1);
    assert_eq!(client.failure_count(), 3);
    assert_eq!(client.last_summary().unwrap().final_increment, 1);

    // the retry pass starts at 1, not at the pre-collapse size
    client.retry().await.unwrap();
    let tally = client.last_summary().unwrap().tally;
    assert_eq!(tally.batches, 3);
    assert_eq!(tally.backoffs, 3);
    assert_eq!(sleeper.waits(), 4);
    assert_eq!(client.increment(), 1);
}

#[tokio::test]
async fn partial_failure_in_the_last_batch_steps_down() {
    let mut client = search_builder()
        .initial_spawn(3)
        .sleeper(NoopSleeper)
        .build()
        .unwrap();

    enqueue_all(&mut client, &[json!(1), json!(2), json!("fail")]);
    let results = client.execute().await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(client.failure_count(), 1);
    assert_eq!(client.increment(), 2);
}

#[rstest]
#[case::max_one(1)]
#[case::max_three(3)]
#[case::max_eight(8)]
#[tokio::test]
async fn healthy_backend_ramps_monotonically(#[case] max_spawn: usize) {
    let (ranges, on_batch_done) = range_recorder();
    let mut client = search_builder()
        .max_spawn(max_spawn)
        .sleeper(NoopSleeper)
        .on_batch_done(on_batch_done)
        .build()
        .unwrap();

    let vars: Vec<Value> = (0..100).map(|i| json!(i)).collect();
    enqueue_all(&mut client, &vars);
    client.execute().await.unwrap();

    let ranges = ranges.lock().unwrap();
    let full: Vec<usize> = ranges[..ranges.len() - 1].iter().map(|r| r.len()).collect();
    assert!(full.windows(2).all(|w| w[0] <= w[1]));
    assert!(full.iter().all(|&size| size <= max_spawn));
    assert_eq!(client.increment(), max_spawn);
}

#[tokio::test]
async fn batch_done_error_aborts_after_merge() {
    let mut client = search_builder()
        .sleeper(NoopSleeper)
        .on_batch_done(|range: BatchRange| {
            if range.from == 3 {
                Err(HookError::new("audit sink closed"))
            } else {
                Ok(())
            }
        })
        .build()
        .unwrap();

    let vars: Vec<Value> = (0..10).map(|i| json!(i)).collect();
    enqueue_all(&mut client, &vars);

    let err = client.execute().await.unwrap_err();

    assert!(matches!(
        err,
        SurgeError::Hook {
            hook: HookKind::OnBatchDone,
            ..
        }
    ));
    // 0..1, 1..3, 3..6 merged; seek stays at 3
    assert_eq!(client.last_results().len(), 6);
    assert_eq!(client.pending(), 7);
    assert!(client.last_summary().unwrap().aborted);
}

#[tokio::test]
async fn before_request_error_discards_the_batch() {
    let mut client = search_builder()
        .sleeper(NoopSleeper)
        .before_request(|_range: BatchRange, op: Operation| async move {
            if op.key().as_str() == "searchApi-5" {
                Err(HookError::new("token expired"))
            } else {
                Ok::<Option<Operation>, HookError>(None)
            }
        })
        .build()
        .unwrap();

    let vars: Vec<Value> = (0..10).map(|i| json!(i)).collect();
    enqueue_all(&mut client, &vars);

    let err = client.execute().await.unwrap_err();

    assert_eq!(err.to_string(), "beforeRequest hook failed: token expired");
    assert_eq!(client.last_results().len(), 3);
    assert!(client.last_results().contains_key("searchApi-3"));
    assert!(!client.last_results().contains_key("searchApi-4"));
}

#[tokio::test]
async fn after_request_error_discards_the_batch() {
    let mut client = search_builder()
        .sleeper(NoopSleeper)
        .after_request(
            |_range: BatchRange, original: Operation, _key: OperationKey, _result: Value| async move {
                if original.key().as_str() == "searchApi-5" {
                    Err(HookError::new("sink rejected result"))
                } else {
                    Ok::<(), HookError>(())
                }
            },
        )
        .build()
        .unwrap();

    let vars: Vec<Value> = (0..10).map(|i| json!(i)).collect();
    enqueue_all(&mut client, &vars);

    let err = client.execute().await.unwrap_err();

    assert!(matches!(
        err,
        SurgeError::Hook {
            hook: HookKind::AfterRequest,
            ..
        }
    ));
    // 0..1 and 1..3 merged, 3..6 dropped
    assert_eq!(client.last_results().len(), 3);
    assert!(!client.last_results().contains_key("searchApi-4"));
    assert_eq!(client.pending(), 7);
    assert!(client.last_summary().unwrap().aborted);
}

#[tokio::test]
async fn on_failure_error_discards_the_batch() {
    let mut client = search_builder()
        .sleeper(NoopSleeper)
        .on_failure(|_range: BatchRange, error: CallError, _op: Operation| async move {
            Err::<bool, HookError>(HookError::with_source("failure log unavailable", error))
        })
        .build()
        .unwrap();

    let mut vars: Vec<Value> = (0..10).map(|i| json!(i)).collect();
    vars[4] = json!("fail");
    enqueue_all(&mut client, &vars);

    let err = client.execute().await.unwrap_err();

    assert!(matches!(
        err,
        SurgeError::Hook {
            hook: HookKind::OnFailure,
            ..
        }
    ));
    assert_eq!(client.last_results().len(), 3);
    assert!(client.last_results().contains_key("searchApi-3"));
    assert!(!client.has_failed());
    assert_eq!(client.pending(), 7);
}

#[tokio::test]
async fn replacement_is_attempted_but_original_is_reported() {
    let reported = Arc::new(Mutex::new(Vec::new()));
    let sink = reported.clone();
    let mut client = search_builder()
        .sleeper(NoopSleeper)
        .before_request(|_range: BatchRange, op: Operation| async move {
            let doubled = json!(op.variables().as_i64().unwrap_or(0) * 2);
            Ok::<Option<Operation>, HookError>(Some(op.with_variables(doubled)))
        })
        .after_request(
            move |_range: BatchRange, original: Operation, key: OperationKey, result: Value| {
                sink.lock()
                    .unwrap()
                    .push((key, original.variables().clone(), result));
                async { Ok::<(), HookError>(()) }
            },
        )
        .build()
        .unwrap();

    let keys = enqueue_all(&mut client, &[json!(21)]);
    let results = client.execute().await.unwrap();

    assert_eq!(results.get(keys[0].as_str()), Some(&json!(42)));
    assert_eq!(
        *reported.lock().unwrap(),
        vec![(keys[0].clone(), json!(21), json!(42))]
    );
}

#[tokio::test]
async fn retry_returns_only_the_retried_results() {
    let healthy = Arc::new(AtomicBool::new(false));
    let flag = healthy.clone();
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let mut client = SurgeClient::builder()
        .caller(ApiCategory::OrderApi, move |_q: String, v: Value| {
            let up = flag.load(Ordering::SeqCst);
            async move {
                let odd = v.as_i64().unwrap_or(0) % 2 == 1;
                if odd && !up {
                    Err(CallError::new("flaky"))
                } else {
                    Ok(v)
                }
            }
        })
        .unwrap()
        .sleeper(NoopSleeper)
        .clock(FixedClock::new(at))
        .build()
        .unwrap();

    for i in 0..4 {
        client.enqueue().order_api("mutation Place", json!(i)).unwrap();
    }

    let mut results = client.execute().await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(client.failure_count(), 2);

    healthy.store(true, Ordering::SeqCst);
    let retried = client.retry().await.unwrap();

    let mut retried_keys: Vec<&str> = retried.keys().map(|k| k.as_str()).collect();
    retried_keys.sort();
    assert_eq!(retried_keys, vec!["orderApi-2", "orderApi-4"]);
    assert!(!client.has_failed());

    let summary = client.last_summary().unwrap();
    assert_eq!(summary.kind, RunKind::Retry);
    assert_eq!(summary.started_at, at);
    assert_eq!(summary.tally.attempted, 2);
    assert_eq!(summary.tally.succeeded, 2);

    results.merge(retried);
    assert_eq!(results.len(), 4);
}

#[tokio::test]
async fn increment_carries_into_the_next_run() {
    let (ranges, on_batch_done) = range_recorder();
    let mut client = search_builder()
        .sleeper(NoopSleeper)
        .on_batch_done(on_batch_done)
        .build()
        .unwrap();

    enqueue_all(&mut client, &[json!(1), json!(2), json!(3)]);
    client.execute().await.unwrap();
    assert_eq!(client.increment(), 2);

    ranges.lock().unwrap().clear();
    client.execute().await.unwrap();

    assert_eq!(ranges.lock().unwrap()[0], BatchRange::new(0, 2));
}

#[tokio::test]
async fn sleeper_resets_after_a_partial_success() {
    let sleeper = CountingSleeper::default();
    let mut client = search_builder()
        .sleeper(sleeper.clone())
        .build()
        .unwrap();

    enqueue_all(&mut client, &[json!("fail"), json!(1), json!(2)]);
    client.execute().await.unwrap();

    assert_eq!(sleeper.waits(), 1);
    assert_eq!(sleeper.resets.load(Ordering::SeqCst), 2);
}
