#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use std::time::Duration;

use serde_json::{json, Value};

use deltabot_core::BotError;
use deltabot_runtime::config::WorkerConfig;
use deltabot_runtime::Rpc;

use common::{manual_worker, scripted_worker};

#[tokio::test]
async fn replies_in_reverse_order_reach_their_callers() {
    let (rpc, mut worker) = manual_worker();

    let calls: Vec<_> = (0..8u32)
        .map(|i| {
            let rpc = rpc.clone();
            tokio::spawn(async move { (i, rpc.call("echo", vec![json!(i)]).await) })
        })
        .collect();

    let mut reqs = Vec::new();
    for _ in 0..8 {
        reqs.push(worker.next_request().await.unwrap());
    }
    let mut ids: Vec<u64> = reqs.iter().map(|r| r["id"].as_u64().unwrap()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 8, "ids must be unique");
    assert!(ids[0] >= 1);

    for req in reqs.iter().rev() {
        assert_eq!(req["jsonrpc"], "2.0");
        let id = req["id"].as_u64().unwrap();
        worker.reply(id, json!({"echoed": req["params"][0]})).await;
    }

    for call in calls {
        let (i, res) = call.await.unwrap();
        let value = res.unwrap();
        assert_eq!(value.get("echoed"), Some(&json!(i)));
    }
}

#[tokio::test]
async fn unknown_and_missing_ids_are_dropped() {
    let (rpc, mut worker) = manual_worker();
    let pending = tokio::spawn({
        let rpc = rpc.clone();
        async move { rpc.call("get_system_info", vec![]).await }
    });

    let req = worker.next_request().await.unwrap();
    let id = req["id"].as_u64().unwrap();
    worker.reply(id + 100, json!("stray")).await;
    worker.send_raw(r#"{"jsonrpc":"2.0","result":"no id"}"#).await;
    worker
        .reply(id, json!({"deltachatCoreVersion": "v1.0.0"}))
        .await;

    let info = pending.await.unwrap().unwrap();
    assert_eq!(info.str_field("deltachat_core_version"), Some("v1.0.0"));
    assert!(!rpc.is_closed());
}

#[tokio::test]
async fn non_integer_ids_do_not_tear_down_the_reader() {
    let (rpc, mut worker) = manual_worker();
    let pending = tokio::spawn({
        let rpc = rpc.clone();
        async move { rpc.call("get_system_info", vec![]).await }
    });

    let req = worker.next_request().await.unwrap();
    worker.send_raw(r#"{"jsonrpc":"2.0","id":"stray","result":1}"#).await;
    worker.send_raw(r#"{"jsonrpc":"2.0","id":-1,"result":1}"#).await;
    worker.send_raw(r#"{"jsonrpc":"2.0","id":1.5,"result":1}"#).await;
    worker
        .reply(req["id"].as_u64().unwrap(), json!({"deltachatCoreVersion": "v2"}))
        .await;

    let info = pending.await.unwrap().unwrap();
    assert_eq!(info.str_field("deltachat_core_version"), Some("v2"));
    assert!(!rpc.is_closed());
}

#[tokio::test]
async fn abandoned_call_leaves_no_pending_entry() {
    let (rpc, mut worker) = manual_worker();

    let gave_up = tokio::time::timeout(
        Duration::from_millis(50),
        rpc.call("get_next_event", vec![]),
    )
    .await;
    assert!(gave_up.is_err());
    assert_eq!(rpc.pending_calls(), 0);

    // the late reply is dropped as unknown and the transport stays usable
    let stale = worker.next_request().await.unwrap();
    worker.reply(stale["id"].as_u64().unwrap(), json!({"kind": "Info"})).await;

    let next = tokio::spawn({
        let rpc = rpc.clone();
        async move { rpc.call("get_all_account_ids", vec![]).await }
    });
    let req = worker.next_request().await.unwrap();
    assert_eq!(req["method"], "get_all_account_ids");
    worker.reply(req["id"].as_u64().unwrap(), json!([1])).await;
    let ids: Vec<u32> = next.await.unwrap().unwrap().deserialize().unwrap();
    assert_eq!(ids, vec![1]);
    assert!(!rpc.is_closed());
}

#[tokio::test]
async fn remote_error_only_fails_its_caller() {
    let (rpc, mut worker) = manual_worker();
    let bad = tokio::spawn({
        let rpc = rpc.clone();
        async move { rpc.call("get_config", vec![json!(1), json!("nope")]).await }
    });
    let good = tokio::spawn({
        let rpc = rpc.clone();
        async move { rpc.call("get_all_account_ids", vec![]).await }
    });

    for _ in 0..2 {
        let req = worker.next_request().await.unwrap();
        let id = req["id"].as_u64().unwrap();
        if req["method"] == "get_config" {
            worker.reply_error(id, -1, "unknown key").await;
        } else {
            worker.reply(id, json!([1, 2])).await;
        }
    }

    match bad.await.unwrap() {
        Err(BotError::Remote { code, message }) => {
            assert_eq!(code, -1);
            assert_eq!(message, "unknown key");
        }
        other => panic!("expected remote error, got {other:?}"),
    }
    let ids: Vec<u32> = good.await.unwrap().unwrap().deserialize().unwrap();
    assert_eq!(ids, vec![1, 2]);
}

#[tokio::test]
async fn close_fails_every_pending_call() {
    let rpc = scripted_worker(|method, _| match method {
        "stop_io_for_all_accounts" => Some(Value::Null),
        _ => None,
    });

    let calls: Vec<_> = (0..5)
        .map(|_| {
            let rpc = rpc.clone();
            tokio::spawn(async move { rpc.call("get_next_event", vec![]).await })
        })
        .collect();
    tokio::time::sleep(Duration::from_millis(20)).await;

    tokio::time::timeout(Duration::from_secs(5), rpc.close())
        .await
        .expect("close must not hang")
        .unwrap();
    assert!(rpc.is_closed());

    for call in calls {
        let err = call.await.unwrap().unwrap_err();
        assert_eq!(err.kind().as_str(), "TRANSPORT_CLOSED");
    }

    let err = rpc.call("get_system_info", vec![]).await.unwrap_err();
    assert!(matches!(err, BotError::TransportClosed));

    // second close is a no-op
    rpc.close().await.unwrap();
}

#[tokio::test]
async fn close_flushes_queued_requests_and_asks_worker_to_stop() {
    let (rpc, worker) = manual_worker();
    let seen = tokio::spawn(worker.drain());

    let queued = tokio::spawn({
        let rpc = rpc.clone();
        async move { rpc.call("start_io_for_all_accounts", vec![]).await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    rpc.close().await.unwrap();

    let methods: Vec<String> = seen
        .await
        .unwrap()
        .into_iter()
        .map(|r| r["method"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        methods,
        vec!["start_io_for_all_accounts", "stop_io_for_all_accounts"]
    );
    assert!(matches!(queued.await.unwrap(), Err(BotError::TransportClosed)));
}

#[tokio::test]
async fn worker_exit_fails_pending_calls() {
    let (rpc, mut worker) = manual_worker();
    let pending = tokio::spawn({
        let rpc = rpc.clone();
        async move { rpc.call("get_next_event", vec![]).await }
    });
    worker.next_request().await.unwrap();
    drop(worker);

    let err = pending.await.unwrap().unwrap_err();
    assert!(matches!(err, BotError::TransportClosed));
    assert!(rpc.is_closed());
    assert!(matches!(
        rpc.call("get_system_info", vec![]).await,
        Err(BotError::TransportClosed)
    ));
}

#[tokio::test]
async fn malformed_line_tears_down_the_reader() {
    let (rpc, mut worker) = manual_worker();
    let pending = tokio::spawn({
        let rpc = rpc.clone();
        async move { rpc.call("get_system_info", vec![]).await }
    });
    worker.next_request().await.unwrap();
    worker.send_raw("{not json").await;

    let err = pending.await.unwrap().unwrap_err();
    assert!(matches!(err, BotError::TransportClosed));
}

#[tokio::test]
async fn generated_wrappers_send_positional_params() {
    let (rpc, mut worker) = manual_worker();
    let call = tokio::spawn({
        let rpc = rpc.clone();
        async move { rpc.misc_send_text_message(3, 12, "hi").await }
    });
    let req = worker.next_request().await.unwrap();
    assert_eq!(req["method"], "misc_send_text_message");
    assert_eq!(req["params"], json!([3, 12, "hi"]));
    worker.reply(req["id"].as_u64().unwrap(), json!(99)).await;
    let msg_id: u32 = call.await.unwrap().unwrap().deserialize().unwrap();
    assert_eq!(msg_id, 99);
}

#[tokio::test]
async fn spawn_reports_missing_program() {
    let cfg = WorkerConfig {
        program: "/nonexistent/deltachat-rpc-server".into(),
        ..WorkerConfig::default()
    };
    let err = Rpc::spawn(&cfg, false).unwrap_err();
    assert_eq!(err.kind().as_str(), "IO");
}

// `cat` echoes each request back; an echoed request has an id but neither
// result nor error, which reads as a null result.
#[cfg(unix)]
#[tokio::test]
async fn child_process_round_trip() {
    let cfg = WorkerConfig {
        program: "cat".into(),
        ..WorkerConfig::default()
    };
    let rpc = Rpc::spawn(&cfg, false).unwrap();
    let value = rpc.call("get_system_info", vec![]).await.unwrap();
    assert!(value.is_null());

    tokio::time::timeout(Duration::from_secs(5), rpc.close())
        .await
        .expect("close must not hang")
        .unwrap();
    assert!(rpc.is_closed());
}
