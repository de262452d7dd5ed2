//! In-memory worker for transport and client tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use serde_json::{json, Value};
use tokio::io::{duplex, AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines};

use deltabot_runtime::Rpc;

const PIPE_CAPACITY: usize = 64 * 1024;

/// Worker end of the pipes, driven by the test itself.
pub struct WorkerSide {
    requests: Lines<BufReader<DuplexStream>>,
    output: DuplexStream,
}

impl WorkerSide {
    /// Next request sent by the transport; `None` once its stdin is closed.
    pub async fn next_request(&mut self) -> Option<Value> {
        let line = self.requests.next_line().await.unwrap()?;
        Some(serde_json::from_str(&line).unwrap())
    }

    pub async fn send_raw(&mut self, line: &str) {
        self.output.write_all(line.as_bytes()).await.unwrap();
        self.output.write_all(b"\n").await.unwrap();
        self.output.flush().await.unwrap();
    }

    pub async fn reply(&mut self, id: u64, result: Value) {
        self.send_raw(&json!({"jsonrpc": "2.0", "id": id, "result": result}).to_string())
            .await;
    }

    pub async fn reply_error(&mut self, id: u64, code: i64, message: &str) {
        let line = json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {"code": code, "message": message}
        });
        self.send_raw(&line.to_string()).await;
    }

    /// Read until the transport closes stdin, then close stdout.
    pub async fn drain(mut self) -> Vec<Value> {
        let mut seen = Vec::new();
        while let Some(req) = self.next_request().await {
            seen.push(req);
        }
        seen
    }
}

/// Transport connected to a worker the test drives by hand.
pub fn manual_worker() -> (Rpc, WorkerSide) {
    let (rpc_out, worker_in) = duplex(PIPE_CAPACITY);
    let (worker_out, rpc_in) = duplex(PIPE_CAPACITY);
    let rpc = Rpc::from_io(rpc_in, rpc_out);
    let side = WorkerSide {
        requests: BufReader::new(worker_in).lines(),
        output: worker_out,
    };
    (rpc, side)
}

/// Transport connected to a worker answering through `script`.
///
/// `script(method, params)` returns the result to send back, or `None` to
/// leave the request unanswered. The worker exits when its stdin closes.
pub fn scripted_worker<F>(mut script: F) -> Rpc
where
    F: FnMut(&str, &[Value]) -> Option<Value> + Send + 'static,
{
    let (rpc, mut side) = manual_worker();
    tokio::spawn(async move {
        while let Some(req) = side.next_request().await {
            let id = req["id"].as_u64().unwrap();
            let method = req["method"].as_str().unwrap().to_string();
            let params = req["params"].as_array().cloned().unwrap_or_default();
            if let Some(result) = script(&method, &params) {
                side.reply(id, result).await;
            }
        }
    });
    rpc
}
