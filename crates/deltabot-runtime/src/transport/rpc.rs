//! `Rpc`: concurrent method calls over one duplex line stream.
//!
//! - Ids come from one counter starting at 1 and are never reused.
//! - The pending table maps id -> one-shot completion; the reader task is
//!   the only fulfiller, and it fails every entry when the stream ends.
//! - The writer task is the only writer; an unbounded queue keeps requests
//!   whole and in submission order.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::Child;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;

use deltabot_core::error::{BotError, Result};
use deltabot_core::protocol::rpc::{encode_request, Reply, Request};
use deltabot_core::NormalizedValue;

use crate::config::schema::WorkerConfig;
use crate::transport::{codec, process};

/// Writer queue item. `Shutdown` ends the writer and closes the worker's stdin.
#[derive(Debug)]
enum Outgoing {
    Line(String),
    Shutdown,
}

/// Correlation table shared by callers and the reader task.
#[derive(Default)]
struct PendingTable {
    calls: DashMap<u64, oneshot::Sender<Reply>>,
    closed: AtomicBool,
}

impl PendingTable {
    /// Returns false when no call waits for `id`.
    fn fulfill(&self, id: u64, reply: Reply) -> bool {
        match self.calls.remove(&id) {
            Some((_, tx)) => {
                // the caller may have given up on the reply
                let _ = tx.send(reply);
                true
            }
            None => false,
        }
    }

    /// Fail every pending call; later inserts observe `closed`.
    fn fail_all(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let ids: Vec<u64> = self.calls.iter().map(|e| *e.key()).collect();
        for id in ids {
            if let Some((_, tx)) = self.calls.remove(&id) {
                let _ = tx.send(Err(BotError::TransportClosed));
            }
        }
    }
}

/// Removes the caller's entry when its `call()` future is dropped before
/// the reply arrived. Ids are never reused, so removing after fulfillment
/// is a no-op.
struct PendingSlot<'a> {
    id: u64,
    pending: &'a PendingTable,
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        if self.pending.calls.remove(&self.id).is_some() {
            tracing::trace!(id = self.id, "abandoned call removed");
        }
    }
}

struct Tasks {
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
    child: Option<Child>,
}

struct RpcInner {
    next_id: AtomicU64,
    pending: Arc<PendingTable>,
    outgoing: mpsc::UnboundedSender<Outgoing>,
    closing: AtomicBool,
    tasks: Mutex<Option<Tasks>>,
}

/// Cloneable handle to the worker transport.
#[derive(Clone)]
pub struct Rpc {
    inner: Arc<RpcInner>,
}

impl std::fmt::Debug for Rpc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rpc")
            .field("pending", &self.inner.pending.calls.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Rpc {
    /// Launch the worker process and start both pipe tasks.
    pub fn spawn(cfg: &WorkerConfig, show_stderr: bool) -> Result<Self> {
        let mut child = process::spawn_worker(cfg, show_stderr)?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| BotError::Internal("worker stdin not piped".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BotError::Internal("worker stdout not piped".into()))?;
        Ok(Self::start(stdout, stdin, Some(child)))
    }

    /// Build a transport over an arbitrary byte stream pair.
    ///
    /// `reader` carries worker output, `writer` worker input. Must be called
    /// inside a tokio runtime.
    pub fn from_io<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        Self::start(reader, writer, None)
    }

    fn start<R, W>(reader: R, writer: W, child: Option<Child>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let pending = Arc::new(PendingTable::default());
        let (tx, rx) = mpsc::unbounded_channel();

        let reader = tokio::spawn(reader_loop(reader, Arc::clone(&pending)));
        let writer = tokio::spawn(writer_loop(writer, rx));

        Self {
            inner: Arc::new(RpcInner {
                next_id: AtomicU64::new(1),
                pending,
                outgoing: tx,
                closing: AtomicBool::new(false),
                tasks: Mutex::new(Some(Tasks {
                    reader,
                    writer,
                    child,
                })),
            }),
        }
    }

    /// True once `close()` started or the reader task ended.
    pub fn is_closed(&self) -> bool {
        self.inner.closing.load(Ordering::SeqCst) || self.inner.pending.closed.load(Ordering::SeqCst)
    }

    /// Call `method` with positional `params` and wait for its reply.
    ///
    /// There is no timeout: the call ends with the reply, or with
    /// `TransportClosed` when the worker output ends first.
    pub async fn call(&self, method: &str, params: Vec<Value>) -> Result<NormalizedValue> {
        if self.inner.closing.load(Ordering::SeqCst) {
            return Err(BotError::TransportClosed);
        }
        let (id, rx) = self.enqueue(method, &params)?;
        let _slot = PendingSlot {
            id,
            pending: &self.inner.pending,
        };
        let value = rx.await.map_err(|_| BotError::TransportClosed)??;
        Ok(NormalizedValue::new(value))
    }

    /// Calls waiting for a reply.
    pub fn pending_calls(&self) -> usize {
        self.inner.pending.calls.len()
    }

    /// `call` followed by deserialization of the normalized result.
    pub async fn call_as<T: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> Result<T> {
        self.call(method, params).await?.deserialize()
    }

    fn enqueue(&self, method: &str, params: &[Value]) -> Result<(u64, oneshot::Receiver<Reply>)> {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        let line = encode_request(&Request::new(id, method, params))?;

        let (tx, rx) = oneshot::channel();
        let pending = &self.inner.pending;
        pending.calls.insert(id, tx);
        if pending.closed.load(Ordering::SeqCst) {
            pending.calls.remove(&id);
            return Err(BotError::TransportClosed);
        }
        if self.inner.outgoing.send(Outgoing::Line(line)).is_err() {
            pending.calls.remove(&id);
            return Err(BotError::TransportClosed);
        }
        tracing::trace!(id, method, "request queued");
        Ok((id, rx))
    }

    /// Shut the transport down.
    ///
    /// Asks the worker to stop background io, lets the writer flush every
    /// queued request and close the worker's stdin, then joins the reader,
    /// the writer and the worker process. Calls still pending fail with
    /// `TransportClosed`. A second `close()` returns immediately.
    pub async fn close(&self) -> Result<()> {
        self.inner.closing.store(true, Ordering::SeqCst);
        let Some(tasks) = self.inner.tasks.lock().await.take() else {
            return Ok(());
        };

        // reply not awaited: the worker may never answer
        if let Err(e) = self.enqueue("stop_io_for_all_accounts", &[]) {
            tracing::debug!(error = %e, "stop_io not sent");
        }
        let _ = self.inner.outgoing.send(Outgoing::Shutdown);

        let reader = tasks.reader.await;
        let writer = tasks.writer.await;
        if let Some(mut child) = tasks.child {
            let status = child.wait().await?;
            tracing::debug!(%status, "worker exited");
        }
        self.inner.pending.fail_all();

        reader.map_err(|e| BotError::Internal(format!("reader task failed: {e}")))?;
        writer.map_err(|e| BotError::Internal(format!("writer task failed: {e}")))?;
        Ok(())
    }
}

async fn reader_loop<R>(reader: R, pending: Arc<PendingTable>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut line = String::new();
    loop {
        match codec::read_response(&mut reader, &mut line).await {
            Ok(Some(resp)) => match resp.request_id() {
                Some(id) => {
                    if !pending.fulfill(id, resp.into_reply()) {
                        tracing::warn!(id, "response for unknown request id dropped");
                    }
                }
                None => tracing::warn!(id = ?resp.id, "response without usable id dropped"),
            },
            Ok(None) => {
                tracing::debug!("worker output closed");
                break;
            }
            Err(e) => {
                tracing::error!(error = %e, kind = e.kind().as_str(), "reader loop died");
                break;
            }
        }
    }
    pending.fail_all();
}

async fn writer_loop<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<Outgoing>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(item) = rx.recv().await {
        match item {
            Outgoing::Line(line) => {
                if let Err(e) = codec::write_line(&mut writer, &line).await {
                    tracing::error!(error = %e, "writer loop died");
                    break;
                }
            }
            Outgoing::Shutdown => break,
        }
    }
    if let Err(e) = writer.shutdown().await {
        tracing::debug!(error = %e, "worker stdin already closed");
    }
}
