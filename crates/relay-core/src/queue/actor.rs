//! Queue actor: single-flight processing, backoff retries, terminal
//! broadcast.
//!
//! All mutable queue state lives in [`QueueActor`] and is touched only by its
//! own task; callers reach it through [`QueueCommand`]. Transport execution
//! and backoff sleeps run in spawned tasks, so a slow request or a waiting
//! retry never blocks new enqueues.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::domain::{QueueFailure, QueuedRequest, QueuedRequestResult};
use crate::fanout::Fanout;
use crate::ports::{QueueStore, Transport};

use super::retry::RetryPolicy;
use super::QueueStatus;

pub(super) enum QueueCommand {
    Enqueue {
        request: QueuedRequest,
        reply: oneshot::Sender<()>,
    },
    Configure,
    Subscribe {
        reply: oneshot::Sender<mpsc::UnboundedReceiver<QueuedRequestResult>>,
    },
    Status {
        reply: oneshot::Sender<QueueStatus>,
    },
    /// Internal: a spawned execution came back.
    Resolved {
        request: QueuedRequest,
        outcome: Result<Vec<u8>, QueueFailure>,
    },
    /// Internal: a backoff delay elapsed; the bumped copy rejoins at the head.
    Reinsert { request: QueuedRequest },
}

pub(super) struct QueueActor {
    pending: VecDeque<QueuedRequest>,
    processing: bool,
    configured: bool,
    subscribers: Fanout<QueuedRequestResult>,
    transport: Arc<dyn Transport>,
    store: Arc<dyn QueueStore>,
    policy: RetryPolicy,
    command_rx: mpsc::Receiver<QueueCommand>,
    /// Cloned into spawned tasks so results and due retries find their way
    /// back into the serialized loop.
    command_tx: mpsc::Sender<QueueCommand>,
}

impl QueueActor {
    pub(super) fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn QueueStore>,
        policy: RetryPolicy,
        command_rx: mpsc::Receiver<QueueCommand>,
        command_tx: mpsc::Sender<QueueCommand>,
    ) -> Self {
        Self {
            pending: VecDeque::new(),
            processing: false,
            configured: false,
            subscribers: Fanout::new(),
            transport,
            store,
            policy,
            command_rx,
            command_tx,
        }
    }

    pub(super) async fn run(mut self) {
        self.pending = self.store.load().await.into();
        debug!(pending = self.pending.len(), "request queue started");

        while let Some(command) = self.command_rx.recv().await {
            self.handle(command).await;
        }
        debug!("request queue stopped");
    }

    async fn handle(&mut self, command: QueueCommand) {
        match command {
            QueueCommand::Enqueue { request, reply } => {
                debug!(id = %request.id(), event_type = %request.event_type(), "enqueue");
                self.pending.push_back(request);
                self.persist().await;
                let _ = reply.send(());
                self.drain().await;
            }
            QueueCommand::Configure => {
                if !self.configured {
                    self.configured = true;
                    debug!("queue configured, draining");
                    self.drain().await;
                }
            }
            QueueCommand::Subscribe { reply } => {
                let _ = reply.send(self.subscribers.subscribe());
            }
            QueueCommand::Status { reply } => {
                let _ = reply.send(QueueStatus {
                    pending: self.pending.len(),
                    processing: self.processing,
                    configured: self.configured,
                });
            }
            QueueCommand::Resolved { request, outcome } => {
                self.resolve(request, outcome).await;
            }
            QueueCommand::Reinsert { request } => {
                debug!(
                    id = %request.id(),
                    retry_count = request.retry_count(),
                    "retry due, rejoining at the head"
                );
                self.pending.push_front(request);
                self.persist().await;
                self.drain().await;
            }
        }
    }

    /// Start executing the head item unless one is already in flight.
    async fn drain(&mut self) {
        if self.processing || !self.configured {
            return;
        }
        let Some(request) = self.pending.pop_front() else {
            return;
        };
        // Persist the post-removal snapshot before execution: a crash while
        // the request is in flight drops it instead of replaying it.
        self.persist().await;
        self.processing = true;

        let transport = Arc::clone(&self.transport);
        let tx = self.command_tx.clone();
        tokio::spawn(async move {
            let outcome = transport.execute(&request).await;
            let _ = tx.send(QueueCommand::Resolved { request, outcome }).await;
        });
    }

    async fn resolve(&mut self, request: QueuedRequest, outcome: Result<Vec<u8>, QueueFailure>) {
        self.processing = false;
        match outcome {
            Ok(bytes) => {
                debug!(id = %request.id(), event_type = %request.event_type(), "request succeeded");
                self.subscribers.send(&QueuedRequestResult::success(
                    request.event_type(),
                    request.retry_count(),
                    bytes,
                ));
            }
            Err(failure) => {
                let will_retry = self.policy.should_retry(request.retry_count());
                warn!(
                    id = %request.id(),
                    event_type = %request.event_type(),
                    retry_count = request.retry_count(),
                    will_retry,
                    "request failed: {failure}"
                );
                self.subscribers.send(&QueuedRequestResult::failure(
                    request.event_type(),
                    request.retry_count(),
                    failure,
                    will_retry,
                ));
                if will_retry {
                    let retry = request.bump_retry();
                    let delay = self.policy.delay_for(retry.retry_count());
                    let tx = self.command_tx.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = tx.send(QueueCommand::Reinsert { request: retry }).await;
                    });
                }
            }
        }
        // Whatever happened to the head, unrelated queued work goes next.
        self.drain().await;
    }

    async fn persist(&self) {
        let pending: Vec<QueuedRequest> = self.pending.iter().cloned().collect();
        if let Err(error) = self.store.persist(&pending).await {
            warn!(%error, "queue snapshot write failed");
        }
    }
}
