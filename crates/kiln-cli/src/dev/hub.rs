//! Client registry for live reload.
//!
//! The [`Hub`] runs as its own task and is the only owner of the connected
//! client set and of the last build failure. Everything else talks to it
//! through a cloneable [`HubHandle`], which turns each call into a
//! [`HubCommand`] and waits for the reply. Commands are handled one at a
//! time, so membership changes and broadcasts are totally ordered.

use crate::dev::protocol::{BuildOutcome, ReloadMessage};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Capacity of the command channel feeding the control loop.
const COMMAND_QUEUE: usize = 64;

/// Unique identity of one connected browser tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(Uuid);

impl ClientId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered client: its identity and the sending half of its outbound queue.
///
/// Dropping the `Client` closes the queue, which tells the connection task
/// to close the socket.
#[derive(Debug)]
pub struct Client {
    id: ClientId,
    sender: mpsc::Sender<ReloadMessage>,
}

impl Client {
    /// Create a client with a bounded outbound queue of `capacity` messages.
    ///
    /// Returns the receiving half for the connection task.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ReloadMessage>) {
        Self::with_id(ClientId::new(), capacity)
    }

    pub fn with_id(id: ClientId, capacity: usize) -> (Self, mpsc::Receiver<ReloadMessage>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { id, sender }, receiver)
    }

    pub fn id(&self) -> ClientId {
        self.id
    }
}

/// Result of one broadcast pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastReport {
    /// Clients whose queue accepted the message
    pub delivered: usize,
    /// Clients removed because their queue was full or closed
    pub dropped: usize,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HubError {
    #[error("live-reload hub is not running")]
    Closed,
}

/// Requests processed by the control loop.
#[derive(Debug)]
pub enum HubCommand {
    Register {
        client: Client,
        reply: oneshot::Sender<bool>,
    },
    Unregister {
        id: ClientId,
        reply: oneshot::Sender<bool>,
    },
    Broadcast {
        message: ReloadMessage,
        reply: oneshot::Sender<BroadcastReport>,
    },
    Publish {
        outcome: BuildOutcome,
        reply: oneshot::Sender<BroadcastReport>,
    },
    LastFailure {
        reply: oneshot::Sender<Option<Vec<String>>>,
    },
    ClientCount {
        reply: oneshot::Sender<usize>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// The control loop state.
pub struct Hub {
    clients: HashMap<ClientId, Client>,
    last_failure: Option<Vec<String>>,
    commands: mpsc::Receiver<HubCommand>,
}

impl Hub {
    pub fn new() -> (Self, HubHandle) {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE);
        let hub = Self {
            clients: HashMap::new(),
            last_failure: None,
            commands: rx,
        };
        (hub, HubHandle { commands: tx })
    }

    /// Start the control loop on the current runtime.
    pub fn spawn() -> (HubHandle, JoinHandle<()>) {
        let (hub, handle) = Self::new();
        let task = tokio::spawn(hub.run());
        (handle, task)
    }

    /// Process commands until shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        tracing::debug!("Live-reload hub started");

        while let Some(command) = self.commands.recv().await {
            match command {
                HubCommand::Register { client, reply } => {
                    let _ = reply.send(self.register(client));
                }
                HubCommand::Unregister { id, reply } => {
                    let _ = reply.send(self.unregister(id));
                }
                HubCommand::Broadcast { message, reply } => {
                    let _ = reply.send(self.broadcast(&message));
                }
                HubCommand::Publish { outcome, reply } => {
                    let _ = reply.send(self.publish(outcome));
                }
                HubCommand::LastFailure { reply } => {
                    let _ = reply.send(self.last_failure.clone());
                }
                HubCommand::ClientCount { reply } => {
                    let _ = reply.send(self.clients.len());
                }
                HubCommand::Shutdown { reply } => {
                    let closed = self.clients.len();
                    self.clients.clear();
                    tracing::debug!(clients = closed, "Live-reload hub shutting down");
                    let _ = reply.send(());
                    break;
                }
            }
        }

        self.clients.clear();
    }

    fn register(&mut self, client: Client) -> bool {
        let id = client.id;
        if self.clients.contains_key(&id) {
            return false;
        }
        self.clients.insert(id, client);
        tracing::debug!(client = %id, clients = self.clients.len(), "Client registered");
        true
    }

    fn unregister(&mut self, id: ClientId) -> bool {
        let removed = self.clients.remove(&id).is_some();
        if removed {
            tracing::debug!(client = %id, clients = self.clients.len(), "Client unregistered");
        }
        removed
    }

    fn broadcast(&mut self, message: &ReloadMessage) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        self.clients.retain(|id, client| {
            match client.sender.try_send(message.clone()) {
                Ok(()) => {
                    report.delivered += 1;
                    true
                }
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(client = %id, "Client queue full, dropping client");
                    report.dropped += 1;
                    false
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::debug!(client = %id, "Client gone, dropping client");
                    report.dropped += 1;
                    false
                }
            }
        });

        tracing::debug!(
            delivered = report.delivered,
            dropped = report.dropped,
            "Broadcast {}",
            message
        );
        report
    }

    fn publish(&mut self, outcome: BuildOutcome) -> BroadcastReport {
        let message = ReloadMessage::from(&outcome);
        self.last_failure = match outcome {
            BuildOutcome::Success => None,
            BuildOutcome::Failure { diagnostics } => Some(diagnostics),
        };
        self.broadcast(&message)
    }
}

/// Cloneable front door to a running [`Hub`].
#[derive(Debug, Clone)]
pub struct HubHandle {
    commands: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> HubCommand,
    ) -> Result<T, HubError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(make(reply))
            .await
            .map_err(|_| HubError::Closed)?;
        response.await.map_err(|_| HubError::Closed)
    }

    /// Add a client. Returns `false` when a client with the same id is
    /// already registered; the new one is dropped in that case.
    pub async fn register(&self, client: Client) -> Result<bool, HubError> {
        self.request(|reply| HubCommand::Register { client, reply })
            .await
    }

    /// Remove a client. Returns `false` when it was not registered.
    pub async fn unregister(&self, id: ClientId) -> Result<bool, HubError> {
        self.request(|reply| HubCommand::Unregister { id, reply })
            .await
    }

    /// Queue `message` for every registered client.
    pub async fn broadcast(&self, message: ReloadMessage) -> Result<BroadcastReport, HubError> {
        self.request(|reply| HubCommand::Broadcast { message, reply })
            .await
    }

    /// Broadcast the message for a build outcome and record it as the
    /// latest failure (or clear it on success).
    pub async fn publish(&self, outcome: BuildOutcome) -> Result<BroadcastReport, HubError> {
        self.request(|reply| HubCommand::Publish { outcome, reply })
            .await
    }

    /// Diagnostics of the most recent failed build, if the latest build failed.
    pub async fn last_failure(&self) -> Result<Option<Vec<String>>, HubError> {
        self.request(|reply| HubCommand::LastFailure { reply }).await
    }

    pub async fn client_count(&self) -> Result<usize, HubError> {
        self.request(|reply| HubCommand::ClientCount { reply }).await
    }

    /// Drop every client and stop the control loop.
    pub async fn shutdown(&self) -> Result<(), HubError> {
        self.request(|reply| HubCommand::Shutdown { reply }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_is_idempotent() {
        let (hub, _task) = Hub::spawn();
        let id = ClientId::new();
        let (first, _rx1) = Client::with_id(id, 4);
        let (second, _rx2) = Client::with_id(id, 4);

        assert!(hub.register(first).await.unwrap());
        assert!(!hub.register(second).await.unwrap());
        assert_eq!(hub.client_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        let (hub, _task) = Hub::spawn();
        let (client, mut rx) = Client::new(4);
        let id = client.id();

        hub.register(client).await.unwrap();
        assert!(hub.unregister(id).await.unwrap());
        assert!(!hub.unregister(id).await.unwrap());

        // Unregistering releases the queue.
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_full_queue_drops_client() {
        let (hub, _task) = Hub::spawn();
        let (slow, _slow_rx) = Client::new(1);
        let (fast, mut fast_rx) = Client::new(4);
        hub.register(slow).await.unwrap();
        hub.register(fast).await.unwrap();

        let first = hub.broadcast(ReloadMessage::Reload).await.unwrap();
        assert_eq!(first, BroadcastReport { delivered: 2, dropped: 0 });

        let second = hub.broadcast(ReloadMessage::Reload).await.unwrap();
        assert_eq!(second, BroadcastReport { delivered: 1, dropped: 1 });
        assert_eq!(hub.client_count().await.unwrap(), 1);

        assert_eq!(fast_rx.recv().await, Some(ReloadMessage::Reload));
        assert_eq!(fast_rx.recv().await, Some(ReloadMessage::Reload));
    }

    #[tokio::test]
    async fn test_closed_receiver_drops_client() {
        let (hub, _task) = Hub::spawn();
        let (client, rx) = Client::new(4);
        hub.register(client).await.unwrap();
        drop(rx);

        let report = hub.broadcast(ReloadMessage::Reload).await.unwrap();
        assert_eq!(report, BroadcastReport { delivered: 0, dropped: 1 });
        assert_eq!(hub.client_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_publish_tracks_last_failure() {
        let (hub, _task) = Hub::spawn();
        let (client, mut rx) = Client::new(4);
        hub.register(client).await.unwrap();

        assert_eq!(hub.last_failure().await.unwrap(), None);

        hub.publish(BuildOutcome::failed("broken")).await.unwrap();
        assert_eq!(
            hub.last_failure().await.unwrap(),
            Some(vec!["broken".to_string()])
        );
        assert_eq!(
            rx.recv().await,
            Some(ReloadMessage::Error {
                text: "broken".into()
            })
        );

        // A forced reload does not touch the recorded failure.
        hub.broadcast(ReloadMessage::Reload).await.unwrap();
        assert!(hub.last_failure().await.unwrap().is_some());

        hub.publish(BuildOutcome::Success).await.unwrap();
        assert_eq!(hub.last_failure().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_shutdown_closes_clients_and_handle() {
        let (hub, task) = Hub::spawn();
        let (client, mut rx) = Client::new(4);
        hub.register(client).await.unwrap();

        hub.shutdown().await.unwrap();
        task.await.unwrap();

        assert_eq!(rx.recv().await, None);
        assert_eq!(hub.client_count().await, Err(HubError::Closed));
    }
}
