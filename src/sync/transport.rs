//! Transport seam between the two endpoints
//!
//! The OS channel is modelled as a trait with two delivery primitives: a
//! point-to-point command with a single reply, and a last-value context
//! broadcast. Both return immediately; unavailability is reported synchronously.

use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::warn;

use super::protocol::{CommandReply, Payload};

/// Session activation, as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationState {
    NotActivated,
    Inactive,
    Activated,
}

impl std::fmt::Display for ActivationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ActivationState::NotActivated => "not activated",
            ActivationState::Inactive => "inactive",
            ActivationState::Activated => "activated",
        };
        f.write_str(name)
    }
}

/// Failures of the sync channel. None of them is fatal to an endpoint.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChannelError {
    #[error("session is {0}")]
    NotActivated(ActivationState),

    #[error("peer is not reachable")]
    PeerUnreachable,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed reply: {0}")]
    MalformedReply(String),
}

/// Reply to an accepted command, resolved by the peer
pub type PendingReply = oneshot::Receiver<Result<Payload, ChannelError>>;

/// Best-effort channel to the paired endpoint
pub trait Transport: Send + Sync {
    fn activation_state(&self) -> ActivationState;

    fn is_reachable(&self) -> bool;

    /// Deliver a command at most once. No retry is attempted.
    fn send_command(&self, message: Payload) -> Result<PendingReply, ChannelError>;

    /// Replace the previously broadcast context; only the last value is guaranteed to arrive.
    fn broadcast_context(&self, context: Payload) -> Result<(), ChannelError>;
}

/// Wait for and decode a command reply. No timeout is applied.
pub async fn await_reply(pending: PendingReply) -> Result<CommandReply, ChannelError> {
    let payload = pending
        .await
        .map_err(|_| ChannelError::Transport("reply dropped by peer".to_string()))??;

    CommandReply::from_payload(&payload).map_err(|e| ChannelError::MalformedReply(e.to_string()))
}

/// Command received from the peer, answered through [`InboundCommand::reply`]
#[derive(Debug)]
pub struct InboundCommand {
    pub message: Payload,
    reply_tx: oneshot::Sender<Result<Payload, ChannelError>>,
}

impl InboundCommand {
    pub fn new(message: Payload) -> (Self, PendingReply) {
        let (reply_tx, reply_rx) = oneshot::channel();
        (Self { message, reply_tx }, reply_rx)
    }

    pub fn reply(self, reply: Payload) {
        if self.reply_tx.send(Ok(reply)).is_err() {
            warn!("Command reply dropped: sender is gone");
        }
    }
}

/// Receiving half of a session
#[derive(Debug)]
pub struct Inbound {
    pub commands: mpsc::UnboundedReceiver<InboundCommand>,
    pub contexts: watch::Receiver<Option<Payload>>,
}
