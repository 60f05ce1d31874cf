//! In-memory paired session between a phone end and a watch end
//!
//! Stands in for the OS connectivity session: activation and reachability are
//! toggled through [`LinkControl`], commands travel over an unbounded channel
//! and contexts over a last-value slot that is flushed once the peer is reachable.

use std::sync::{
    atomic::{AtomicBool, AtomicU8, Ordering},
    Arc, Mutex,
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use super::{
    protocol::Payload,
    transport::{ActivationState, ChannelError, Inbound, InboundCommand, PendingReply, Transport},
};

/// Which end of the link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Phone,
    Watch,
}

impl Side {
    fn peer(self) -> Self {
        match self {
            Side::Phone => Side::Watch,
            Side::Watch => Side::Phone,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Phone => f.write_str("phone"),
            Side::Watch => f.write_str("watch"),
        }
    }
}

/// Delivery path into one side
#[derive(Debug)]
struct Mailbox {
    commands: mpsc::UnboundedSender<InboundCommand>,
    /// Latest context not yet handed to the peer
    pending_context: Mutex<Option<Payload>>,
    contexts: watch::Sender<Option<Payload>>,
}

impl Mailbox {
    fn new() -> (Self, Inbound) {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (contexts_tx, contexts_rx) = watch::channel(None);

        let mailbox = Self {
            commands: commands_tx,
            pending_context: Mutex::new(None),
            contexts: contexts_tx,
        };
        let inbound = Inbound {
            commands: commands_rx,
            contexts: contexts_rx,
        };
        (mailbox, inbound)
    }

    fn flush(&self) -> Result<bool, ChannelError> {
        let pending = self.pending_context.lock()
            .map_err(|e| ChannelError::Transport(format!("Failed to lock pending context: {}", e)))?
            .take();

        match pending {
            Some(context) => {
                self.contexts.send_replace(Some(context));
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Debug)]
struct Session {
    activation: AtomicU8,
    reachable: AtomicBool,
    to_phone: Mailbox,
    to_watch: Mailbox,
}

impl Session {
    fn mailbox(&self, side: Side) -> &Mailbox {
        match side {
            Side::Phone => &self.to_phone,
            Side::Watch => &self.to_watch,
        }
    }

    fn activation(&self) -> ActivationState {
        match self.activation.load(Ordering::SeqCst) {
            2 => ActivationState::Activated,
            1 => ActivationState::Inactive,
            _ => ActivationState::NotActivated,
        }
    }

    fn set_activation(&self, state: ActivationState) {
        let raw = match state {
            ActivationState::NotActivated => 0,
            ActivationState::Inactive => 1,
            ActivationState::Activated => 2,
        };
        self.activation.store(raw, Ordering::SeqCst);
    }

    fn flush_all(&self) {
        for side in [Side::Phone, Side::Watch] {
            match self.mailbox(side).flush() {
                Ok(true) => debug!("Delivered pending context to {}", side),
                Ok(false) => {}
                Err(e) => tracing::warn!("Failed to deliver pending context to {}: {}", side, e),
            }
        }
    }
}

/// One end of the paired session
#[derive(Debug)]
pub struct LinkEnd {
    side: Side,
    session: Arc<Session>,
}

impl Transport for LinkEnd {
    fn activation_state(&self) -> ActivationState {
        self.session.activation()
    }

    fn is_reachable(&self) -> bool {
        self.session.reachable.load(Ordering::SeqCst)
    }

    fn send_command(&self, message: Payload) -> Result<PendingReply, ChannelError> {
        let state = self.activation_state();
        if state != ActivationState::Activated {
            return Err(ChannelError::NotActivated(state));
        }
        if !self.is_reachable() {
            return Err(ChannelError::PeerUnreachable);
        }

        let (command, pending) = InboundCommand::new(message);
        self.session
            .mailbox(self.side.peer())
            .commands
            .send(command)
            .map_err(|_| ChannelError::Transport(format!("{} session closed", self.side.peer())))?;

        Ok(pending)
    }

    fn broadcast_context(&self, context: Payload) -> Result<(), ChannelError> {
        let state = self.activation_state();
        if state != ActivationState::Activated {
            return Err(ChannelError::NotActivated(state));
        }

        let mailbox = self.session.mailbox(self.side.peer());
        {
            let mut pending = mailbox.pending_context.lock()
                .map_err(|e| ChannelError::Transport(format!("Failed to lock pending context: {}", e)))?;
            *pending = Some(context);
        }

        if self.is_reachable() {
            mailbox.flush()?;
        } else {
            debug!("{} unreachable, context queued", self.side.peer());
        }
        Ok(())
    }
}

/// Knobs for simulating peer availability
#[derive(Debug, Clone)]
pub struct LinkControl {
    session: Arc<Session>,
}

impl LinkControl {
    pub fn activation_state(&self) -> ActivationState {
        self.session.activation()
    }

    pub fn is_reachable(&self) -> bool {
        self.session.reachable.load(Ordering::SeqCst)
    }

    /// Activate the session and make the peer reachable, delivering queued contexts
    pub fn connect(&self) {
        self.session.set_activation(ActivationState::Activated);
        self.session.reachable.store(true, Ordering::SeqCst);
        info!("Link connected");
        self.session.flush_all();
    }

    /// Keep the session activated but make the peer unreachable
    pub fn disconnect(&self) {
        self.session.reachable.store(false, Ordering::SeqCst);
        info!("Link disconnected, peer unreachable");
    }

    /// Deactivate the session entirely
    pub fn deactivate(&self) {
        self.session.reachable.store(false, Ordering::SeqCst);
        self.session.set_activation(ActivationState::Inactive);
        info!("Link deactivated");
    }
}

/// One side's transport plus its inbound half
#[derive(Debug)]
pub struct Peer {
    pub transport: Arc<LinkEnd>,
    pub inbound: Inbound,
}

/// Build a paired session, returning `(control, phone, watch)`
pub fn pair(connected: bool) -> (LinkControl, Peer, Peer) {
    let (to_phone, phone_inbound) = Mailbox::new();
    let (to_watch, watch_inbound) = Mailbox::new();

    let session = Arc::new(Session {
        activation: AtomicU8::new(0),
        reachable: AtomicBool::new(false),
        to_phone,
        to_watch,
    });

    let control = LinkControl {
        session: Arc::clone(&session),
    };
    if connected {
        control.connect();
    }

    let phone = Peer {
        transport: Arc::new(LinkEnd {
            side: Side::Phone,
            session: Arc::clone(&session),
        }),
        inbound: phone_inbound,
    };
    let watch = Peer {
        transport: Arc::new(LinkEnd {
            side: Side::Watch,
            session,
        }),
        inbound: watch_inbound,
    };

    (control, phone, watch)
}
