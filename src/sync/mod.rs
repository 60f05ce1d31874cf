//! Phone/watch state synchronization
//!
//! [`protocol`] defines the wire shapes, [`transport`] the channel seam and
//! [`link`] an in-memory paired session implementing it. [`reconciler`] holds
//! the merge rules used by the two endpoints in [`phone`] and [`watch`].

pub mod link;
pub mod phone;
pub mod protocol;
pub mod reconciler;
pub mod transport;
pub mod watch;

pub use link::{pair, LinkControl, LinkEnd, Peer, Side};
pub use phone::{PhoneEndpoint, DEFAULT_BROADCAST_INTERVAL};
pub use protocol::{Action, CommandReply, ContextUpdate, Payload, ReplyStatus, SyncContext};
pub use reconciler::{merge_context, CommandHandler};
pub use transport::{ActivationState, ChannelError, Inbound, InboundCommand, PendingReply, Transport};
pub use watch::{CommandOutcome, WatchEndpoint};
