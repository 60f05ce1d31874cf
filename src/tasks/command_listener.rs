//! Phone-side command listener

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::sync::{InboundCommand, PhoneEndpoint};

/// Answer commands from the watch until the session closes
pub async fn command_listener_task(
    phone: Arc<PhoneEndpoint>,
    mut commands: mpsc::UnboundedReceiver<InboundCommand>,
) {
    info!("Starting phone command listener");

    while let Some(command) = commands.recv().await {
        let reply = phone.handle_command(&command.message);
        debug!("Replying to watch: {:?}", reply);
        command.reply(reply);
    }

    info!("Phone command listener stopped, session closed");
}
