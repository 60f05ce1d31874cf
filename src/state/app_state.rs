//! Main application state management

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::{
    config::Config,
    services::{LiveActivity, NotificationCenter, PresenceObserver, StopSignal},
    sync::{self, Inbound, LinkControl, PhoneEndpoint, WatchEndpoint},
    timer::{Clock, SystemClock, TimerEngine},
};

/// Inbound halves of the paired session, consumed by the background tasks
#[derive(Debug)]
pub struct SessionInbound {
    pub phone: Inbound,
    pub watch: Inbound,
}

/// Both endpoints plus the simulated session between them
pub struct AppState {
    pub phone: Arc<PhoneEndpoint>,
    pub watch: Arc<WatchEndpoint>,
    pub link: LinkControl,
    pub live_activity: Arc<LiveActivity>,
    pub stop_signal: StopSignal,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Mutex<Option<String>>,
    pub last_action_time: Mutex<Option<DateTime<Utc>>>,
}

impl AppState {
    /// Wire both endpoints from configuration using the system clock
    pub fn new(config: &Config) -> Result<(Self, SessionInbound), String> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Wire both endpoints around `clock`
    pub fn with_clock(config: &Config, clock: Arc<dyn Clock>) -> Result<(Self, SessionInbound), String> {
        let (link, phone_peer, watch_peer) = sync::pair(!config.offline);

        let live_activity = Arc::new(LiveActivity::new(!config.disable_live_activity));
        let notifications = Arc::new(NotificationCenter::new(
            !config.deny_notifications,
            config.notification_delay(),
        ));

        let phone_engine = Arc::new(TimerEngine::new("phone", Arc::clone(&clock), config.tick_interval()));
        phone_engine.add_observer(Arc::new(PresenceObserver::new(Arc::clone(&live_activity))))?;
        let phone = Arc::new(PhoneEndpoint::new(
            phone_engine,
            phone_peer.transport,
            notifications,
            config.broadcast_interval(),
        )?);

        let watch_engine = Arc::new(TimerEngine::new("watch", Arc::clone(&clock), config.tick_interval()));
        let watch = Arc::new(WatchEndpoint::new(watch_peer.transport, clock, watch_engine)?);

        info!(
            "Endpoints wired: session {}, live activity {}, notifications {}",
            link.activation_state(),
            if config.disable_live_activity { "disabled" } else { "enabled" },
            if config.deny_notifications { "denied" } else { "allowed" },
        );

        let state = Self {
            phone,
            watch,
            link,
            live_activity,
            stop_signal: StopSignal::new(),
            start_time: Instant::now(),
            port: config.port,
            host: config.host.clone(),
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
        };
        let inbound = SessionInbound {
            phone: phone_peer.inbound,
            watch: watch_peer.inbound,
        };

        Ok((state, inbound))
    }

    /// Record the most recent control action
    pub fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[tokio::test]
    async fn wires_endpoints_from_config() {
        let config = Config::parse_from(["stopwatch-sync", "--offline"]);
        let (state, _inbound) = AppState::new(&config).unwrap();

        assert_eq!(state.link.activation_state(), sync::ActivationState::NotActivated);
        assert!(!state.phone.snapshot().unwrap().is_running);
        assert!(!state.watch.snapshot().unwrap().is_running);
        assert_eq!(state.get_last_action(), (None, None));
    }

    #[tokio::test]
    async fn phone_start_reaches_live_activity() {
        let config = Config::parse_from(["stopwatch-sync"]);
        let (state, _inbound) = AppState::new(&config).unwrap();

        state.phone.start().unwrap();
        assert!(state.live_activity.current().is_some());
        state.phone.stop().unwrap();
        assert!(state.live_activity.current().is_none());

        state.record_action("phone-stop");
        assert_eq!(state.get_last_action().0.as_deref(), Some("phone-stop"));
    }
}
