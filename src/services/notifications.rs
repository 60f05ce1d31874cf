//! Local notification scheduling

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::{task::JoinHandle, time::sleep};
use tracing::{info, warn};

/// A notification that reached the user
#[derive(Debug, Clone, Serialize)]
pub struct DeliveredNotification {
    pub id: String,
    pub title: String,
    pub body: String,
    pub delivered_at: DateTime<Utc>,
}

/// Authorization state and delayed delivery of local notifications
#[derive(Debug)]
pub struct NotificationCenter {
    authorized: AtomicBool,
    /// Answer given when authorization is requested
    grant_on_request: bool,
    offline_delay: Duration,
    next_id: AtomicU64,
    delivered: Arc<Mutex<Vec<DeliveredNotification>>>,
}

impl NotificationCenter {
    pub fn new(grant_on_request: bool, offline_delay: Duration) -> Self {
        Self {
            authorized: AtomicBool::new(false),
            grant_on_request,
            offline_delay,
            next_id: AtomicU64::new(1),
            delivered: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn is_authorized(&self) -> bool {
        self.authorized.load(Ordering::SeqCst)
    }

    /// Ask the user for permission; returns the resulting authorization
    pub fn request_authorization(&self) -> bool {
        self.authorized.store(self.grant_on_request, Ordering::SeqCst);
        if self.grant_on_request {
            info!("Notification authorization granted");
        } else {
            warn!("Notification authorization denied");
        }
        self.grant_on_request
    }

    /// Schedule a notification after `delay`.
    ///
    /// Without authorization this only requests it and drops the notification.
    pub fn send_notification(&self, title: &str, body: &str, delay: Duration) -> Option<JoinHandle<()>> {
        if !self.is_authorized() {
            self.request_authorization();
            return None;
        }

        let id = format!("notification-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let title = title.to_string();
        let body = body.to_string();
        let delivered = Arc::clone(&self.delivered);

        info!("Scheduling {} in {:?}", id, delay);
        Some(tokio::spawn(async move {
            sleep(delay).await;

            let notification = DeliveredNotification {
                id,
                title,
                body,
                delivered_at: Utc::now(),
            };
            info!("Delivering {}: {}", notification.id, notification.title);

            match delivered.lock() {
                Ok(mut delivered) => delivered.push(notification),
                Err(e) => warn!("Failed to record delivered notification: {}", e),
            }
        }))
    }

    /// Schedule the demo notification that arrives even when the app is closed
    pub fn schedule_offline_notification(&self) -> Option<JoinHandle<()>> {
        self.send_notification(
            "Timer Notification",
            "This notification works even when the app is offline!",
            self.offline_delay,
        )
    }

    pub fn delivered(&self) -> Vec<DeliveredNotification> {
        self.delivered
            .lock()
            .map(|delivered| delivered.clone())
            .unwrap_or_default()
    }
}
