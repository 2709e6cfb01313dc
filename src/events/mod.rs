use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Events emitted after state changes commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    SessionStarted {
        session_id: Uuid,
        entry_count: usize,
        started_at: DateTime<Utc>,
    },
    SessionSettled {
        session_id: Uuid,
        settled_at: DateTime<Utc>,
    },
    InventoryAdjusted {
        transaction_id: Uuid,
        blank_variant_id: Option<Uuid>,
        product_variant_id: Option<Uuid>,
        change_amount: i32,
        new_quantity: i32,
        reason: String,
    },
    MisprintRecorded {
        session_id: Uuid,
        line_item_id: Uuid,
        blank_variant_id: Uuid,
    },
}

/// Creates an event channel and a background task that drains it into the
/// log. Callers that need richer fan-out can replace the receiver side.
pub fn channel(buffer: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(buffer);
    (EventSender::new(tx), rx)
}

pub fn spawn_event_logger(mut rx: mpsc::Receiver<Event>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            info!(?event, "domain event");
        }
    })
}
