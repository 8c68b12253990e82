use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted after successful commits. Consumers are best-effort;
/// a dropped event never fails the request that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderCreated(Uuid),
    PaymentInitialized {
        order_id: Uuid,
        reference: String,
    },
    PaymentConfirmed {
        order_id: Uuid,
        reference: String,
        amount: i64,
    },
    PaymentFailed {
        order_id: Uuid,
        reference: String,
    },
    ProductOutOfStock(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Drains the event channel, logging each event. Runs until every sender is
/// dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::OrderCreated(order_id) => {
                info!(%order_id, "order created");
            }
            Event::PaymentInitialized {
                order_id,
                reference,
            } => {
                info!(%order_id, %reference, "payment initialized");
            }
            Event::PaymentConfirmed {
                order_id,
                reference,
                amount,
            } => {
                info!(%order_id, %reference, amount, "payment confirmed");
            }
            Event::PaymentFailed {
                order_id,
                reference,
            } => {
                warn!(%order_id, %reference, "payment failed");
            }
            Event::ProductOutOfStock(product_id) => {
                warn!(%product_id, "product out of stock");
            }
        }
    }
}
