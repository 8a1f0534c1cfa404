use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted by the services after their transactions commit.
/// Delivery is best-effort: a full or closed channel is logged and never
/// fails the operation that produced the event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Order events
    OrderCreated(Uuid),
    OrderCompleted(Uuid),
    OrderCancelled(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },

    // Ticket events
    TicketCheckedIn {
        ticket_id: Uuid,
        checked_in_by: String,
    },
    TicketStatusChanged {
        ticket_id: Uuid,
        old_status: String,
        new_status: String,
    },

    // Inventory events
    InventoryProvisioned {
        ticket_type_id: Uuid,
        slots: u64,
    },

    // Customer events
    CustomerCreated(Uuid),

    // Generic event for custom messages
    Generic {
        message: String,
        timestamp: DateTime<Utc>,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Drains the event channel, logging each event. Consumers that need more
/// than logs (webhooks, analytics) subscribe here.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderCreated(order_id) => {
                info!(order_id = %order_id, "Order created");
            }
            Event::OrderCompleted(order_id) => {
                info!(order_id = %order_id, "Order completed");
            }
            Event::OrderCancelled(order_id) => {
                info!(order_id = %order_id, "Order cancelled");
            }
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(order_id = %order_id, old_status = %old_status, new_status = %new_status, "Order status changed");
            }
            Event::TicketCheckedIn {
                ticket_id,
                checked_in_by,
            } => {
                info!(ticket_id = %ticket_id, checked_in_by = %checked_in_by, "Ticket checked in");
            }
            Event::TicketStatusChanged {
                ticket_id,
                old_status,
                new_status,
            } => {
                info!(ticket_id = %ticket_id, old_status = %old_status, new_status = %new_status, "Ticket status changed");
            }
            Event::InventoryProvisioned {
                ticket_type_id,
                slots,
            } => {
                info!(ticket_type_id = %ticket_type_id, slots = slots, "Inventory slots provisioned");
            }
            Event::CustomerCreated(customer_id) => {
                info!(customer_id = %customer_id, "Customer created");
            }
            Event::Generic { message, timestamp } => {
                info!(message = %message, timestamp = %timestamp, "Generic event");
            }
        }
    }

    warn!("Event channel closed, stopping event processing loop");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_to_receiver() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);
        let order_id = Uuid::new_v4();

        sender.send(Event::OrderCreated(order_id)).await.unwrap();

        match rx.recv().await {
            Some(Event::OrderCreated(id)) => assert_eq!(id, order_id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_fails_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        let result = sender.send(Event::OrderCreated(Uuid::new_v4())).await;
        assert!(result.is_err());
    }
}
