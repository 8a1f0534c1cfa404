// Core services
pub mod customers;
pub mod events;
pub mod orders;
pub mod ticket_types;
pub mod tickets;

use crate::{config::AppConfig, db::DbPool, events::EventSender};
use std::sync::Arc;

/// Bundle of constructed services, shared by the embedding application.
#[derive(Clone)]
pub struct AppServices {
    pub customers: Arc<customers::CustomerService>,
    pub events: Arc<events::EventService>,
    pub orders: Arc<orders::OrderService>,
    pub ticket_types: Arc<ticket_types::TicketTypeService>,
    pub tickets: Arc<tickets::TicketService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, config: &AppConfig, event_sender: Arc<EventSender>) -> Self {
        Self {
            customers: Arc::new(customers::CustomerService::new(
                db.clone(),
                Some(event_sender.clone()),
            )),
            events: Arc::new(events::EventService::new(db.clone())),
            orders: Arc::new(orders::OrderService::new(
                db.clone(),
                Some(event_sender.clone()),
            )),
            ticket_types: Arc::new(ticket_types::TicketTypeService::new(
                db.clone(),
                Some(event_sender.clone()),
            )),
            tickets: Arc::new(tickets::TicketService::with_config(
                db,
                Some(event_sender),
                config.page_size,
                config.count_cache_ttl(),
            )),
        }
    }
}
