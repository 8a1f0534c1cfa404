//! Boxoffice API Library
//!
//! Core services for a ticket-sales platform: slot-based inventory
//! allocation, order placement, and cursor-paginated admin listings. The
//! presentation layer (HTTP routing, rendering, auth) lives outside this
//! crate and consumes [`AppState`].
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod pagination;
pub mod services;

use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::sync::mpsc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: Arc<events::EventSender>,
    pub services: services::AppServices,
}

impl AppState {
    /// Wires up the full service stack against an established connection
    /// and spawns the event processing loop.
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel(1024);
        let event_sender = Arc::new(events::EventSender::new(event_tx));
        tokio::spawn(events::process_events(event_rx));

        let services = services::AppServices::new(db.clone(), &config, event_sender.clone());

        Self {
            db,
            config,
            event_sender,
            services,
        }
    }

    pub fn order_service(&self) -> Arc<services::orders::OrderService> {
        self.services.orders.clone()
    }

    pub fn ticket_service(&self) -> Arc<services::tickets::TicketService> {
        self.services.tickets.clone()
    }

    pub fn ticket_type_service(&self) -> Arc<services::ticket_types::TicketTypeService> {
        self.services.ticket_types.clone()
    }

    pub fn customer_service(&self) -> Arc<services::customers::CustomerService> {
        self.services.customers.clone()
    }

    pub fn event_service(&self) -> Arc<services::events::EventService> {
        self.services.events.clone()
    }
}

pub mod prelude {
    pub use crate::db::*;
    pub use crate::errors::*;
    pub use crate::events::*;
    pub use crate::pagination::*;
    pub use crate::services::*;
}
