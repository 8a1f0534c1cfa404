use crate::{
    db::DbPool,
    entities::{
        customer::Entity as CustomerEntity,
        ticket::{self, Entity as TicketEntity, Model as TicketModel, TicketStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    pagination::{self, CountCache, Cursor, PageInfo},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

const TICKETS_COUNT_KEY: &str = "tickets";

/// Listing request. `cursor` resumes a forward scan; `page` + `is_jump`
/// selects the offset fallback for arbitrary page jumps.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TicketPageQuery {
    pub cursor: Option<String>,
    pub page: Option<u64>,
    pub prev_cursor: Option<String>,
    #[serde(default)]
    pub is_jump: bool,
}

/// One row of the admin ticket listing, with the purchaser's live email
/// joined in next to the denormalized snapshot fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminTicketRow {
    pub id: Uuid,
    pub ticket_code: String,
    pub status: TicketStatus,
    pub event_title: String,
    pub ticket_type_name: String,
    pub price: Decimal,
    pub is_checked_in: bool,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub attendee_email: Option<String>,
    pub customer_email: Option<String>,
    pub event_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TicketPageResponse {
    pub tickets: Vec<AdminTicketRow>,
    pub pagination: PageInfo,
}

/// Service for ticket listings and per-ticket admin operations.
///
/// Listings are keyset-paginated over `(created_at DESC, id DESC)`; the
/// composite key makes pages stable under concurrent inserts, which a bare
/// timestamp sort cannot guarantee when timestamps tie. The one offset
/// query lives in the explicitly labeled jump path and nowhere else.
#[derive(Clone)]
pub struct TicketService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
    count_cache: Arc<CountCache>,
    page_size: u64,
}

impl TicketService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self::with_config(
            db_pool,
            event_sender,
            pagination::DEFAULT_PAGE_SIZE,
            pagination::count_cache::DEFAULT_COUNT_TTL,
        )
    }

    pub fn with_config(
        db_pool: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        page_size: u64,
        count_ttl: Duration,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            count_cache: Arc::new(CountCache::new(count_ttl)),
            page_size,
        }
    }

    /// Lists tickets, newest first.
    ///
    /// Forward paging decodes the cursor and fetches `page_size + 1` rows
    /// strictly after the cursor key; the probe row decides `has_more`.
    /// Jumping to an arbitrary page cannot be expressed with a cursor and
    /// falls back to OFFSET — correct but O(offset), kept as a separate
    /// branch so its cost stays visible in the logs.
    #[instrument(skip(self, query), fields(is_jump = query.is_jump))]
    pub async fn list_tickets(
        &self,
        query: TicketPageQuery,
    ) -> Result<TicketPageResponse, ServiceError> {
        let page_size = self.page_size;
        let total = self.ticket_count().await?;
        let total_pages = pagination::total_pages(total, page_size);
        let current_page = query.page.unwrap_or(1).max(1);

        if query.is_jump && query.page.is_some() {
            return self
                .list_tickets_by_offset(current_page, total, total_pages)
                .await;
        }

        let cursor = match query.cursor.as_deref() {
            Some(token) => Some(Cursor::decode(token)?),
            None => None,
        };

        let mut select = TicketEntity::find();
        if let Some(cursor) = cursor {
            // Resume strictly after (created_at, id), descending.
            select = select.filter(
                Condition::any()
                    .add(ticket::Column::CreatedAt.lt(cursor.created_at))
                    .add(
                        Condition::all()
                            .add(ticket::Column::CreatedAt.eq(cursor.created_at))
                            .add(ticket::Column::Id.lt(cursor.id)),
                    ),
            );
        }

        let rows = select
            .find_also_related(CustomerEntity)
            .order_by_desc(ticket::Column::CreatedAt)
            .order_by_desc(ticket::Column::Id)
            .limit(page_size + 1)
            .all(self.db_pool.as_ref())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch ticket page");
                ServiceError::DatabaseError(e)
            })?;

        let has_more = rows.len() as u64 > page_size;
        let tickets: Vec<AdminTicketRow> = rows
            .into_iter()
            .take(page_size as usize)
            .map(|(t, c)| Self::row(t, c.map(|c| c.email)))
            .collect();

        let next_cursor = if has_more {
            tickets
                .last()
                .map(|last| Cursor::new(last.created_at, last.id).encode())
        } else {
            None
        };

        info!(
            pagination.kind = "cursor",
            page = current_page,
            returned = tickets.len(),
            has_more = has_more,
            "Tickets listed"
        );

        Ok(TicketPageResponse {
            tickets,
            pagination: PageInfo {
                next_cursor,
                prev_cursor: query.prev_cursor,
                current_cursor: query.cursor,
                current_page,
                has_more,
                total,
                total_pages,
            },
        })
    }

    /// The intentionally slow path: OFFSET-based retrieval for arbitrary
    /// page jumps. Same ordering, same probe-row `has_more` test; the only
    /// difference is the O(offset) skip.
    async fn list_tickets_by_offset(
        &self,
        page: u64,
        total: u64,
        total_pages: u64,
    ) -> Result<TicketPageResponse, ServiceError> {
        let page_size = self.page_size;
        let offset = (page - 1) * page_size;

        let rows = TicketEntity::find()
            .find_also_related(CustomerEntity)
            .order_by_desc(ticket::Column::CreatedAt)
            .order_by_desc(ticket::Column::Id)
            .offset(offset)
            .limit(page_size + 1)
            .all(self.db_pool.as_ref())
            .await
            .map_err(|e| {
                error!(error = %e, page = page, offset = offset, "Failed to fetch ticket page by offset");
                ServiceError::DatabaseError(e)
            })?;

        let has_more = rows.len() as u64 > page_size;
        let tickets: Vec<AdminTicketRow> = rows
            .into_iter()
            .take(page_size as usize)
            .map(|(t, c)| Self::row(t, c.map(|c| c.email)))
            .collect();

        let next_cursor = if has_more {
            tickets
                .last()
                .map(|last| Cursor::new(last.created_at, last.id).encode())
        } else {
            None
        };

        info!(
            pagination.kind = "offset-jump",
            page = page,
            offset = offset,
            returned = tickets.len(),
            has_more = has_more,
            "Tickets listed via offset fallback"
        );

        Ok(TicketPageResponse {
            tickets,
            pagination: PageInfo {
                next_cursor,
                prev_cursor: None,
                current_cursor: None,
                current_page: page,
                has_more,
                total,
                total_pages,
            },
        })
    }

    /// Approximate ticket count for "page X of Y" hints, refreshed on the
    /// cache TTL. Display only — page existence always comes from the
    /// probe row, never from this number.
    async fn ticket_count(&self) -> Result<u64, ServiceError> {
        if let Some(cached) = self.count_cache.get(TICKETS_COUNT_KEY) {
            return Ok(cached);
        }

        let count = TicketEntity::find()
            .count(self.db_pool.as_ref())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to count tickets");
                ServiceError::DatabaseError(e)
            })?;

        self.count_cache.put(TICKETS_COUNT_KEY, count);
        Ok(count)
    }

    /// Retrieves a single ticket
    #[instrument(skip(self), fields(ticket_id = %ticket_id))]
    pub async fn get_ticket(&self, ticket_id: Uuid) -> Result<Option<TicketModel>, ServiceError> {
        let ticket = TicketEntity::find_by_id(ticket_id)
            .one(self.db_pool.as_ref())
            .await?;
        Ok(ticket)
    }

    /// Checks a ticket in at the door: marks it used and records who
    /// performed the check-in.
    #[instrument(skip(self), fields(ticket_id = %ticket_id, checked_in_by = %checked_in_by))]
    pub async fn check_in_ticket(
        &self,
        ticket_id: Uuid,
        checked_in_by: String,
    ) -> Result<TicketModel, ServiceError> {
        let db = self.db_pool.as_ref();
        let now = Utc::now();

        let ticket_model = TicketEntity::find_by_id(ticket_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                warn!(ticket_id = %ticket_id, "Ticket not found for check-in");
                ServiceError::NotFound(format!("Ticket {}", ticket_id))
            })?;

        if ticket_model.is_checked_in {
            return Err(ServiceError::InvalidOperation(format!(
                "Ticket {} is already checked in",
                ticket_model.ticket_code
            )));
        }
        if ticket_model.status != TicketStatus::Valid {
            return Err(ServiceError::InvalidOperation(format!(
                "Ticket {} is not valid for check-in",
                ticket_model.ticket_code
            )));
        }

        let mut active: ticket::ActiveModel = ticket_model.into();
        active.is_checked_in = Set(true);
        active.checked_in_at = Set(Some(now));
        active.checked_in_by = Set(Some(checked_in_by.clone()));
        active.status = Set(TicketStatus::Used);
        active.updated_at = Set(now);

        let updated = active.update(db).await?;

        info!(ticket_id = %ticket_id, "Ticket checked in");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::TicketCheckedIn {
                    ticket_id,
                    checked_in_by,
                })
                .await
            {
                warn!(error = %e, ticket_id = %ticket_id, "Failed to send ticket checked in event");
            }
        }

        Ok(updated)
    }

    /// Updates a ticket's status (cancel, refund, revalidate).
    #[instrument(skip(self), fields(ticket_id = %ticket_id, new_status = %status))]
    pub async fn update_ticket_status(
        &self,
        ticket_id: Uuid,
        status: TicketStatus,
    ) -> Result<TicketModel, ServiceError> {
        let db = self.db_pool.as_ref();

        let ticket_model = TicketEntity::find_by_id(ticket_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                warn!(ticket_id = %ticket_id, "Ticket not found for status update");
                ServiceError::NotFound(format!("Ticket {}", ticket_id))
            })?;

        let old_status = ticket_model.status;

        let mut active: ticket::ActiveModel = ticket_model.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now());

        let updated = active.update(db).await?;

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::TicketStatusChanged {
                    ticket_id,
                    old_status: old_status.to_string(),
                    new_status: status.to_string(),
                })
                .await
            {
                warn!(error = %e, ticket_id = %ticket_id, "Failed to send ticket status changed event");
            }
        }

        Ok(updated)
    }

    fn row(ticket: TicketModel, customer_email: Option<String>) -> AdminTicketRow {
        AdminTicketRow {
            id: ticket.id,
            ticket_code: ticket.ticket_code,
            status: ticket.status,
            event_title: ticket.event_title,
            ticket_type_name: ticket.ticket_type_name,
            price: ticket.price,
            is_checked_in: ticket.is_checked_in,
            checked_in_at: ticket.checked_in_at,
            attendee_email: ticket.attendee_email,
            customer_email,
            event_id: ticket.event_id,
            created_at: ticket.created_at,
        }
    }
}
