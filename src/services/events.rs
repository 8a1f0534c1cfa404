use crate::{
    db::DbPool,
    entities::event::{self, Entity as EventEntity, EventStatus, Model as EventModel},
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, max = 255, message = "Slug is required"))]
    pub slug: String,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub timezone: String,
    pub total_capacity: i32,
    pub currency: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EventListResponse {
    pub events: Vec<EventModel>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Catalog reads and writes for events. Plain CRUD; the storefront and
/// admin surfaces consume these directly.
#[derive(Clone)]
pub struct EventService {
    db_pool: Arc<DbPool>,
}

impl EventService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, request), fields(slug = %request.slug))]
    pub async fn create_event(
        &self,
        request: CreateEventRequest,
    ) -> Result<EventModel, ServiceError> {
        request.validate()?;

        let now = Utc::now();
        let event_id = Uuid::new_v4();

        let model = event::ActiveModel {
            id: Set(event_id),
            title: Set(request.title),
            slug: Set(request.slug),
            description: Set(request.description),
            short_description: Set(request.short_description),
            start_date: Set(request.start_date),
            end_date: Set(request.end_date),
            timezone: Set(request.timezone),
            status: Set(EventStatus::Draft),
            is_published: Set(false),
            published_at: Set(None),
            total_capacity: Set(request.total_capacity),
            currency: Set(request.currency.unwrap_or_else(|| "USD".to_string())),
            category: Set(request.category),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = model.insert(self.db_pool.as_ref()).await.map_err(|e| {
            error!(error = %e, event_id = %event_id, "Failed to create event");
            ServiceError::DatabaseError(e)
        })?;

        info!(event_id = %event_id, "Event created");
        Ok(created)
    }

    #[instrument(skip(self), fields(event_id = %event_id))]
    pub async fn get_event(&self, event_id: Uuid) -> Result<Option<EventModel>, ServiceError> {
        let event = EventEntity::find_by_id(event_id)
            .one(self.db_pool.as_ref())
            .await?;
        Ok(event)
    }

    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn get_event_by_slug(&self, slug: &str) -> Result<Option<EventModel>, ServiceError> {
        let event = EventEntity::find()
            .filter(event::Column::Slug.eq(slug))
            .one(self.db_pool.as_ref())
            .await?;
        Ok(event)
    }

    /// Publishes a draft event, making it visible to the storefront.
    #[instrument(skip(self), fields(event_id = %event_id))]
    pub async fn publish_event(&self, event_id: Uuid) -> Result<EventModel, ServiceError> {
        let db = self.db_pool.as_ref();
        let now = Utc::now();

        let event_model = EventEntity::find_by_id(event_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                warn!(event_id = %event_id, "Event not found for publishing");
                ServiceError::NotFound(format!("Event {}", event_id))
            })?;

        let mut active: event::ActiveModel = event_model.into();
        active.status = Set(EventStatus::Published);
        active.is_published = Set(true);
        active.published_at = Set(Some(now));
        active.updated_at = Set(now);

        let updated = active.update(db).await?;
        info!(event_id = %event_id, "Event published");
        Ok(updated)
    }

    /// Published events, soonest first. Standard offset pagination: the
    /// catalog is small and rarely appended, unlike the ticket ledger.
    #[instrument(skip(self))]
    pub async fn list_published(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<EventListResponse, ServiceError> {
        let paginator = EventEntity::find()
            .filter(event::Column::IsPublished.eq(true))
            .order_by_asc(event::Column::StartDate)
            .paginate(self.db_pool.as_ref(), per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count events");
            ServiceError::DatabaseError(e)
        })?;

        let events = paginator.fetch_page(page.saturating_sub(1)).await.map_err(|e| {
            error!(error = %e, page = page, "Failed to fetch events page");
            ServiceError::DatabaseError(e)
        })?;

        Ok(EventListResponse {
            events,
            total,
            page,
            per_page,
        })
    }
}
