use crate::{
    db::DbPool,
    entities::customer::{self, Entity as CustomerEntity, Model as CustomerModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Input for customer resolution. `user_id` is the external auth id for
/// signed-in buyers; guests are keyed by email.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CustomerInput {
    pub user_id: Option<String>,
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    pub phone: Option<String>,
    pub billing_address_line1: Option<String>,
    pub billing_address_line2: Option<String>,
    pub billing_city: Option<String>,
    pub billing_state: Option<String>,
    pub billing_country: Option<String>,
    pub billing_postal_code: Option<String>,
}

/// Service for resolving and managing customers
#[derive(Clone)]
pub struct CustomerService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl CustomerService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Finds an existing customer or creates a new one.
    ///
    /// Resolution order: by `user_id` when present, then by email (an email
    /// match refreshes contact and billing fields), otherwise insert.
    /// Idempotent with respect to (user_id) and (email).
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn find_or_create(&self, input: CustomerInput) -> Result<CustomerModel, ServiceError> {
        let (customer, created) = Self::find_or_create_on(self.db_pool.as_ref(), input).await?;

        if created {
            if let Some(event_sender) = &self.event_sender {
                if let Err(e) = event_sender.send(Event::CustomerCreated(customer.id)).await {
                    warn!(error = %e, customer_id = %customer.id, "Failed to send customer created event");
                }
            }
        }

        Ok(customer)
    }

    /// Transaction-friendly resolution: runs against any connection, so
    /// order placement can resolve its customer inside the same transaction
    /// as the inventory claims. Returns the customer and whether it was
    /// newly created.
    pub async fn find_or_create_on<C: ConnectionTrait>(
        conn: &C,
        input: CustomerInput,
    ) -> Result<(CustomerModel, bool), ServiceError> {
        input.validate()?;

        // Signed-in buyers resolve by auth id first.
        if let Some(user_id) = input.user_id.as_deref() {
            if let Some(existing) = CustomerEntity::find()
                .filter(customer::Column::UserId.eq(user_id))
                .one(conn)
                .await?
            {
                return Ok((existing, false));
            }
        }

        let now = Utc::now();

        if let Some(existing) = CustomerEntity::find()
            .filter(customer::Column::Email.eq(input.email.as_str()))
            .one(conn)
            .await?
        {
            // Refresh contact details supplied with this purchase.
            let mut active: customer::ActiveModel = existing.into();
            active.first_name = Set(input.first_name);
            active.last_name = Set(input.last_name);
            active.phone = Set(input.phone);
            active.billing_address_line1 = Set(input.billing_address_line1);
            active.billing_address_line2 = Set(input.billing_address_line2);
            active.billing_city = Set(input.billing_city);
            active.billing_state = Set(input.billing_state);
            active.billing_country = Set(input.billing_country);
            active.billing_postal_code = Set(input.billing_postal_code);
            active.updated_at = Set(now);

            let updated = active.update(conn).await?;
            return Ok((updated, false));
        }

        let customer_id = Uuid::new_v4();
        let new_customer = customer::ActiveModel {
            id: Set(customer_id),
            user_id: Set(input.user_id),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            email: Set(input.email),
            phone: Set(input.phone),
            billing_address_line1: Set(input.billing_address_line1),
            billing_address_line2: Set(input.billing_address_line2),
            billing_city: Set(input.billing_city),
            billing_state: Set(input.billing_state),
            billing_country: Set(input.billing_country),
            billing_postal_code: Set(input.billing_postal_code),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = new_customer.insert(conn).await?;
        info!(customer_id = %customer_id, "Customer created");

        Ok((created, true))
    }

    /// Retrieves a customer by ID
    #[instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn get_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Option<CustomerModel>, ServiceError> {
        let customer = CustomerEntity::find_by_id(customer_id)
            .one(self.db_pool.as_ref())
            .await?;
        Ok(customer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(email: &str) -> CustomerInput {
        CustomerInput {
            user_id: None,
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: email.into(),
            phone: None,
            billing_address_line1: None,
            billing_address_line2: None,
            billing_city: None,
            billing_state: None,
            billing_country: None,
            billing_postal_code: None,
        }
    }

    #[test]
    fn rejects_invalid_email() {
        let bad = input("not-an-email");
        assert!(bad.validate().is_err());
    }

    #[test]
    fn accepts_minimal_guest_input() {
        let ok = input("ada@example.com");
        assert!(ok.validate().is_ok());
    }
}
