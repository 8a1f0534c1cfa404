pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_events_table;
mod m20250301_000002_create_ticket_types_table;
mod m20250301_000003_create_ticket_inventory_table;
mod m20250301_000004_create_customers_table;
mod m20250301_000005_create_orders_table;
mod m20250301_000006_create_order_items_table;
mod m20250301_000007_create_tickets_table;
mod m20250520_000008_add_tickets_pagination_index;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_events_table::Migration),
            Box::new(m20250301_000002_create_ticket_types_table::Migration),
            Box::new(m20250301_000003_create_ticket_inventory_table::Migration),
            Box::new(m20250301_000004_create_customers_table::Migration),
            Box::new(m20250301_000005_create_orders_table::Migration),
            Box::new(m20250301_000006_create_order_items_table::Migration),
            Box::new(m20250301_000007_create_tickets_table::Migration),
            Box::new(m20250520_000008_add_tickets_pagination_index::Migration),
        ]
    }
}
