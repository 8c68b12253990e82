pub use sea_orm_migration::prelude::*;

mod m20250901_000001_create_users_table;
mod m20250901_000002_create_categories_table;
mod m20250901_000003_create_products_table;
mod m20250901_000004_create_orders_table;
mod m20250901_000005_create_order_items_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250901_000001_create_users_table::Migration),
            Box::new(m20250901_000002_create_categories_table::Migration),
            Box::new(m20250901_000003_create_products_table::Migration),
            Box::new(m20250901_000004_create_orders_table::Migration),
            Box::new(m20250901_000005_create_order_items_table::Migration),
        ]
    }
}
