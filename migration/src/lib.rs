pub use sea_orm_migration::prelude::*;

mod m20250601_000001_initial;
mod m20250628_000001_add_standard_deviation;
mod m20250712_000001_add_user_review_stats;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_initial::Migration),
            Box::new(m20250628_000001_add_standard_deviation::Migration),
            Box::new(m20250712_000001_add_user_review_stats::Migration),
        ]
    }
}
