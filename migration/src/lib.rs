pub use sea_orm_migration::prelude::*;
mod enums;
mod m20250601_000001_create_golfers_and_tee_times;
mod m20250615_000002_create_excluded_dates;
mod macros;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_golfers_and_tee_times::Migration),
            Box::new(m20250615_000002_create_excluded_dates::Migration),
        ]
    }
}
