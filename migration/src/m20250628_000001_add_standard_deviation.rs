use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum DailyAlbums {
    Table,
    StandardDeviation,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Frozen at finalization alongside the rating; NULL until then (or when the
/// day received no reviews).
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(DailyAlbums::Table)
                    .add_column(
                        ColumnDef::new(DailyAlbums::StandardDeviation)
                            .double()
                            .null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(DailyAlbums::Table)
                    .drop_column(DailyAlbums::StandardDeviation)
                    .to_owned(),
            )
            .await
    }
}
