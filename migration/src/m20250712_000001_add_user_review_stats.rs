use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum AotdUserData {
    Table,
    TotalReviews,
    ReviewScoreAverage,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(AotdUserData::Table)
                    .add_column(
                        ColumnDef::new(AotdUserData::TotalReviews)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(AotdUserData::Table)
                    .add_column(
                        ColumnDef::new(AotdUserData::ReviewScoreAverage)
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
                    .table(AotdUserData::Table)
                    .drop_column(AotdUserData::TotalReviews)
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(AotdUserData::Table)
                    .drop_column(AotdUserData::ReviewScoreAverage)
                    .to_owned(),
            )
            .await
    }
}
