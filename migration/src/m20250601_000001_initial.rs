use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    DiscordId,
    Nickname,
    AotdEnrolled,
    CreatedAt,
}

/// Per-participant AOtD bookkeeping (streaks + selection eligibility flag)
#[derive(DeriveIden)]
enum AotdUserData {
    Table,
    UserId,
    SelectionBlockedFlag,
    CurrentStreak,
    LongestStreak,
    LastReviewDate,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Albums {
    Table,
    Id,
    CatalogId,
    Title,
    Artist,
    ArtistUrl,
    CoverUrl,
    AlbumUrl,
    SubmittedBy,
    UserComment,
    SubmissionDate,
    ReleaseDate,
}

/// One row per calendar day. Rating defaults to the 11.0 "unfinalized"
/// sentinel; NULL rating means "finalized with zero reviews".
#[derive(DeriveIden)]
enum DailyAlbums {
    Table,
    Id,
    AlbumId,
    Date,
    Manual,
    AdminMessage,
    Rating,
    Timeline,
}

#[derive(DeriveIden)]
enum Reviews {
    Table,
    Id,
    AlbumId,
    UserId,
    AotdDate,
    Score,
    ReviewText,
    FirstListen,
    ReviewDate,
    LastUpdated,
    Version,
}

/// Append-only pre-edit snapshots. `last_updated` is the timestamp the
/// snapshotted version was itself created/edited; `recorded_at` is when the
/// superseding edit happened.
#[derive(DeriveIden)]
enum ReviewHistory {
    Table,
    Id,
    ReviewId,
    AotdDate,
    Score,
    ReviewText,
    FirstListen,
    LastUpdated,
    RecordedAt,
}

#[derive(DeriveIden)]
enum Outages {
    Table,
    Id,
    UserId,
    StartDate,
    EndDate,
    Reason,
    AdminEnacted,
    AdminEnactor,
    CreatedAt,
}

#[derive(DeriveIden)]
enum SelectionChances {
    Table,
    Id,
    UserId,
    ChancePercentage,
    BlockType,
    OutageId,
    Reason,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::DiscordId).string().not_null())
                    .col(ColumnDef::new(Users::Nickname).string().not_null())
                    .col(
                        ColumnDef::new(Users::AotdEnrolled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_users_discord_id")
                    .table(Users::Table)
                    .col(Users::DiscordId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AotdUserData::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AotdUserData::UserId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AotdUserData::SelectionBlockedFlag)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(AotdUserData::CurrentStreak)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(AotdUserData::LongestStreak)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(AotdUserData::LastReviewDate).date().null())
                    .col(
                        ColumnDef::new(AotdUserData::CreatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_aotd_user_data_user")
                            .from(AotdUserData::Table, AotdUserData::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Albums::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Albums::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Albums::CatalogId).string().not_null())
                    .col(ColumnDef::new(Albums::Title).string().not_null())
                    .col(ColumnDef::new(Albums::Artist).string().not_null())
                    .col(ColumnDef::new(Albums::ArtistUrl).string().null())
                    .col(ColumnDef::new(Albums::CoverUrl).string().null())
                    .col(ColumnDef::new(Albums::AlbumUrl).string().null())
                    .col(ColumnDef::new(Albums::SubmittedBy).big_integer().null())
                    .col(ColumnDef::new(Albums::UserComment).text().null())
                    .col(
                        ColumnDef::new(Albums::SubmissionDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Albums::ReleaseDate).date().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_albums_submitted_by")
                            .from(Albums::Table, Albums::SubmittedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_albums_catalog_id")
                    .table(Albums::Table)
                    .col(Albums::CatalogId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DailyAlbums::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DailyAlbums::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DailyAlbums::AlbumId).big_integer().not_null())
                    .col(ColumnDef::new(DailyAlbums::Date).date().not_null())
                    .col(
                        ColumnDef::new(DailyAlbums::Manual)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(DailyAlbums::AdminMessage).string().null())
                    .col(
                        ColumnDef::new(DailyAlbums::Rating)
                            .double()
                            .null()
                            .default(11.0),
                    )
                    .col(ColumnDef::new(DailyAlbums::Timeline).json().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_daily_albums_album")
                            .from(DailyAlbums::Table, DailyAlbums::AlbumId)
                            .to(Albums::Table, Albums::Id),
                    )
                    .to_owned(),
            )
            .await?;
        // At most one pick per calendar day, enforced by the store so the
        // selection job's check-then-insert cannot race itself.
        manager
            .create_index(
                Index::create()
                    .name("idx_daily_albums_date")
                    .table(DailyAlbums::Table)
                    .col(DailyAlbums::Date)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Reviews::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Reviews::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Reviews::AlbumId).big_integer().not_null())
                    .col(ColumnDef::new(Reviews::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Reviews::AotdDate).date().not_null())
                    .col(ColumnDef::new(Reviews::Score).double().not_null())
                    .col(ColumnDef::new(Reviews::ReviewText).text().null())
                    .col(
                        ColumnDef::new(Reviews::FirstListen)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Reviews::ReviewDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reviews::LastUpdated)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reviews::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reviews_album")
                            .from(Reviews::Table, Reviews::AlbumId)
                            .to(Albums::Table, Albums::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reviews_user")
                            .from(Reviews::Table, Reviews::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        // One review per (album, user, day); edits mutate the row in place.
        manager
            .create_index(
                Index::create()
                    .name("idx_reviews_album_user_day")
                    .table(Reviews::Table)
                    .col(Reviews::AlbumId)
                    .col(Reviews::UserId)
                    .col(Reviews::AotdDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ReviewHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReviewHistory::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ReviewHistory::ReviewId).big_integer().not_null())
                    .col(ColumnDef::new(ReviewHistory::AotdDate).date().not_null())
                    .col(ColumnDef::new(ReviewHistory::Score).double().not_null())
                    .col(ColumnDef::new(ReviewHistory::ReviewText).text().null())
                    .col(
                        ColumnDef::new(ReviewHistory::FirstListen)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ReviewHistory::LastUpdated)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReviewHistory::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_review_history_review")
                            .from(ReviewHistory::Table, ReviewHistory::ReviewId)
                            .to(Reviews::Table, Reviews::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_review_history_review_recorded")
                    .table(ReviewHistory::Table)
                    .col(ReviewHistory::ReviewId)
                    .col(ReviewHistory::RecordedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Outages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Outages::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Outages::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Outages::StartDate).date().not_null())
                    .col(ColumnDef::new(Outages::EndDate).date().not_null())
                    .col(ColumnDef::new(Outages::Reason).string().not_null())
                    .col(
                        ColumnDef::new(Outages::AdminEnacted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Outages::AdminEnactor).big_integer().null())
                    .col(
                        ColumnDef::new(Outages::CreatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_outages_user")
                            .from(Outages::Table, Outages::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_outages_user_dates")
                    .table(Outages::Table)
                    .col(Outages::UserId)
                    .col(Outages::StartDate)
                    .col(Outages::EndDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SelectionChances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SelectionChances::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SelectionChances::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SelectionChances::ChancePercentage)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(SelectionChances::BlockType).string().null())
                    .col(ColumnDef::new(SelectionChances::OutageId).big_integer().null())
                    .col(ColumnDef::new(SelectionChances::Reason).string().null())
                    .col(
                        ColumnDef::new(SelectionChances::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_selection_chances_user")
                            .from(SelectionChances::Table, SelectionChances::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_selection_chances_user")
                    .table(SelectionChances::Table)
                    .col(SelectionChances::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SelectionChances::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Outages::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ReviewHistory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Reviews::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DailyAlbums::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Albums::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AotdUserData::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
