use sea_orm_migration::prelude::*;

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
                        ColumnDef::new(Users::ZId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(ColumnDef::new(Users::Email).string().not_null())
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .col(ColumnDef::new(Users::Program).string().null())
                    .col(ColumnDef::new(Users::Birthday).string().null())
                    .col(ColumnDef::new(Users::Suburb).string().null())
                    .col(ColumnDef::new(Users::Latitude).double().null())
                    .col(ColumnDef::new(Users::Longitude).double().null())
                    .col(ColumnDef::new(Users::Bio).text().null())
                    .col(ColumnDef::new(Users::ImagePath).string().null())
                    .col(ColumnDef::new(Users::BackgroundPath).string().null())
                    .col(
                        ColumnDef::new(Users::Verified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Posts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Posts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Posts::User).string().not_null())
                    .col(ColumnDef::new(Posts::Message).text().not_null())
                    .col(
                        ColumnDef::new(Posts::MediaType)
                            .string()
                            .not_null()
                            .default("text"),
                    )
                    .col(ColumnDef::new(Posts::ContentPath).string().null())
                    .col(
                        ColumnDef::new(Posts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Comments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Comments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Comments::Post).string().not_null())
                    .col(ColumnDef::new(Comments::User).string().not_null())
                    .col(ColumnDef::new(Comments::Message).text().not_null())
                    .col(
                        ColumnDef::new(Comments::MediaType)
                            .string()
                            .not_null()
                            .default("text"),
                    )
                    .col(ColumnDef::new(Comments::ContentPath).string().null())
                    .col(
                        ColumnDef::new(Comments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Replies::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Replies::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Replies::Comment).string().not_null())
                    .col(ColumnDef::new(Replies::Post).string().not_null())
                    .col(ColumnDef::new(Replies::User).string().not_null())
                    .col(ColumnDef::new(Replies::Message).text().not_null())
                    .col(
                        ColumnDef::new(Replies::MediaType)
                            .string()
                            .not_null()
                            .default("text"),
                    )
                    .col(ColumnDef::new(Replies::ContentPath).string().null())
                    .col(
                        ColumnDef::new(Replies::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 动态页与个人主页按作者过滤帖子并按时间排序
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_posts_user")
                    .table(Posts::Table)
                    .col(Posts::User)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_posts_created_at")
                    .table(Posts::Table)
                    .col(Posts::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_comments_post")
                    .table(Comments::Table)
                    .col(Comments::Post)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_replies_comment")
                    .table(Replies::Table)
                    .col(Replies::Comment)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_replies_post")
                    .table(Replies::Table)
                    .col(Replies::Post)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for index in [
            "idx_replies_post",
            "idx_replies_comment",
            "idx_comments_post",
            "idx_posts_created_at",
            "idx_posts_user",
        ] {
            manager
                .drop_index(Index::drop().if_exists().name(index).to_owned())
                .await?;
        }

        manager
            .drop_table(Table::drop().table(Replies::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Comments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Posts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    ZId,
    Name,
    Email,
    Password,
    Program,
    Birthday,
    Suburb,
    Latitude,
    Longitude,
    Bio,
    ImagePath,
    BackgroundPath,
    Verified,
}

#[derive(DeriveIden)]
enum Posts {
    Table,
    Id,
    User,
    Message,
    MediaType,
    ContentPath,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Comments {
    Table,
    Id,
    Post,
    User,
    Message,
    MediaType,
    ContentPath,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Replies {
    Table,
    Id,
    Comment,
    Post,
    User,
    Message,
    MediaType,
    ContentPath,
    CreatedAt,
}
