use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Friends::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Friends::Reference).string().not_null())
                    .col(ColumnDef::new(Friends::Friend).string().not_null())
                    .col(
                        ColumnDef::new(Friends::Accepted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .primary_key(
                        Index::create()
                            .col(Friends::Reference)
                            .col(Friends::Friend),
                    )
                    .to_owned(),
            )
            .await?;

        // 反向查询：谁有指向我的行
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_friends_friend")
                    .table(Friends::Table)
                    .col(Friends::Friend)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Courses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Courses::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Courses::User).string().not_null())
                    .col(ColumnDef::new(Courses::Code).string().not_null())
                    .col(ColumnDef::new(Courses::Year).integer().not_null())
                    .col(ColumnDef::new(Courses::Semester).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_courses_enrolment")
                    .table(Courses::Table)
                    .col(Courses::User)
                    .col(Courses::Code)
                    .col(Courses::Year)
                    .col(Courses::Semester)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 好友推荐按开课信息关联
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_courses_offering")
                    .table(Courses::Table)
                    .col(Courses::Code)
                    .col(Courses::Year)
                    .col(Courses::Semester)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().if_exists().name("idx_courses_offering").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().if_exists().name("uq_courses_enrolment").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().if_exists().name("idx_friends_friend").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Courses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Friends::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Friends {
    Table,
    Reference,
    Friend,
    Accepted,
}

#[derive(DeriveIden)]
enum Courses {
    Table,
    Id,
    User,
    Code,
    Year,
    Semester,
}
