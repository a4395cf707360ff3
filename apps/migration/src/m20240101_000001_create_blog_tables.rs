use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    Username,
    PasswordHash,
    FirstName,
    LastName,
    Bio,
    Location,
    BirthDate,
    Avatar,
    IsVerified,
    LastLogin,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
    Name,
    Slug,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tags {
    Table,
    Id,
    Name,
    Slug,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Posts {
    Table,
    Id,
    AuthorId,
    CategoryId,
    Title,
    Slug,
    Content,
    Excerpt,
    Status,
    FeaturedImage,
    IsFeatured,
    ViewsCount,
    LikesCount,
    PublishedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PostTags {
    Table,
    PostId,
    TagId,
}

#[derive(DeriveIden)]
enum Comments {
    Table,
    Id,
    PostId,
    AuthorId,
    ParentId,
    Content,
    IsApproved,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Likes {
    Table,
    Id,
    UserId,
    PostId,
    CreatedAt,
}

fn timestamps(table: &mut TableCreateStatement, created: impl IntoIden, updated: Option<impl IntoIden>) {
    table.col(
        ColumnDef::new(created)
            .timestamp_with_time_zone()
            .not_null()
            .default(Expr::current_timestamp()),
    );
    if let Some(updated) = updated {
        table.col(
            ColumnDef::new(updated)
                .timestamp_with_time_zone()
                .not_null()
                .default(Expr::current_timestamp()),
        );
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut users = Table::create();
        users
            .table(Users::Table)
            .if_not_exists()
            .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
            .col(ColumnDef::new(Users::Email).string_len(254).not_null().unique_key())
            .col(ColumnDef::new(Users::Username).string_len(150).not_null().unique_key())
            .col(ColumnDef::new(Users::PasswordHash).string().not_null())
            .col(ColumnDef::new(Users::FirstName).string_len(150).not_null().default(""))
            .col(ColumnDef::new(Users::LastName).string_len(150).not_null().default(""))
            .col(ColumnDef::new(Users::Bio).text().not_null().default(""))
            .col(ColumnDef::new(Users::Location).string_len(30).not_null().default(""))
            .col(ColumnDef::new(Users::BirthDate).date().null())
            .col(ColumnDef::new(Users::Avatar).string().null())
            .col(ColumnDef::new(Users::IsVerified).boolean().not_null().default(false))
            .col(ColumnDef::new(Users::LastLogin).timestamp_with_time_zone().null());
        timestamps(&mut users, Users::CreatedAt, Some(Users::UpdatedAt));
        manager.create_table(users).await?;

        let mut categories = Table::create();
        categories
            .table(Categories::Table)
            .if_not_exists()
            .col(ColumnDef::new(Categories::Id).uuid().not_null().primary_key())
            .col(ColumnDef::new(Categories::Name).string_len(100).not_null().unique_key())
            .col(ColumnDef::new(Categories::Slug).string_len(100).not_null().unique_key())
            .col(ColumnDef::new(Categories::Description).text().not_null().default(""));
        timestamps(&mut categories, Categories::CreatedAt, Some(Categories::UpdatedAt));
        manager.create_table(categories).await?;

        let mut tags = Table::create();
        tags.table(Tags::Table)
            .if_not_exists()
            .col(ColumnDef::new(Tags::Id).uuid().not_null().primary_key())
            .col(ColumnDef::new(Tags::Name).string_len(50).not_null().unique_key())
            .col(ColumnDef::new(Tags::Slug).string_len(50).not_null().unique_key());
        timestamps(&mut tags, Tags::CreatedAt, None::<Tags>);
        manager.create_table(tags).await?;

        let mut posts = Table::create();
        posts
            .table(Posts::Table)
            .if_not_exists()
            .col(ColumnDef::new(Posts::Id).uuid().not_null().primary_key())
            .col(ColumnDef::new(Posts::AuthorId).uuid().not_null())
            .col(ColumnDef::new(Posts::CategoryId).uuid().null())
            .col(ColumnDef::new(Posts::Title).string_len(200).not_null())
            .col(ColumnDef::new(Posts::Slug).string_len(200).not_null().unique_key())
            .col(ColumnDef::new(Posts::Content).text().not_null())
            .col(ColumnDef::new(Posts::Excerpt).string_len(300).not_null().default(""))
            .col(ColumnDef::new(Posts::Status).string_len(10).not_null().default("draft"))
            .col(ColumnDef::new(Posts::FeaturedImage).string().null())
            .col(ColumnDef::new(Posts::IsFeatured).boolean().not_null().default(false))
            .col(ColumnDef::new(Posts::ViewsCount).big_integer().not_null().default(0))
            .col(ColumnDef::new(Posts::LikesCount).big_integer().not_null().default(0))
            .col(ColumnDef::new(Posts::PublishedAt).timestamp_with_time_zone().null())
            .check(Expr::col(Posts::Status).is_in(["draft", "published", "archived"]))
            .check(Expr::col(Posts::ViewsCount).gte(0))
            .check(Expr::col(Posts::LikesCount).gte(0))
            .foreign_key(
                ForeignKey::create()
                    .name("fk_posts_author")
                    .from(Posts::Table, Posts::AuthorId)
                    .to(Users::Table, Users::Id)
                    .on_delete(ForeignKeyAction::Cascade),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk_posts_category")
                    .from(Posts::Table, Posts::CategoryId)
                    .to(Categories::Table, Categories::Id)
                    .on_delete(ForeignKeyAction::SetNull),
            );
        timestamps(&mut posts, Posts::CreatedAt, Some(Posts::UpdatedAt));
        manager.create_table(posts).await?;

        manager
            .create_table(
                Table::create()
                    .table(PostTags::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PostTags::PostId).uuid().not_null())
                    .col(ColumnDef::new(PostTags::TagId).uuid().not_null())
                    .primary_key(Index::create().col(PostTags::PostId).col(PostTags::TagId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_tags_post")
                            .from(PostTags::Table, PostTags::PostId)
                            .to(Posts::Table, Posts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_tags_tag")
                            .from(PostTags::Table, PostTags::TagId)
                            .to(Tags::Table, Tags::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        let mut comments = Table::create();
        comments
            .table(Comments::Table)
            .if_not_exists()
            .col(ColumnDef::new(Comments::Id).uuid().not_null().primary_key())
            .col(ColumnDef::new(Comments::PostId).uuid().not_null())
            .col(ColumnDef::new(Comments::AuthorId).uuid().not_null())
            .col(ColumnDef::new(Comments::ParentId).uuid().null())
            .col(ColumnDef::new(Comments::Content).text().not_null())
            .col(ColumnDef::new(Comments::IsApproved).boolean().not_null().default(true))
            .foreign_key(
                ForeignKey::create()
                    .name("fk_comments_post")
                    .from(Comments::Table, Comments::PostId)
                    .to(Posts::Table, Posts::Id)
                    .on_delete(ForeignKeyAction::Cascade),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk_comments_author")
                    .from(Comments::Table, Comments::AuthorId)
                    .to(Users::Table, Users::Id)
                    .on_delete(ForeignKeyAction::Cascade),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk_comments_parent")
                    .from(Comments::Table, Comments::ParentId)
                    .to(Comments::Table, Comments::Id)
                    .on_delete(ForeignKeyAction::Cascade),
            );
        timestamps(&mut comments, Comments::CreatedAt, Some(Comments::UpdatedAt));
        manager.create_table(comments).await?;

        let mut likes = Table::create();
        likes
            .table(Likes::Table)
            .if_not_exists()
            .col(ColumnDef::new(Likes::Id).uuid().not_null().primary_key())
            .col(ColumnDef::new(Likes::UserId).uuid().not_null())
            .col(ColumnDef::new(Likes::PostId).uuid().not_null())
            .foreign_key(
                ForeignKey::create()
                    .name("fk_likes_user")
                    .from(Likes::Table, Likes::UserId)
                    .to(Users::Table, Users::Id)
                    .on_delete(ForeignKeyAction::Cascade),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk_likes_post")
                    .from(Likes::Table, Likes::PostId)
                    .to(Posts::Table, Posts::Id)
                    .on_delete(ForeignKeyAction::Cascade),
            );
        timestamps(&mut likes, Likes::CreatedAt, None::<Likes>);
        manager.create_table(likes).await?;

        // One like per (user, post); the toggle relies on this to settle races.
        manager
            .create_index(
                Index::create()
                    .name("uq_likes_user_post")
                    .table(Likes::Table)
                    .col(Likes::UserId)
                    .col(Likes::PostId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_likes_post")
                    .table(Likes::Table)
                    .col(Likes::PostId)
                    .to_owned(),
            )
            .await?;

        for (name, column) in [
            ("idx_posts_status", Posts::Status),
            ("idx_posts_author", Posts::AuthorId),
            ("idx_posts_category", Posts::CategoryId),
            ("idx_posts_created_at", Posts::CreatedAt),
            ("idx_posts_published_at", Posts::PublishedAt),
        ] {
            manager
                .create_index(Index::create().name(name).table(Posts::Table).col(column).to_owned())
                .await?;
        }

        for (name, column) in [
            ("idx_comments_post", Comments::PostId),
            ("idx_comments_parent", Comments::ParentId),
        ] {
            manager
                .create_index(Index::create().name(name).table(Comments::Table).col(column).to_owned())
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Likes::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Comments::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PostTags::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Posts::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tags::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}
