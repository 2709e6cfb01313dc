use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_catalog_tables::Migration),
            Box::new(m20240101_000002_create_order_tables::Migration),
            Box::new(m20240101_000003_create_session_tables::Migration),
            Box::new(m20240101_000004_create_ledger_tables::Migration),
        ]
    }
}

mod m20240101_000001_create_catalog_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(
                            ColumnDef::new(Products::IsBlackLabel)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Products::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Products::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Blanks::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Blanks::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Blanks::Name).string().not_null())
                        .col(ColumnDef::new(Blanks::GarmentType).string().not_null())
                        .col(ColumnDef::new(Blanks::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Blanks::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(BlankVariants::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(BlankVariants::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(BlankVariants::BlankId).uuid().not_null())
                        .col(ColumnDef::new(BlankVariants::Name).string().not_null())
                        .col(ColumnDef::new(BlankVariants::Color).string().not_null())
                        .col(ColumnDef::new(BlankVariants::Size).string().not_null())
                        .col(
                            ColumnDef::new(BlankVariants::Quantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(BlankVariants::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(BlankVariants::UpdatedAt).timestamp().null())
                        .foreign_key(
                            ForeignKey::create()
                                .from(BlankVariants::Table, BlankVariants::BlankId)
                                .to(Blanks::Table, Blanks::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductVariants::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductVariants::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductVariants::ProductId).uuid().not_null())
                        .col(ColumnDef::new(ProductVariants::Name).string().not_null())
                        .col(
                            ColumnDef::new(ProductVariants::WarehouseInventory)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductVariants::BlankVariantId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProductVariants::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductVariants::UpdatedAt).timestamp().null())
                        .foreign_key(
                            ForeignKey::create()
                                .from(ProductVariants::Table, ProductVariants::ProductId)
                                .to(Products::Table, Products::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .from(ProductVariants::Table, ProductVariants::BlankVariantId)
                                .to(BlankVariants::Table, BlankVariants::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Prints::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Prints::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Prints::ProductId).uuid().not_null())
                        .col(ColumnDef::new(Prints::Location).string().not_null())
                        .col(ColumnDef::new(Prints::Pretreat).string().null())
                        .col(
                            ColumnDef::new(Prints::HeatTransfer)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Prints::SmallFormat)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Prints::CreatedAt).timestamp().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .from(Prints::Table, Prints::ProductId)
                                .to(Products::Table, Products::Id),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Prints::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ProductVariants::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(BlankVariants::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Blanks::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Products {
        Table,
        Id,
        Name,
        IsBlackLabel,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum Blanks {
        Table,
        Id,
        Name,
        GarmentType,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum BlankVariants {
        Table,
        Id,
        BlankId,
        Name,
        Color,
        Size,
        Quantity,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum ProductVariants {
        Table,
        Id,
        ProductId,
        Name,
        WarehouseInventory,
        BlankVariantId,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum Prints {
        Table,
        Id,
        ProductId,
        Location,
        Pretreat,
        HeatTransfer,
        SmallFormat,
        CreatedAt,
    }
}

mod m20240101_000002_create_order_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Orders::Name).string().not_null())
                        .col(
                            ColumnDef::new(Orders::Cancelled)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Orders::FulfillmentStatus)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::HasActiveHold)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Orders::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Orders::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(LineItems::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(LineItems::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(LineItems::OrderId).uuid().not_null())
                        .col(ColumnDef::new(LineItems::Name).string().not_null())
                        .col(ColumnDef::new(LineItems::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(LineItems::RequiresShipping)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(LineItems::RemainingQuantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(LineItems::CompletionStatus)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(LineItems::ProductVariantId).uuid().null())
                        .col(ColumnDef::new(LineItems::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(LineItems::UpdatedAt).timestamp().null())
                        .foreign_key(
                            ForeignKey::create()
                                .from(LineItems::Table, LineItems::OrderId)
                                .to(Orders::Table, Orders::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_line_items_order_id")
                        .table(LineItems::Table)
                        .col(LineItems::OrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(LineItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Orders {
        Table,
        Id,
        Name,
        Cancelled,
        FulfillmentStatus,
        HasActiveHold,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum LineItems {
        Table,
        Id,
        OrderId,
        Name,
        Quantity,
        RequiresShipping,
        RemainingQuantity,
        CompletionStatus,
        ProductVariantId,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_session_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_session_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Sessions::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Sessions::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Sessions::Name).string().not_null())
                        .col(ColumnDef::new(Sessions::Status).string().not_null())
                        .col(
                            ColumnDef::new(Sessions::Active)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Sessions::AssemblyPlan).text().null())
                        .col(ColumnDef::new(Sessions::PickingRequirements).text().null())
                        .col(ColumnDef::new(Sessions::StartedAt).timestamp().null())
                        .col(ColumnDef::new(Sessions::SettledAt).timestamp().null())
                        .col(ColumnDef::new(Sessions::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Sessions::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SessionOrders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(SessionOrders::SessionId).uuid().not_null())
                        .col(ColumnDef::new(SessionOrders::OrderId).uuid().not_null())
                        .col(
                            ColumnDef::new(SessionOrders::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .primary_key(
                            Index::create()
                                .col(SessionOrders::SessionId)
                                .col(SessionOrders::OrderId),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .from(SessionOrders::Table, SessionOrders::SessionId)
                                .to(Sessions::Table, Sessions::Id),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SessionOrders::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Sessions::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Sessions {
        Table,
        Id,
        Name,
        Status,
        Active,
        AssemblyPlan,
        PickingRequirements,
        StartedAt,
        SettledAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum SessionOrders {
        Table,
        SessionId,
        OrderId,
        CreatedAt,
    }
}

mod m20240101_000004_create_ledger_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_ledger_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(AuditLogs::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(AuditLogs::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(AuditLogs::Action).string().not_null())
                        .col(ColumnDef::new(AuditLogs::Detail).string().null())
                        .col(ColumnDef::new(AuditLogs::SessionId).uuid().null())
                        .col(ColumnDef::new(AuditLogs::LineItemId).uuid().null())
                        .col(ColumnDef::new(AuditLogs::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InventoryTransactions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryTransactions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::BlankVariantId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::ProductVariantId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::ChangeAmount)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::PreviousQuantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::NewQuantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::Reason)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryTransactions::SessionId).uuid().null())
                        .col(
                            ColumnDef::new(InventoryTransactions::LineItemId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::AuditLogId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_inventory_transactions_session")
                        .table(InventoryTransactions::Table)
                        .col(InventoryTransactions::SessionId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryTransactions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(AuditLogs::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum AuditLogs {
        Table,
        Id,
        Action,
        Detail,
        SessionId,
        LineItemId,
        CreatedAt,
    }

    #[derive(Iden)]
    enum InventoryTransactions {
        Table,
        Id,
        BlankVariantId,
        ProductVariantId,
        ChangeAmount,
        PreviousQuantity,
        NewQuantity,
        Reason,
        SessionId,
        LineItemId,
        AuditLogId,
        CreatedAt,
    }
}
