use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SequenceCounters::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(SequenceCounters::Kind).string().not_null())
                    .col(ColumnDef::new(SequenceCounters::Year).integer().not_null())
                    .col(
                        ColumnDef::new(SequenceCounters::LastValue)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .primary_key(
                        Index::create()
                            .col(SequenceCounters::Kind)
                            .col(SequenceCounters::Year),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SequenceCounters::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SequenceCounters {
    Table,
    Kind,
    Year,
    LastValue,
}
