use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ========== STATIONS ==========
        // One row per externally assigned station id. Never deleted by the sync.
        manager
            .create_table(
                Table::create()
                    .table(Stations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Stations::StationId)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Stations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ========== SENSORS ==========
        manager
            .create_table(
                Table::create()
                    .table(Sensors::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Sensors::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Sensors::StationId).integer().not_null())
                    .col(ColumnDef::new(Sensors::Key).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Sensors::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sensors_station")
                            .from(Sensors::Table, Sensors::StationId)
                            .to(Stations::Table, Stations::StationId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // A key exists at most once per station
        manager
            .create_index(
                Index::create()
                    .name("idx_sensors_station_key")
                    .table(Sensors::Table)
                    .col(Sensors::StationId)
                    .col(Sensors::Key)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ========== MEASUREMENTS ==========
        // The serial id keeps insertion order of a sensor's value list.
        manager
            .create_table(
                Table::create()
                    .table(Measurements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Measurements::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Measurements::SensorId).uuid().not_null())
                    .col(
                        ColumnDef::new(Measurements::Date)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Measurements::Value).double().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_measurements_sensor")
                            .from(Measurements::Table, Measurements::SensorId)
                            .to(Sensors::Table, Sensors::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // No two measurements of one sensor share a (normalized) date
        manager
            .create_index(
                Index::create()
                    .name("idx_measurements_sensor_date")
                    .table(Measurements::Table)
                    .col(Measurements::SensorId)
                    .col(Measurements::Date)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Measurements::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sensors::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Stations::Table).if_exists().to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum Stations {
    Table,
    StationId,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum Sensors {
    Table,
    Id,
    StationId,
    Key,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum Measurements {
    Table,
    Id,
    SensorId,
    Date,
    Value,
}
