//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs. Constraints entities cannot express, uniqueness of a student's
//! cart row or favourite per menu item, are added as explicit indexes.

use crate::entities::{
    CartEntry, CartEntryColumn, Favourite, FavouriteColumn, Feedback, MenuItem, Notification,
    Order, OrderLine, Staff, Student, TimeSlot,
};
use crate::errors::Result;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema,
    sea_query::{Index, TableCreateStatement},
};
use std::path::Path;
use tracing::info;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/canteen.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    if let Some(path) = database_url.strip_prefix("sqlite://") {
        let file = path.split('?').next().unwrap_or(path);
        if let Some(dir) = Path::new(file).parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
    }
    info!("Connecting to database at {database_url}");
    Database::connect(&database_url).await.map_err(Into::into)
}

fn table_for<E: EntityTrait>(schema: &Schema, entity: E) -> TableCreateStatement {
    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    table
}

/// Creates all tables (if missing) using `SeaORM`'s schema generation from entity definitions.
///
/// Parent tables are created before the tables whose foreign keys reference them.
pub async fn create_tables<C: ConnectionTrait>(db: &C) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let tables = [
        table_for(&schema, Student),
        table_for(&schema, Staff),
        table_for(&schema, MenuItem),
        table_for(&schema, TimeSlot),
        table_for(&schema, CartEntry),
        table_for(&schema, Order),
        table_for(&schema, OrderLine),
        table_for(&schema, Notification),
        table_for(&schema, Feedback),
        table_for(&schema, Favourite),
    ];

    for table in &tables {
        db.execute(builder.build(table)).await?;
    }

    let cart_unique = Index::create()
        .name("idx_cart_entries_student_item")
        .table(CartEntry)
        .col(CartEntryColumn::StudentId)
        .col(CartEntryColumn::MenuItemId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&cart_unique)).await?;

    let favourite_unique = Index::create()
        .name("idx_favourites_student_item")
        .table(Favourite)
        .col(FavouriteColumn::StudentId)
        .col(FavouriteColumn::MenuItemId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&favourite_unique)).await?;

    Ok(())
}
