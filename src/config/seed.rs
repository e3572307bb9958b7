//! Seed data loading from config.toml
//!
//! A fresh database is filled from a TOML file with three optional tables:
//! `[[menu_items]]`, `[[time_slots]]` and `[[staff]]`. Each table is seeded
//! only while its database table is still empty, so restarting the server
//! never duplicates rows.

use crate::{
    core::{account, menu, timeslot},
    entities::{MenuItem, TimeSlot},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Configuration structure representing the entire seed file
#[derive(Debug, Default, Deserialize)]
pub struct SeedConfig {
    /// Catalog to create
    #[serde(default)]
    pub menu_items: Vec<MenuItemSeed>,
    /// Pickup windows to create
    #[serde(default)]
    pub time_slots: Vec<TimeSlotSeed>,
    /// Staff accounts to create
    #[serde(default)]
    pub staff: Vec<PersonSeed>,
}

/// One catalog entry
#[derive(Debug, Deserialize, Clone)]
pub struct MenuItemSeed {
    /// Display name
    pub name: String,
    /// Menu grouping
    pub category: String,
    /// Unit price
    pub price: Decimal,
    /// Opening stock
    #[serde(default)]
    pub quantity: i32,
    /// Optional description
    pub description: Option<String>,
}

/// One pickup window, times as `HH:MM`
#[derive(Debug, Deserialize, Clone)]
pub struct TimeSlotSeed {
    /// Window start
    pub start_time: String,
    /// Window end
    pub end_time: String,
    /// Capacity
    pub max_orders: i32,
}

/// A named account
#[derive(Debug, Deserialize, Clone)]
pub struct PersonSeed {
    /// Display name
    pub name: String,
    /// Contact email
    pub email: String,
}

/// Loads seed data from a TOML file
///
/// # Errors
/// Returns [`Error::Config`] if the file cannot be read or parsed.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SeedConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Inserts seed rows into every table that is still empty.
pub async fn seed_if_empty(db: &DatabaseConnection, config: &SeedConfig) -> Result<()> {
    if MenuItem::find().count(db).await? == 0 {
        for item in &config.menu_items {
            menu::create_menu_item(
                db,
                menu::NewMenuItem {
                    name: item.name.clone(),
                    description: item.description.clone(),
                    category: item.category.clone(),
                    price: item.price,
                    quantity: Some(item.quantity),
                    low_stock_threshold: None,
                },
            )
            .await?;
        }
        info!(count = config.menu_items.len(), "seeded menu items");
    }

    if TimeSlot::find().count(db).await? == 0 {
        for slot in &config.time_slots {
            timeslot::create_slot(
                db,
                timeslot::parse_slot_time(&slot.start_time)?,
                timeslot::parse_slot_time(&slot.end_time)?,
                slot.max_orders,
            )
            .await?;
        }
        info!(count = config.time_slots.len(), "seeded time slots");
    }

    if account::count_staff(db).await? == 0 {
        for person in &config.staff {
            account::create_staff(db, &person.name, &person.email).await?;
        }
        info!(count = config.staff.len(), "seeded staff accounts");
    }

    Ok(())
}
