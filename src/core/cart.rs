//! Cart business logic - one row per (student, menu item).
//!
//! Stock is checked when the cart is written, not continuously. A later stock
//! drop can leave a cart asking for more than is on hand; checkout re-validates
//! inside its transaction.

use crate::{
    core::{menu, money},
    entities::{CartEntry, MenuItem, cart_entry, menu_item},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Serialize;

/// One cart row joined with current catalog data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    /// Cart row id
    pub id: i64,
    /// Item in the cart
    pub menu_item_id: i64,
    /// Requested units
    pub quantity: i32,
    /// Item name
    pub name: String,
    /// Current unit price
    pub price: Decimal,
    /// Current stock of the item
    pub stock_quantity: i32,
    /// `price * quantity`
    pub total_price: Decimal,
}

async fn orderable_item(db: &DatabaseConnection, item_id: i64) -> Result<menu_item::Model> {
    let item = menu::get_menu_item(db, item_id)
        .await?
        .ok_or(Error::MenuItemNotFound { item_id })?;

    if !item.is_available {
        return Err(Error::ItemUnavailable { item: item.name });
    }

    Ok(item)
}

async fn find_entry(
    db: &DatabaseConnection,
    student_id: i64,
    item_id: i64,
) -> Result<Option<cart_entry::Model>> {
    CartEntry::find()
        .filter(cart_entry::Column::StudentId.eq(student_id))
        .filter(cart_entry::Column::MenuItemId.eq(item_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Adds `quantity` units of an item, merging with an existing row.
///
/// The combined quantity must not exceed current stock.
pub async fn add_to_cart(
    db: &DatabaseConnection,
    student_id: i64,
    item_id: i64,
    quantity: i32,
) -> Result<cart_entry::Model> {
    if quantity <= 0 {
        return Err(Error::validation("Quantity must be greater than zero"));
    }

    let item = orderable_item(db, item_id).await?;
    let existing = find_entry(db, student_id, item_id).await?;
    let in_cart = existing.as_ref().map_or(0, |entry| entry.quantity);
    let new_total = in_cart.saturating_add(quantity);

    if new_total > item.quantity {
        return Err(Error::InsufficientStock {
            item: item.name,
            available: item.quantity,
            requested: new_total,
        });
    }

    let now = chrono::Utc::now().naive_utc();
    let entry = if let Some(entry) = existing {
        let mut entry: cart_entry::ActiveModel = entry.into();
        entry.quantity = Set(new_total);
        entry.updated_at = Set(now);
        entry.update(db).await?
    } else {
        cart_entry::ActiveModel {
            student_id: Set(student_id),
            menu_item_id: Set(item_id),
            quantity: Set(quantity),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?
    };

    Ok(entry)
}

/// Sets the quantity of an item already in the cart.
///
/// A quantity of zero or less removes the row and returns `None`.
pub async fn update_cart_item(
    db: &DatabaseConnection,
    student_id: i64,
    item_id: i64,
    quantity: i32,
) -> Result<Option<cart_entry::Model>> {
    if quantity <= 0 {
        remove_from_cart(db, student_id, item_id).await?;
        return Ok(None);
    }

    let item = menu::get_menu_item(db, item_id)
        .await?
        .ok_or(Error::MenuItemNotFound { item_id })?;

    if quantity > item.quantity {
        return Err(Error::InsufficientStock {
            item: item.name,
            available: item.quantity,
            requested: quantity,
        });
    }

    let entry = find_entry(db, student_id, item_id)
        .await?
        .ok_or_else(|| Error::validation(format!("'{}' is not in your cart", item.name)))?;

    let mut entry: cart_entry::ActiveModel = entry.into();
    entry.quantity = Set(quantity);
    entry.updated_at = Set(chrono::Utc::now().naive_utc());
    Ok(Some(entry.update(db).await?))
}

/// Removes an item from the cart. Removing an absent item is not an error.
pub async fn remove_from_cart(db: &DatabaseConnection, student_id: i64, item_id: i64) -> Result<()> {
    CartEntry::delete_many()
        .filter(cart_entry::Column::StudentId.eq(student_id))
        .filter(cart_entry::Column::MenuItemId.eq(item_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Returns the student's cart with current prices.
pub async fn get_cart(db: &DatabaseConnection, student_id: i64) -> Result<Vec<CartLine>> {
    let rows = CartEntry::find()
        .filter(cart_entry::Column::StudentId.eq(student_id))
        .find_also_related(MenuItem)
        .order_by_asc(cart_entry::Column::Id)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(entry, item)| {
            let item = item?;
            let price = money::from_cents(item.price_cents);
            Some(CartLine {
                id: entry.id,
                menu_item_id: entry.menu_item_id,
                quantity: entry.quantity,
                name: item.name,
                price,
                stock_quantity: item.quantity,
                total_price: price * Decimal::from(entry.quantity),
            })
        })
        .collect())
}

/// Deletes every cart row of a student. Returns how many rows were removed.
pub async fn clear_cart<C>(db: &C, student_id: i64) -> Result<u64>
where
    C: ConnectionTrait,
{
    let result = CartEntry::delete_many()
        .filter(cart_entry::Column::StudentId.eq(student_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
