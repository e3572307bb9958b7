//! Menu catalog business logic - the inventory store.
//!
//! Staff create and edit items here. Checkout is the only other writer, and it
//! only ever calls [`decrement_stock`], which refuses to take stock below zero.

use crate::{
    core::money,
    entities::{MenuItem, menu_item},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};

const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 10;

/// Derived stock level shown next to each item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StockStatus {
    /// At or above the low-stock threshold
    #[serde(rename = "In Stock")]
    InStock,
    /// Above zero but below the threshold
    #[serde(rename = "Limited Stock")]
    LimitedStock,
    /// Nothing left
    #[serde(rename = "Out of Stock")]
    OutOfStock,
}

impl StockStatus {
    /// Classifies a stock level against its threshold.
    #[must_use]
    pub const fn classify(quantity: i32, low_stock_threshold: i32) -> Self {
        if quantity <= 0 {
            Self::OutOfStock
        } else if quantity < low_stock_threshold {
            Self::LimitedStock
        } else {
            Self::InStock
        }
    }
}

/// Menu item as presented to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItemView {
    /// Item id
    pub id: i64,
    /// Display name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Menu grouping
    pub category: String,
    /// Current unit price
    pub price: Decimal,
    /// Units in stock
    pub quantity: i32,
    /// Threshold for limited stock
    pub low_stock_threshold: i32,
    /// Derived stock level
    pub stock_status: StockStatus,
    /// Whether the item can be ordered
    pub is_available: bool,
}

impl From<menu_item::Model> for MenuItemView {
    fn from(item: menu_item::Model) -> Self {
        Self {
            stock_status: StockStatus::classify(item.quantity, item.low_stock_threshold),
            price: money::from_cents(item.price_cents),
            id: item.id,
            name: item.name,
            description: item.description,
            category: item.category,
            quantity: item.quantity,
            low_stock_threshold: item.low_stock_threshold,
            is_available: item.is_available,
        }
    }
}

/// Fields for a new menu item
#[derive(Debug, Clone, Deserialize)]
pub struct NewMenuItem {
    /// Display name
    pub name: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Menu grouping
    pub category: String,
    /// Unit price
    pub price: Decimal,
    /// Opening stock, defaults to 0
    #[serde(default)]
    pub quantity: Option<i32>,
    /// Limited-stock threshold, defaults to 10
    #[serde(default)]
    pub low_stock_threshold: Option<i32>,
}

/// Partial update of a menu item; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MenuItemChanges {
    /// New name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New category
    pub category: Option<String>,
    /// New unit price (does not affect existing orders)
    pub price: Option<Decimal>,
    /// New stock level
    pub quantity: Option<i32>,
    /// New threshold
    pub low_stock_threshold: Option<i32>,
    /// Open or close the item for ordering
    pub is_available: Option<bool>,
}

fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("Menu item name cannot be empty"));
    }
    Ok(trimmed.to_string())
}

fn validate_count(field: &str, value: i32) -> Result<i32> {
    if value < 0 {
        return Err(Error::validation(format!("{field} cannot be negative")));
    }
    Ok(value)
}

/// Lists non-deleted items ordered by category then name.
///
/// Students see only available items; staff pass `include_unavailable`.
pub async fn list_menu(
    db: &DatabaseConnection,
    include_unavailable: bool,
) -> Result<Vec<MenuItemView>> {
    let mut query = MenuItem::find().filter(menu_item::Column::IsDeleted.eq(false));
    if !include_unavailable {
        query = query.filter(menu_item::Column::IsAvailable.eq(true));
    }

    let items = query
        .order_by_asc(menu_item::Column::Category)
        .order_by_asc(menu_item::Column::Name)
        .all(db)
        .await?;

    Ok(items.into_iter().map(MenuItemView::from).collect())
}

/// Finds a non-deleted item by id.
pub async fn get_menu_item<C: ConnectionTrait>(
    db: &C,
    item_id: i64,
) -> Result<Option<menu_item::Model>> {
    MenuItem::find_by_id(item_id)
        .filter(menu_item::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a new item after validating name, price and counts.
pub async fn create_menu_item(
    db: &DatabaseConnection,
    new_item: NewMenuItem,
) -> Result<menu_item::Model> {
    let name = validate_name(&new_item.name)?;
    let price_cents = money::to_cents(new_item.price)?;
    let quantity = validate_count("Quantity", new_item.quantity.unwrap_or(0))?;
    let low_stock_threshold = validate_count(
        "Low stock threshold",
        new_item
            .low_stock_threshold
            .unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD),
    )?;

    let now = chrono::Utc::now().naive_utc();
    menu_item::ActiveModel {
        name: Set(name),
        description: Set(new_item.description),
        category: Set(new_item.category.trim().to_string()),
        price_cents: Set(price_cents),
        quantity: Set(quantity),
        low_stock_threshold: Set(low_stock_threshold),
        is_available: Set(true),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Applies a partial update to a non-deleted item.
pub async fn update_menu_item(
    db: &DatabaseConnection,
    item_id: i64,
    changes: MenuItemChanges,
) -> Result<menu_item::Model> {
    let mut item: menu_item::ActiveModel = get_menu_item(db, item_id)
        .await?
        .ok_or(Error::MenuItemNotFound { item_id })?
        .into();

    if let Some(name) = changes.name {
        item.name = Set(validate_name(&name)?);
    }
    if let Some(description) = changes.description {
        item.description = Set(Some(description));
    }
    if let Some(category) = changes.category {
        item.category = Set(category.trim().to_string());
    }
    if let Some(price) = changes.price {
        item.price_cents = Set(money::to_cents(price)?);
    }
    if let Some(quantity) = changes.quantity {
        item.quantity = Set(validate_count("Quantity", quantity)?);
    }
    if let Some(threshold) = changes.low_stock_threshold {
        item.low_stock_threshold = Set(validate_count("Low stock threshold", threshold)?);
    }
    if let Some(is_available) = changes.is_available {
        item.is_available = Set(is_available);
    }
    item.updated_at = Set(chrono::Utc::now().naive_utc());

    item.update(db).await.map_err(Into::into)
}

/// Soft deletes an item so historical order lines keep a valid reference.
pub async fn delete_menu_item(db: &DatabaseConnection, item_id: i64) -> Result<menu_item::Model> {
    let mut item: menu_item::ActiveModel = get_menu_item(db, item_id)
        .await?
        .ok_or(Error::MenuItemNotFound { item_id })?
        .into();

    item.is_deleted = Set(true);
    item.is_available = Set(false);
    item.updated_at = Set(chrono::Utc::now().naive_utc());

    item.update(db).await.map_err(Into::into)
}

/// Atomically takes `quantity` units out of stock.
///
/// Runs a single `UPDATE menu_items SET quantity = quantity - q
/// WHERE id = ? AND quantity >= q`. Returns `false` when the guard fails
/// (not enough stock, or the item is missing); stock is untouched in that case.
pub async fn decrement_stock<C>(db: &C, item_id: i64, quantity: i32) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = MenuItem::update_many()
        .col_expr(
            menu_item::Column::Quantity,
            Expr::col(menu_item::Column::Quantity).sub(quantity),
        )
        .filter(menu_item::Column::Id.eq(item_id))
        .filter(menu_item::Column::Quantity.gte(quantity))
        .exec(db)
        .await?;

    Ok(result.rows_affected == 1)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::str::FromStr;

    #[test]
    fn test_stock_status_classification() {
        assert_eq!(StockStatus::classify(0, 10), StockStatus::OutOfStock);
        assert_eq!(StockStatus::classify(9, 10), StockStatus::LimitedStock);
        assert_eq!(StockStatus::classify(10, 10), StockStatus::InStock);
        assert_eq!(StockStatus::classify(1, 0), StockStatus::InStock);
    }

    #[tokio::test]
    async fn test_create_menu_item_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let blank = NewMenuItem {
            name: "   ".to_string(),
            description: None,
            category: "snacks".to_string(),
            price: Decimal::ONE,
            quantity: None,
            low_stock_threshold: None,
        };
        assert!(matches!(
            create_menu_item(&db, blank.clone()).await,
            Err(Error::Validation { .. })
        ));

        let negative_price = NewMenuItem {
            name: "Samosa".to_string(),
            price: Decimal::from_str("-2.00").unwrap(),
            ..blank.clone()
        };
        assert!(matches!(
            create_menu_item(&db, negative_price).await,
            Err(Error::Validation { .. })
        ));

        let negative_stock = NewMenuItem {
            name: "Samosa".to_string(),
            quantity: Some(-1),
            ..blank
        };
        assert!(matches!(
            create_menu_item(&db, negative_stock).await,
            Err(Error::Validation { .. })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_menu_item_defaults() -> Result<()> {
        let db = setup_test_db().await?;
        let item = create_menu_item(
            &db,
            NewMenuItem {
                name: " Tea ".to_string(),
                description: None,
                category: "beverages".to_string(),
                price: Decimal::from_str("15.00").unwrap(),
                quantity: None,
                low_stock_threshold: None,
            },
        )
        .await?;

        assert_eq!(item.name, "Tea");
        assert_eq!(item.price_cents, 1500);
        assert_eq!(item.quantity, 0);
        assert_eq!(item.low_stock_threshold, 10);
        assert!(item.is_available);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_menu_hides_unavailable_and_deleted() -> Result<()> {
        let db = setup_test_db().await?;
        let tea = create_test_menu_item(&db, "Tea", "15.00", 20).await?;
        let coffee = create_test_menu_item(&db, "Coffee", "25.00", 3).await?;
        let cake = create_test_menu_item(&db, "Cake", "40.00", 0).await?;

        update_menu_item(
            &db,
            coffee.id,
            MenuItemChanges {
                is_available: Some(false),
                ..Default::default()
            },
        )
        .await?;
        delete_menu_item(&db, cake.id).await?;

        let public = list_menu(&db, false).await?;
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].id, tea.id);
        assert_eq!(public[0].stock_status, StockStatus::InStock);

        let staff_view = list_menu(&db, true).await?;
        assert_eq!(staff_view.len(), 2);
        let coffee_view = staff_view.iter().find(|i| i.id == coffee.id).unwrap();
        assert_eq!(coffee_view.stock_status, StockStatus::LimitedStock);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_menu_item_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let result = update_menu_item(&db, 42, MenuItemChanges::default()).await;
        assert!(matches!(result, Err(Error::MenuItemNotFound { item_id: 42 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_deleted_item_is_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let item = create_test_menu_item(&db, "Tea", "15.00", 5).await?;
        delete_menu_item(&db, item.id).await?;

        assert!(get_menu_item(&db, item.id).await?.is_none());
        assert!(matches!(
            delete_menu_item(&db, item.id).await,
            Err(Error::MenuItemNotFound { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_decrement_stock_guard() -> Result<()> {
        let db = setup_test_db().await?;
        let item = create_test_menu_item(&db, "Tea", "15.00", 5).await?;

        assert!(decrement_stock(&db, item.id, 3).await?);
        assert_eq!(get_menu_item(&db, item.id).await?.unwrap().quantity, 2);

        // Not enough left: nothing changes
        assert!(!decrement_stock(&db, item.id, 3).await?);
        assert_eq!(get_menu_item(&db, item.id).await?.unwrap().quantity, 2);

        assert!(decrement_stock(&db, item.id, 2).await?);
        assert_eq!(get_menu_item(&db, item.id).await?.unwrap().quantity, 0);

        assert!(!decrement_stock(&db, 999, 1).await?);
        Ok(())
    }
}
