//! Student favourites - bookmarked menu items.

use crate::{
    core::menu::{self, MenuItemView},
    entities::{Favourite, MenuItem, favourite, menu_item},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::debug;

/// Adds the item to the student's favourites, or removes it if already there.
///
/// Returns whether the item is a favourite afterwards. Removing works even
/// for items that have since been deleted from the menu; adding requires a
/// live item.
pub async fn toggle_favourite(
    db: &DatabaseConnection,
    student_id: i64,
    menu_item_id: i64,
) -> Result<bool> {
    let removed = Favourite::delete_many()
        .filter(favourite::Column::StudentId.eq(student_id))
        .filter(favourite::Column::MenuItemId.eq(menu_item_id))
        .exec(db)
        .await?;
    if removed.rows_affected > 0 {
        debug!(student_id, menu_item_id, "favourite removed");
        return Ok(false);
    }

    if menu::get_menu_item(db, menu_item_id).await?.is_none() {
        return Err(Error::MenuItemNotFound {
            item_id: menu_item_id,
        });
    }

    favourite::ActiveModel {
        student_id: Set(student_id),
        menu_item_id: Set(menu_item_id),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    debug!(student_id, menu_item_id, "favourite added");
    Ok(true)
}

/// The student's favourite items that are still on the menu, by name.
pub async fn list_favourites(
    db: &DatabaseConnection,
    student_id: i64,
) -> Result<Vec<MenuItemView>> {
    let items = MenuItem::find()
        .inner_join(Favourite)
        .filter(favourite::Column::StudentId.eq(student_id))
        .filter(menu_item::Column::IsDeleted.eq(false))
        .order_by_asc(menu_item::Column::Name)
        .all(db)
        .await?;
    Ok(items.into_iter().map(MenuItemView::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_toggle_favourite_round_trip() -> Result<()> {
        let db = setup_test_db().await?;
        let student = create_test_student(&db, "Asha").await?;
        let tea = create_test_menu_item(&db, "Tea", "15.00", 10).await?;
        let samosa = create_test_menu_item(&db, "Samosa", "20.00", 10).await?;

        assert!(toggle_favourite(&db, student.id, tea.id).await?);
        assert!(toggle_favourite(&db, student.id, samosa.id).await?);
        let names: Vec<_> = list_favourites(&db, student.id)
            .await?
            .into_iter()
            .map(|item| item.name)
            .collect();
        assert_eq!(names, vec!["Samosa", "Tea"]);

        assert!(!toggle_favourite(&db, student.id, tea.id).await?);
        assert_eq!(list_favourites(&db, student.id).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_favourites_are_per_student() -> Result<()> {
        let db = setup_test_db().await?;
        let asha = create_test_student(&db, "Asha").await?;
        let ravi = create_test_student(&db, "Ravi").await?;
        let tea = create_test_menu_item(&db, "Tea", "15.00", 10).await?;

        toggle_favourite(&db, asha.id, tea.id).await?;
        assert!(list_favourites(&db, ravi.id).await?.is_empty());
        // Ravi's toggle adds his own row instead of removing Asha's
        assert!(toggle_favourite(&db, ravi.id, tea.id).await?);
        assert_eq!(list_favourites(&db, asha.id).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_deleted_items_drop_out_of_favourites() -> Result<()> {
        let db = setup_test_db().await?;
        let student = create_test_student(&db, "Asha").await?;
        let tea = create_test_menu_item(&db, "Tea", "15.00", 10).await?;

        assert!(matches!(
            toggle_favourite(&db, student.id, 999).await,
            Err(Error::MenuItemNotFound { item_id: 999 })
        ));

        toggle_favourite(&db, student.id, tea.id).await?;
        menu::delete_menu_item(&db, tea.id).await?;
        assert!(list_favourites(&db, student.id).await?.is_empty());

        // Still removable, but cannot be added back
        assert!(!toggle_favourite(&db, student.id, tea.id).await?);
        assert!(matches!(
            toggle_favourite(&db, student.id, tea.id).await,
            Err(Error::MenuItemNotFound { .. })
        ));
        Ok(())
    }
}
