//! Shared test utilities.
//!
//! In-memory databases and small fixtures with sensible defaults. The
//! `sqlite::memory:` pool holds a single connection, so code under test must
//! never use the outer connection while it holds a transaction.
//!
//! Tests that need real concurrency use [`setup_shared_file_db`], a file
//! database behind a pool of several connections.

use crate::{
    core::{account, cart, checkout, menu, timeslot},
    entities,
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, DatabaseConnection};
use std::{
    path::PathBuf,
    str::FromStr,
    sync::atomic::{AtomicUsize, Ordering},
};

static FILE_DB_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Connections in the [`setup_shared_file_db`] pool
pub const SHARED_POOL_SIZE: u32 = 8;

/// Creates an in-memory `SQLite` database with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// A file-backed database shared by several pooled connections.
///
/// The file and its journals are removed on drop.
pub struct SharedTestDb {
    /// Pool over the database file
    pub db: DatabaseConnection,
    path: PathBuf,
}

impl Drop for SharedTestDb {
    fn drop(&mut self) {
        for suffix in ["", "-journal", "-wal", "-shm"] {
            let mut path = self.path.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Creates a fresh `SQLite` file in the temp directory, opened through a pool of
/// [`SHARED_POOL_SIZE`] connections, with all tables initialized.
///
/// Unlike [`setup_test_db`], transactions here run on separate connections, so
/// concurrent checkouts really contend inside `SQLite`.
pub async fn setup_shared_file_db() -> Result<SharedTestDb> {
    let path = std::env::temp_dir().join(format!(
        "canteen-orders-test-{}-{}-{}.db",
        std::process::id(),
        FILE_DB_COUNTER.fetch_add(1, Ordering::Relaxed),
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default(),
    ));
    let url = format!("sqlite://{}?mode=rwc", path.display());

    let mut options = ConnectOptions::new(url);
    options
        .max_connections(SHARED_POOL_SIZE)
        .min_connections(1)
        .sqlx_logging(false);
    let db = sea_orm::Database::connect(options).await?;
    crate::config::database::create_tables(&db).await?;
    Ok(SharedTestDb { db, path })
}

/// Creates a student named `name` with a derived college email.
pub async fn create_test_student(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::student::Model> {
    account::create_student(db, name, &format!("{}@college.edu", name.to_lowercase())).await
}

/// Creates a staff member named `name`.
pub async fn create_test_staff(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::staff::Model> {
    account::create_staff(db, name, &format!("{}@canteen.edu", name.to_lowercase())).await
}

/// Creates an available menu item in the "Snacks" category.
///
/// `price` is a decimal string such as `"15.00"`.
pub async fn create_test_menu_item(
    db: &DatabaseConnection,
    name: &str,
    price: &str,
    quantity: i32,
) -> Result<entities::menu_item::Model> {
    let price = Decimal::from_str(price).map_err(|e| Error::validation(e.to_string()))?;
    menu::create_menu_item(
        db,
        menu::NewMenuItem {
            name: name.to_string(),
            description: None,
            category: "Snacks".to_string(),
            price,
            quantity: Some(quantity),
            low_stock_threshold: None,
        },
    )
    .await
}

/// Creates an active slot from `HH:MM` strings.
pub async fn create_test_slot(
    db: &DatabaseConnection,
    start: &str,
    end: &str,
    max_orders: i32,
) -> Result<entities::time_slot::Model> {
    timeslot::create_slot(
        db,
        timeslot::parse_slot_time(start)?,
        timeslot::parse_slot_time(end)?,
        max_orders,
    )
    .await
}

/// Ids produced by [`setup_with_placed_order`]
#[derive(Debug, Clone, Copy)]
pub struct OrderFixture {
    /// "Asha", who placed the order
    pub student_id: i64,
    /// The only staff member
    pub staff_id: i64,
    /// 09:00-10:00 slot with capacity 1, now full
    pub slot_id: i64,
    /// "Tea" at 15.00, 10 in stock before the order
    pub item_id: i64,
    /// One Tea, status `PAID`
    pub order_id: i64,
}

/// A database holding one paid order placed through checkout.
pub async fn setup_with_placed_order() -> Result<(DatabaseConnection, OrderFixture)> {
    let db = setup_test_db().await?;
    let student = create_test_student(&db, "Asha").await?;
    let staff = create_test_staff(&db, "Kumar").await?;
    let item = create_test_menu_item(&db, "Tea", "15.00", 10).await?;
    let slot = create_test_slot(&db, "09:00", "10:00", 1).await?;

    cart::add_to_cart(&db, student.id, item.id, 1).await?;
    let placed = checkout::complete_order(&db, student.id, slot.id, None).await?;

    let fixture = OrderFixture {
        student_id: student.id,
        staff_id: staff.id,
        slot_id: slot.id,
        item_id: item.id,
        order_id: placed.order.id,
    };
    Ok((db, fixture))
}
