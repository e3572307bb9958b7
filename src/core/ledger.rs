//! Order ledger read paths.
//!
//! Orders are joined with their lines, slots and students for display, and
//! aggregated for revenue and spending reports. Only `PAID`, `PREPARING`,
//! `READY` and `COMPLETED` orders count as revenue. Calendar boundaries are
//! UTC.

use crate::{
    core::{
        account::{Identity, Role},
        money,
    },
    entities::{
        MenuItem, Order, OrderLine, OrderStatus, Student, TimeSlot, order, order_line, student,
        time_slot,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, prelude::*, sea_query::Expr};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::info;

const MIN_REPORT_YEAR: i32 = 1;
const MAX_REPORT_YEAR: i32 = 9999;

/// One line of an order as shown on a receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLineView {
    /// Ordered item
    pub menu_item_id: i64,
    /// Item name, or a placeholder if the item row is gone
    pub name: String,
    /// Units ordered
    pub quantity: i32,
    /// Unit price frozen at checkout
    pub price_at_order: Decimal,
    /// `price_at_order * quantity`
    pub subtotal: Decimal,
}

/// An order with its lines, slot window and student
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderView {
    /// Order number
    pub id: i64,
    /// Who placed it
    pub student_id: i64,
    /// Student display name
    pub student_name: Option<String>,
    /// Reserved slot
    pub slot_id: i64,
    /// Pickup window start
    pub start_time: Option<NaiveTime>,
    /// Pickup window end
    pub end_time: Option<NaiveTime>,
    /// Total charged
    pub total_amount: Decimal,
    /// Fulfilment state
    pub status: OrderStatus,
    /// Student instructions
    pub order_notes: Option<String>,
    /// Placement time
    pub created_at: DateTime<Utc>,
    /// Receipt lines
    pub items: Vec<OrderLineView>,
}

/// Which part of a year a revenue report covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevenuePeriod {
    /// A single month, 1-12, broken down by day
    Month(u32),
    /// The whole year, broken down by month
    All,
}

impl RevenuePeriod {
    /// Parses `all` (or nothing) and month numbers `1`-`12`.
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        match raw.map(str::trim) {
            None | Some("") => Ok(Self::All),
            Some(value) if value.eq_ignore_ascii_case("all") => Ok(Self::All),
            Some(value) => match value.parse::<u32>() {
                Ok(month @ 1..=12) => Ok(Self::Month(month)),
                _ => Err(Error::validation(format!(
                    "Month must be 1-12 or 'all', got '{value}'"
                ))),
            },
        }
    }

    fn bounds(self, year: i32) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        if !(MIN_REPORT_YEAR..=MAX_REPORT_YEAR).contains(&year) {
            return Err(Error::validation(format!(
                "Year must be between {MIN_REPORT_YEAR} and {MAX_REPORT_YEAR}, got {year}"
            )));
        }
        let (start, end) = match self {
            Self::All => (
                NaiveDate::from_ymd_opt(year, 1, 1),
                NaiveDate::from_ymd_opt(year + 1, 1, 1),
            ),
            Self::Month(12) => (
                NaiveDate::from_ymd_opt(year, 12, 1),
                NaiveDate::from_ymd_opt(year + 1, 1, 1),
            ),
            Self::Month(month) => (
                NaiveDate::from_ymd_opt(year, month, 1),
                NaiveDate::from_ymd_opt(year, month + 1, 1),
            ),
        };
        match (start, end) {
            (Some(start), Some(end)) => Ok((start_of_day(start), start_of_day(end))),
            _ => Err(Error::validation(format!("Unsupported year {year}"))),
        }
    }
}

/// One bar of the revenue chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevenuePoint {
    /// Day of month or month of year
    pub label: u32,
    /// Revenue in that bucket
    pub value: Decimal,
}

/// Best seller of a period
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MostSoldItem {
    /// Item name
    pub name: String,
    /// Units sold
    pub total_quantity: i64,
}

/// Revenue report for a month or a year
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevenueStats {
    /// Month covered, `None` for the whole year
    pub month: Option<u32>,
    /// Year covered
    pub year: i32,
    /// Revenue orders in the period
    pub total_orders: u64,
    /// Sum of their totals
    pub total_revenue: Decimal,
    /// Item with the most units sold, if anything sold
    pub most_sold_item: Option<MostSoldItem>,
    /// Per-day or per-month revenue, ascending, empty buckets omitted
    pub breakdown: Vec<RevenuePoint>,
}

/// A student's own spend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StudentSpending {
    /// Spend on the given day
    pub daily_spending: Decimal,
    /// Spend in that day's calendar month
    pub monthly_spending: Decimal,
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn revenue_statuses() -> impl Iterator<Item = OrderStatus> {
    OrderStatus::ALL.into_iter().filter(|status| status.is_revenue())
}

async fn revenue_orders_between(
    db: &DatabaseConnection,
    student_id: Option<i64>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<order::Model>> {
    let mut query = Order::find()
        .filter(order::Column::Status.is_in(revenue_statuses()))
        .filter(order::Column::CreatedAt.gte(start))
        .filter(order::Column::CreatedAt.lt(end));
    if let Some(student_id) = student_id {
        query = query.filter(order::Column::StudentId.eq(student_id));
    }
    query
        .order_by_asc(order::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Joins orders with their lines, slots and students, keeping input order.
async fn assemble(db: &DatabaseConnection, orders: Vec<order::Model>) -> Result<Vec<OrderView>> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
    let slot_ids: Vec<i64> = orders.iter().map(|o| o.slot_id).collect();
    let student_ids: Vec<i64> = orders.iter().map(|o| o.student_id).collect();

    let mut lines: HashMap<i64, Vec<OrderLineView>> = HashMap::new();
    for (line, item) in OrderLine::find()
        .filter(order_line::Column::OrderId.is_in(order_ids))
        .find_also_related(MenuItem)
        .order_by_asc(order_line::Column::Id)
        .all(db)
        .await?
    {
        let price_at_order = money::from_cents(line.price_at_order_cents);
        lines.entry(line.order_id).or_default().push(OrderLineView {
            menu_item_id: line.menu_item_id,
            name: item.map_or_else(|| "Unknown item".to_string(), |item| item.name),
            quantity: line.quantity,
            price_at_order,
            subtotal: price_at_order * Decimal::from(line.quantity),
        });
    }

    let slots: HashMap<i64, time_slot::Model> = TimeSlot::find()
        .filter(time_slot::Column::Id.is_in(slot_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|slot| (slot.id, slot))
        .collect();

    let students: HashMap<i64, String> = Student::find()
        .filter(student::Column::Id.is_in(student_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect();

    Ok(orders
        .into_iter()
        .map(|order| {
            let slot = slots.get(&order.slot_id);
            OrderView {
                id: order.id,
                student_id: order.student_id,
                student_name: students.get(&order.student_id).cloned(),
                slot_id: order.slot_id,
                start_time: slot.map(|s| s.start_time),
                end_time: slot.map(|s| s.end_time),
                total_amount: money::from_cents(order.total_cents),
                status: order.status,
                order_notes: order.order_notes,
                created_at: order.created_at,
                items: lines.remove(&order.id).unwrap_or_default(),
            }
        })
        .collect())
}

/// One order with its lines.
///
/// Students only see their own orders; anything else reads as not found.
pub async fn get_order_details(
    db: &DatabaseConnection,
    order_id: i64,
    viewer: &Identity,
) -> Result<OrderView> {
    let order = Order::find_by_id(order_id)
        .one(db)
        .await?
        .filter(|order| viewer.role == Role::Staff || order.student_id == viewer.id)
        .ok_or(Error::OrderNotFound { order_id })?;

    assemble(db, vec![order])
        .await?
        .pop()
        .ok_or(Error::OrderNotFound { order_id })
}

async fn orders_of_student(
    db: &DatabaseConnection,
    student_id: i64,
    include_hidden: bool,
) -> Result<Vec<OrderView>> {
    let mut query = Order::find().filter(order::Column::StudentId.eq(student_id));
    if !include_hidden {
        query = query.filter(order::Column::IsStudentHidden.eq(false));
    }
    let orders = query
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .all(db)
        .await?;
    assemble(db, orders).await
}

/// A student's visible order history, newest first.
pub async fn get_student_orders(db: &DatabaseConnection, student_id: i64) -> Result<Vec<OrderView>> {
    orders_of_student(db, student_id, false).await
}

/// Every order a student ever placed, newest first, including ones they hid.
pub async fn get_all_student_orders(
    db: &DatabaseConnection,
    student_id: i64,
) -> Result<Vec<OrderView>> {
    orders_of_student(db, student_id, true).await
}

/// Every order (hidden or not) for the kitchen, by pickup time.
pub async fn get_staff_orders(
    db: &DatabaseConnection,
    status: Option<OrderStatus>,
) -> Result<Vec<OrderView>> {
    let mut query = Order::find();
    if let Some(status) = status {
        query = query.filter(order::Column::Status.eq(status));
    }
    let orders = query.order_by_asc(order::Column::CreatedAt).all(db).await?;

    let mut views = assemble(db, orders).await?;
    views.sort_by_key(|view| view.start_time);
    Ok(views)
}

/// Removes an order from the student's own history.
pub async fn hide_order_for_student(
    db: &DatabaseConnection,
    student_id: i64,
    order_id: i64,
) -> Result<()> {
    let result = Order::update_many()
        .col_expr(order::Column::IsStudentHidden, Expr::value(true))
        .filter(order::Column::Id.eq(order_id))
        .filter(order::Column::StudentId.eq(student_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::OrderNotFound { order_id });
    }
    info!(order_id, student_id, "order hidden from student history");
    Ok(())
}

/// Revenue report for one month or a whole year.
pub async fn get_revenue_stats(
    db: &DatabaseConnection,
    period: RevenuePeriod,
    year: i32,
) -> Result<RevenueStats> {
    let (start, end) = period.bounds(year)?;
    let orders = revenue_orders_between(db, None, start, end).await?;

    let mut buckets: BTreeMap<u32, i64> = BTreeMap::new();
    for order in &orders {
        let label = match period {
            RevenuePeriod::Month(_) => order.created_at.day(),
            RevenuePeriod::All => order.created_at.month(),
        };
        *buckets.entry(label).or_default() += order.total_cents;
    }

    let total_cents: i64 = buckets.values().sum();
    let most_sold_item = most_sold(db, orders.iter().map(|o| o.id).collect()).await?;

    Ok(RevenueStats {
        month: match period {
            RevenuePeriod::Month(month) => Some(month),
            RevenuePeriod::All => None,
        },
        year,
        total_orders: orders.len() as u64,
        total_revenue: money::from_cents(total_cents),
        most_sold_item,
        breakdown: buckets
            .into_iter()
            .map(|(label, cents)| RevenuePoint {
                label,
                value: money::from_cents(cents),
            })
            .collect(),
    })
}

/// Item with the highest summed quantity; ties go to the lower item id.
async fn most_sold(db: &DatabaseConnection, order_ids: Vec<i64>) -> Result<Option<MostSoldItem>> {
    if order_ids.is_empty() {
        return Ok(None);
    }

    let mut sold: BTreeMap<i64, (String, i64)> = BTreeMap::new();
    for (line, item) in OrderLine::find()
        .filter(order_line::Column::OrderId.is_in(order_ids))
        .find_also_related(MenuItem)
        .all(db)
        .await?
    {
        let Some(item) = item else { continue };
        let entry = sold.entry(item.id).or_insert_with(|| (item.name, 0));
        entry.1 += i64::from(line.quantity);
    }

    Ok(sold
        .into_values()
        .rev()
        .max_by_key(|(_, quantity)| *quantity)
        .map(|(name, total_quantity)| MostSoldItem {
            name,
            total_quantity,
        }))
}

/// What a student spent on `today` and in its calendar month.
pub async fn get_student_spending(
    db: &DatabaseConnection,
    student_id: i64,
    today: NaiveDate,
) -> Result<StudentSpending> {
    let (month_start, month_end) = RevenuePeriod::Month(today.month()).bounds(today.year())?;
    let day_start = start_of_day(today);
    let day_end = day_start + chrono::Duration::days(1);

    let orders = revenue_orders_between(db, Some(student_id), month_start, month_end).await?;
    let monthly: i64 = orders.iter().map(|o| o.total_cents).sum();
    let daily: i64 = orders
        .iter()
        .filter(|o| o.created_at >= day_start && o.created_at < day_end)
        .map(|o| o.total_cents)
        .sum();

    Ok(StudentSpending {
        daily_spending: money::from_cents(daily),
        monthly_spending: money::from_cents(monthly),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::{cart::add_to_cart, checkout::complete_order, status::set_status};
    use crate::test_utils::*;
    use chrono::TimeZone;
    use sea_orm::Set;
    use std::str::FromStr;

    async fn backdate(db: &DatabaseConnection, order_id: i64, at: DateTime<Utc>) -> Result<()> {
        let mut order: order::ActiveModel = Order::find_by_id(order_id).one(db).await?.unwrap().into();
        order.created_at = Set(at);
        order.update(db).await?;
        Ok(())
    }

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn dec(raw: &str) -> Decimal {
        Decimal::from_str(raw).unwrap()
    }

    async fn place(
        db: &DatabaseConnection,
        student_id: i64,
        slot_id: i64,
        item_id: i64,
        quantity: i32,
    ) -> Result<i64> {
        add_to_cart(db, student_id, item_id, quantity).await?;
        Ok(complete_order(db, student_id, slot_id, None).await?.order.id)
    }

    #[test]
    fn test_revenue_period_parse() {
        assert_eq!(RevenuePeriod::parse(None).unwrap(), RevenuePeriod::All);
        assert_eq!(RevenuePeriod::parse(Some("ALL")).unwrap(), RevenuePeriod::All);
        assert_eq!(RevenuePeriod::parse(Some("3")).unwrap(), RevenuePeriod::Month(3));
        for bad in ["0", "13", "march"] {
            assert!(RevenuePeriod::parse(Some(bad)).is_err(), "{bad}");
        }
    }

    #[tokio::test]
    async fn test_revenue_stats_rejects_out_of_range_year() -> Result<()> {
        let db = setup_test_db().await?;
        for year in [i32::MAX, i32::MIN, 0, 10_000] {
            assert!(
                matches!(
                    get_revenue_stats(&db, RevenuePeriod::All, year).await,
                    Err(Error::Validation { .. })
                ),
                "{year} should be rejected"
            );
        }
        assert!(matches!(
            get_revenue_stats(&db, RevenuePeriod::Month(12), i32::MAX).await,
            Err(Error::Validation { .. })
        ));
        assert!(get_revenue_stats(&db, RevenuePeriod::Month(12), 9999).await.is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn test_order_details_visibility() -> Result<()> {
        let (db, fixture) = setup_with_placed_order().await?;
        let other = create_test_student(&db, "Ravi").await?;

        let own = get_order_details(&db, fixture.order_id, &Identity::student(fixture.student_id)).await?;
        assert_eq!(own.items.len(), 1);
        assert_eq!(own.items[0].name, "Tea");
        assert_eq!(own.student_name.as_deref(), Some("Asha"));
        assert_eq!(own.start_time, NaiveTime::from_hms_opt(9, 0, 0));

        let staff_view = get_order_details(&db, fixture.order_id, &Identity::staff(fixture.staff_id)).await?;
        assert_eq!(staff_view, own);

        assert!(matches!(
            get_order_details(&db, fixture.order_id, &Identity::student(other.id)).await,
            Err(Error::OrderNotFound { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_hidden_orders_only_leave_student_history() -> Result<()> {
        let (db, fixture) = setup_with_placed_order().await?;

        assert_eq!(get_student_orders(&db, fixture.student_id).await?.len(), 1);
        hide_order_for_student(&db, fixture.student_id, fixture.order_id).await?;

        assert!(get_student_orders(&db, fixture.student_id).await?.is_empty());
        assert_eq!(get_staff_orders(&db, None).await?.len(), 1);
        assert_eq!(
            get_staff_orders(&db, Some(OrderStatus::Paid)).await?.len(),
            1
        );
        assert!(get_staff_orders(&db, Some(OrderStatus::Ready)).await?.is_empty());

        // Someone else's order cannot be hidden
        assert!(matches!(
            hide_order_for_student(&db, fixture.student_id + 100, fixture.order_id).await,
            Err(Error::OrderNotFound { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_staff_orders_sorted_by_pickup_time() -> Result<()> {
        let db = setup_test_db().await?;
        let student = create_test_student(&db, "Asha").await?;
        let late = create_test_slot(&db, "13:00", "14:00", 5).await?;
        let early = create_test_slot(&db, "08:00", "09:00", 5).await?;
        let tea = create_test_menu_item(&db, "Tea", "15.00", 10).await?;

        let late_order = place(&db, student.id, late.id, tea.id, 1).await?;
        let early_order = place(&db, student.id, early.id, tea.id, 1).await?;

        let ids: Vec<i64> = get_staff_orders(&db, None).await?.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![early_order, late_order]);

        let history: Vec<i64> = get_student_orders(&db, student.id).await?.iter().map(|o| o.id).collect();
        assert_eq!(history, vec![early_order, late_order]);
        Ok(())
    }

    #[tokio::test]
    async fn test_revenue_stats_month_and_year() -> Result<()> {
        let db = setup_test_db().await?;
        let student = create_test_student(&db, "Asha").await?;
        let slot = create_test_slot(&db, "12:00", "13:00", 10).await?;
        let tea = create_test_menu_item(&db, "Tea", "15.00", 50).await?;
        let thali = create_test_menu_item(&db, "Thali", "100.00", 50).await?;

        let a = place(&db, student.id, slot.id, tea.id, 4).await?; // 60.00
        let b = place(&db, student.id, slot.id, thali.id, 1).await?; // 100.00
        let c = place(&db, student.id, slot.id, thali.id, 2).await?; // 200.00, cancelled
        let d = place(&db, student.id, slot.id, tea.id, 1).await?; // 15.00, other month

        backdate(&db, a, utc(2025, 3, 3, 10)).await?;
        backdate(&db, b, utc(2025, 3, 17, 12)).await?;
        backdate(&db, c, utc(2025, 3, 17, 13)).await?;
        backdate(&db, d, utc(2025, 5, 1, 9)).await?;
        set_status(&db, c, OrderStatus::Cancelled).await?;

        let march = get_revenue_stats(&db, RevenuePeriod::Month(3), 2025).await?;
        assert_eq!(march.month, Some(3));
        assert_eq!(march.total_orders, 2);
        assert_eq!(march.total_revenue, dec("160.00"));
        assert_eq!(
            march.breakdown,
            vec![
                RevenuePoint { label: 3, value: dec("60.00") },
                RevenuePoint { label: 17, value: dec("100.00") },
            ]
        );
        let best = march.most_sold_item.unwrap();
        assert_eq!((best.name.as_str(), best.total_quantity), ("Tea", 4));

        let year = get_revenue_stats(&db, RevenuePeriod::All, 2025).await?;
        assert_eq!(year.total_orders, 3);
        assert_eq!(year.total_revenue, dec("175.00"));
        assert_eq!(
            year.breakdown.iter().map(|p| p.label).collect::<Vec<_>>(),
            vec![3, 5]
        );

        let empty = get_revenue_stats(&db, RevenuePeriod::Month(12), 2025).await?;
        assert_eq!(empty.total_orders, 0);
        assert_eq!(empty.total_revenue, Decimal::ZERO);
        assert!(empty.most_sold_item.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_student_spending_day_and_month() -> Result<()> {
        let db = setup_test_db().await?;
        let asha = create_test_student(&db, "Asha").await?;
        let ravi = create_test_student(&db, "Ravi").await?;
        let slot = create_test_slot(&db, "12:00", "13:00", 10).await?;
        let tea = create_test_menu_item(&db, "Tea", "15.00", 50).await?;

        let today = place(&db, asha.id, slot.id, tea.id, 2).await?; // 30.00
        let earlier = place(&db, asha.id, slot.id, tea.id, 1).await?; // 15.00
        let last_month = place(&db, asha.id, slot.id, tea.id, 3).await?; // 45.00
        let other = place(&db, ravi.id, slot.id, tea.id, 1).await?;

        backdate(&db, today, utc(2025, 6, 20, 8)).await?;
        backdate(&db, earlier, utc(2025, 6, 2, 8)).await?;
        backdate(&db, last_month, utc(2025, 5, 31, 23)).await?;
        backdate(&db, other, utc(2025, 6, 20, 9)).await?;

        let spending =
            get_student_spending(&db, asha.id, NaiveDate::from_ymd_opt(2025, 6, 20).unwrap()).await?;
        assert_eq!(spending.daily_spending, dec("30.00"));
        assert_eq!(spending.monthly_spending, dec("45.00"));
        Ok(())
    }
}
