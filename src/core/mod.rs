//! Core business logic - framework-agnostic ordering, capacity and ledger operations.
//!
//! Every function takes a `SeaORM` connection (or an open transaction, where
//! the operation has to join a larger unit of work) and returns
//! [`crate::errors::Result`]. Nothing in here knows about HTTP.

/// Identities and the student/staff tables
pub mod account;
/// Per-student shopping cart
pub mod cart;
/// Checkout orchestration: cart to order in one transaction
pub mod checkout;
/// Per-student bookmarked menu items
pub mod favourite;
/// Student feedback and its staff broadcast
pub mod feedback;
/// Order ledger read paths and aggregation
pub mod ledger;
/// Menu catalog and stock
pub mod menu;
/// Fixed-point currency conversion
pub mod money;
/// Notification writes and recipient reads
pub mod notification;
/// Order status machine
pub mod status;
/// Time-slot capacity manager
pub mod timeslot;
