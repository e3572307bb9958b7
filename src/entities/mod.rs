//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod cart_entry;
pub mod favourite;
pub mod feedback;
pub mod menu_item;
pub mod notification;
pub mod order;
pub mod order_line;
pub mod staff;
pub mod student;
pub mod time_slot;

// Re-export specific types to avoid conflicts
pub use cart_entry::{Column as CartEntryColumn, Entity as CartEntry, Model as CartEntryModel};
pub use favourite::{Column as FavouriteColumn, Entity as Favourite, Model as FavouriteModel};
pub use feedback::{Column as FeedbackColumn, Entity as Feedback, Model as FeedbackModel};
pub use menu_item::{Column as MenuItemColumn, Entity as MenuItem, Model as MenuItemModel};
pub use notification::{
    Column as NotificationColumn, Entity as Notification, Model as NotificationModel,
    NotificationKind, RecipientType,
};
pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel, OrderStatus};
pub use order_line::{Column as OrderLineColumn, Entity as OrderLine, Model as OrderLineModel};
pub use staff::{Column as StaffColumn, Entity as Staff, Model as StaffModel};
pub use student::{Column as StudentColumn, Entity as Student, Model as StudentModel};
pub use time_slot::{Column as TimeSlotColumn, Entity as TimeSlot, Model as TimeSlotModel};
