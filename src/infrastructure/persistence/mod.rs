pub mod booking_source;
pub mod database;

pub use booking_source::SqliteBookingSource;
pub use database::Database;
