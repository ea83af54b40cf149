pub mod artifact_store;
pub mod in_memory;
pub mod observability;
pub mod persistence;
pub mod weather;

pub use artifact_store::{FileArtifactStore, InMemoryArtifactStore};
pub use in_memory::InMemoryBookingSource;
pub use persistence::{Database, SqliteBookingSource};
pub use weather::{StaticWeatherProvider, UnavailableWeatherProvider};
