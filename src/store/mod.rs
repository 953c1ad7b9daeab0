//! Storage engine: file layout, record codec, index and the store itself.

pub mod database;
pub mod index;
pub mod layout;
pub mod record;
pub mod registry;

pub use database::DataBase;
pub use index::Index;
pub use record::{Decoded, Kind, Record};
