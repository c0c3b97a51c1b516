pub mod catalog;
pub mod error;
pub mod idgen;
pub mod store;
pub mod types;

#[cfg(test)]
mod test_util;

pub use catalog::{parse_item_ids, ItemCatalog};
pub use error::{CoreError, ErrorKind};
pub use idgen::{IdGenerator, SequenceIdGenerator};
pub use store::Datastore;
