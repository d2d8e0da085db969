pub mod conformance;
mod error;
mod memory;
mod record;
mod traits;

pub use error::StorageError;
pub use memory::{MemorySnapshot, MemoryStorage, StoreData};
pub use record::{ActivityRecord, LeadFilter, LeadRecord, NoteRecord, UserRecord};
pub use traits::LeadStorage;
