pub mod conformance;
mod error;
mod memory;
mod record;
mod traits;

pub use error::StorageError;
pub use memory::MemoryDraftStore;
pub use record::{rfc3339_now, DraftPayload, DraftRecord};
pub use traits::DraftStorage;
