pub mod entry;
pub mod store;

pub use entry::{EntryIdGenerator, JournalEntry};
pub use store::JournalLog;
