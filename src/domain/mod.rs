pub mod entry;
pub mod timestamp;
