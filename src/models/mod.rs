//! Value types shared by every backend

pub mod entry;

pub use entry::Entry;
