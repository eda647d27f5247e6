//! Storage areas
//!
//! The managers that own on-disk state:
//!
//! - `repository`: The facade coordinating all areas
//! - `database`: Content-addressable object storage
//! - `refs`: The unified reference API over the loose and packed stores
//! - `reflog`: Reference log file maintenance

pub mod database;
pub mod reflog;
pub mod refs;
pub mod repository;
