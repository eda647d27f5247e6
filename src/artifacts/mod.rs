//! Data structures and storage formats
//!
//! This module contains the core types of the reference backend:
//!
//! - `core`: Shared filesystem utilities (atomic writes, mtime reads)
//! - `objects`: Object identifiers and the object types the backend touches
//! - `refs`: Reference names, handles, and the loose/packed file formats

pub mod core;
pub mod objects;
pub mod refs;
