//! Portal registry maintenance: classification, scoring, merging of crawler
//! discoveries, deduplication, and oracle-backed verification.

pub mod classify;
pub mod dedup;
pub mod merge;
pub mod score;
pub mod verify;
