//! Functional core for reviewq.
//!
//! Pure review document types and operations, plus the repository traits the
//! storage backends implement. Nothing in this crate performs I/O.

pub mod review;
pub mod storage;
