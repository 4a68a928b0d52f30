//! Helpers shared by unit and integration tests.
//!
//! [`faulty`] wraps any backend client to fail after a number of requests. [`blob`] seeds
//! containers and reads names back from prefix tree tokens, [`cursor`] drains sources and
//! [`tree`] flattens prefix trees into comparable summaries.

pub mod blob;
pub mod cursor;
pub mod faulty;
pub mod tree;
