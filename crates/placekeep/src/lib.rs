//! Repository and unit-of-work data layer with its storage backends.

pub mod data;
pub mod storage;
