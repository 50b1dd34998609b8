pub mod entity;
pub mod placeholder;
pub mod storage;
