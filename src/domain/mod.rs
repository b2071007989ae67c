pub mod cluster;
pub mod common;
