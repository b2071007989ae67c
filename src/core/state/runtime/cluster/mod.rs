pub mod cluster_state;
pub mod cluster_state_repository;
pub mod log_buffer;
