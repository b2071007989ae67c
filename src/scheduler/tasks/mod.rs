pub mod job_status;
pub mod namespaces;
pub mod task_groups;
