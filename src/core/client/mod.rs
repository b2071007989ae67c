// Nomad HTTP client
pub mod nomad_api_trait;
pub mod nomad_client;
pub mod nomad_resources;
pub mod search_options;
pub mod mappers;

// Resource fetchers
pub mod jobs;
pub mod namespaces;
pub mod deployments;
pub mod allocations;
pub mod task_groups;
pub mod job_status;

// Streams
pub mod events;
pub mod logs;

pub use events::EventReceiver;
pub use logs::{LogChannels, LogRequest};
pub use nomad_api_trait::NomadApi;
pub use nomad_client::{build_nomad_client, NomadHttpClient};
pub use search_options::SearchOptions;
