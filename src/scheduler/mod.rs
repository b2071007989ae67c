pub mod poller;
pub mod refresher;
pub mod tasks;
