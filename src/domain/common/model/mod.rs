//! Shared domain types (Topic, HandlerKind, LogSource)

use std::fmt;
use std::str::FromStr;


/// A class of cluster object. Events and subscriptions are keyed by topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Job,
    Deployment,
    Allocation,
    Namespace,
    TaskGroup,
    JobStatus,
    Log,
}

impl Topic {
    /// Topics delivered by the server event stream rather than polled.
    pub const STREAMED: [Topic; 3] = [Topic::Job, Topic::Deployment, Topic::Allocation];

    pub fn is_streamed(self) -> bool {
        Self::STREAMED.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Topic::Job => "Job",
            Topic::Deployment => "Deployment",
            Topic::Allocation => "Allocation",
            Topic::Namespace => "Namespace",
            Topic::TaskGroup => "TaskGroup",
            Topic::JobStatus => "JobStatus",
            Topic::Log => "Log",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Job" => Ok(Topic::Job),
            "Deployment" => Ok(Topic::Deployment),
            "Allocation" => Ok(Topic::Allocation),
            "Namespace" => Ok(Topic::Namespace),
            "TaskGroup" => Ok(Topic::TaskGroup),
            "JobStatus" => Ok(Topic::JobStatus),
            "Log" => Ok(Topic::Log),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// System-wide sinks that reach the UI regardless of the active view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    /// A single fetch or read failed; stale state stays in place.
    Error,
    /// The synchronization substrate is broken.
    Fatal,
    Info,
}

/// Which output stream of a task to tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogSource {
    Stdout,
    Stderr,
}

impl LogSource {
    pub fn as_str(self) -> &'static str {
        match self {
            LogSource::Stdout => "stdout",
            LogSource::Stderr => "stderr",
        }
    }
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogSource {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdout" => Ok(LogSource::Stdout),
            "stderr" => Ok(LogSource::Stderr),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown variant: {0}")]
pub struct UnknownVariant(pub String);
