use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::core::client::{LogChannels, LogRequest, NomadApi};
use crate::domain::common::model::{LogSource, Topic};
use crate::watcher::subscription::Callback;
use crate::watcher::Watcher;

/// Arguments of the last log tail, kept so the view can resume it.
#[derive(Clone)]
pub(crate) struct LogResumeState {
    allocation_id: String,
    task_name: String,
    source: LogSource,
    callback: Callback,
}

impl<N: NomadApi> Watcher<N> {
    /// Tail `source` of `task_name` in allocation `alloc_id` into the Logs
    /// slot. An empty task name picks the allocation's first task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn subscribe_to_logs<F>(&self, alloc_id: &str, task_name: &str, source: LogSource, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.start_logs(LogResumeState {
            allocation_id: alloc_id.to_string(),
            task_name: task_name.to_string(),
            source,
            callback: Arc::new(callback),
        });
    }

    /// Restart the last tail with the same arguments and callback.
    pub fn resume_logs(&self) {
        let Some(resume) = self.inner.log_resume.lock().clone() else {
            warn!("No log tail to resume");
            return;
        };
        self.start_logs(resume);
    }

    fn start_logs(&self, resume: LogResumeState) {
        let generation = self.repository().update(|s| s.logs.reset());

        let task_name = match self.resolve_task(&resume) {
            Ok(task_name) => task_name,
            Err(message) => {
                // The previous tail no longer matches the buffer generation.
                self.activities().deactivate_all();
                self.raise_error(&message);
                return;
            }
        };

        *self.inner.log_resume.lock() = Some(resume.clone());
        self.subscribe_callback(&[Topic::Log], resume.callback);
        self.notify(Topic::Log);

        let request = LogRequest {
            allocation_id: resume.allocation_id,
            task_name,
            source: resume.source,
        };
        let span = info_span!(
            "log_tail",
            allocation = %request.allocation_id,
            task = %request.task_name,
            activity = %Uuid::new_v4()
        );
        info!(parent: &span, "Starting {} tail", request.source);

        let token = CancellationToken::new();
        let channels = self.nomad().logs(request, token.clone());
        self.activities().add(token.clone());

        let watcher = self.clone();
        tokio::spawn(
            async move { watcher.tail_logs(channels, token, generation).await }.instrument(span),
        );
    }

    fn resolve_task(&self, resume: &LogResumeState) -> Result<String, String> {
        let snapshot = self.state();
        let alloc = snapshot
            .allocation(&resume.allocation_id)
            .ok_or_else(|| format!("allocation not found: {}", resume.allocation_id))?;
        let first = alloc
            .task_names
            .first()
            .ok_or_else(|| format!("no tasks for allocation: {}", resume.allocation_id))?;

        if resume.task_name.is_empty() {
            Ok(first.clone())
        } else {
            Ok(resume.task_name.clone())
        }
    }

    async fn tail_logs(&self, mut channels: LogChannels, token: CancellationToken, generation: u64) {
        let mut frames_open = true;
        let mut errors_open = true;

        while frames_open || errors_open {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!("Log tail cancelled");
                    return;
                }
                frame = channels.frames.recv(), if frames_open => match frame {
                    Some(bytes) => {
                        let kept = self
                            .repository()
                            .update(|s| s.logs.append(generation, &bytes));
                        if kept {
                            self.notify(Topic::Log);
                        }
                    }
                    None => frames_open = false,
                },
                err = channels.errors.recv(), if errors_open => match err {
                    Some(e) => self.raise_error(&e.to_string()),
                    None => errors_open = false,
                },
            }
        }
        debug!("Log source closed");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use bytes::Bytes;

    use crate::config::WatcherConfig;
    use crate::core::client::LogRequest;
    use crate::domain::cluster::Allocation;
    use crate::domain::common::model::{HandlerKind, LogSource, Topic};
    use crate::errors::NomadError;
    use crate::watcher::testing::{counter, messages, wait_until, FakeNomad};
    use crate::watcher::Watcher;

    fn allocation(id: &str, task: &str) -> Allocation {
        Allocation {
            id: id.into(),
            task_names: vec![task.into()],
            ..Allocation::default()
        }
    }

    fn watcher_with_allocations() -> (Watcher<FakeNomad>, crate::watcher::dispatcher::Dispatcher) {
        let (watcher, dispatcher) = Watcher::new(FakeNomad::default(), WatcherConfig::default());
        watcher.repository().update(|s| {
            s.set_allocations(vec![
                allocation("the-alloc", "the-task"),
                allocation("another-alloc", "another-task"),
            ])
        });
        (watcher, dispatcher)
    }

    #[tokio::test]
    async fn tail_requests_exact_target_and_clears_buffer() {
        let (watcher, mut dispatcher) = watcher_with_allocations();
        watcher.repository().update(|s| {
            let generation = s.logs.generation();
            s.logs.append(generation, b"stale output\n")
        });
        let (hits, cb) = counter();

        watcher.subscribe_to_logs("the-alloc", "the-task", LogSource::Stderr, cb);

        assert!(watcher.state().logs.is_empty());
        assert_eq!(
            watcher.nomad().log_requests(),
            vec![LogRequest {
                allocation_id: "the-alloc".into(),
                task_name: "the-task".into(),
                source: LogSource::Stderr,
            }]
        );
        assert_eq!(watcher.activities().len(), 1);
        dispatcher.dispatch_pending();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn frames_are_appended_and_notified() {
        let (watcher, mut dispatcher) = watcher_with_allocations();
        let (hits, cb) = counter();
        watcher.subscribe_to_logs("another-alloc", "", LogSource::Stdout, cb);
        assert_eq!(watcher.nomad().log_requests()[0].task_name, "another-task");
        dispatcher.dispatch_pending();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let (frames, _errors) = watcher.nomad().log_senders(0);
        frames.send(Bytes::from_static(b"hello\n")).await.unwrap();
        frames.send(Bytes::from_static(b"world\n")).await.unwrap();
        wait_until(|| watcher.state().logs.line_count() == 2).await;

        assert_eq!(watcher.state().logs.to_string_lossy(), "hello\nworld\n");
        // Both frames landed before the dispatcher ran: one redraw.
        dispatcher.dispatch_pending();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn error_frames_raise_and_tail_continues() {
        let (watcher, mut dispatcher) = watcher_with_allocations();
        let (errors, sink) = messages();
        watcher.subscribe_handler(HandlerKind::Error, sink);
        watcher.subscribe_to_logs("the-alloc", "the-task", LogSource::Stdout, || {});

        let (frames, error_tx) = watcher.nomad().log_senders(0);
        error_tx.send(NomadError::Other("read timeout".into())).await.unwrap();
        frames.send(Bytes::from_static(b"after\n")).await.unwrap();
        wait_until(|| {
            let state = watcher.state();
            !state.logs.is_empty() && state.last_error_message.is_some()
        })
        .await;

        dispatcher.dispatch_pending();
        assert_eq!(*errors.lock(), vec!["read timeout".to_string()]);
        assert_eq!(watcher.state().logs.to_string_lossy(), "after\n");
    }

    #[tokio::test]
    async fn missing_allocation_raises_once_without_activity() {
        let (watcher, mut dispatcher) = watcher_with_allocations();
        let (errors, sink) = messages();
        watcher.subscribe_handler(HandlerKind::Error, sink);

        watcher.subscribe_to_logs("ghost", "task", LogSource::Stdout, || {});

        dispatcher.dispatch_pending();
        assert_eq!(*errors.lock(), vec!["allocation not found: ghost".to_string()]);
        assert!(watcher.activities().is_empty());
        assert!(watcher.nomad().log_requests().is_empty());
    }

    #[tokio::test]
    async fn failed_lookup_stops_previous_tail() {
        let (watcher, mut dispatcher) = watcher_with_allocations();
        let (errors, sink) = messages();
        watcher.subscribe_handler(HandlerKind::Error, sink);
        watcher.subscribe_to_logs("the-alloc", "the-task", LogSource::Stdout, || {});
        let (old_frames, _old_errors) = watcher.nomad().log_senders(0);
        assert_eq!(watcher.activities().len(), 1);

        watcher.subscribe_to_logs("ghost", "the-task", LogSource::Stdout, || {});

        assert!(watcher.activities().is_empty());
        wait_until(|| old_frames.is_closed()).await;
        assert!(watcher.state().logs.is_empty());
        dispatcher.dispatch_pending();
        assert_eq!(*errors.lock(), vec!["allocation not found: ghost".to_string()]);
    }

    #[tokio::test]
    async fn allocation_without_tasks_is_rejected() {
        let (watcher, mut dispatcher) = Watcher::new(FakeNomad::default(), WatcherConfig::default());
        watcher.repository().update(|s| {
            s.set_allocations(vec![Allocation {
                id: "empty".into(),
                ..Allocation::default()
            }])
        });
        let (errors, sink) = messages();
        watcher.subscribe_handler(HandlerKind::Error, sink);

        watcher.subscribe_to_logs("empty", "", LogSource::Stdout, || {});

        dispatcher.dispatch_pending();
        assert_eq!(*errors.lock(), vec!["no tasks for allocation: empty".to_string()]);
        assert!(watcher.activities().is_empty());
    }

    #[tokio::test]
    async fn resume_replays_last_tail_after_view_switch() {
        let (watcher, mut dispatcher) = watcher_with_allocations();
        let (hits, cb) = counter();
        watcher.subscribe_to_logs("the-alloc", "the-task", LogSource::Stderr, cb);
        watcher.subscribe(&[Topic::Job], || {});
        dispatcher.dispatch_pending();
        let before = hits.load(Ordering::SeqCst);

        watcher.resume_logs();

        let requests = watcher.nomad().log_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], requests[1]);
        dispatcher.dispatch_pending();
        assert_eq!(hits.load(Ordering::SeqCst), before + 1);
    }

    #[tokio::test]
    async fn cancelled_tail_drops_late_frames() {
        let (watcher, _dispatcher) = watcher_with_allocations();
        watcher.subscribe_to_logs("the-alloc", "the-task", LogSource::Stdout, || {});
        let (old_frames, _old_errors) = watcher.nomad().log_senders(0);

        watcher.subscribe_to_logs("another-alloc", "another-task", LogSource::Stdout, || {});
        let _ = old_frames.send(Bytes::from_static(b"late\n")).await;
        let (frames, _errors) = watcher.nomad().log_senders(1);
        frames.send(Bytes::from_static(b"fresh\n")).await.unwrap();
        wait_until(|| !watcher.state().logs.is_empty()).await;

        assert_eq!(watcher.state().logs.to_string_lossy(), "fresh\n");
    }

    #[test]
    fn resume_without_history_does_nothing() {
        let (watcher, _dispatcher) = watcher_with_allocations();
        watcher.resume_logs();
        assert!(watcher.nomad().log_requests().is_empty());
    }
}
