use futures::future::join_all;
use parking_lot::Mutex;
use std::future::Future;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Background tasks spawned on behalf of one hub controller
///
/// Tasks run on the runtime captured at construction, falling back to the
/// caller's runtime. Outstanding tasks are aborted when the scope is dropped.
pub(crate) struct TaskScope {
    runtime: Option<Handle>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl TaskScope {
    pub(crate) fn new(runtime: Option<Handle>) -> Self {
        Self {
            runtime,
            handles: Mutex::new(Vec::new()),
            sweeper: Mutex::new(None),
        }
    }

    fn runtime(&self) -> Option<Handle> {
        self.runtime.clone().or_else(|| Handle::try_current().ok())
    }

    /// Whether a task spawned now would actually run
    pub(crate) fn has_runtime(&self) -> bool {
        self.runtime.is_some() || Handle::try_current().is_ok()
    }

    /// Spawn a fire-and-forget task
    pub(crate) fn spawn<F>(&self, name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Some(runtime) = self.runtime() else {
            tracing::error!(task = name, "No tokio runtime available, task not started");
            return;
        };

        let handle = runtime.spawn(task);
        let mut handles = self.handles.lock();
        handles.retain(|handle| !handle.is_finished());
        handles.push(handle);
    }

    /// Start the periodic task unless one is already running
    pub(crate) fn start_sweeper<F>(&self, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut sweeper = self.sweeper.lock();
        if sweeper.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return false;
        }

        let Some(runtime) = self.runtime() else {
            tracing::error!("No tokio runtime available, sweeper not started");
            return false;
        };

        *sweeper = Some(runtime.spawn(task));
        true
    }

    pub(crate) fn stop_sweeper(&self) {
        if let Some(handle) = self.sweeper.lock().take() {
            handle.abort();
        }
    }

    #[cfg(test)]
    pub(crate) fn sweeper_running(&self) -> bool {
        self.sweeper
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Wait for every fire-and-forget task, including ones spawned meanwhile
    pub(crate) async fn settle(&self) {
        loop {
            let batch = std::mem::take(&mut *self.handles.lock());
            if batch.is_empty() {
                return;
            }

            for result in join_all(batch).await {
                if let Err(e) = result {
                    if e.is_panic() {
                        tracing::error!(error = %e, "Background task panicked");
                    }
                }
            }
        }
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.handles
            .lock()
            .iter()
            .filter(|handle| !handle.is_finished())
            .count()
    }
}

impl Drop for TaskScope {
    fn drop(&mut self) {
        self.stop_sweeper();
        for handle in self.handles.get_mut().drain(..) {
            handle.abort();
        }
    }
}
