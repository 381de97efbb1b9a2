//! Runtime abstraction for the fire-and-forget requests issued by the UI
//!
//! The UI thread never awaits anything. Requests are spawned through an
//! [`AsyncSpawner`] and report back over the event channel.

use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Something that can run detached futures
pub trait AsyncSpawner: Send + Sync + 'static {
    fn spawn_boxed(&self, future: BoxFuture<'static, ()>) -> TaskHandle;
}

impl dyn AsyncSpawner {
    pub fn spawn<F>(&self, future: F) -> TaskHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.spawn_boxed(Box::pin(future))
    }
}

/// Handle to a spawned request
#[derive(Debug)]
pub struct TaskHandle(JoinHandle<()>);

impl TaskHandle {
    pub fn is_finished(&self) -> bool {
        self.0.is_finished()
    }

    pub fn cancel(&self) {
        self.0.abort();
    }
}

/// Spawns onto a tokio runtime captured at construction, so spawning works
/// from threads that are not runtime workers (the eframe UI thread)
#[derive(Debug, Clone)]
pub struct TokioSpawner {
    handle: Handle,
}

impl TokioSpawner {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// The runtime the caller is running in, if any
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }

    /// The spawner of the caller's runtime, as the shared handle the shell
    /// and tile loader take
    pub fn shared() -> Option<Arc<dyn AsyncSpawner>> {
        Self::current().map(|spawner| Arc::new(spawner) as Arc<dyn AsyncSpawner>)
    }
}

impl AsyncSpawner for TokioSpawner {
    fn spawn_boxed(&self, future: BoxFuture<'static, ()>) -> TaskHandle {
        TaskHandle(self.handle.spawn(future))
    }
}
