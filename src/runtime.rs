//! Runtime abstraction layer for transition tasks
//!
//! Transitions run as independent async tasks that suspend between frames.
//! This module hides which executor spawns them behind [`AsyncSpawner`] and
//! provides the delay primitive the driver suspends on.

use futures::future::BoxFuture;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::time::Instant;

/// A trait for spawning async tasks (object-safe version)
pub trait AsyncSpawner: Send + Sync + 'static {
    /// Spawn a future and return a handle to it
    fn spawn_boxed(&self, future: BoxFuture<'static, ()>) -> Box<dyn AsyncHandle>;
}

/// Handle to a spawned async task
pub trait AsyncHandle: Send + Sync {
    /// Check if the task is finished
    fn is_finished(&self) -> bool;

    /// Abort the task at its next suspension point
    fn cancel(&self);
}

/// Spawn a future on the global runtime
pub fn spawn<F>(future: F) -> Box<dyn AsyncHandle>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    runtime().spawn_boxed(Box::pin(future))
}

/// Suspend until `deadline`
pub async fn delay_until(deadline: Instant) {
    tokio::time::sleep_until(deadline).await;
}

/// Suspend for `duration`
pub async fn delay(duration: Duration) {
    tokio::time::sleep(duration).await;
}

/// Default spawner implementations
pub mod spawners {
    use super::*;

    pub mod tokio_impl {
        use super::*;
        use ::tokio::task::JoinHandle;

        /// Tokio-based async spawner; must be used from within a tokio runtime
        pub struct TokioSpawner;

        impl AsyncSpawner for TokioSpawner {
            fn spawn_boxed(&self, future: BoxFuture<'static, ()>) -> Box<dyn AsyncHandle> {
                let handle = ::tokio::spawn(future);
                Box::new(TokioHandle(handle))
            }
        }

        struct TokioHandle(JoinHandle<()>);

        impl AsyncHandle for TokioHandle {
            fn is_finished(&self) -> bool {
                self.0.is_finished()
            }

            fn cancel(&self) {
                self.0.abort();
            }
        }
    }
}

/// Global runtime instance
static RUNTIME: OnceLock<Box<dyn AsyncSpawner>> = OnceLock::new();

/// Install the global spawner. Returns `false` if one was already in place.
pub fn init_runtime(spawner: Box<dyn AsyncSpawner>) -> bool {
    let installed = RUNTIME.set(spawner).is_ok();
    if !installed {
        log::warn!("global runtime already initialised, ignoring replacement spawner");
    }
    installed
}

/// Get the global runtime spawner
pub fn runtime() -> &'static dyn AsyncSpawner {
    RUNTIME
        .get_or_init(|| Box::new(spawners::tokio_impl::TokioSpawner))
        .as_ref()
}
