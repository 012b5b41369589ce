//! Teardown hooks collected by a scope or the root container.

use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by an asynchronous disposal hook.
pub type BoxFutureUnit = Pin<Box<dyn Future<Output = ()> + Send>>;

type SyncHook = Box<dyn FnOnce() + Send>;
type AsyncHook = Box<dyn FnOnce() -> BoxFutureUnit + Send>;

/// Hooks in registration order; both kinds are drained newest first.
#[derive(Default)]
pub(crate) struct DisposeBag {
    sync_hooks: Vec<SyncHook>,
    async_hooks: Vec<AsyncHook>,
}

impl DisposeBag {
    pub(crate) fn push_sync(&mut self, hook: SyncHook) {
        self.sync_hooks.push(hook);
    }

    pub(crate) fn push_async(&mut self, hook: AsyncHook) {
        self.async_hooks.push(hook);
    }

    pub(crate) fn run_sync_lifo(&mut self) {
        for hook in self.sync_hooks.drain(..).rev() {
            hook();
        }
    }

    pub(crate) async fn run_async_lifo(&mut self) {
        let hooks: Vec<AsyncHook> = self.async_hooks.drain(..).rev().collect();
        for hook in hooks {
            hook().await;
        }
    }

    pub(crate) fn has_async(&self) -> bool {
        !self.async_hooks.is_empty()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.sync_hooks.is_empty() && !self.has_async()
    }
}
