use futures::future::LocalBoxFuture;

/// Runs background work on the current thread
///
/// The socket transport uses it for its reconnect timer and for watching an
/// idle connection. Tasks are detached; they end on their own once the
/// transport is shut down or dropped.
pub trait Spawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);
}
