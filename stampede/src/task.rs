//! Named units of simulated user behavior.

use crate::client::{Client, ClientError};
use futures_util::future::BoxFuture;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::debug;

/// What a task invocation yields: nothing on success, the client's own error
/// on failure. Tasks do not classify errors, they propagate them.
pub type TaskResult = Result<(), ClientError>;

type TaskFn<C> = Arc<dyn Fn(C) -> BoxFuture<'static, TaskResult> + Send + Sync>;

/// A named, weighted action registered on a [`UserBehavior`](crate::UserBehavior).
///
/// The weight is descriptor data for engines that select tasks
/// proportionally; the selection algorithm itself lives in the engine. A task
/// owns no state of its own, so invoking it any number of times leaves the
/// descriptor untouched.
pub struct Task<C> {
    name: String,
    weight: NonZeroU32,
    func: TaskFn<C>,
}

impl<C> Clone for Task<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            weight: self.weight,
            func: Arc::clone(&self.func),
        }
    }
}

impl<C: Client> Task<C> {
    pub(crate) fn new<F, Fut>(name: &str, weight: NonZeroU32, func: F) -> Self
    where
        F: Fn(C) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = TaskResult> + Send + 'static,
    {
        Self {
            name: name.to_string(),
            weight,
            func: Arc::new(move |client| Box::pin(func(client))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn weight(&self) -> NonZeroU32 {
        self.weight
    }

    /// Invoke the task once against the given client.
    pub async fn run(&self, client: C) -> TaskResult {
        debug!(task = %self.name, "running task");
        (self.func)(client).await
    }
}

impl<C> std::fmt::Debug for Task<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("weight", &self.weight)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Request, Response};
    use std::future::Future;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Clone, Default)]
    struct NullClient;

    impl Client for NullClient {
        fn send(
            &self,
            _req: Request,
        ) -> impl Future<Output = Result<Response, ClientError>> + Send {
            async move { Ok(Response::new(200, Vec::new())) }
        }
    }

    #[tokio::test]
    async fn task_invokes_closure() {
        static CALLS: AtomicU64 = AtomicU64::new(0);

        let task = Task::new("noop", NonZeroU32::new(1).unwrap(), |_client: NullClient| {
            CALLS.fetch_add(1, Ordering::Relaxed);
            async move { Ok(()) }
        });

        task.run(NullClient).await.unwrap();
        task.run(NullClient).await.unwrap();

        assert_eq!(CALLS.load(Ordering::Relaxed), 2);
        assert_eq!(task.name(), "noop");
        assert_eq!(task.weight().get(), 1);
    }

    #[tokio::test]
    async fn task_propagates_client_error() {
        let task = Task::new("fails", NonZeroU32::new(1).unwrap(), |_client: NullClient| {
            async move { Err(ClientError::Transport("injected".into())) }
        });

        let res = task.run(NullClient).await;
        assert!(matches!(res, Err(ClientError::Transport(_))));
    }
}
