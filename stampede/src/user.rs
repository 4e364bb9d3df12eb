//! User-behavior descriptors.
//!
//! A [`UserBehavior`] declares what one simulated client does: the host it
//! targets plus an ordered set of named tasks. It is the declarative half of
//! a load test; an engine consumes the descriptor, constructs a
//! [`Client`](crate::Client) bound to [`host()`](UserBehavior::host), and
//! decides when and how often each task runs.

use crate::client::Client;
use crate::task::{Task, TaskResult};
use std::future::Future;
use std::num::NonZeroU32;
use tracing::debug;

/// Errors raised when freezing a descriptor with [`Builder::build`].
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("host must be non-empty")]
    EmptyHost,

    #[error("invalid host `{host}`: {source}")]
    InvalidHost {
        host: String,
        source: url::ParseError,
    },

    #[error("no tasks registered")]
    NoTasks,

    #[error("duplicate task name `{0}`")]
    DuplicateTask(String),
}

/// A declarative bundle of simulated user behavior: a target host and the
/// tasks eligible for scheduling against it.
///
/// Descriptors are immutable once built and hold no mutable state, so an
/// engine may clone one per simulated user and drive any number of them
/// concurrently.
pub struct UserBehavior<C> {
    host: String,
    tasks: Vec<Task<C>>,
}

impl<C> Clone for UserBehavior<C> {
    fn clone(&self) -> Self {
        Self {
            host: self.host.clone(),
            tasks: self.tasks.clone(),
        }
    }
}

impl<C: Client> UserBehavior<C> {
    /// Start a descriptor targeting `host`. Tasks are registered explicitly
    /// on the returned builder; only registered tasks are ever eligible for
    /// scheduling.
    pub fn builder(host: impl Into<String>) -> Builder<C> {
        Builder {
            host: host.into(),
            tasks: Vec::new(),
        }
    }

    /// The host string exactly as given at build time.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Registered tasks, in registration order.
    pub fn tasks(&self) -> &[Task<C>] {
        &self.tasks
    }

    pub fn get_task(&self, name: &str) -> Option<&Task<C>> {
        self.tasks.iter().find(|t| t.name() == name)
    }

    /// Sum of task weights, for engines selecting tasks proportionally.
    pub fn total_weight(&self) -> u32 {
        self.tasks
            .iter()
            .fold(0u32, |acc, t| acc.saturating_add(t.weight().get()))
    }
}

impl<C> std::fmt::Debug for UserBehavior<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserBehavior")
            .field("host", &self.host)
            .field("tasks", &self.tasks)
            .finish()
    }
}

/// Builder for [`UserBehavior`]. Registration is explicit and happens only
/// here; the task set is frozen by [`build`](Builder::build).
pub struct Builder<C> {
    host: String,
    tasks: Vec<Task<C>>,
}

impl<C: Client> Builder<C> {
    /// Register a task with the default weight of 1.
    pub fn task<F, Fut>(self, name: &str, func: F) -> Self
    where
        F: Fn(C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TaskResult> + Send + 'static,
    {
        self.weighted_task(name, NonZeroU32::MIN, func)
    }

    /// Register a task with an explicit selection weight.
    pub fn weighted_task<F, Fut>(mut self, name: &str, weight: NonZeroU32, func: F) -> Self
    where
        F: Fn(C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TaskResult> + Send + 'static,
    {
        debug!(task = name, weight = weight.get(), "registering task");
        self.tasks.push(Task::new(name, weight, func));
        self
    }

    /// Validate and freeze the descriptor.
    ///
    /// Fails on an empty or unparseable host, an empty task set, or a
    /// duplicate task name.
    pub fn build(self) -> Result<UserBehavior<C>, BuildError> {
        if self.host.is_empty() {
            return Err(BuildError::EmptyHost);
        }

        // Parsed only to validate; the literal string is what the engine and
        // its client see.
        if let Err(source) = url::Url::parse(&self.host) {
            return Err(BuildError::InvalidHost {
                host: self.host,
                source,
            });
        }

        if self.tasks.is_empty() {
            return Err(BuildError::NoTasks);
        }

        for (i, task) in self.tasks.iter().enumerate() {
            if self.tasks[..i].iter().any(|t| t.name() == task.name()) {
                return Err(BuildError::DuplicateTask(task.name().to_string()));
            }
        }

        Ok(UserBehavior {
            host: self.host,
            tasks: self.tasks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientError, Method, Request, Response};
    use std::sync::{Arc, Mutex};

    /// Client stand-in that records every request it is handed.
    #[derive(Clone, Default)]
    struct RecordingClient {
        calls: Arc<Mutex<Vec<(Method, String)>>>,
    }

    impl RecordingClient {
        fn calls(&self) -> Vec<(Method, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Client for RecordingClient {
        fn send(
            &self,
            req: Request,
        ) -> impl Future<Output = Result<Response, ClientError>> + Send {
            let calls = Arc::clone(&self.calls);
            async move {
                calls.lock().unwrap().push((req.method, req.path));
                Ok(Response::new(200, Vec::new()))
            }
        }
    }

    fn index_behavior() -> UserBehavior<RecordingClient> {
        UserBehavior::builder("http://localhost:5000")
            .task("index", |client: RecordingClient| async move {
                client.get("/").await?;
                Ok(())
            })
            .build()
            .unwrap()
    }

    #[test]
    fn host_is_kept_verbatim() {
        let behavior = index_behavior();
        assert_eq!(behavior.host(), "http://localhost:5000");
    }

    #[tokio::test]
    async fn index_task_issues_one_get_to_root() {
        let behavior = index_behavior();
        let client = RecordingClient::default();

        behavior
            .get_task("index")
            .unwrap()
            .run(client.clone())
            .await
            .unwrap();

        assert_eq!(client.calls(), vec![(Method::Get, "/".to_string())]);
    }

    #[tokio::test]
    async fn repeated_invocation_leaves_descriptor_unchanged() {
        let behavior = index_behavior();
        let client = RecordingClient::default();

        for _ in 0..3 {
            behavior
                .get_task("index")
                .unwrap()
                .run(client.clone())
                .await
                .unwrap();
        }

        assert_eq!(behavior.host(), "http://localhost:5000");
        assert_eq!(behavior.tasks().len(), 1);
        assert_eq!(behavior.tasks()[0].name(), "index");
        assert_eq!(client.calls().len(), 3);
    }

    #[tracing_test::traced_test]
    #[test]
    fn tasks_keep_registration_order_and_weights() {
        let behavior: UserBehavior<RecordingClient> =
            UserBehavior::builder("http://localhost:5000")
                .task("index", |client: RecordingClient| async move {
                    client.get("/").await?;
                    Ok(())
                })
                .weighted_task(
                    "search",
                    NonZeroU32::new(3).unwrap(),
                    |client: RecordingClient| async move {
                        client.get("/search").await?;
                        Ok(())
                    },
                )
                .build()
                .unwrap();

        let names: Vec<_> = behavior.tasks().iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["index", "search"]);
        assert_eq!(behavior.tasks()[0].weight().get(), 1);
        assert_eq!(behavior.tasks()[1].weight().get(), 3);
        assert_eq!(behavior.total_weight(), 4);
        assert!(behavior.get_task("search").is_some());
        assert!(behavior.get_task("missing").is_none());
    }

    #[test]
    fn build_rejects_empty_host() {
        let res = UserBehavior::<RecordingClient>::builder("")
            .task("index", |client: RecordingClient| async move {
                client.get("/").await?;
                Ok(())
            })
            .build();
        assert!(matches!(res, Err(BuildError::EmptyHost)));
    }

    #[test]
    fn build_rejects_relative_host() {
        let res = UserBehavior::<RecordingClient>::builder("/not/absolute")
            .task("index", |client: RecordingClient| async move {
                client.get("/").await?;
                Ok(())
            })
            .build();
        assert!(matches!(res, Err(BuildError::InvalidHost { .. })));
    }

    #[test]
    fn build_rejects_empty_task_set() {
        let res = UserBehavior::<RecordingClient>::builder("http://localhost:5000").build();
        assert!(matches!(res, Err(BuildError::NoTasks)));
    }

    #[test]
    fn build_rejects_duplicate_task_names() {
        let res = UserBehavior::<RecordingClient>::builder("http://localhost:5000")
            .task("index", |client: RecordingClient| async move {
                client.get("/").await?;
                Ok(())
            })
            .task("index", |client: RecordingClient| async move {
                client.get("/other").await?;
                Ok(())
            })
            .build();
        assert!(matches!(res, Err(BuildError::DuplicateTask(name)) if name == "index"));
    }
}
