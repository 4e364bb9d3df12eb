//! Smallest useful descriptor: one user hitting the index page of a local
//! service. Run `mock-service` first to have something listening on :5000.

use anyhow::Result;
use stampede::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    FmtSubscriber::builder()
        .with_env_filter("stampede=debug,demos=info")
        .init();

    let behavior = UserBehavior::builder("http://localhost:5000")
        .task("index", |client: ReqwestClient| async move {
            client.get("/").await?;
            Ok(())
        })
        .build()?;

    let client = ReqwestClient::new(behavior.host())?;

    for task in behavior.tasks() {
        match task.run(client.clone()).await {
            Ok(()) => info!(task = task.name(), "task succeeded"),
            Err(err) => warn!(task = task.name(), %err, "task failed"),
        }
    }

    Ok(())
}
