mod utils;
#[allow(unused)]
use utils::*;

use anyhow::Result;
use stampede::prelude::*;

#[tokio::test]
async fn index_task_issues_single_get_to_root() -> Result<()> {
    init().await;

    let behavior = UserBehavior::builder(mock_host())
        .task("index", |client: ReqwestClient| async move {
            client.get("/").await?;
            Ok(())
        })
        .build()?;

    let client = ReqwestClient::new(behavior.host())?;
    let before = mock_service::root_hits();

    behavior.get_task("index").unwrap().run(client).await?;

    assert_eq!(mock_service::root_hits() - before, 1);
    Ok(())
}

#[tokio::test]
async fn engine_loop_drives_every_registered_task() -> Result<()> {
    init().await;

    let behavior = UserBehavior::builder(mock_host())
        .task("browse", |client: ReqwestClient| async move {
            client.get("/count/browse").await?;
            Ok(())
        })
        .weighted_task(
            "checkout",
            std::num::NonZeroU32::new(3).unwrap(),
            |client: ReqwestClient| async move {
                client.get("/count/checkout").await?;
                Ok(())
            },
        )
        .build()?;

    assert_eq!(behavior.total_weight(), 4);

    // Minimal stand-in for an engine: one pass over the task set.
    let client = ReqwestClient::new(behavior.host())?;
    for task in behavior.tasks() {
        task.run(client.clone()).await?;
    }

    assert_eq!(mock_service::key_hits("browse"), 1);
    assert_eq!(mock_service::key_hits("checkout"), 1);
    Ok(())
}

#[tokio::test]
async fn concurrent_users_share_one_descriptor() -> Result<()> {
    init().await;

    let behavior = UserBehavior::builder(mock_host())
        .task("swarm", |client: ReqwestClient| async move {
            client.get("/count/swarm").await?;
            Ok(())
        })
        .build()?;

    let client = ReqwestClient::new(behavior.host())?;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let user = behavior.clone();
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            user.get_task("swarm").unwrap().run(client).await
        }));
    }
    for handle in handles {
        handle.await??;
    }

    assert_eq!(mock_service::key_hits("swarm"), 10);
    Ok(())
}

#[tokio::test]
async fn mock_service_outlives_the_runtime_that_started_it() -> Result<()> {
    // Drive startup from a runtime that is gone before the request is made.
    std::thread::spawn(|| {
        tokio::runtime::Runtime::new()
            .expect("short-lived runtime")
            .block_on(init());
    })
    .join()
    .expect("init thread");

    let client = ReqwestClient::new(&mock_host())?;
    let res = client.get("/status/204").await?;
    assert!(res.is_success());
    Ok(())
}

#[tokio::test]
async fn non_success_status_is_not_a_client_error() -> Result<()> {
    init().await;

    let client = ReqwestClient::new(&mock_host())?;
    let res = client.get("/status/503").await?;

    assert!(!res.is_success());
    assert_eq!(res.status(), 503);
    Ok(())
}

#[tokio::test]
async fn transport_failure_propagates_out_of_the_task() -> Result<()> {
    init().await;

    // Nothing listens on this port.
    let behavior = UserBehavior::builder("http://127.0.0.1:39997")
        .task("index", |client: ReqwestClient| async move {
            client.get("/").await?;
            Ok(())
        })
        .build()?;

    let client = ReqwestClient::new(behavior.host())?;
    let res = behavior.get_task("index").unwrap().run(client).await;

    assert!(matches!(res, Err(ClientError::Transport(_))));
    Ok(())
}

#[tokio::test]
async fn caller_configured_reqwest_client_is_reusable() -> Result<()> {
    init().await;

    let inner = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()?;
    let client = ReqwestClient::with_client(&mock_host(), inner)?;

    let res = client.get("/status/204").await?;
    assert!(res.is_success());
    Ok(())
}
