#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod client;
pub mod task;
pub mod user;

pub use client::{Client, ClientError, Method, Request, Response};
pub use task::{Task, TaskResult};
pub use user::{BuildError, Builder, UserBehavior};

#[cfg(feature = "reqwest")]
pub use client::reqwest::ReqwestClient;

pub mod prelude {
    pub use crate::client::{Client, ClientError, Method, Request, Response};
    pub use crate::task::{Task, TaskResult};
    pub use crate::user::{BuildError, UserBehavior};

    #[cfg(feature = "reqwest")]
    pub use crate::client::reqwest::ReqwestClient;
}
