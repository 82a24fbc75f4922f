pub mod client;
pub mod messages;
pub mod openapi;
pub mod session;
pub mod shared;

pub use client::{ApolloClient, ApolloError, ExternalTaskMessage};
pub use messages::{fetch_messages, fetch_task_messages, FetchPath, FetchedMessages};
