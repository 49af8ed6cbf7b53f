//! Typed calls to the [Amazon DynamoDB](https://docs.aws.amazon.com/amazondynamodb/latest/developerguide/Introduction.html)
//! data plane and a bounded walker over
//! [DynamoDB Streams](https://docs.aws.amazon.com/amazondynamodb/latest/developerguide/streamsmain.html) shards.
//!
//! ## Getting Started
//!
//! Edit your **Cargo.toml** at first.
//!
//! ```toml
//! [dependencies]
//! dynamo-walker = "0.1"
//! aws-config = "1.0.1"
//! tokio = { version = "1", features = ["macros", "rt-multi-thread"] }
//! ```
//!
//! Then in code, assuming that the dynamodb-local instance is running on localhost:8000
//! and the "Music" table exists with a stream enabled, you can read every change record
//! of that table with the following.
//!
//! ```rust,no_run
//! use dynamo_walker::{config::Config, walker::ShardWalker, Client};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), dynamo_walker::error::Error> {
//!     // DYNAMODB_ENDPOINT_URL=http://localhost:8000
//!     let config = Config::new();
//!     let client = Client::new(&config.sdk_config().await);
//!
//!     let walker = ShardWalker::builder(client.clone()).build();
//!     let report = walker.walk_table(&client, "Music").await?;
//!
//!     for record in report.records() {
//!         println!("{record}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## AWS SDK Dependency
//!
//! To build [`Client`] of this crate, you must pass the reference for
//! [`SdkConfig`](aws_config::SdkConfig).

/// Client for calling AWS APIs.
pub mod client;

/// Settings read from the environment.
pub mod config;

/// Common errors.
pub mod error;

/// Item helpers built on [`DynamodbClient`].
pub mod items;

/// Table lifecycle helpers.
pub mod table;

/// Data structures used by operations.
pub mod types;

pub mod walker;

pub use client::{Client, DynamodbClient, DynamodbStreamsClient};
