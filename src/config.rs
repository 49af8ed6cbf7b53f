use super::walker::DEFAULT_MAX_POLLS;

use aws_config::{BehaviorVersion, Region, SdkConfig};
use std::env;

pub const ENV_DYNAMODB_ENDPOINT_URL: &str = "DYNAMODB_ENDPOINT_URL";
pub const ENV_AWS_REGION: &str = "AWS_REGION";
pub const ENV_TABLE_NAME: &str = "DYNAMO_WALKER_TABLE";
pub const ENV_MAX_POLLS: &str = "DYNAMO_WALKER_MAX_POLLS";

const DEFAULT_TABLE_NAME: &str = "Music";

/// Settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    endpoint_url: Option<String>,
    region: Option<String>,
    table_name: String,
    max_polls: usize,
}

impl Config {
    pub fn new() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup. Unparsable numbers fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            endpoint_url: non_empty(ENV_DYNAMODB_ENDPOINT_URL),
            region: non_empty(ENV_AWS_REGION),
            table_name: non_empty(ENV_TABLE_NAME).unwrap_or_else(|| DEFAULT_TABLE_NAME.into()),
            max_polls: non_empty(ENV_MAX_POLLS)
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_MAX_POLLS),
        }
    }

    pub fn endpoint_url(&self) -> Option<&str> {
        self.endpoint_url.as_deref()
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn table_name(&self) -> &str {
        self.table_name.as_str()
    }

    pub fn max_polls(&self) -> usize {
        self.max_polls
    }

    /// Load the AWS SDK config, pointed at the configured endpoint when there is one.
    pub async fn sdk_config(&self) -> SdkConfig {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(region) = self.region.clone() {
            loader = loader.region(Region::new(region));
        }
        if let Some(url) = self.endpoint_url.as_deref() {
            loader = loader.endpoint_url(url);
        }

        loader.load().await
    }
}

impl Default for Config {
    fn default() -> Config {
        Config::new()
    }
}
