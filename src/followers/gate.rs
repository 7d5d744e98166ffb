use log::info;

use crate::{
    api::{FollowerApi, types::EndpointLimit},
    error::{GateError, QuotaError},
};

pub const FOLLOWERS_RESOURCE: &str = "followers";
pub const FOLLOWERS_LIST_ENDPOINT: &str = "/followers/list";

/// Asks the API for the remaining `followers/list` quota before each page
/// fetch. Fails closed: a missing status entry is treated like no quota.
pub struct RateLimitGate<'a, A> {
    api: &'a A,
}

impl<'a, A: FollowerApi> RateLimitGate<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    pub async fn check_quota(&self) -> Result<EndpointLimit, GateError> {
        let status = self.api.rate_limit_status().await?;

        let limit = status
            .endpoint(FOLLOWERS_RESOURCE, FOLLOWERS_LIST_ENDPOINT)
            .copied()
            .ok_or_else(|| QuotaError::StatusUnavailable {
                resource: FOLLOWERS_LIST_ENDPOINT.to_string(),
            })?;

        if limit.remaining <= 0 {
            return Err(QuotaError::Exhausted {
                remaining: limit.remaining,
                reset: limit.reset,
            }
            .into());
        }

        info!(
            "{FOLLOWERS_LIST_ENDPOINT} quota: {}/{} requests remaining",
            limit.remaining, limit.limit
        );
        Ok(limit)
    }
}
