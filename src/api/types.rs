use std::{collections::HashMap, fmt::Display, num::ParseIntError, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};

/// Continuation token for `followers/list`.
///
/// Twitter encodes cursors as signed integers where `-1` asks for the first
/// page and `0` means the stream has no further pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(i64);

impl Cursor {
    pub const START: Cursor = Cursor(-1);

    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Maps the API's "no more pages" value to `None`.
    pub fn continuation(value: i64) -> Option<Self> {
        (value != 0).then_some(Self(value))
    }

    pub fn is_exhausted(&self) -> bool {
        self.0 == 0
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Cursor {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Cursor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    #[serde(default)]
    pub id_str: String,
    pub screen_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub protected: bool,
    /// Whether the authenticating account already follows this user.
    #[serde(default, deserialize_with = "null_as_false")]
    pub following: bool,
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub friends_count: u64,
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// Raw `followers/list` payload.
#[derive(Debug, Deserialize)]
pub struct FollowersResponse {
    pub users: Vec<User>,
    #[serde(default)]
    pub next_cursor: i64,
}

/// One page of the follower stream.
#[derive(Debug, Clone, Default)]
pub struct FollowersPage {
    pub users: Vec<User>,
    pub next_cursor: Option<Cursor>,
}

impl From<FollowersResponse> for FollowersPage {
    fn from(res: FollowersResponse) -> Self {
        Self {
            users: res.users,
            next_cursor: Cursor::continuation(res.next_cursor),
        }
    }
}

/// `application/rate_limit_status` payload, keyed by resource family and then
/// endpoint path (e.g. `followers` -> `/followers/list`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RateLimitStatus {
    #[serde(default)]
    pub resources: HashMap<String, HashMap<String, EndpointLimit>>,
}

impl RateLimitStatus {
    pub fn endpoint(&self, family: &str, path: &str) -> Option<&EndpointLimit> {
        self.resources.get(family)?.get(path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct EndpointLimit {
    pub limit: i64,
    pub remaining: i64,
    pub reset: i64,
}

/// Per-run classification totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub fetched: u64,
    pub skipped_quota_reached: u64,
    pub skipped_protected: u64,
    pub skipped_already_followed: u64,
    pub skipped_for_resume: u64,
    pub collected: u64,
}

impl Counters {
    pub fn skipped(&self) -> u64 {
        self.skipped_quota_reached
            + self.skipped_protected
            + self.skipped_already_followed
            + self.skipped_for_resume
    }
}

/// Arguments that continue a stopped run exactly where it left off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumePoint {
    pub cursor: Cursor,
    /// Otherwise-eligible users to discard at `cursor` before collecting.
    pub skip: i64,
    /// How many users the original target still lacks.
    pub remaining: i64,
}
