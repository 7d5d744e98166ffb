use std::future::Future;

use log::debug;
use oauth::{HMAC_SHA1, Token};
use reqwest::{Client, StatusCode};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    api::types::{Cursor, FollowersPage, FollowersResponse, RateLimitStatus, User},
    config::Config,
    error::ApiError,
};

/// The follower-list surface of the Twitter API that the acquisition engine
/// drives.
pub trait FollowerApi {
    fn followers_page(
        &self,
        cursor: Cursor,
        count: u32,
    ) -> impl Future<Output = Result<FollowersPage, ApiError>> + Send;

    /// Rate limit status for the `followers` resource family.
    fn rate_limit_status(&self) -> impl Future<Output = Result<RateLimitStatus, ApiError>> + Send;
}

#[derive(Serialize, oauth::Request)]
struct FollowersListParams {
    count: u32,
    cursor: i64,
    include_user_entities: bool,
    skip_status: bool,
}

#[derive(Serialize, oauth::Request)]
struct RateLimitParams<'a> {
    resources: &'a str,
}

#[derive(Serialize, oauth::Request)]
struct CreateFriendshipParams<'a> {
    follow: bool,
    screen_name: &'a str,
}

#[derive(Debug, Clone)]
pub struct TwitterClient {
    client: Client,
    base_url: String,
    token: Token<String, String>,
}

impl TwitterClient {
    pub fn new(cfg: &Config) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(format!("followback/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, cfg))
    }

    pub fn with_client(client: Client, cfg: &Config) -> Self {
        let token = Token::from_parts(
            cfg.consumer_key.clone(),
            cfg.consumer_secret.clone(),
            cfg.access_token.clone(),
            cfg.access_secret.clone(),
        );
        Self {
            client,
            base_url: cfg.api_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    async fn get<T, P>(&self, endpoint: &str, params: &P) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        P: Serialize + oauth::Request,
    {
        let url = self.url(endpoint);
        debug!("GET {url}");
        let auth_header = oauth::get(&url, params, &self.token, HMAC_SHA1);
        let response = self
            .client
            .get(&url)
            .query(params)
            .header(reqwest::header::AUTHORIZATION, &auth_header)
            .send()
            .await?;

        decode(response).await
    }

    async fn post<T, P>(&self, endpoint: &str, params: &P) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        P: Serialize + oauth::Request,
    {
        let url = self.url(endpoint);
        debug!("POST {url}");
        let auth_header = oauth::post(&url, params, &self.token, HMAC_SHA1);
        let response = self
            .client
            .post(&url)
            .form(params)
            .header(reqwest::header::AUTHORIZATION, &auth_header)
            .send()
            .await?;

        decode(response).await
    }

    /// Follow `screen_name` on behalf of the authenticating account.
    pub async fn create_friendship(&self, screen_name: &str) -> Result<User, ApiError> {
        let params = CreateFriendshipParams {
            follow: false,
            screen_name,
        };
        self.post("friendships/create.json", &params).await
    }

    /// The authenticating account, as returned by the API.
    pub async fn verify_credentials(&self) -> Result<serde_json::Value, ApiError> {
        let url = self.url("account/verify_credentials.json");
        let auth_header = oauth::get(&url, &(), &self.token, HMAC_SHA1);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, &auth_header)
            .send()
            .await?;

        decode(response).await
    }
}

impl FollowerApi for TwitterClient {
    async fn followers_page(&self, cursor: Cursor, count: u32) -> Result<FollowersPage, ApiError> {
        let params = FollowersListParams {
            count,
            cursor: cursor.value(),
            include_user_entities: false,
            skip_status: true,
        };
        let res: FollowersResponse = self.get("followers/list.json", &params).await?;
        Ok(res.into())
    }

    async fn rate_limit_status(&self) -> Result<RateLimitStatus, ApiError> {
        let params = RateLimitParams {
            resources: "followers",
        };
        self.get("application/rate_limit_status.json", &params)
            .await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text().await?;

    if status.is_success() {
        return Ok(serde_json::from_str(&body)?);
    }

    match status {
        StatusCode::UNAUTHORIZED => Err(ApiError::InvalidCredentials),
        StatusCode::TOO_MANY_REQUESTS => Err(ApiError::RateLimited),
        other => Err(ApiError::InvalidResponse {
            status: other.as_u16(),
            body,
        }),
    }
}
