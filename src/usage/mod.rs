use std::time::{SystemTime, UNIX_EPOCH};

use tabled::builder::Builder;

use crate::{
    api::{FollowerApi, TwitterClient, types::RateLimitStatus},
    config::Config,
    error::Result,
    followers::gate::FOLLOWERS_RESOURCE,
};

pub async fn show() -> Result<()> {
    let cfg = Config::load()?;
    cfg.validate()?;
    let client = TwitterClient::new(&cfg)?;
    let status = client.rate_limit_status().await?;

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default();

    match usage_table(&status, now) {
        Some(table) => println!("{table}"),
        None => eprintln!("Twitter did not report any limits for the {FOLLOWERS_RESOURCE} endpoints."),
    }
    Ok(())
}

fn usage_table(status: &RateLimitStatus, now: i64) -> Option<String> {
    let endpoints = status.resources.get(FOLLOWERS_RESOURCE)?;
    if endpoints.is_empty() {
        return None;
    }

    let mut rows: Vec<_> = endpoints.iter().collect();
    rows.sort_by(|a, b| a.0.cmp(b.0));

    let mut table_builder = Builder::new();
    table_builder.push_record(["Endpoint", "Remaining", "Limit", "Resets in"]);
    for (endpoint, limit) in rows {
        let resets_in = (limit.reset - now).max(0);
        table_builder.push_record([
            endpoint.to_string(),
            limit.remaining.to_string(),
            limit.limit.to_string(),
            format!("{}m {}s", resets_in / 60, resets_in % 60),
        ]);
    }

    Some(table_builder.build().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_table_sorted_by_endpoint() {
        let status: RateLimitStatus = serde_json::from_value(serde_json::json!({
            "resources": {
                "followers": {
                    "/followers/list": {"limit": 15, "remaining": 4, "reset": 1125},
                    "/followers/ids": {"limit": 15, "remaining": 15, "reset": 1000}
                }
            }
        }))
        .unwrap();

        let table = usage_table(&status, 1000).unwrap();
        let ids = table.find("/followers/ids").unwrap();
        let list = table.find("/followers/list").unwrap();
        assert!(ids < list);
        assert!(table.contains("2m 5s"));
    }

    #[test]
    fn test_usage_table_without_followers_entry() {
        assert!(usage_table(&RateLimitStatus::default(), 0).is_none());
    }
}
