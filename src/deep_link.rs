//! Deep links to a single plant.
//!
//! A link such as `https://greenthumb.example.com/plants/3` resolves to plant
//! id `3`: the last non-empty path segment, parsed as an integer.

use anyhow::{anyhow, Result};

use crate::config::Config;
use crate::plants;

pub fn parse_plant_id(link: &str) -> Result<i64> {
    let url = reqwest::Url::parse(link).map_err(|e| anyhow!("invalid deep link {}: {}", link, e))?;

    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .and_then(|segment| segment.parse::<i64>().ok())
        .ok_or_else(|| anyhow!("no plant id in deep link: {}", link))
}

/// CLI entry point for `greenthumb link <url>`.
pub async fn run_link(config: &Config, link: &str) -> Result<()> {
    let id = parse_plant_id(link)?;
    tracing::debug!(plant_id = id, "resolved deep link");
    plants::run_show(config, id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_segment_is_id() {
        assert_eq!(
            parse_plant_id("https://greenthumb.example.com/plants/3").unwrap(),
            3
        );
        assert_eq!(
            parse_plant_id("https://greenthumb.example.com/plants/12/?ref=invite").unwrap(),
            12
        );
    }

    #[test]
    fn test_missing_or_invalid_id() {
        assert!(parse_plant_id("https://greenthumb.example.com/").is_err());
        assert!(parse_plant_id("https://greenthumb.example.com/plants/basil").is_err());
        assert!(parse_plant_id("not a url").is_err());
    }
}
