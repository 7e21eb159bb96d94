use crate::common::error::Result;
use crate::config::HttpConfig;
use std::time::Duration;

/// One client shared by every oracle: pooled connections, a per-request
/// timeout, and an identifying User-Agent (Wikidata rejects anonymous clients).
pub fn build_client(http: &HttpConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(http.timeout_secs))
        .user_agent(http.user_agent.as_str())
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_default_config() {
        assert!(build_client(&HttpConfig::default()).is_ok());
    }
}
