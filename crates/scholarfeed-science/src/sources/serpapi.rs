use async_trait::async_trait;
use reqwest::Url;
use scholarfeed_core::SearchConfig;
use serde_json::Value;

use crate::error::{Result, ScienceError};
use crate::http::HttpClient;
use crate::sources::{RawSearchResult, ScholarSearch};

const USER_AGENT: &str = "scholarfeed/0.1";
const SEARCH_PATH: &str = "search.json";
const FIRST_PAGE_OFFSET: &str = "0";

/// Google Scholar through SerpApi.
pub struct SerpApiSource {
    client: HttpClient,
    base_url: String,
    engine: String,
    api_key: Option<String>,
    api_key_env: String,
    page_size: u32,
}

impl SerpApiSource {
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        Ok(Self {
            client: HttpClient::new(config.timeout(), USER_AGENT)?,
            base_url: config.base_url.clone(),
            engine: config.engine.clone(),
            api_key: config.api_key(),
            api_key_env: config.api_key_env.clone(),
            page_size: config.page_size,
        })
    }

    pub fn with_params(base_url: &str, api_key: Option<String>, config: &SearchConfig) -> Result<Self> {
        let mut source = Self::from_config(config)?;
        source.base_url = base_url.to_string();
        source.api_key = api_key;
        Ok(source)
    }

    /// Author-restricted query in Google Scholar syntax.
    pub fn author_query(author: &str) -> String {
        format!("author:\"{}\"", author.trim())
    }

    fn build_url(&self, api_key: &str, selector: (&str, &str)) -> Result<Url> {
        let base = self.base_url.trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}/{SEARCH_PATH}"))
            .map_err(|e| ScienceError::Parse(format!("invalid URL {base}: {e}")))?;
        url.query_pairs_mut()
            .append_pair("engine", &self.engine)
            .append_pair("api_key", api_key)
            .append_pair(selector.0, selector.1)
            .append_pair("start", FIRST_PAGE_OFFSET)
            .append_pair("num", &self.page_size.to_string());
        Ok(url)
    }

    async fn fetch(&self, selector: (&str, &str)) -> Result<RawSearchResult> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ScienceError::MissingApiKey(self.api_key_env.clone()))?;

        let url = self.build_url(api_key, selector)?;
        tracing::debug!(engine = %self.engine, param = selector.0, value = selector.1, "querying SerpApi");

        let json = self.client.get_json(&url).await?;
        parse_response(json)
    }
}

/// Splits a decoded response into items, surfacing an embedded `"error"` as [`ScienceError::Remote`].
pub fn parse_response(json: Value) -> Result<RawSearchResult> {
    if let Some(message) = json.get("error").and_then(Value::as_str) {
        return Err(ScienceError::Remote(message.to_string()));
    }

    let search_id = json
        .get("search_metadata")
        .and_then(|m| m.get("id"))
        .and_then(Value::as_str)
        .map(ToOwned::to_owned);

    let items = match json {
        Value::Object(mut obj) => match obj.remove("organic_results") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    Ok(RawSearchResult { items, search_id })
}

#[async_trait]
impl ScholarSearch for SerpApiSource {
    fn name(&self) -> &str {
        "serpapi-google-scholar"
    }

    async fn search_by_author(&self, author: &str) -> Result<RawSearchResult> {
        let query = Self::author_query(author);
        self.fetch(("q", query.as_str())).await
    }

    async fn get_cited_by(&self, cites_id: &str) -> Result<RawSearchResult> {
        self.fetch(("cites", cites_id)).await
    }

    async fn get_all_versions(&self, cluster_id: &str) -> Result<RawSearchResult> {
        self.fetch(("cluster", cluster_id)).await
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}
