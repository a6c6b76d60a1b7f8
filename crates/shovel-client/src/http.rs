//! HTTP implementation of [`FlowApi`]

use std::time::Duration;

use shovel_core::prelude::*;
use shovel_core::{FlowDetail, FlowId, FlowPage};
use url::Url;

use crate::api::{FlowApi, ListFlowsQuery};

/// Per-request timeout for list and detail calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Flow API reached over HTTP (`api/flow`, `api/flow/{id}`).
#[derive(Debug, Clone)]
pub struct HttpFlowApi {
    client: reqwest::Client,
    base: Url,
}

impl HttpFlowApi {
    /// Create a client rooted at `base` (the viewer's own location).
    ///
    /// A missing trailing slash is added so that relative API paths resolve
    /// under `base` rather than next to it.
    pub fn new(base: Url) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::transport(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base: normalize_base(base),
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }
}

pub(crate) fn normalize_base(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.set_query(None);
    base.set_fragment(None);
    base
}

impl FlowApi for HttpFlowApi {
    async fn list_flows(&self, query: &ListFlowsQuery) -> Result<FlowPage> {
        let mut url = self.endpoint("api/flow")?;
        let pairs = query.to_pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::transport(format!("Failed to list flows: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::http_status(response.status().as_u16(), url.path()));
        }
        response
            .json::<FlowPage>()
            .await
            .map_err(|e| Error::transport(format!("Invalid flow list response: {e}")))
    }

    async fn get_flow(&self, id: FlowId) -> Result<Option<FlowDetail>> {
        let url = self.endpoint(&format!("api/flow/{id}"))?;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::transport(format!("Failed to fetch flow {id}: {e}")))?;
        if !response.status().is_success() {
            debug!("Flow {} unavailable: HTTP {}", id, response.status());
            return Ok(None);
        }
        let detail = response
            .json::<FlowDetail>()
            .await
            .map_err(|e| Error::transport(format!("Invalid flow {id} response: {e}")))?;
        Ok(Some(detail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_gets_trailing_slash() {
        let api = HttpFlowApi::new(Url::parse("http://ctf.local/shovel").unwrap()).unwrap();
        assert_eq!(api.base().as_str(), "http://ctf.local/shovel/");
        assert_eq!(
            api.endpoint("api/flow").unwrap().as_str(),
            "http://ctf.local/shovel/api/flow"
        );
    }

    #[test]
    fn test_base_drops_viewer_query() {
        let base = normalize_base(Url::parse("http://ctf.local/?flow=3&to=9").unwrap());
        assert_eq!(base.as_str(), "http://ctf.local/");
    }

    #[test]
    fn test_flow_endpoint() {
        let api = HttpFlowApi::new(Url::parse("http://127.0.0.1:8000/").unwrap()).unwrap();
        assert_eq!(
            api.endpoint(&format!("api/flow/{}", FlowId(77))).unwrap().as_str(),
            "http://127.0.0.1:8000/api/flow/77"
        );
    }
}
