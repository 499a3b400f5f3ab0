use api_types::ErrorBody;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::GatewayError;

/// Thin wrapper over `reqwest` that knows the backend's URL layout and
/// headers.
#[derive(Clone, Debug)]
pub(crate) struct RestClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl RestClient {
    pub(crate) fn new(client: Client, base_url: String, anon_key: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
        }
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// A request carrying `apikey` and the bearer token; the anon key stands
    /// in for the token when signed out.
    pub(crate) fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let bearer = token.unwrap_or(&self.anon_key);
        self.client
            .request(method, self.url(path))
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    pub(crate) async fn json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, GatewayError> {
        let resp = Self::checked(req).await?;
        resp.json::<T>()
            .await
            .map_err(|err| GatewayError::Decode(err.to_string()))
    }

    pub(crate) async fn unit(req: RequestBuilder) -> Result<(), GatewayError> {
        Self::checked(req).await.map(|_| ())
    }

    pub(crate) async fn json_body<TReq: Serialize + ?Sized, TResp: DeserializeOwned>(
        req: RequestBuilder,
        body: &TReq,
    ) -> Result<TResp, GatewayError> {
        Self::json(req.json(body)).await
    }

    async fn checked(req: RequestBuilder) -> Result<Response, GatewayError> {
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let text = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| body.text().map(str::to_string))
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| "server error".to_string());
        tracing::debug!("backend returned {status}: {message}");
        Err(GatewayError::Server { status, message })
    }
}
