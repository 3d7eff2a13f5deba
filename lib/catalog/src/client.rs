use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use http::{HeaderMap, HeaderValue, Method, Uri};
use hyper::body::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::{TokioExecutor, TokioTimer};
use serde_json::Value as JsonValue;
use tokio::sync::Semaphore;
use tracing::trace;

use fieldline_engine::source::{DataSource, SourceError};

use crate::config::CatalogSourceConfig;

/// HTTP-backed catalog data source. Maps the engine's fetch/mutate
/// operations onto the catalog REST API: `GET /tracks`, `GET /{kind}/{id}`,
/// `GET /track/{id}/modules`, `PATCH /track/{id}/numberOfViews`.
pub struct RestCatalogSource {
    endpoint: String,
    http_client: Arc<Client<HttpConnector, Full<Bytes>>>,
    header_map: HeaderMap,
    semaphore: Arc<Semaphore>,
    request_timeout: Duration,
}

impl RestCatalogSource {
    pub fn new(config: &CatalogSourceConfig) -> Self {
        let mut builder = Client::builder(TokioExecutor::new());
        let builder_mut = builder
            .pool_timer(TokioTimer::new())
            .pool_idle_timeout(Duration::from_secs(50));
        let http_client = Arc::new(builder_mut.build_http());

        let mut header_map = HeaderMap::new();
        header_map.insert(http::header::ACCEPT, HeaderValue::from_static("application/json"));
        header_map.insert(
            http::header::CONNECTION,
            HeaderValue::from_static("keep-alive"),
        );

        RestCatalogSource {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            http_client,
            header_map,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_requests)),
            request_timeout: config.request_timeout,
        }
    }

    async fn request(&self, method: Method, path: &str) -> Result<JsonValue, SourceError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|err| SourceError::Transport(err.to_string()))?;

        let uri: Uri = format!("{}/{}", self.endpoint, path)
            .parse()
            .map_err(|err: http::uri::InvalidUri| SourceError::Transport(err.to_string()))?;
        trace!(%uri, %method, "catalog request");

        let mut request = http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(Bytes::new()))
            .map_err(|err| SourceError::Transport(err.to_string()))?;
        request.headers_mut().extend(self.header_map.clone());

        let response = tokio::time::timeout(self.request_timeout, self.http_client.request(request))
            .await
            .map_err(|_| {
                SourceError::Transport(format!(
                    "request timed out after {:?}",
                    self.request_timeout
                ))
            })?
            .map_err(|err| SourceError::Unavailable(err.to_string()))?;

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|err| SourceError::Transport(err.to_string()))?
            .to_bytes();

        if !status.is_success() {
            return Err(SourceError::Upstream {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        serde_json::from_slice(&body).map_err(|err| SourceError::Decode(err.to_string()))
    }

    fn expect_array(value: JsonValue, what: &str) -> Result<Vec<JsonValue>, SourceError> {
        match value {
            JsonValue::Array(items) => Ok(items),
            other => Err(SourceError::Decode(format!(
                "expected a JSON array of {}, got: {}",
                what, other
            ))),
        }
    }
}

#[async_trait]
impl DataSource for RestCatalogSource {
    async fn fetch_home_collection(&self) -> Result<Vec<JsonValue>, SourceError> {
        let value = self.request(Method::GET, "tracks").await?;
        Self::expect_array(value, "tracks")
    }

    async fn fetch_by_id(&self, kind: &str, id: &str) -> Result<JsonValue, SourceError> {
        match self.request(Method::GET, &format!("{}/{}", kind, id)).await {
            Err(SourceError::Upstream { status: 404, .. }) => Err(SourceError::NotFound {
                kind: kind.to_string(),
                id: id.to_string(),
            }),
            other => other,
        }
    }

    async fn fetch_related(
        &self,
        kind: &str,
        parent_id: &str,
    ) -> Result<Vec<JsonValue>, SourceError> {
        let related = match kind {
            "track" => "modules",
            other => {
                return Err(SourceError::Decode(format!(
                    "no related collection for kind \"{}\"",
                    other
                )))
            }
        };
        let value = self
            .request(Method::GET, &format!("{}/{}/{}", kind, parent_id, related))
            .await?;
        Self::expect_array(value, related)
    }

    async fn mutate_counter_field(
        &self,
        kind: &str,
        id: &str,
        field_name: &str,
    ) -> Result<JsonValue, SourceError> {
        self.request(Method::PATCH, &format!("{}/{}/{}", kind, id, field_name))
            .await
    }
}
