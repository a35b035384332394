//! Request-issuing layer.
//!
//! Every API call asks the cluster for a base URL, sends the request, and
//! on a transport failure reports the member as inactive and retries on
//! whatever member the cluster selects next. The loop ends with
//! `NoAvailableMember` once every member is down.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use http::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use chronos_cluster::{
    Cluster, ClusterOptions, HttpRequest, HttpResponse, HyperTransport, Transport,
};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Client for the Chronos scheduler REST API.
#[derive(Clone)]
pub struct Client {
    config: ClientConfig,
    cluster: Cluster,
    transport: Arc<dyn Transport>,
    authorization: Option<String>,
}

impl Client {
    /// Create a client using the hyper transport.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let transport = Arc::new(HyperTransport::new(config.request_timeout())?);
        Self::with_transport(config, transport)
    }

    /// Create a client on top of a custom transport.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> ClientResult<Self> {
        let options = ClusterOptions {
            probe_timeout: config.request_timeout(),
            ..ClusterOptions::default()
        };
        Self::with_cluster_options(config, transport, options)
    }

    pub fn with_cluster_options(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        options: ClusterOptions,
    ) -> ClientResult<Self> {
        let cluster = Cluster::with_options(&config.url, transport.clone(), options)?;
        let authorization = config
            .basic_auth()
            .map(|(user, password)| {
                format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
            });

        Ok(Self {
            config,
            cluster,
            transport,
            authorization,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn cluster(&self) -> &Cluster {
        &self.cluster
    }

    pub async fn api_get<T: DeserializeOwned>(&self, uri: &str) -> ClientResult<T> {
        let resp = self.api_call(Method::GET, uri, None).await?;
        decode(&resp)
    }

    pub async fn api_put<B: Serialize + ?Sized>(
        &self,
        uri: &str,
        post: Option<&B>,
    ) -> ClientResult<()> {
        self.api_operation(Method::PUT, uri, post).await
    }

    pub async fn api_post<B: Serialize + ?Sized>(
        &self,
        uri: &str,
        post: Option<&B>,
    ) -> ClientResult<()> {
        self.api_operation(Method::POST, uri, post).await
    }

    pub async fn api_delete(&self, uri: &str) -> ClientResult<()> {
        self.api_operation::<()>(Method::DELETE, uri, None).await
    }

    async fn api_operation<B: Serialize + ?Sized>(
        &self,
        method: Method,
        uri: &str,
        post: Option<&B>,
    ) -> ClientResult<()> {
        let body = post.map(encode).transpose()?;
        self.api_call(method, uri, body).await?;
        Ok(())
    }

    /// Send one API request and require a 2xx answer.
    pub async fn api_call(
        &self,
        method: Method,
        uri: &str,
        body: Option<String>,
    ) -> ClientResult<HttpResponse> {
        debug!(%method, %uri, body = body.as_deref().unwrap_or_default(), "api request");

        let resp = self.http_request(method, uri, body).await?;

        debug!(status = resp.status, content = %resp.body, "api result");
        if resp.is_success() {
            Ok(resp)
        } else {
            Err(ClientError::Status {
                status: resp.status,
                body: resp.body,
            })
        }
    }

    async fn http_request(
        &self,
        method: Method,
        uri: &str,
        body: Option<String>,
    ) -> ClientResult<HttpResponse> {
        loop {
            let base = self.cluster.get_member()?;
            let url = format!("{base}{uri}");

            let mut request = HttpRequest::new(method.clone(), url.as_str())
                .with_header("content-type", "application/json")
                .with_header("accept", "application/json");
            if let Some(auth) = &self.authorization {
                request = request.with_header("authorization", auth.as_str());
            }
            if let Some(body) = &body {
                request = request.with_body(body.as_str());
            }

            debug!(%method, %url, "http request");
            match self.transport.send(request).await {
                Ok(resp) => return Ok(resp),
                Err(e) if e.is_unreachable() => {
                    warn!(error = %e, %url, "cluster member unreachable, retrying on next member");
                    let host = base.split_once("://").map_or(base.as_str(), |(_, host)| host);
                    self.cluster.mark_inactive_host(host);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("url", &self.config.url)
            .field("cluster", &self.cluster)
            .field("basic_auth", &self.authorization.is_some())
            .finish()
    }
}

fn encode<B: Serialize + ?Sized>(data: &B) -> ClientResult<String> {
    serde_json::to_string(data).map_err(ClientError::Encode)
}

fn decode<T: DeserializeOwned>(resp: &HttpResponse) -> ClientResult<T> {
    serde_json::from_str(&resp.body).map_err(|e| {
        debug!(error = %e, "failed to decode response from chronos");
        ClientError::Decode(e)
    })
}
