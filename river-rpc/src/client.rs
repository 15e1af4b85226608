//! Stream RPC client: retry, logging and token-expiry handling around a
//! [`StreamService`].

use crate::config::{RetryParams, TransportConfig};
use crate::error::RpcError;
use crate::retry::{retry_unary, RefreshNodeUrl, RetryPolicy};
use crate::service::{GrpcStreamService, StreamService};
use crate::telemetry::{gen_short_id, CallHistogram, REQUEST_ID_HEADER};
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use river_proto::{
    AddEventRequest, AddEventResponse, Envelope, GetLastMiniblockHashRequest,
    GetLastMiniblockHashResponse, GetMiniblocksRequest, GetMiniblocksResponse, GetStreamRequest,
    GetStreamResponse, SyncCookie, SyncStreamsRequest, SyncStreamsResponse,
};
use std::fmt::Debug;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tonic::metadata::AsciiMetadataValue;
use tonic::{Code, Request, Status};

static NEXT_TRANSPORT_ID: AtomicU64 = AtomicU64::new(0);

pub type OnTokenExpired = Arc<dyn Fn() + Send + Sync>;

/// Client bound to one node url.
pub struct StreamRpcClient {
    service: Arc<dyn StreamService>,
    url: String,
    transport_id: u64,
    retry: RetryParams,
    attempt_timeout: Option<Duration>,
    histogram: Arc<CallHistogram>,
    refresh_node_url: Option<RefreshNodeUrl>,
    on_token_expired: Option<OnTokenExpired>,
    shutdown_token: CancellationToken,
}

impl Debug for StreamRpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamRpcClient")
            .field("url", &self.url)
            .field("transport_id", &self.transport_id)
            .field("retry", &self.retry)
            .finish()
    }
}

impl StreamRpcClient {
    /// Pick a node from `config`, build a gRPC client for it and start the
    /// histogram reporter. Must be called inside a tokio runtime.
    pub fn connect(config: &TransportConfig) -> Result<Self, RpcError> {
        let url = config.select_node_url()?;
        tracing::info!(url = %url, all_urls = %config.node_urls, "connecting stream rpc client");
        let service = GrpcStreamService::connect_lazy(&url, config.wire_format)?;
        let mut client = Self::new(Arc::new(service), url, config.retry);
        client.attempt_timeout = config.attempt_timeout;
        client.spawn_histogram_reporter();
        Ok(client)
    }

    /// Wrap an existing service; no background tasks are started.
    pub fn new(service: Arc<dyn StreamService>, url: impl Into<String>, retry: RetryParams) -> Self {
        let transport_id = NEXT_TRANSPORT_ID.fetch_add(1, Ordering::Relaxed);
        Self {
            service,
            url: url.into(),
            transport_id,
            retry,
            attempt_timeout: None,
            histogram: CallHistogram::new(),
            refresh_node_url: None,
            on_token_expired: None,
            shutdown_token: CancellationToken::new(),
        }
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    pub fn with_refresh_node_url(mut self, refresh: RefreshNodeUrl) -> Self {
        self.refresh_node_url = Some(refresh);
        self
    }

    pub fn with_on_token_expired(mut self, hook: OnTokenExpired) -> Self {
        self.on_token_expired = Some(hook);
        self
    }

    pub fn spawn_histogram_reporter(&self) {
        self.histogram.spawn_reporter(self.transport_id, self.shutdown_token.child_token());
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn histogram(&self) -> &Arc<CallHistogram> {
        &self.histogram
    }

    /// Request with a fresh correlation id header.
    fn tagged_request<T>(message: T, request_id: &str) -> Request<T> {
        let mut request = Request::new(message);
        if let Ok(value) = AsciiMetadataValue::try_from(request_id) {
            request.metadata_mut().insert(REQUEST_ID_HEADER, value);
        }
        request
    }

    /// One logged attempt. `GetStream` answering `NotFound` is an expected
    /// existence check and is neither logged as an error nor counted.
    async fn logged_attempt<Req, Resp, F, Fut>(
        &self,
        method: &'static str,
        stream_id: Option<&str>,
        message: Req,
        send: F,
    ) -> Result<Resp, RpcError>
    where
        Req: Debug,
        Resp: Debug,
        F: FnOnce(Request<Req>) -> Fut,
        Fut: Future<Output = Result<Resp, Status>>,
    {
        let request_id = gen_short_id();
        tracing::debug!(method, stream_id, request_id = %request_id, "call");
        tracing::trace!(method, request_id = %request_id, request = ?message, "REQUEST");
        self.histogram.record(method, stream_id, false);

        match send(Self::tagged_request(message, &request_id)).await {
            Ok(response) => {
                tracing::trace!(method, request_id = %request_id, response = ?response, "RESPONSE");
                Ok(response)
            }
            Err(status) => {
                if !(method == "GetStream" && status.code() == Code::NotFound) {
                    tracing::error!(method, request_id = %request_id, error = %status, "RPC error");
                    self.histogram.record(method, stream_id, true);
                }
                Err(RpcError::status(method, status))
            }
        }
    }

    async fn call<Req, Resp, F, Fut>(
        &self,
        method: &'static str,
        stream_id: Option<String>,
        message: Req,
        cancel: &CancellationToken,
        send: F,
    ) -> Result<Resp, RpcError>
    where
        Req: Clone + Debug,
        Resp: Debug,
        F: Fn(Arc<dyn StreamService>, Request<Req>) -> Fut,
        Fut: Future<Output = Result<Resp, Status>>,
    {
        let policy = RetryPolicy {
            params: self.retry,
            attempt_timeout: self.attempt_timeout,
            url: &self.url,
            refresh_node_url: self.refresh_node_url.as_ref(),
        };
        let result = retry_unary(&policy, method, cancel, |_| {
            let message = message.clone();
            let service = Arc::clone(&self.service);
            let send = &send;
            let stream_id = stream_id.as_deref();
            async move {
                self.logged_attempt(method, stream_id, message, |req| send(service, req)).await
            }
        })
        .await;

        if let Err(e) = &result {
            if e.is_delegate_expired() {
                if let Some(hook) = &self.on_token_expired {
                    hook();
                }
            }
        }
        result
    }

    #[tracing::instrument(skip(self, stream_id, cancel), fields(stream_id = %hex::encode(&stream_id)))]
    pub async fn get_stream(
        &self,
        stream_id: Vec<u8>,
        optional: bool,
        cancel: &CancellationToken,
    ) -> Result<GetStreamResponse, RpcError> {
        let id = hex::encode(&stream_id);
        let message = GetStreamRequest { stream_id, optional };
        self.call("GetStream", Some(id), message, cancel, |svc, req| async move {
            svc.get_stream(req).await
        })
        .await
    }

    #[tracing::instrument(skip(self, stream_id, cancel), fields(stream_id = %hex::encode(&stream_id)))]
    pub async fn get_miniblocks(
        &self,
        stream_id: Vec<u8>,
        from_inclusive: i64,
        to_exclusive: i64,
        cancel: &CancellationToken,
    ) -> Result<GetMiniblocksResponse, RpcError> {
        let id = hex::encode(&stream_id);
        let message = GetMiniblocksRequest { stream_id, from_inclusive, to_exclusive };
        self.call("GetMiniblocks", Some(id), message, cancel, |svc, req| async move {
            svc.get_miniblocks(req).await
        })
        .await
    }

    pub async fn get_last_miniblock_hash(
        &self,
        stream_id: Vec<u8>,
        cancel: &CancellationToken,
    ) -> Result<GetLastMiniblockHashResponse, RpcError> {
        let id = hex::encode(&stream_id);
        let message = GetLastMiniblockHashRequest { stream_id };
        self.call("GetLastMiniblockHash", Some(id), message, cancel, |svc, req| async move {
            svc.get_last_miniblock_hash(req).await
        })
        .await
    }

    pub async fn add_event(
        &self,
        stream_id: Vec<u8>,
        event: Envelope,
        optional: bool,
        cancel: &CancellationToken,
    ) -> Result<AddEventResponse, RpcError> {
        let id = hex::encode(&stream_id);
        let message = AddEventRequest { stream_id, event: Some(event), optional };
        self.call("AddEvent", Some(id), message, cancel, |svc, req| async move {
            svc.add_event(req).await
        })
        .await
    }

    /// Open a sync session. Streaming calls are logged but never retried.
    pub async fn sync_streams(
        &self,
        sync_pos: Vec<SyncCookie>,
    ) -> Result<BoxStream<'static, Result<SyncStreamsResponse, RpcError>>, RpcError> {
        const METHOD: &str = "SyncStreams";
        let request_id = gen_short_id();
        let stream_ids: Vec<String> = sync_pos.iter().map(|c| hex::encode(&c.stream_id)).collect();
        tracing::debug!(method = METHOD, num = stream_ids.len(), request_id = %request_id, streams = ?stream_ids, "call");
        self.histogram.record(METHOD, None, false);

        let request = Self::tagged_request(SyncStreamsRequest { sync_pos }, &request_id);
        let stream = match self.service.sync_streams(request).await {
            Ok(stream) => stream,
            Err(status) => {
                tracing::error!(method = METHOD, request_id = %request_id, error = %status, "RPC error");
                self.histogram.record(METHOD, None, true);
                let err = RpcError::status(METHOD, status);
                if err.is_delegate_expired() {
                    if let Some(hook) = &self.on_token_expired {
                        hook();
                    }
                }
                return Err(err);
            }
        };

        let histogram = Arc::clone(&self.histogram);
        let recv = format!("{} RECV", METHOD);
        Ok(stream
            .enumerate()
            .map(move |(index, item)| match item {
                Ok(response) => {
                    let stream_id = response
                        .stream
                        .as_ref()
                        .and_then(|s| s.next_sync_cookie.as_ref())
                        .map(|c| hex::encode(&c.stream_id));
                    tracing::debug!(
                        method = METHOD,
                        index,
                        request_id = %request_id,
                        stream_id = stream_id.as_deref(),
                        "RECV"
                    );
                    histogram.record(&recv, stream_id.as_deref(), false);
                    Ok(response)
                }
                Err(status) => {
                    tracing::error!(method = METHOD, index, request_id = %request_id, error = %status, "stream error");
                    histogram.record(&recv, None, true);
                    Err(RpcError::status(METHOD, status))
                }
            })
            .boxed())
    }
}

impl Drop for StreamRpcClient {
    fn drop(&mut self) {
        self.shutdown_token.cancel();
    }
}
