//! The `StreamService` RPC surface and its tonic implementation.

use crate::codec::JsonCodec;
use crate::config::WireFormat;
use crate::error::RpcError;
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use river_proto::{
    AddEventRequest, AddEventResponse, GetLastMiniblockHashRequest, GetLastMiniblockHashResponse,
    GetMiniblocksRequest, GetMiniblocksResponse, GetStreamRequest, GetStreamResponse,
    SyncStreamsRequest, SyncStreamsResponse,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};
use tonic::{Request, Status};

pub type SyncStreamsStream = BoxStream<'static, Result<SyncStreamsResponse, Status>>;

/// One node's stream API. Each call takes a fresh `Request`; callers
/// must build a new one per attempt.
#[async_trait]
pub trait StreamService: Send + Sync {
    async fn get_stream(&self, request: Request<GetStreamRequest>) -> Result<GetStreamResponse, Status>;

    async fn get_miniblocks(
        &self,
        request: Request<GetMiniblocksRequest>,
    ) -> Result<GetMiniblocksResponse, Status>;

    async fn get_last_miniblock_hash(
        &self,
        request: Request<GetLastMiniblockHashRequest>,
    ) -> Result<GetLastMiniblockHashResponse, Status>;

    async fn add_event(&self, request: Request<AddEventRequest>) -> Result<AddEventResponse, Status>;

    async fn sync_streams(&self, request: Request<SyncStreamsRequest>) -> Result<SyncStreamsStream, Status>;
}

const SERVICE_PATH: &str = "/river.StreamService/";

fn method_path(method: &'static str) -> Result<PathAndQuery, Status> {
    format!("{}{}", SERVICE_PATH, method)
        .parse()
        .map_err(|e| Status::internal(format!("bad method path: {}", e)))
}

/// gRPC client for a single node url.
#[derive(Clone)]
pub struct GrpcStreamService {
    grpc: Grpc<Channel>,
    url: String,
    wire_format: WireFormat,
}

impl std::fmt::Debug for GrpcStreamService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrpcStreamService")
            .field("url", &self.url)
            .field("wire_format", &self.wire_format)
            .finish()
    }
}

impl GrpcStreamService {
    /// Build a client for `url`. The connection is established on first use,
    /// so an unreachable node shows up as a retryable call error.
    pub fn connect_lazy(url: &str, wire_format: WireFormat) -> Result<Self, RpcError> {
        let endpoint = Endpoint::from_shared(url.to_string())
            .map_err(|e| RpcError::InvalidUrl { url: url.to_string(), reason: e.to_string() })?;
        if wire_format == WireFormat::Json {
            tracing::info!(url, "running in debug mode, using JSON format");
        }
        Ok(Self { grpc: Grpc::new(endpoint.connect_lazy()), url: url.to_string(), wire_format })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn wire_format(&self) -> WireFormat {
        self.wire_format
    }

    async fn ready(&self) -> Result<Grpc<Channel>, Status> {
        let mut grpc = self.grpc.clone();
        grpc.ready()
            .await
            .map_err(|e| Status::unavailable(format!("transport error: {}", e)))?;
        Ok(grpc)
    }

    async fn unary<Req, Resp>(&self, request: Request<Req>, method: &'static str) -> Result<Resp, Status>
    where
        Req: prost::Message + Serialize + Send + Sync + 'static,
        Resp: prost::Message + Default + DeserializeOwned + Send + Sync + 'static,
    {
        let mut grpc = self.ready().await?;
        let path = method_path(method)?;
        let response = match self.wire_format {
            WireFormat::Binary => grpc.unary(request, path, ProstCodec::<Req, Resp>::default()).await?,
            WireFormat::Json => grpc.unary(request, path, JsonCodec::<Req, Resp>::default()).await?,
        };
        Ok(response.into_inner())
    }
}

#[async_trait]
impl StreamService for GrpcStreamService {
    async fn get_stream(&self, request: Request<GetStreamRequest>) -> Result<GetStreamResponse, Status> {
        self.unary(request, "GetStream").await
    }

    async fn get_miniblocks(
        &self,
        request: Request<GetMiniblocksRequest>,
    ) -> Result<GetMiniblocksResponse, Status> {
        self.unary(request, "GetMiniblocks").await
    }

    async fn get_last_miniblock_hash(
        &self,
        request: Request<GetLastMiniblockHashRequest>,
    ) -> Result<GetLastMiniblockHashResponse, Status> {
        self.unary(request, "GetLastMiniblockHash").await
    }

    async fn add_event(&self, request: Request<AddEventRequest>) -> Result<AddEventResponse, Status> {
        self.unary(request, "AddEvent").await
    }

    async fn sync_streams(&self, request: Request<SyncStreamsRequest>) -> Result<SyncStreamsStream, Status> {
        let mut grpc = self.ready().await?;
        let path = method_path("SyncStreams")?;
        let stream = match self.wire_format {
            WireFormat::Binary => grpc
                .server_streaming(request, path, ProstCodec::<SyncStreamsRequest, SyncStreamsResponse>::default())
                .await?
                .into_inner()
                .boxed(),
            WireFormat::Json => grpc
                .server_streaming(request, path, JsonCodec::<SyncStreamsRequest, SyncStreamsResponse>::default())
                .await?
                .into_inner()
                .boxed(),
        };
        Ok(stream)
    }
}
