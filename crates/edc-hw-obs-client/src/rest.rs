//! [`ObsClient`] over the S3-compatible OBS REST API.
//!
//! Requests use path-style addressing (`<endpoint>/<bucket>/<key>`) and are
//! signed with SigV4. The path and query placed on the wire are the canonical
//! forms used for signing.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use bytes::Bytes;
use chrono::Utc;
use edc_hw_auth::canonical::{build_canonical_query_string, build_canonical_uri, hash_payload};
use edc_hw_auth::{Credentials, SigV4Signer};
use edc_hw_core::HuaweiCloudConfig;
use edc_hw_obs_model::{
    CompletedPart, DeleteResult, InitiatedUpload, ListObjectsPage, MAX_DELETE_BATCH,
    MAX_LIST_KEYS, ObsError, ObsErrorCode, ObsResult,
};
use edc_hw_obs_xml::{
    CompleteMultipartUpload, CreateBucketConfiguration, DeleteObjects, from_xml, parse_error_body,
    to_xml,
};
use futures::TryStreamExt;
use http::header::{CONTENT_TYPE, ETAG, HOST, HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use md5::{Digest, Md5};
use tokio_util::io::StreamReader;
use tracing::{debug, warn};

use crate::client::{ObjectBody, ObsClient, UploadPartRequest};

const CONTENT_MD5: HeaderName = HeaderName::from_static("content-md5");
const REQUEST_ID_HEADERS: [&str; 2] = ["x-obs-request-id", "x-amz-request-id"];

/// OBS client speaking HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpObsClient {
    endpoint: String,
    host: String,
    region: String,
    http: reqwest::Client,
    signer: SigV4Signer,
}

impl HttpObsClient {
    /// Create a client for `endpoint` signing with `credentials`.
    ///
    /// An endpoint without a scheme is treated as `https://`.
    pub fn new(
        endpoint: &str,
        credentials: Credentials,
        config: &HuaweiCloudConfig,
    ) -> ObsResult<Self> {
        let endpoint = normalize_endpoint(endpoint)?;
        let url = reqwest::Url::parse(&endpoint)
            .map_err(|e| ObsError::InvalidRequest(format!("invalid endpoint {endpoint}: {e}")))?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_owned(),
            (None, _) => {
                return Err(ObsError::InvalidRequest(format!(
                    "endpoint {endpoint} has no host"
                )));
            }
        };

        // Idle limit per read, so large bodies can stream for as long as they flow.
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .read_timeout(config.request_timeout())
            .build()
            .map_err(|e| ObsError::InvalidRequest(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint,
            host,
            region: config.region.clone(),
            http,
            signer: SigV4Signer::new(credentials, config.region.clone()),
        })
    }

    /// Sign and send a request; non-2xx responses become [`ObsError::Service`].
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        mut headers: HeaderMap,
        body: Bytes,
    ) -> ObsResult<reqwest::Response> {
        let canonical_uri = build_canonical_uri(path);
        let canonical_query = build_canonical_query_string(query);
        let url = if canonical_query.is_empty() {
            format!("{}{canonical_uri}", self.endpoint)
        } else {
            format!("{}{canonical_uri}?{canonical_query}", self.endpoint)
        };

        headers.insert(HOST, header_value(&self.host)?);
        self.signer
            .sign(
                method.as_str(),
                &canonical_uri,
                &canonical_query,
                &mut headers,
                &hash_payload(&body),
                Utc::now(),
            )
            .map_err(|e| ObsError::InvalidRequest(e.to_string()))?;

        debug!(method = %method, url = %url, "sending OBS request");
        let response = self
            .http
            .request(method, &url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(|e| ObsError::Transport(e.to_string()))?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from_response(response).await)
        }
    }

    async fn read_body(response: reqwest::Response) -> ObsResult<Bytes> {
        response
            .bytes()
            .await
            .map_err(|e| ObsError::Transport(e.to_string()))
    }
}

#[async_trait]
impl ObsClient for HttpObsClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn create_bucket(&self, bucket: &str) -> ObsResult<()> {
        let mut headers = HeaderMap::new();
        let body = if self.region.is_empty() || self.region == "us-east-1" {
            Bytes::new()
        } else {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/xml"));
            Bytes::from(
                to_xml(
                    CreateBucketConfiguration::ROOT,
                    &CreateBucketConfiguration {
                        location: &self.region,
                    },
                )
                .map_err(|e| ObsError::InvalidRequest(e.to_string()))?,
            )
        };
        self.send(Method::PUT, &bucket_path(bucket), &[], headers, body)
            .await?;
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> ObsResult<()> {
        self.send(
            Method::DELETE,
            &bucket_path(bucket),
            &[],
            HeaderMap::new(),
            Bytes::new(),
        )
        .await?;
        Ok(())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        marker: Option<&str>,
    ) -> ObsResult<ListObjectsPage> {
        let max_keys = MAX_LIST_KEYS.to_string();
        let mut query = vec![("max-keys", max_keys.as_str())];
        if !prefix.is_empty() {
            query.push(("prefix", prefix));
        }
        if let Some(marker) = marker {
            query.push(("marker", marker));
        }

        let response = self
            .send(
                Method::GET,
                &bucket_path(bucket),
                &query,
                HeaderMap::new(),
                Bytes::new(),
            )
            .await?;
        let body = Self::read_body(response).await?;
        from_xml(&body).map_err(|e| ObsError::InvalidResponse(e.to_string()))
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> ObsResult<String> {
        let response = self
            .send(
                Method::PUT,
                &object_path(bucket, key),
                &[],
                HeaderMap::new(),
                body,
            )
            .await?;
        Ok(etag_header(&response).unwrap_or_default())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> ObsResult<ObjectBody> {
        let response = self
            .send(
                Method::GET,
                &object_path(bucket, key),
                &[],
                HeaderMap::new(),
                Bytes::new(),
            )
            .await?;

        let content_length = response.content_length();
        let etag = etag_header(&response).map(|e| e.trim_matches('"').to_owned());
        let stream = response.bytes_stream().map_err(std::io::Error::other);
        Ok(ObjectBody {
            content_length,
            etag,
            stream: Box::pin(StreamReader::new(stream)),
        })
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> ObsResult<()> {
        self.send(
            Method::DELETE,
            &object_path(bucket, key),
            &[],
            HeaderMap::new(),
            Bytes::new(),
        )
        .await?;
        Ok(())
    }

    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> ObsResult<DeleteResult> {
        if keys.is_empty() {
            return Ok(DeleteResult::default());
        }
        if keys.len() > MAX_DELETE_BATCH {
            return Err(ObsError::InvalidRequest(format!(
                "cannot delete {} keys in one request (limit {MAX_DELETE_BATCH})",
                keys.len()
            )));
        }

        let body = to_xml(DeleteObjects::ROOT, &DeleteObjects { keys, quiet: true })
            .map_err(|e| ObsError::InvalidRequest(e.to_string()))?;
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/xml"));
        headers.insert(
            CONTENT_MD5,
            header_value(&BASE64_STANDARD.encode(Md5::digest(&body)))?,
        );

        let response = self
            .send(
                Method::POST,
                &bucket_path(bucket),
                &[("delete", "")],
                headers,
                Bytes::from(body),
            )
            .await?;
        let body = Self::read_body(response).await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(DeleteResult::default());
        }
        from_xml(&body).map_err(|e| ObsError::InvalidResponse(e.to_string()))
    }

    async fn initiate_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
    ) -> ObsResult<InitiatedUpload> {
        let response = self
            .send(
                Method::POST,
                &object_path(bucket, key),
                &[("uploads", "")],
                HeaderMap::new(),
                Bytes::new(),
            )
            .await?;
        let body = Self::read_body(response).await?;
        from_xml(&body).map_err(|e| ObsError::InvalidResponse(e.to_string()))
    }

    async fn upload_part(&self, request: UploadPartRequest<'_>) -> ObsResult<CompletedPart> {
        let part_number = request.part_number.to_string();
        let response = self
            .send(
                Method::PUT,
                &object_path(request.bucket, request.key),
                &[
                    ("partNumber", part_number.as_str()),
                    ("uploadId", request.upload_id),
                ],
                HeaderMap::new(),
                request.body,
            )
            .await?;
        let etag = etag_header(&response).ok_or_else(|| {
            ObsError::InvalidResponse(format!(
                "upload of part {} returned no ETag",
                request.part_number
            ))
        })?;
        Ok(CompletedPart {
            part_number: request.part_number,
            etag,
        })
    }

    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> ObsResult<()> {
        let body = to_xml(
            CompleteMultipartUpload::ROOT,
            &CompleteMultipartUpload { parts },
        )
        .map_err(|e| ObsError::InvalidRequest(e.to_string()))?;
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/xml"));

        let response = self
            .send(
                Method::POST,
                &object_path(bucket, key),
                &[("uploadId", upload_id)],
                headers,
                Bytes::from(body),
            )
            .await?;

        // A 200 response may still carry an <Error> document.
        let status = response.status().as_u16();
        let body = Self::read_body(response).await?;
        if let Some(error) = parse_error_body(&body) {
            return Err(ObsError::Service {
                status,
                code: ObsErrorCode::from_code(&error.code),
                message: error.message,
                request_id: error.request_id,
            });
        }
        Ok(())
    }

    async fn abort_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> ObsResult<()> {
        self.send(
            Method::DELETE,
            &object_path(bucket, key),
            &[("uploadId", upload_id)],
            HeaderMap::new(),
            Bytes::new(),
        )
        .await?;
        Ok(())
    }

    async fn close(&self) -> ObsResult<()> {
        debug!(endpoint = %self.endpoint, "closing OBS client");
        Ok(())
    }
}

/// Prepend `https://` when no scheme is given and strip trailing slashes.
fn normalize_endpoint(endpoint: &str) -> ObsResult<String> {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ObsError::InvalidRequest("endpoint is empty".to_owned()));
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_owned())
    } else {
        Ok(format!("https://{trimmed}"))
    }
}

fn bucket_path(bucket: &str) -> String {
    format!("/{bucket}")
}

fn object_path(bucket: &str, key: &str) -> String {
    format!("/{bucket}/{key}")
}

fn header_value(value: &str) -> ObsResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| ObsError::InvalidRequest(format!("invalid header value: {e}")))
}

fn etag_header(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned)
}

/// Turn a non-2xx response into an [`ObsError::Service`].
async fn error_from_response(response: reqwest::Response) -> ObsError {
    let status = response.status();
    let request_id = REQUEST_ID_HEADERS.iter().find_map(|name| {
        response
            .headers()
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned)
    });

    let body = match response.bytes().await {
        Ok(body) => body,
        Err(e) => {
            warn!(status = %status, error = %e, "failed to read OBS error body");
            Bytes::new()
        }
    };

    match parse_error_body(&body) {
        Some(error) => ObsError::Service {
            status: status.as_u16(),
            code: ObsErrorCode::from_code(&error.code),
            message: error.message,
            request_id: error.request_id.or(request_id),
        },
        None => ObsError::Service {
            status: status.as_u16(),
            code: ObsErrorCode::from_status(status),
            message: status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_owned(),
            request_id,
        },
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;

    #[test]
    fn test_should_normalize_endpoint() {
        assert_eq!(
            normalize_endpoint("obs.cn-north-4.myhuaweicloud.com/").expect("endpoint"),
            "https://obs.cn-north-4.myhuaweicloud.com"
        );
        assert_eq!(
            normalize_endpoint("http://localhost:4566").expect("endpoint"),
            "http://localhost:4566"
        );
        assert!(normalize_endpoint("  ").is_err());
    }

    #[test]
    fn test_should_keep_port_in_host() {
        let client = HttpObsClient::new(
            "http://localhost:4566",
            Credentials::new("ak", "sk"),
            &HuaweiCloudConfig::default(),
        )
        .expect("client");
        assert_eq!(client.host, "localhost:4566");
        assert_eq!(client.endpoint(), "http://localhost:4566");
    }

    #[test]
    fn test_should_build_path_style_paths() {
        assert_eq!(bucket_path("b"), "/b");
        assert_eq!(object_path("b", "dir/file.txt"), "/b/dir/file.txt");
        assert_eq!(
            build_canonical_uri(&object_path("b", "dir/a b.txt")),
            "/b/dir/a%20b.txt"
        );
    }

    const KIB: usize = 1024;

    /// Serve one request with a `total` byte body, sending 1 KiB every
    /// `interval` for `pieces` pieces, then hold the connection for `linger`.
    async fn drip_server(
        total: usize,
        pieces: usize,
        interval: Duration,
        linger: Duration,
    ) -> (String, JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let endpoint = format!("http://{}", listener.local_addr().expect("addr"));
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut request = Vec::new();
            let mut buf = [0u8; KIB];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.expect("read request");
                if n == 0 {
                    return;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {total}\r\nETag: \"drip\"\r\n\r\n"
            );
            socket.write_all(head.as_bytes()).await.expect("head");
            for _ in 0..pieces {
                tokio::time::sleep(interval).await;
                if socket.write_all(&[7u8; KIB]).await.is_err() {
                    return;
                }
            }
            tokio::time::sleep(linger).await;
        });
        (endpoint, server)
    }

    fn client_with_timeout(endpoint: &str, request_timeout_ms: u64) -> HttpObsClient {
        let config = HuaweiCloudConfig::builder()
            .request_timeout_ms(request_timeout_ms)
            .build();
        HttpObsClient::new(endpoint, Credentials::new("ak", "sk"), &config).expect("client")
    }

    #[tokio::test]
    async fn test_should_stream_body_for_longer_than_request_timeout() {
        // 20 pieces at 100 ms take twice the timeout, but no read waits long.
        let (endpoint, server) =
            drip_server(20 * KIB, 20, Duration::from_millis(100), Duration::ZERO).await;
        let client = client_with_timeout(&endpoint, 1000);

        let mut body = client.get_object("bucket", "key").await.expect("get");
        assert_eq!(body.content_length, Some(20 * KIB as u64));
        assert_eq!(body.etag.as_deref(), Some("drip"));
        let mut data = Vec::new();
        body.stream.read_to_end(&mut data).await.expect("body");

        assert_eq!(data.len(), 20 * KIB);
        server.await.expect("server");
    }

    #[tokio::test]
    async fn test_should_time_out_stalled_body() {
        let (endpoint, server) =
            drip_server(20 * KIB, 2, Duration::from_millis(10), Duration::from_secs(5)).await;
        let client = client_with_timeout(&endpoint, 300);

        let mut body = client.get_object("bucket", "key").await.expect("get");
        let mut data = Vec::new();
        assert!(body.stream.read_to_end(&mut data).await.is_err());
        assert!(data.len() < 20 * KIB);
        server.abort();
    }
}
