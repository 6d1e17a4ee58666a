use async_trait::async_trait;
use bytes::Bytes;
use http::request::Request;
use http::{HeaderMap, Method, StatusCode, Version};
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use log::debug;
use std::net::SocketAddr;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use url::{Host, Position, Url};

use crate::error::TransportError;
use crate::tls;

/// Redirect hops followed within one attempt before giving up.
pub const MAX_REDIRECTS: usize = 30;

/// What came back from the peer, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseBody {
    pub status: StatusCode,
    pub body: Bytes,
}

impl ResponseBody {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Delivers one payload to a fixed endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        body: &str,
        headers: &[(String, String)],
    ) -> Result<ResponseBody, TransportError>;
}

/// HTTP/1.1 over a fresh TCP (or TLS) connection per hop. No pooling,
/// no timeout.
#[derive(Debug, Clone)]
pub struct HyperTransport {
    url: String,
    verify_tls: bool,
}

struct Fetched {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl HyperTransport {
    pub fn new(url: impl Into<String>, verify_tls: bool) -> Self {
        Self {
            url: url.into(),
            verify_tls,
        }
    }

    async fn fetch_res(
        &self,
        url: &Url,
        method: Method,
        payload: Bytes,
        headers: &[(String, String)],
    ) -> Result<Fetched, TransportError> {
        let scheme = url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(TransportError::unsupported_protocol(scheme));
        }

        let host = url
            .host()
            .ok_or_else(|| TransportError::malformed_url(url.as_str(), "no host"))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| TransportError::malformed_url(url.as_str(), "no port"))?;
        let host_str = url.host_str().unwrap_or_default();

        let addrs = resolve(&host, port).await?;
        debug!("connecting to {host_str}:{port} ({} address(es))", addrs.len());
        let stream = TcpStream::connect(&addrs[..])
            .await
            .map_err(|err| TransportError::connect(host_str, port, err))?;

        let authority = match url.port() {
            Some(port) => format!("{host_str}:{port}"),
            None => host_str.to_string(),
        };

        let mut builder = Request::builder()
            .version(Version::HTTP_11)
            .method(method)
            .uri(&url[Position::BeforePath..Position::AfterQuery])
            .header(hyper::header::HOST, authority.as_str());
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let req = builder
            .body(Full::new(payload))
            .map_err(TransportError::bad_request)?;

        if scheme == "https" {
            let config = tls::client_config(self.verify_tls)
                .map_err(|err| TransportError::tls(host_str, err))?;
            let name =
                tls::server_name(&host).map_err(|err| TransportError::tls(host_str, err))?;
            let stream = TlsConnector::from(config)
                .connect(name, stream)
                .await
                .map_err(|err| TransportError::tls(host_str, err))?;
            exchange(TokioIo::new(stream), req).await
        } else {
            exchange(TokioIo::new(stream), req).await
        }
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn send(
        &self,
        body: &str,
        headers: &[(String, String)],
    ) -> Result<ResponseBody, TransportError> {
        let mut url =
            Url::parse(&self.url).map_err(|err| TransportError::malformed_url(&self.url, err))?;
        let mut method = Method::POST;
        let mut payload = Bytes::copy_from_slice(body.as_bytes());
        let mut hops = 0;

        loop {
            debug!("{method} {url} ({} bytes)", payload.len());
            let res = self
                .fetch_res(&url, method.clone(), payload.clone(), headers)
                .await?;

            let Some(location) = redirect_location(&res)? else {
                return Ok(ResponseBody {
                    status: res.status,
                    body: res.body,
                });
            };

            if hops == MAX_REDIRECTS {
                return Err(TransportError::too_many_redirects(MAX_REDIRECTS));
            }
            hops += 1;

            url = url
                .join(&location)
                .map_err(|err| TransportError::malformed_url(&location, err))?;

            // 307/308 repeat the request as is; the older codes fall back to GET.
            if !matches!(
                res.status,
                StatusCode::TEMPORARY_REDIRECT | StatusCode::PERMANENT_REDIRECT
            ) {
                method = Method::GET;
                payload = Bytes::new();
            }
            debug!("following {} redirect to {url}", res.status.as_u16());
        }
    }
}

/// Target of a followable redirect. A redirect without `Location` is the
/// final response; one with an unreadable `Location` fails the attempt.
fn redirect_location(res: &Fetched) -> Result<Option<String>, TransportError> {
    if !matches!(
        res.status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    ) {
        return Ok(None);
    }
    let Some(value) = res.headers.get(hyper::header::LOCATION) else {
        return Ok(None);
    };
    value.to_str().map(|location| Some(location.to_owned())).map_err(|err| {
        TransportError::malformed_url(&String::from_utf8_lossy(value.as_bytes()), err)
    })
}

async fn resolve(host: &Host<&str>, port: u16) -> Result<Vec<SocketAddr>, TransportError> {
    match host {
        Host::Domain(domain) => {
            let addrs: Vec<SocketAddr> = tokio::net::lookup_host((*domain, port))
                .await
                .map_err(|err| TransportError::resolve(domain, err))?
                .collect();
            if addrs.is_empty() {
                return Err(TransportError::resolve(domain, "no addresses"));
            }
            Ok(addrs)
        }
        Host::Ipv4(ip) => Ok(vec![SocketAddr::from((*ip, port))]),
        Host::Ipv6(ip) => Ok(vec![SocketAddr::from((*ip, port))]),
    }
}

async fn exchange<T>(io: T, req: Request<Full<Bytes>>) -> Result<Fetched, TransportError>
where
    T: hyper::rt::Read + hyper::rt::Write + Unpin + Send + 'static,
{
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(TransportError::send)?;
    tokio::task::spawn(async move {
        if let Err(err) = conn.await {
            debug!("connection closed: {err:?}");
        }
    });

    let res = sender
        .send_request(req)
        .await
        .map_err(TransportError::from_hyper)?;
    let (parts, body) = res.into_parts();
    let body = body
        .collect()
        .await
        .map_err(TransportError::recv)?
        .to_bytes();

    Ok(Fetched {
        status: parts.status,
        headers: parts.headers,
        body,
    })
}
