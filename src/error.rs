use thiserror::Error;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Failure codes, numbered the way curl numbers them so output stays
/// comparable with older runs of the harness.
pub mod code {
    pub const UNSUPPORTED_PROTOCOL: i32 = 1;
    pub const URL_MALFORMAT: i32 = 3;
    pub const COULDNT_RESOLVE_HOST: i32 = 6;
    pub const COULDNT_CONNECT: i32 = 7;
    pub const SSL_CONNECT_ERROR: i32 = 35;
    pub const BAD_FUNCTION_ARGUMENT: i32 = 43;
    pub const TOO_MANY_REDIRECTS: i32 = 47;
    pub const GOT_NOTHING: i32 = 52;
    pub const SEND_ERROR: i32 = 55;
    pub const RECV_ERROR: i32 = 56;
}

/// The HTTP exchange could not be completed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}---{message}")]
pub struct TransportError {
    pub code: i32,
    pub message: String,
}

impl TransportError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn unsupported_protocol(scheme: &str) -> Self {
        Self::new(
            code::UNSUPPORTED_PROTOCOL,
            format!("Protocol \"{scheme}\" not supported"),
        )
    }

    pub fn malformed_url(url: &str, reason: impl std::fmt::Display) -> Self {
        Self::new(code::URL_MALFORMAT, format!("URL rejected: {url}: {reason}"))
    }

    pub fn resolve(host: &str, err: impl std::fmt::Display) -> Self {
        Self::new(
            code::COULDNT_RESOLVE_HOST,
            format!("Could not resolve host: {host}: {err}"),
        )
    }

    pub fn connect(host: &str, port: u16, err: impl std::fmt::Display) -> Self {
        Self::new(
            code::COULDNT_CONNECT,
            format!("Failed to connect to {host} port {port}: {err}"),
        )
    }

    pub fn tls(host: &str, err: impl std::fmt::Display) -> Self {
        Self::new(
            code::SSL_CONNECT_ERROR,
            format!("TLS connect error with {host}: {err}"),
        )
    }

    pub fn bad_request(err: impl std::fmt::Display) -> Self {
        Self::new(
            code::BAD_FUNCTION_ARGUMENT,
            format!("could not build request: {err}"),
        )
    }

    pub fn too_many_redirects(max: usize) -> Self {
        Self::new(
            code::TOO_MANY_REDIRECTS,
            format!("Maximum ({max}) redirects followed"),
        )
    }

    pub fn send(err: impl std::fmt::Display) -> Self {
        Self::new(code::SEND_ERROR, format!("Failed sending data to the peer: {err}"))
    }

    pub fn recv(err: impl std::fmt::Display) -> Self {
        Self::new(code::RECV_ERROR, format!("Failure when receiving data from the peer: {err}"))
    }

    /// Maps an error from `send_request` onto the closest failure code.
    pub fn from_hyper(err: hyper::Error) -> Self {
        if err.is_incomplete_message() || err.is_canceled() {
            Self::new(code::GOT_NOTHING, format!("Empty reply from server: {err}"))
        } else if err.is_body_write_aborted() {
            Self::send(err)
        } else {
            Self::recv(err)
        }
    }
}
