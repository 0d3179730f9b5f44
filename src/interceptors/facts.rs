use std::net::SocketAddr;

use axum::body::{self, Body};
use axum::extract::{ConnectInfo, FromRequestParts, RawPathParams, Request};
use axum::http::{header, HeaderMap, HeaderValue, Method};
use turnate_error::AppError;
use turnate_types::AuthContext;

use crate::utils::extract_client_key;

/// What the gates are allowed to see of a request
#[derive(Debug, Clone)]
pub struct RequestFacts {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    /// Rate limiting key (client address)
    pub client_key: String,
    pub query: Vec<(String, String)>,
    /// Url-encoded form fields, only captured when a gate asks for them
    pub form: Vec<(String, String)>,
    form_loaded: bool,
    pub path_params: Vec<(String, String)>,
    /// Set by session authentication, or carried in from an outer chain
    pub auth: Option<AuthContext>,
}

impl RequestFacts {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            client_key: "unknown".to_string(),
            query: Vec::new(),
            form: Vec::new(),
            form_loaded: false,
            path_params: Vec::new(),
            auth: None,
        }
    }

    pub fn with_header(mut self, name: header::HeaderName, value: &'static str) -> Self {
        self.headers.insert(name, HeaderValue::from_static(value));
        self
    }

    pub fn with_client_key(mut self, key: impl Into<String>) -> Self {
        self.client_key = key.into();
        self
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_form_field(mut self, key: &str, value: &str) -> Self {
        self.form.push((key.to_string(), value.to_string()));
        self.form_loaded = true;
        self
    }

    pub fn with_path_param(mut self, key: &str, value: &str) -> Self {
        self.path_params.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_auth(mut self, auth: AuthContext) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn header_str(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Capture facts from a live request and hand back an equivalent request
    ///
    /// The body is left untouched; see `load_form`.
    pub async fn capture(request: Request) -> (Self, Request) {
        let (mut parts, body) = request.into_parts();

        let direct_ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip());
        let client_key = extract_client_key(&parts.headers, direct_ip);

        let query = parts.uri.query().map(parse_pairs).unwrap_or_default();

        // Absent outside of a matched route (fallbacks)
        let path_params = match RawPathParams::from_request_parts(&mut parts, &()).await {
            Ok(params) => params
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
            Err(_) => Vec::new(),
        };

        let facts = Self {
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            headers: parts.headers.clone(),
            client_key,
            query,
            form: Vec::new(),
            form_loaded: false,
            path_params,
            auth: parts.extensions.get::<AuthContext>().cloned(),
        };

        (facts, Request::from_parts(parts, body))
    }

    /// Buffer a url-encoded body into `form` and put the bytes back
    ///
    /// Runs at most once per request. Other content types are left alone.
    pub async fn load_form(
        &mut self,
        request: &mut Request,
        limit: usize,
    ) -> Result<(), AppError> {
        if self.form_loaded {
            return Ok(());
        }
        self.form_loaded = true;

        let is_form = self
            .header_str(header::CONTENT_TYPE)
            .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
            .unwrap_or(false);
        if !is_form {
            return Ok(());
        }

        let body = std::mem::take(request.body_mut());
        let bytes = body::to_bytes(body, limit)
            .await
            .map_err(|_| AppError::validation("Request body too large"))?;
        self.form = parse_pairs(&String::from_utf8_lossy(&bytes));
        *request.body_mut() = Body::from(bytes);
        Ok(())
    }
}

fn parse_pairs(input: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(input.as_bytes())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form_request(body: impl Into<Body>) -> Request {
        axum::http::Request::builder()
            .method(Method::POST)
            .uri("/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body.into())
            .unwrap()
    }

    #[tokio::test]
    async fn test_capture_reads_query_and_client_key() {
        let request = axum::http::Request::builder()
            .uri("/search?q=hello%20world&page=2")
            .header("x-real-ip", "198.51.100.9")
            .body(Body::empty())
            .unwrap();

        let (facts, rebuilt) = RequestFacts::capture(request).await;

        assert_eq!(facts.path, "/search");
        assert_eq!(facts.client_key, "198.51.100.9");
        assert_eq!(
            facts.query,
            vec![
                ("q".to_string(), "hello world".to_string()),
                ("page".to_string(), "2".to_string())
            ]
        );
        assert_eq!(rebuilt.uri().path(), "/search");
    }

    #[tokio::test]
    async fn test_capture_leaves_body_unread() {
        let (facts, rebuilt) = RequestFacts::capture(form_request("username=alice")).await;
        assert!(facts.form.is_empty());

        let bytes = body::to_bytes(rebuilt.into_body(), 1024).await.unwrap();
        assert_eq!(&bytes[..], b"username=alice");
    }

    #[tokio::test]
    async fn test_load_form_buffers_and_restores_body() {
        let (mut facts, mut request) =
            RequestFacts::capture(form_request("username=alice&note=hi")).await;

        facts.load_form(&mut request, 1024).await.unwrap();
        assert_eq!(facts.form[0], ("username".to_string(), "alice".to_string()));

        // Second call is a no-op on an already buffered body
        facts.load_form(&mut request, 1024).await.unwrap();
        assert_eq!(facts.form.len(), 2);

        let bytes = body::to_bytes(request.into_body(), 1024).await.unwrap();
        assert_eq!(&bytes[..], b"username=alice&note=hi");
    }

    #[tokio::test]
    async fn test_oversized_form_is_rejected() {
        let (mut facts, mut request) = RequestFacts::capture(form_request("a=".repeat(64))).await;

        let err = facts.load_form(&mut request, 16).await.unwrap_err();
        assert_eq!(err.status_code().as_u16(), 400);
    }
}
