use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use turnate_error::AppError;

use super::{Interceptor, RequestFacts, Verdict};

static SQL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(union|select|insert|update|delete|drop|create|alter|exec)\b")
        .expect("invalid SQL screening pattern")
});

static MARKUP_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(<script|javascript:|onload\s*=|onerror\s*=|onclick\s*=|onmouseover\s*=|<iframe|<object|<embed|<link|\b(eval|alert|confirm|prompt)\s*\()",
    )
    .expect("invalid markup screening pattern")
});

static SHELL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(;|&|\|\||\$\(|`)").expect("invalid shell screening pattern"));

static PATH_TRAVERSAL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\.\./|\.\.\\|%2e%2e%2f|%2e%2e%5c)").expect("invalid traversal screening pattern")
});

/// Class of payload a value was rejected for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Threat {
    Sql,
    Markup,
    Shell,
    PathTraversal,
}

impl Threat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Threat::Sql => "sql",
            Threat::Markup => "markup",
            Threat::Shell => "shell",
            Threat::PathTraversal => "path_traversal",
        }
    }
}

/// Match a value against the denylist, case-insensitively
pub fn screen_value(value: &str) -> Option<Threat> {
    let value = value.to_lowercase();
    if SQL_PATTERN.is_match(&value) {
        Some(Threat::Sql)
    } else if MARKUP_PATTERN.is_match(&value) {
        Some(Threat::Markup)
    } else if SHELL_PATTERN.is_match(&value) {
        Some(Threat::Shell)
    } else if PATH_TRAVERSAL_PATTERN.is_match(&value) {
        Some(Threat::PathTraversal)
    } else {
        None
    }
}

/// Rejects requests carrying injection-style payloads in query parameters,
/// url-encoded form fields or path parameters
#[derive(Debug, Default, Clone, Copy)]
pub struct InputScreen;

impl InputScreen {
    fn first_hit<'a>(fields: &'a [(String, String)]) -> Option<(&'a str, Threat)> {
        fields
            .iter()
            .find_map(|(key, value)| screen_value(value).map(|threat| (key.as_str(), threat)))
    }
}

#[async_trait]
impl Interceptor for InputScreen {
    fn name(&self) -> &'static str {
        "input_screen"
    }

    async fn inspect(&self, facts: &mut RequestFacts) -> Verdict {
        let body_hit = Self::first_hit(&facts.query).or_else(|| Self::first_hit(&facts.form));
        if let Some((field, threat)) = body_hit {
            tracing::warn!(
                field = %field,
                threat = threat.as_str(),
                path = %facts.path,
                client = %facts.client_key,
                "Potentially malicious input rejected"
            );
            return Verdict::Terminate(AppError::InvalidInput {
                error: "Invalid input detected",
                message: "Request contains potentially malicious content",
                field: field.to_string(),
            });
        }

        if let Some((field, threat)) = Self::first_hit(&facts.path_params) {
            tracing::warn!(
                field = %field,
                threat = threat.as_str(),
                path = %facts.path,
                client = %facts.client_key,
                "Potentially malicious path parameter rejected"
            );
            return Verdict::Terminate(AppError::InvalidInput {
                error: "Invalid path parameter",
                message: "Path contains potentially malicious content",
                field: field.to_string(),
            });
        }

        Verdict::Continue
    }

    fn reads_form(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    #[test]
    fn test_screen_value_classes() {
        assert_eq!(screen_value("1 UNION SELECT password"), Some(Threat::Sql));
        assert_eq!(screen_value("<ScRiPt>x</script>"), Some(Threat::Markup));
        assert_eq!(screen_value("JavaScript:void(0)"), Some(Threat::Markup));
        assert_eq!(screen_value("x; rm -rf /"), Some(Threat::Shell));
        assert_eq!(screen_value("a && b"), Some(Threat::Shell));
        assert_eq!(screen_value("../../etc/passwd"), Some(Threat::PathTraversal));
        assert_eq!(screen_value("%2E%2E%2Fsecret"), Some(Threat::PathTraversal));
    }

    #[test]
    fn test_benign_values_pass() {
        for value in ["hello world", "rust-talk", "updated notes", "selection", "3.14"] {
            assert_eq!(screen_value(value), None, "{value} should pass");
        }
    }

    #[tokio::test]
    async fn test_rejection_names_field() {
        let mut facts = RequestFacts::new(Method::GET, "/search")
            .with_query("page", "1")
            .with_query("q", "' or 1=1; drop table users");

        match InputScreen.inspect(&mut facts).await {
            Verdict::Terminate(err) => {
                assert_eq!(err.status_code().as_u16(), 400);
                assert_eq!(err.field(), Some("q"));
                assert_eq!(err.user_message(), "Invalid input detected");
            }
            Verdict::Continue => panic!("payload should be rejected"),
        }
    }

    #[tokio::test]
    async fn test_form_fields_are_screened() {
        let mut facts =
            RequestFacts::new(Method::POST, "/login").with_form_field("bio", "<iframe src=x>");

        let verdict = InputScreen.inspect(&mut facts).await;
        assert!(matches!(verdict, Verdict::Terminate(ref e) if e.field() == Some("bio")));
    }

    #[tokio::test]
    async fn test_path_params_use_path_message() {
        let mut facts =
            RequestFacts::new(Method::GET, "/files/x").with_path_param("name", "..\\boot.ini");

        match InputScreen.inspect(&mut facts).await {
            Verdict::Terminate(err) => {
                assert_eq!(err.user_message(), "Invalid path parameter");
                assert_eq!(err.field(), Some("name"));
            }
            Verdict::Continue => panic!("traversal should be rejected"),
        }
    }

    #[tokio::test]
    async fn test_clean_request_continues() {
        let mut facts = RequestFacts::new(Method::GET, "/channels/abc")
            .with_query("limit", "20")
            .with_path_param("id", "4f1c2a9e-0000-4000-8000-000000000000");

        assert!(InputScreen.inspect(&mut facts).await.is_continue());
    }
}
