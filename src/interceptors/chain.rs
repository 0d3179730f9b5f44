use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use turnate_error::AppError;
use turnate_metrics::INTERCEPTOR_REJECTIONS;

use super::{Deadline, Interceptor, RequestFacts, Verdict};

/// Ordered gates plus an optional deadline at a fixed position
#[derive(Clone)]
pub struct InterceptorChain {
    stages: Vec<Arc<dyn Interceptor>>,
    /// Deadline and the index of the first stage it covers
    deadline: Option<(usize, Deadline)>,
    max_body_size: usize,
}

impl InterceptorChain {
    pub fn new(max_body_size: usize) -> Self {
        Self {
            stages: Vec::new(),
            deadline: None,
            max_body_size,
        }
    }

    pub fn with(mut self, stage: impl Interceptor + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Bound every stage added after this point, and the handler
    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = Some((self.stages.len(), deadline));
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub fn deadline(&self) -> Option<Deadline> {
        self.deadline.map(|(_, deadline)| deadline)
    }

    /// Run every stage in order, stopping at the first termination
    pub async fn evaluate(&self, facts: &mut RequestFacts) -> Result<(), AppError> {
        evaluate_stages(&self.stages, facts, None, self.max_body_size).await
    }

    /// Apply every stage's response headers
    pub fn decorate(&self, headers: &mut HeaderMap) {
        for stage in &self.stages {
            stage.decorate(headers);
        }
    }

    fn reject(&self, error: AppError) -> Response {
        let mut response = error.into_response();
        self.decorate(response.headers_mut());
        response
    }
}

/// Url-encoded bodies are buffered right before the first stage that reads
/// form fields, never earlier.
async fn evaluate_stages(
    stages: &[Arc<dyn Interceptor>],
    facts: &mut RequestFacts,
    mut request: Option<&mut Request>,
    form_limit: usize,
) -> Result<(), AppError> {
    for stage in stages {
        if stage.reads_form() {
            if let Some(request) = request.as_deref_mut() {
                facts.load_form(request, form_limit).await?;
            }
        }
        if let Verdict::Terminate(error) = stage.inspect(facts).await {
            let status = error.status_code();
            INTERCEPTOR_REJECTIONS
                .with_label_values(&[stage.name(), status.as_str()])
                .inc();
            tracing::debug!(
                interceptor = stage.name(),
                method = %facts.method,
                path = %facts.path,
                status = status.as_u16(),
                "Request terminated by interceptor"
            );
            return Err(error);
        }
    }
    Ok(())
}

/// Axum middleware entry point, installed with `from_fn_with_state`
pub async fn run_chain(
    State(chain): State<Arc<InterceptorChain>>,
    request: Request,
    next: Next,
) -> Response {
    let (mut facts, mut request) = RequestFacts::capture(request).await;

    let split = chain
        .deadline
        .map(|(at, _)| at)
        .unwrap_or(chain.stages.len());

    let limit = chain.max_body_size;
    if let Err(error) =
        evaluate_stages(&chain.stages[..split], &mut facts, Some(&mut request), limit).await
    {
        return chain.reject(error);
    }

    let remainder = async {
        if let Err(error) =
            evaluate_stages(&chain.stages[split..], &mut facts, Some(&mut request), limit).await
        {
            return error.into_response();
        }
        if let Some(auth) = facts.auth.take() {
            request.extensions_mut().insert(auth);
        }
        next.run(request).await
    };

    let mut response = match chain.deadline {
        Some((_, deadline)) => deadline.enforce(remainder).await,
        None => remainder.await,
    };
    chain.decorate(response.headers_mut());
    response
}
