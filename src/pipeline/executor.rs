//! Pipeline composition and the attempt loop

use super::decorator::RequestDecorator;
use super::limiter::RateLimiter;
use super::observer::ResponseObserver;
use super::retry::{Outcome, RetryDecision, RetryPolicy};
use super::sleeper::{Sleeper, TokioSleeper};
use super::stage::Stage;
use crate::error::{Error, Result};
use crate::http::{ApiResponse, Transport};
use reqwest::Request;
use std::sync::Arc;
use tracing::debug;

/// Ordered stages plus the retry loop around them
///
/// Built once per client and shared by every request it issues.
#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: Vec<Arc<dyn Stage>>,
    retry: RetryPolicy,
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleeper>,
}

impl Pipeline {
    /// Start building a pipeline around a transport
    pub fn builder(transport: Arc<dyn Transport>) -> PipelineBuilder {
        PipelineBuilder::new(transport)
    }

    /// Names of the stages, in request order
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Get the retry policy
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Run one logical request to completion
    ///
    /// Each attempt works on a fresh copy of `request`, so decoration is
    /// applied to the original every time. The caller sees only the final
    /// response or transport error; retry exhaustion is not distinguished
    /// from a first-attempt failure.
    pub async fn execute(&self, request: Request) -> Result<ApiResponse> {
        let mut retries = 0;

        loop {
            let mut attempt = request.try_clone().ok_or(Error::RequestNotCloneable)?;
            for stage in &self.stages {
                stage.on_request(&mut attempt).await?;
            }

            debug!(
                "Sending {} {} (attempt {})",
                attempt.method(),
                attempt.url(),
                retries + 1
            );

            let outcome = self.transport.send(attempt).await;
            if let Ok(response) = &outcome {
                for stage in self.stages.iter().rev() {
                    stage.on_response(response).await?;
                }
            }

            let decision = match &outcome {
                Ok(response) => self.retry.decide(retries, &Outcome::Response(response)),
                Err(err) => self.retry.decide(retries, &Outcome::TransportError(err)),
            };

            match decision {
                RetryDecision::Retrying { delay } => {
                    if !delay.is_zero() {
                        self.sleeper.sleep(delay).await;
                    }
                    retries += 1;
                }
                RetryDecision::Succeeded | RetryDecision::Failed => {
                    return outcome.map_err(Error::Http);
                }
            }
        }
    }
}

/// Builder for [`Pipeline`]
pub struct PipelineBuilder {
    stages: Vec<Arc<dyn Stage>>,
    retry: RetryPolicy,
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleeper>,
}

impl PipelineBuilder {
    /// Create an empty builder with the default retry policy
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            stages: Vec::new(),
            retry: RetryPolicy::default(),
            transport,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Append a stage
    #[must_use]
    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Append a shared stage
    #[must_use]
    pub fn shared_stage(mut self, stage: Arc<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Append the standard decorator → limiter → observer chain
    #[must_use]
    pub fn standard_stages(
        self,
        decorator: RequestDecorator,
        limiter: RateLimiter,
        observer: ResponseObserver,
    ) -> Self {
        self.stage(decorator).stage(limiter).stage(observer)
    }

    /// Set the retry policy
    #[must_use]
    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the sleeper used for retry backoff
    #[must_use]
    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
            retry: self.retry,
            transport: self.transport,
            sleeper: self.sleeper,
        }
    }
}
