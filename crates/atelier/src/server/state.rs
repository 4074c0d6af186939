//! Shared application state.

use std::sync::Arc;

use atelier_core::config::Config;
use atelier_core::error::ConfigError;
use atelier_core::{RateDecision, RateLimiter, SlidingWindowLimiter, Unlimited, UploadError, UploadPipeline};

/// Cheaply cloneable handle shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    config: Config,
    pipeline: UploadPipeline,
    limiter: Arc<dyn RateLimiter>,
}

impl AppState {
    pub fn new(config: Config, pipeline: UploadPipeline, limiter: Arc<dyn RateLimiter>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                pipeline,
                limiter,
            }),
        }
    }

    /// Build the pipeline and limiter described by `config`.
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let pipeline = UploadPipeline::from_config(&config)?;
        let limiter: Arc<dyn RateLimiter> = if config.rate_limit.enabled {
            Arc::new(SlidingWindowLimiter::from_config(&config.rate_limit))
        } else {
            tracing::warn!("Rate limiting is disabled");
            Arc::new(Unlimited)
        };
        Ok(Self::new(config, pipeline, limiter))
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn pipeline(&self) -> &UploadPipeline {
        &self.inner.pipeline
    }

    /// Count a request against `client`'s budget.
    pub async fn admit(&self, client: &str) -> Result<(), UploadError> {
        match self.inner.limiter.check(client).await {
            RateDecision::Allowed { remaining } => {
                tracing::trace!(client, remaining, "Request admitted");
                Ok(())
            }
            RateDecision::Limited { retry_after } => {
                tracing::warn!(client, ?retry_after, "Rate limit exceeded");
                Err(UploadError::RateLimitExceeded {
                    retry_after_secs: retry_after.as_secs_f64().ceil().max(1.0) as u64,
                })
            }
        }
    }
}
