//! Pipeline assembly and execution.
//!
//! # Responsibilities
//! - Hold the ordered interceptor list and the terminal handler
//! - Drive one request through the whole chain
//!
//! # Design Decisions
//! - Immutable after construction; concurrent requests share it via Arc
//! - Built-in interceptors are instantiated from config in declared order

use std::sync::Arc;

use crate::config::schema::InterceptorConfig;
use crate::config::validation::ValidationError;
use crate::errors::ProxyError;
use crate::pipeline::builtin::{AccessLog, HeaderRewrite, RequestIdInterceptor};
use crate::pipeline::interceptor::{Handler, Interceptor, Next, ProxyRequest, ProxyResponse};

/// An immutable chain of interceptors terminated by a handler.
pub struct Pipeline {
    interceptors: Vec<Arc<dyn Interceptor>>,
    terminal: Arc<dyn Handler>,
}

impl Pipeline {
    /// Assemble a pipeline from an explicit interceptor list.
    pub fn new(interceptors: Vec<Arc<dyn Interceptor>>, terminal: Arc<dyn Handler>) -> Self {
        Self {
            interceptors,
            terminal,
        }
    }

    /// Assemble the built-in interceptors named in config, in order.
    pub fn from_config(
        configs: &[InterceptorConfig],
        terminal: Arc<dyn Handler>,
    ) -> Result<Self, ValidationError> {
        let mut interceptors: Vec<Arc<dyn Interceptor>> = Vec::with_capacity(configs.len());
        for config in configs {
            let interceptor: Arc<dyn Interceptor> = match config {
                InterceptorConfig::RequestId => Arc::new(RequestIdInterceptor),
                InterceptorConfig::AccessLog => Arc::new(AccessLog),
                InterceptorConfig::HeaderRewrite {
                    set_request,
                    set_response,
                    remove_request,
                    remove_response,
                } => Arc::new(HeaderRewrite::new(
                    set_request,
                    set_response,
                    remove_request,
                    remove_response,
                )?),
            };
            interceptors.push(interceptor);
        }
        Ok(Self::new(interceptors, terminal))
    }

    /// Run one request through the chain.
    pub async fn process(&self, req: ProxyRequest) -> Result<ProxyResponse, ProxyError> {
        Next::new(&self.interceptors, self.terminal.as_ref())
            .run(req)
            .await
    }
}
