//! capability_status library: FHIR capability probing and US Core validation
//!
//! This library fetches a FHIR endpoint's capability statement (negotiating
//! between the modern and legacy JSON MIME types), records the HTTP status
//! and negotiated TLS version, publishes the result as a queue message, and
//! validates the statement against the rule set for its FHIR version.
//!
//! # Example
//!
//! ```no_run
//! use capability_status::{run_probes, ChannelPublisher, Config};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     endpoints: vec!["https://fhir.example.com/r4".to_string()],
//!     ..Default::default()
//! };
//! let (publisher, _queue) = ChannelPublisher::new(config.endpoints.len());
//!
//! for report in run_probes(&config, &publisher).await? {
//!     println!("{}: valid = {}", report.message.url, report.validation.is_valid());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

pub mod capability;
pub mod config;
mod error_handling;
pub mod fetch;
pub mod initialization;
pub mod probe;
pub mod publish;
pub mod tls;
pub mod validation;

// Re-export public API
pub use capability::{CapabilityDocument, Field};
pub use config::{Config, LogFormat, LogLevel};
pub use error_handling::{FetchError, InitializationError, ParseError, ProbeError, PublishError};
pub use fetch::{CapabilityFetcher, MimeType};
pub use probe::{
    acquire_capability_probe, get_and_send_capability_statement, ProbeContext, ProbeResult,
    QuerierArgs,
};
pub use publish::{ChannelPublisher, Message, Publisher};
pub use run::{run_probes, EndpointReport};
pub use tls::TlsVersion;
pub use validation::{run_validation_checks, Rule, RuleName, Validation, ValidationInput};

// Probe-then-validate over every configured endpoint
mod run {
    use anyhow::{Context, Result};
    use futures::future::join_all;
    use log::info;
    use serde::Serialize;

    use crate::config::Config;
    use crate::fetch::CapabilityFetcher;
    use crate::initialization::{init_client, init_tls_connector};
    use crate::probe::{
        get_and_send_capability_statement, request_smart_configuration,
        ProbeContext, QuerierArgs, NO_HTTP_RESPONSE,
    };
    use crate::publish::{Message, Publisher};
    use crate::validation::{Validation, ValidationInput, ValidatorRegistry};

    /// Everything learned about one endpoint.
    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct EndpointReport {
        /// The message that was published for the endpoint
        pub message: Message,
        /// Validation report for the endpoint's capability statement
        pub validation: Validation,
    }

    /// Probes every endpoint in `config` concurrently, publishes one message
    /// per endpoint, and validates each result.
    ///
    /// Endpoints are independent: a transport failure on one endpoint is
    /// recorded in its report and does not affect the others.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or TLS connector cannot be
    /// built, if an endpoint URL is invalid, or if a message cannot be
    /// published.
    pub async fn run_probes<P: Publisher>(
        config: &Config,
        publisher: &P,
    ) -> Result<Vec<EndpointReport>> {
        let client = init_client(config).context("Failed to initialize HTTP client")?;
        let tls_connector =
            init_tls_connector().context("Failed to initialize TLS version measurement")?;
        let fetcher = CapabilityFetcher::new(client, tls_connector);
        let registry = ValidatorRegistry::default();

        let querier_args = config
            .endpoints
            .iter()
            .map(|endpoint| {
                QuerierArgs::new(endpoint, fetcher.clone(), config.queue_name.as_str())
                    .with_context(|| format!("Invalid FHIR endpoint URL: {endpoint}"))
            })
            .collect::<Result<Vec<_>>>()?;

        info!("Probing {} endpoint(s)", querier_args.len());
        let reports = join_all(
            querier_args
                .iter()
                .map(|args| probe_endpoint(config, args, publisher, &registry)),
        )
        .await;

        reports.into_iter().collect()
    }

    async fn probe_endpoint<P: Publisher>(
        config: &Config,
        args: &QuerierArgs,
        publisher: &P,
        registry: &ValidatorRegistry,
    ) -> Result<EndpointReport> {
        let ctx = config
            .deadline()
            .map_or_else(ProbeContext::new, ProbeContext::with_timeout);

        let result = get_and_send_capability_statement(&ctx, args, publisher).await?;

        let smart_http_response = if config.skip_smart {
            NO_HTTP_RESPONSE
        } else {
            request_smart_configuration(&ctx, &result.url, args.fetcher.client()).await
        };

        let input = ValidationInput::from_probe(&result, &config.fhir_version, smart_http_response);
        let validation = registry.run_validation(&input);
        info!(
            "{}: {} of {} rules passed",
            result.url,
            validation.results.iter().filter(|rule| rule.valid).count(),
            validation.results.len()
        );

        Ok(EndpointReport {
            message: Message::from(&result),
            validation,
        })
    }
}
