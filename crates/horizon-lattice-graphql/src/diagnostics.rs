//! Structured diagnostics emitted while running operations.
//!
//! The client reports what it sends and receives through a [`DiagnosticSink`].
//! The default sink forwards everything to `tracing`, so nothing is printed
//! unless a subscriber is installed. Swap it for [`NoopSink`] to silence it,
//! or for a closure to capture events in tests.
//!
//! ```ignore
//! let client = GraphQLClient::builder("https://api.example.com/graphql")
//!     .diagnostics(|event: &Diagnostic<'_>| eprintln!("{event:?}"))
//!     .build()?;
//! ```

use serde_json::{Map, Value};
use tracing::Level;

/// A single diagnostic event.
#[derive(Debug, Clone, Copy)]
pub enum Diagnostic<'a> {
    /// Outgoing variables.
    Variables(&'a Map<String, Value>),
    /// Outgoing query document.
    Query(&'a str),
    /// Outgoing headers, after the caller's headers were merged.
    Headers(&'a http::HeaderMap),
    /// Outgoing multipart text field.
    Field {
        /// Field name.
        name: &'a str,
        /// Field value.
        value: &'a str,
    },
    /// Number of file parts in a multipart body.
    Files(usize),
    /// Raw response body.
    Response {
        /// HTTP status code.
        status: u16,
        /// Body bytes as received.
        body: &'a [u8],
    },
}

impl Diagnostic<'_> {
    /// The level this event is logged at.
    pub fn level(&self) -> Level {
        match self {
            Self::Response { .. } => Level::TRACE,
            _ => Level::DEBUG,
        }
    }
}

/// Receiver of client diagnostics.
pub trait DiagnosticSink: Send + Sync {
    /// Record one event.
    fn record(&self, diagnostic: &Diagnostic<'_>);
}

impl<F> DiagnosticSink for F
where
    F: Fn(&Diagnostic<'_>) + Send + Sync,
{
    fn record(&self, diagnostic: &Diagnostic<'_>) {
        self(diagnostic)
    }
}

/// Discards every diagnostic.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn record(&self, _diagnostic: &Diagnostic<'_>) {}
}

/// Forwards diagnostics to `tracing` with structured fields, each at its
/// [`Diagnostic::level`].
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

// `tracing` needs the level at each callsite, so dispatch per level.
macro_rules! emit {
    ($level:expr, $($field:tt)+) => {{
        let level = $level;
        if level == Level::TRACE {
            tracing::trace!(target: "horizon_lattice_graphql::client", $($field)+);
        } else if level == Level::DEBUG {
            tracing::debug!(target: "horizon_lattice_graphql::client", $($field)+);
        } else if level == Level::INFO {
            tracing::info!(target: "horizon_lattice_graphql::client", $($field)+);
        } else if level == Level::WARN {
            tracing::warn!(target: "horizon_lattice_graphql::client", $($field)+);
        } else {
            tracing::error!(target: "horizon_lattice_graphql::client", $($field)+);
        }
    }};
}

impl DiagnosticSink for TracingSink {
    fn record(&self, diagnostic: &Diagnostic<'_>) {
        let level = diagnostic.level();
        match *diagnostic {
            Diagnostic::Variables(variables) => {
                let variables = serde_json::Value::Object(variables.clone());
                emit!(level, variables = %variables, ">> variables");
            }
            Diagnostic::Query(query) => {
                emit!(level, query, ">> query");
            }
            Diagnostic::Headers(headers) => {
                emit!(level, ?headers, ">> headers");
            }
            Diagnostic::Field { name, value } => {
                emit!(level, field = name, value, ">> field");
            }
            Diagnostic::Files(count) => {
                emit!(level, files = count, ">> files");
            }
            Diagnostic::Response { status, body } => {
                let body = String::from_utf8_lossy(body);
                emit!(level, status, body = %body, "<< response");
            }
        }
    }
}
