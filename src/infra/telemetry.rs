//! Logging and metric setup for the binary.
//!
//! Events are written to stderr so that stdout stays clean JSON.

use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing::Subscriber;
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

enum MetricKind {
    Counter,
    Histogram,
}

/// Every metric the cache layers emit, with its unit and help text.
const METRICS: &[(&str, MetricKind, Unit, &str)] = &[
    (
        "brigade_cache_load_total",
        MetricKind::Counter,
        Unit::Count,
        "Restaurant batch loads started.",
    ),
    (
        "brigade_cache_load_failed_total",
        MetricKind::Counter,
        Unit::Count,
        "Restaurant batch loads that failed and kept the previous snapshot.",
    ),
    (
        "brigade_cache_load_ms",
        MetricKind::Histogram,
        Unit::Milliseconds,
        "Wall time of one seven-collection batch load.",
    ),
    (
        "brigade_cache_hit_total",
        MetricKind::Counter,
        Unit::Count,
        "Restaurant selections answered from a cached snapshot.",
    ),
    (
        "brigade_cache_stale_discard_total",
        MetricKind::Counter,
        Unit::Count,
        "Batches dropped because the selection moved while they were in flight.",
    ),
    (
        "brigade_query_cache_hit_total",
        MetricKind::Counter,
        Unit::Count,
        "List queries answered from the response cache.",
    ),
    (
        "brigade_query_cache_miss_total",
        MetricKind::Counter,
        Unit::Count,
        "List queries that went to the backend, expired entries included.",
    ),
    (
        "brigade_response_shape_fallback_total",
        MetricKind::Counter,
        Unit::Count,
        "List responses read as empty because of their status or shape.",
    ),
    (
        "brigade_record_skipped_total",
        MetricKind::Counter,
        Unit::Count,
        "List elements dropped because they did not decode as a record.",
    ),
];

static DESCRIBED: Once = Once::new();

/// Install the global subscriber for `logging`. `RUST_LOG` still wins over
/// the configured level when set.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    DESCRIBED.call_once(describe_metrics);

    let filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(ErrorLayer::default())
        .with(output_layer(logging.format))
        .try_init()
        .map_err(|err| InfraError::Telemetry(err.to_string()))
}

fn output_layer<S>(format: LogFormat) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    let base = fmt::layer().with_target(true).with_writer(std::io::stderr);
    match format {
        LogFormat::Json => base
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .boxed(),
        LogFormat::Compact => base.compact().boxed(),
    }
}

fn describe_metrics() {
    for (name, kind, unit, help) in METRICS {
        match kind {
            MetricKind::Counter => describe_counter!(*name, *unit, *help),
            MetricKind::Histogram => describe_histogram!(*name, *unit, *help),
        }
    }
}
