//! Per-source isolation boundary.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use futures::FutureExt;

use crate::error_handling::SourceError;
use crate::outcome::SourceResult;
use crate::sources::{Section, Source, SourceInput, SourceName};

/// Runs one source to completion, converting a panic into an `Internal`
/// failure and an overrun of `ceiling` into a `Timeout` failure. The
/// abandoned future is dropped, which cancels its in-flight requests.
pub async fn run_isolated(
    source: &dyn Source,
    input: &SourceInput,
    ceiling: Duration,
) -> SourceResult<Section> {
    let name = source.name();
    let started = Instant::now();

    let guarded = AssertUnwindSafe(source.collect(input)).catch_unwind();
    let outcome = match tokio::time::timeout(ceiling, guarded).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(panic)) => {
            let message = panic_message(panic.as_ref());
            log::error!("{name}: adapter panicked: {message}");
            SourceResult::internal(format!("adapter panicked: {message}"))
        }
        Err(_) => {
            log::warn!("{name}: abandoned after {}s", ceiling.as_secs_f64());
            SourceError::Timeout(ceiling).into()
        }
    };

    let elapsed = started.elapsed().as_secs_f64();
    match &outcome {
        SourceResult::Success { .. } => log::info!("{name}: succeeded in {elapsed:.2}s"),
        SourceResult::Empty { reason } => log::info!("{name}: empty ({reason}) in {elapsed:.2}s"),
        SourceResult::Failure { kind, message, .. } => {
            log::warn!("{name}: {kind} after {elapsed:.2}s: {message}")
        }
    }
    outcome
}

/// Runs every source concurrently and keys the outcomes by source name.
///
/// The map's order is the declaration order of [`SourceName`], whatever the
/// order of completion.
pub async fn run_sources(
    sources: &[Arc<dyn Source>],
    input: &SourceInput,
    ceiling: Duration,
) -> BTreeMap<SourceName, SourceResult<Section>> {
    let outcomes = join_all(
        sources
            .iter()
            .map(|source| run_isolated(source.as_ref(), input, ceiling)),
    )
    .await;
    sources
        .iter()
        .map(|source| source.name())
        .zip(outcomes)
        .collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
