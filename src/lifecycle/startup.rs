//! Startup orchestration.
//!
//! # Responsibilities
//! - Start registered services strictly in registration order
//! - On the first failure, roll back what already started, newest first
//!
//! # Design Decisions
//! - Fail fast: the first start failure ends the phase
//! - Services start one at a time, never concurrently
//! - Rollback failures are joined with the start failure, never replace it

use crate::lifecycle::app::{invoke, Entry};
use crate::lifecycle::context::Context;
use crate::lifecycle::error::{Action, Failure, JoinedError};
use crate::lifecycle::shutdown::stop_services;

/// Start every entry in order. On failure, returns the triggering failure
/// followed by any rollback failures.
pub(crate) async fn start_services(ctx: &Context, entries: &[Entry]) -> Result<(), JoinedError> {
    for (position, entry) in entries.iter().enumerate() {
        // Interrupted between calls: no further calls in this phase.
        if let Some(reason) = ctx.err() {
            tracing::warn!(
                service = %entry.tag.name,
                index = entry.tag.index,
                error = %reason,
                "Startup interrupted"
            );
            return Err(JoinedError::new(Failure::Interrupted {
                service: entry.tag.clone(),
                action: Action::Start,
                source: reason,
            }));
        }

        if let Err(failure) = invoke(ctx, entry, Action::Start).await {
            let mut joined = JoinedError::new(failure);
            if position > 0 {
                tracing::info!(started = position, "Rolling back started services");
                let mut rollback = Vec::new();
                stop_services(ctx, &entries[..position], &mut rollback).await;
                joined.extend(rollback);
            }
            return Err(joined);
        }
    }
    Ok(())
}
