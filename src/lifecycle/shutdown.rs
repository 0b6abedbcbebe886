//! Reverse-order release of started services.
//!
//! Shared by startup rollback and the shutdown phase. A failing `stop` never
//! prevents the remaining services from being stopped; only the end of the
//! phase context does.

use crate::lifecycle::app::{invoke, Entry};
use crate::lifecycle::context::Context;
use crate::lifecycle::error::{Action, Failure};

/// Stop `entries` last-to-first, appending every failure to `failures`.
pub(crate) async fn stop_services(ctx: &Context, entries: &[Entry], failures: &mut Vec<Failure>) {
    for entry in entries.iter().rev() {
        if let Some(reason) = ctx.err() {
            tracing::warn!(
                service = %entry.tag.name,
                index = entry.tag.index,
                error = %reason,
                "Stop phase interrupted, remaining services not stopped"
            );
            failures.push(Failure::Interrupted {
                service: entry.tag.clone(),
                action: Action::Stop,
                source: reason,
            });
            return;
        }

        if let Err(failure) = invoke(ctx, entry, Action::Stop).await {
            failures.push(failure);
        }
    }
}
