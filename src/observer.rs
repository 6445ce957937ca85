//! Observability hook for the preparation worker.
//!
//! The worker never logs directly on its completion path; it reports
//! [`PrepareEvent`]s to whatever [`PrepareObserver`] it was built with. The
//! default, [`TracingObserver`], forwards them to `tracing`.

use spoolprep_shared::ElementKind;
use std::time::Duration;
use uuid::Uuid;

use crate::error::PrepareError;

#[derive(Debug, Clone, PartialEq)]
pub enum PrepareEvent {
    Started {
        element: Uuid,
        kind: ElementKind,
    },
    Completed {
        element: Uuid,
        kind: ElementKind,
        elapsed: Duration,
    },
    Failed {
        element: Uuid,
        kind: ElementKind,
        error: PrepareError,
    },
    /// A result was produced but the element refused it.
    Discarded {
        element: Uuid,
        kind: ElementKind,
        reason: String,
    },
}

impl PrepareEvent {
    pub fn element(&self) -> Uuid {
        match self {
            PrepareEvent::Started { element, .. }
            | PrepareEvent::Completed { element, .. }
            | PrepareEvent::Failed { element, .. }
            | PrepareEvent::Discarded { element, .. } => *element,
        }
    }
}

pub trait PrepareObserver: Send + Sync + std::fmt::Debug {
    fn notify(&self, event: &PrepareEvent);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PrepareObserver for TracingObserver {
    fn notify(&self, event: &PrepareEvent) {
        match event {
            PrepareEvent::Started { element, kind } => {
                tracing::debug!(%element, %kind, "Preparing print element");
            }
            PrepareEvent::Completed { element, kind, elapsed } => {
                tracing::info!(%element, %kind, ?elapsed, "Done preparing print element");
            }
            PrepareEvent::Failed { element, kind, error } => {
                tracing::error!(%element, %kind, %error, "Print element preparation failed");
            }
            PrepareEvent::Discarded { element, kind, reason } => {
                tracing::warn!(%element, %kind, %reason, "Discarded prepared output");
            }
        }
    }
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl PrepareObserver for NullObserver {
    fn notify(&self, _event: &PrepareEvent) {}
}
