// src/preparer.rs - Per-element preparation worker
use spoolprep_shared::config::Config;
use spoolprep_shared::ElementKind;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::element::PrintElement;
use crate::error::PrepareError;
use crate::observer::{PrepareEvent, PrepareObserver, TracingObserver};
use crate::output::PreparedOutput;
use crate::source::{self, FsResolver, SourceResolver};
use crate::transform::{self, RtfLayout};

#[derive(Debug, Clone, PartialEq)]
pub struct PrepareSettings {
    /// Deadline for one element, covering source resolution and the
    /// transform. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    pub rtf: RtfLayout,
}

impl Default for PrepareSettings {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            rtf: RtfLayout::default(),
        }
    }
}

impl From<&Config> for PrepareSettings {
    fn from(config: &Config) -> Self {
        Self {
            timeout: config.prepare.timeout_ms.map(Duration::from_millis),
            rtf: RtfLayout::from(config),
        }
    }
}

/// Spawns one independent worker per `prepare` call. Holds no per-element
/// state, so one preparer can serve any number of elements and jobs.
#[derive(Debug, Clone)]
pub struct ElementPreparer {
    resolver: Arc<dyn SourceResolver>,
    observer: Arc<dyn PrepareObserver>,
    settings: PrepareSettings,
}

impl ElementPreparer {
    pub fn new(resolver: Arc<dyn SourceResolver>, observer: Arc<dyn PrepareObserver>, settings: PrepareSettings) -> Self {
        Self {
            resolver,
            observer,
            settings,
        }
    }

    /// Filesystem locators, `tracing` events, and the configured limits.
    pub fn from_config(config: &Config) -> Self {
        let resolver = FsResolver::new(config.source.base_dir.clone(), config.source.max_source_bytes);
        Self::new(Arc::new(resolver), Arc::new(TracingObserver), PrepareSettings::from(config))
    }

    pub fn with_observer(mut self, observer: Arc<dyn PrepareObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn SourceResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_settings(mut self, settings: PrepareSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &PrepareSettings {
        &self.settings
    }

    pub(crate) fn spawn(&self, element: Arc<PrintElement>) -> Result<PrepareHandle, PrepareError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| PrepareError::SchedulingFailure(format!("no async runtime: {}", e)))?;
        element.begin()?;

        let (cancel_tx, cancel_rx) = oneshot::channel();
        let id = element.id();
        let kind = element.kind();
        let worker = Worker {
            element,
            resolver: Arc::clone(&self.resolver),
            observer: Arc::clone(&self.observer),
            settings: self.settings.clone(),
        };
        let join = runtime.spawn(worker.run(cancel_rx));
        Ok(PrepareHandle {
            element: id,
            kind,
            cancel: Some(cancel_tx),
            join,
        })
    }
}

impl Default for ElementPreparer {
    fn default() -> Self {
        Self::new(
            Arc::new(FsResolver::default()),
            Arc::new(TracingObserver),
            PrepareSettings::default(),
        )
    }
}

/// The caller's side of one in-flight preparation. Dropping the handle
/// detaches the worker; it still completes and installs its result.
#[derive(Debug)]
pub struct PrepareHandle {
    element: Uuid,
    kind: ElementKind,
    cancel: Option<oneshot::Sender<()>>,
    join: JoinHandle<Result<(), PrepareError>>,
}

impl PrepareHandle {
    pub fn element(&self) -> Uuid {
        self.element
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Ask the worker to stop. The element is left unprepared with
    /// `Cancelled`; a transform already running on the blocking pool runs
    /// to completion but its result is dropped.
    pub fn cancel(&mut self) {
        if let Some(tx) = self.cancel.take() {
            let _ = tx.send(());
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the worker and surface its outcome.
    pub async fn wait(self) -> Result<(), PrepareError> {
        let PrepareHandle { cancel, join, .. } = self;
        let outcome = join.await;
        drop(cancel);
        match outcome {
            Ok(result) => result,
            Err(e) => Err(PrepareError::Worker(e.to_string())),
        }
    }
}

struct Worker {
    element: Arc<PrintElement>,
    resolver: Arc<dyn SourceResolver>,
    observer: Arc<dyn PrepareObserver>,
    settings: PrepareSettings,
}

impl Worker {
    async fn run(self, mut cancel: oneshot::Receiver<()>) -> Result<(), PrepareError> {
        let element = self.element.id();
        let kind = self.element.kind();
        self.observer.notify(&PrepareEvent::Started { element, kind });
        let started = Instant::now();

        let work = self.transform();
        let outcome = tokio::select! {
            result = deadline(work, self.settings.timeout) => result,
            Ok(()) = &mut cancel => Err(PrepareError::Cancelled),
        };

        match outcome {
            Ok(output) => match self.element.on_prepared(output) {
                Ok(()) => {
                    self.observer.notify(&PrepareEvent::Completed {
                        element,
                        kind,
                        elapsed: started.elapsed(),
                    });
                    Ok(())
                }
                Err(error) => {
                    self.observer.notify(&PrepareEvent::Discarded {
                        element,
                        kind,
                        reason: error.to_string(),
                    });
                    self.element.abort(error.clone());
                    Err(error)
                }
            },
            Err(error) => {
                self.element.abort(error.clone());
                self.observer.notify(&PrepareEvent::Failed {
                    element,
                    kind,
                    error: error.clone(),
                });
                Err(error)
            }
        }
    }

    async fn transform(&self) -> Result<PreparedOutput, PrepareError> {
        let fetched = source::fetch(self.element.source(), self.resolver.as_ref()).await?;
        let element = Arc::clone(&self.element);
        let layout = self.settings.rtf;
        tokio::task::spawn_blocking(move || {
            let input = source::view(element.source(), fetched.as_deref());
            transform::dispatch(element.config(), input, element.charset(), &layout)
        })
        .await
        .map_err(|e| PrepareError::Worker(e.to_string()))?
    }
}

async fn deadline<F>(work: F, limit: Option<Duration>) -> Result<PreparedOutput, PrepareError>
where
    F: std::future::Future<Output = Result<PreparedOutput, PrepareError>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, work)
            .await
            .unwrap_or(Err(PrepareError::TimedOut(limit))),
        None => work.await,
    }
}
