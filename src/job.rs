// src/job.rs - Minimal owning job: sequencing and in-order reassembly
use futures::future::join_all;
use std::sync::Arc;
use uuid::Uuid;

use crate::element::PrintElement;
use crate::error::PrepareError;
use crate::preparer::{ElementPreparer, PrepareHandle};

/// Result of preparing one element of a job.
#[derive(Debug)]
pub struct ElementOutcome {
    pub element: Arc<PrintElement>,
    pub result: Result<(), PrepareError>,
}

/// Owns an ordered set of elements. Elements prepare concurrently and finish
/// in any order; everything the job hands back is ordered by sequence
/// number.
#[derive(Debug)]
pub struct PrintJob {
    id: Uuid,
    elements: Vec<Arc<PrintElement>>,
    next_sequence: u32,
}

impl PrintJob {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            elements: Vec::new(),
            next_sequence: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Add an element, assigning it the next sequence number.
    pub fn append(&mut self, mut element: PrintElement) -> Arc<PrintElement> {
        element.assign_sequence(self.next_sequence);
        self.next_sequence += 1;
        let element = Arc::new(element);
        self.elements.push(Arc::clone(&element));
        element
    }

    pub fn elements(&self) -> &[Arc<PrintElement>] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn is_prepared(&self) -> bool {
        self.elements.iter().all(|e| e.is_prepared())
    }

    /// Start every element that is not yet prepared. If any element cannot
    /// be scheduled, the ones already started are cancelled.
    pub fn prepare_all(&self, preparer: &ElementPreparer) -> Result<Vec<PrepareHandle>, PrepareError> {
        let mut handles = Vec::with_capacity(self.elements.len());
        for element in self.elements.iter().filter(|e| !e.is_prepared()) {
            match element.prepare(preparer) {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    tracing::error!("Could not start element {:?} of job {}: {}", element.sequence(), self.id, e);
                    for handle in &mut handles {
                        handle.cancel();
                    }
                    return Err(e);
                }
            }
        }
        tracing::info!("Started {} of {} elements for job {}", handles.len(), self.elements.len(), self.id);
        Ok(handles)
    }

    /// Wait for every handle and report per-element outcomes in sequence
    /// order, regardless of completion order. Elements without a handle
    /// report their current state.
    pub async fn wait_all(&self, handles: Vec<PrepareHandle>) -> Vec<ElementOutcome> {
        let ids: Vec<Uuid> = handles.iter().map(|h| h.element()).collect();
        let results = join_all(handles.into_iter().map(PrepareHandle::wait)).await;

        let mut outcomes: Vec<ElementOutcome> = self
            .elements
            .iter()
            .map(|element| {
                let result = match ids.iter().position(|id| *id == element.id()) {
                    Some(index) => results[index].clone(),
                    None if element.is_prepared() => Ok(()),
                    None => Err(PrepareError::ContractViolation(format!(
                        "element {} was not started",
                        element.id()
                    ))),
                };
                ElementOutcome {
                    element: Arc::clone(element),
                    result,
                }
            })
            .collect();
        outcomes.sort_by_key(|o| o.element.sequence());
        outcomes
    }

    /// Prepare the whole job, failing it on the first element (in sequence
    /// order) that could not be prepared.
    pub async fn prepare(&self, preparer: &ElementPreparer) -> Result<Vec<Arc<PrintElement>>, PrepareError> {
        let handles = self.prepare_all(preparer)?;
        let outcomes = self.wait_all(handles).await;
        let mut ready = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            outcome.result?;
            ready.push(outcome.element);
        }
        Ok(ready)
    }

    /// All elements in sequence order, once every one of them is prepared.
    pub fn prepared_in_order(&self) -> Option<Vec<Arc<PrintElement>>> {
        if !self.is_prepared() {
            return None;
        }
        let mut ordered = self.elements.clone();
        ordered.sort_by_key(|e| e.sequence());
        Some(ordered)
    }
}

impl Default for PrintJob {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spoolprep_shared::Charset;

    #[test]
    fn append_assigns_increasing_sequence_numbers() {
        let mut job = PrintJob::new();
        let a = job.append(PrintElement::raw(vec![1u8], Charset::UTF_8));
        let b = job.append(PrintElement::raw(vec![2u8], Charset::UTF_8));
        assert_eq!(a.sequence(), Some(0));
        assert_eq!(b.sequence(), Some(1));
        assert_eq!(job.len(), 2);
        assert!(job.prepared_in_order().is_none());
    }

    #[test]
    fn prepare_all_outside_a_runtime_is_a_scheduling_failure() {
        let mut job = PrintJob::new();
        let element = job.append(PrintElement::raw(vec![1u8], Charset::UTF_8));
        let err = job.prepare_all(&ElementPreparer::default()).unwrap_err();
        assert!(matches!(err, PrepareError::SchedulingFailure(_)));
        assert!(!element.is_prepared());
    }
}
