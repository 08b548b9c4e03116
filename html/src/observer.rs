use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use tracing::{span, trace, warn, Level};

use crate::document::Document;
use crate::dom::NodeId;

/// Delivery rounds a single checkpoint may run before it gives up on an
/// observer that keeps mutating the tree it observes
const MAX_CHECKPOINT_ROUNDS: usize = 1000;

/// A `childList` change somewhere in the document tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: NodeId,
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(usize);

/// Receives batches of mutation records at each checkpoint
pub trait MutationObserver {
    fn notify(&mut self, document: &mut Document, records: &[MutationRecord]);

    /// Observers that are no longer alive are disconnected instead of notified
    fn is_alive(&self) -> bool {
        true
    }
}

impl<F> MutationObserver for F
where
    F: FnMut(&mut Document, &[MutationRecord]),
{
    fn notify(&mut self, document: &mut Document, records: &[MutationRecord]) {
        self(document, records)
    }
}

pub(crate) type Microtask = Box<dyn FnOnce(&mut Document)>;

pub(crate) struct Registration {
    id: ObserverId,
    observer: Rc<RefCell<dyn MutationObserver>>,
    records: Vec<MutationRecord>,
}

impl Document {
    /// Start delivering mutations of the whole document tree to `observer`
    pub fn observe(&mut self, observer: Rc<RefCell<dyn MutationObserver>>) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push(Registration {
            id,
            observer,
            records: Vec::new(),
        });
        trace!(?id, "observer registered");
        id
    }

    pub fn observe_with<O: MutationObserver + 'static>(&mut self, observer: O) -> ObserverId {
        self.observe(Rc::new(RefCell::new(observer)))
    }

    /// Stop delivering to an observer, dropping its pending records.
    /// Returns false if it was not registered.
    pub fn disconnect(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|r| r.id != id);
        before != self.observers.len()
    }

    pub fn is_observing(&self, id: ObserverId) -> bool {
        self.observers.iter().any(|r| r.id == id)
    }

    /// Run `task` at the next checkpoint, before pending records are delivered
    pub fn queue_microtask(&mut self, task: impl FnOnce(&mut Document) + 'static) {
        self.microtasks.push_back(Box::new(task));
    }

    pub(crate) fn queue_record(&mut self, record: MutationRecord) {
        for registration in &mut self.observers {
            registration.records.push(record.clone());
        }
    }

    /// Whether a checkpoint would do any work
    pub fn has_pending(&self) -> bool {
        !self.microtasks.is_empty() || self.observers.iter().any(|r| !r.records.is_empty())
    }

    /// Run queued microtasks and deliver pending mutation records, repeating
    /// until nothing is left. Each observer receives its records as one batch
    /// per round. Returns the number of tasks and batches run.
    ///
    /// Calling this from inside a task or observer does nothing. A panic in a
    /// task or observer propagates to the caller.
    pub fn checkpoint(&mut self) -> usize {
        if self.delivering {
            return 0;
        }
        let span = span!(Level::DEBUG, "checkpoint");
        let _enter = span.enter();
        self.delivering = true;
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.run_checkpoint()));
        self.delivering = false;
        match result {
            Ok(steps) => steps,
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    fn run_checkpoint(&mut self) -> usize {
        let mut steps = 0;
        for _ in 0..MAX_CHECKPOINT_ROUNDS {
            if !self.has_pending() {
                return steps;
            }
            while let Some(task) = self.microtasks.pop_front() {
                task(self);
                steps += 1;
            }
            let pending: Vec<ObserverId> = self
                .observers
                .iter()
                .filter(|r| !r.records.is_empty())
                .map(|r| r.id)
                .collect();
            for id in pending {
                // Records are taken only on delivery, so a panicking observer
                // leaves the others' queues intact
                let (observer, records) = match self.observers.iter_mut().find(|r| r.id == id) {
                    Some(r) => (r.observer.clone(), std::mem::take(&mut r.records)),
                    // Disconnected by an earlier observer in this round
                    None => continue,
                };
                if records.is_empty() {
                    continue;
                }
                if !observer.borrow().is_alive() {
                    trace!(?id, "dropping dead observer");
                    self.disconnect(id);
                    continue;
                }
                trace!(?id, records = records.len(), "delivering batch");
                observer.borrow_mut().notify(self, &records);
                steps += 1;
            }
        }
        warn!(
            rounds = MAX_CHECKPOINT_ROUNDS,
            "checkpoint gave up with work still pending"
        );
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_are_batched() {
        let mut doc = Document::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        doc.observe_with(move |_: &mut Document, records: &[MutationRecord]| {
            sink.borrow_mut().push(records.to_vec());
        });
        let body = doc.body();
        let a = doc.create_element("p");
        let b = doc.create_element("p");
        doc.append_child(body, a).unwrap();
        doc.append_child(body, b).unwrap();
        doc.remove(a);
        assert!(seen.borrow().is_empty());

        assert_eq!(doc.checkpoint(), 1);
        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0],
            vec![
                MutationRecord {
                    target: body,
                    added_nodes: vec![a],
                    removed_nodes: vec![]
                },
                MutationRecord {
                    target: body,
                    added_nodes: vec![b],
                    removed_nodes: vec![]
                },
                MutationRecord {
                    target: body,
                    added_nodes: vec![],
                    removed_nodes: vec![a]
                },
            ]
        );
    }

    #[test]
    fn test_detached_mutations_are_not_recorded() {
        let mut doc = Document::new();
        let count = Rc::new(RefCell::new(0));
        let sink = count.clone();
        doc.observe_with(move |_: &mut Document, records: &[MutationRecord]| {
            *sink.borrow_mut() += records.len();
        });
        let list = doc.create_element("ul");
        let item = doc.create_element("li");
        doc.append_child(list, item).unwrap();
        doc.checkpoint();
        assert_eq!(*count.borrow(), 0);

        let body = doc.body();
        doc.append_child(body, list).unwrap();
        doc.checkpoint();
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_mutations_during_delivery_form_a_later_batch() {
        let mut doc = Document::new();
        let batches = Rc::new(RefCell::new(0));
        let sink = batches.clone();
        doc.observe_with(move |doc: &mut Document, records: &[MutationRecord]| {
            *sink.borrow_mut() += 1;
            // Echo each insertion into the head once
            let head = doc.head();
            if records.iter().all(|r| r.target != head) {
                let echo = doc.create_element("meta");
                doc.append_child(head, echo).unwrap();
            }
            assert_eq!(doc.checkpoint(), 0);
        });
        let body = doc.body();
        let p = doc.create_element("p");
        doc.append_child(body, p).unwrap();
        assert_eq!(doc.checkpoint(), 2);
        assert_eq!(*batches.borrow(), 2);
        assert_eq!(doc.children(doc.head()).len(), 1);
    }

    #[test]
    fn test_microtasks_run_before_delivery() {
        let mut doc = Document::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let sink = order.clone();
        doc.observe_with(move |_: &mut Document, _: &[MutationRecord]| {
            sink.borrow_mut().push("records");
        });
        let body = doc.body();
        let p = doc.create_element("p");
        doc.append_child(body, p).unwrap();
        let sink = order.clone();
        doc.queue_microtask(move |_| sink.borrow_mut().push("task"));
        doc.checkpoint();
        assert_eq!(*order.borrow(), vec!["task", "records"]);
    }

    #[test]
    fn test_disconnect() {
        let mut doc = Document::new();
        let count = Rc::new(RefCell::new(0));
        let sink = count.clone();
        let id = doc.observe_with(move |_: &mut Document, _: &[MutationRecord]| {
            *sink.borrow_mut() += 1;
        });
        let body = doc.body();
        let p = doc.create_element("p");
        doc.append_child(body, p).unwrap();
        assert!(doc.disconnect(id));
        assert!(!doc.disconnect(id));
        doc.checkpoint();
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn test_panics_propagate_and_leave_document_usable() {
        let mut doc = Document::new();
        let id = doc.observe_with(|_: &mut Document, _: &[MutationRecord]| panic!("observer failed"));
        let body = doc.body();
        let p = doc.create_element("p");
        doc.append_child(body, p).unwrap();
        let result = panic::catch_unwind(AssertUnwindSafe(|| doc.checkpoint()));
        assert!(result.is_err());
        doc.disconnect(id);
        let q = doc.create_element("p");
        doc.append_child(body, q).unwrap();
        assert_eq!(doc.checkpoint(), 0);
    }

    #[test]
    fn test_panic_keeps_other_observers_records() {
        let mut doc = Document::new();
        doc.observe_with(|_: &mut Document, _: &[MutationRecord]| panic!("observer failed"));
        let seen = Rc::new(RefCell::new(0));
        let sink = seen.clone();
        doc.observe_with(move |_: &mut Document, records: &[MutationRecord]| {
            *sink.borrow_mut() += records.len();
        });
        let body = doc.body();
        let p = doc.create_element("p");
        doc.append_child(body, p).unwrap();

        assert!(panic::catch_unwind(AssertUnwindSafe(|| doc.checkpoint())).is_err());
        assert_eq!(*seen.borrow(), 0);
        assert!(doc.has_pending());
        assert_eq!(doc.checkpoint(), 1);
        assert_eq!(*seen.borrow(), 1);
    }
}
