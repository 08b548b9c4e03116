//! Continuous matching: run a queue of operations on every element that
//! matches a selector, now or whenever it is inserted later.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::{Rc, Weak};

use css::{SelectorError, SelectorList};
use html::{Document, MutationObserver, MutationRecord, NodeId, ObserverId};
use tracing::{debug, span, trace, Level};

/// How a perpetual query treats elements it has already seen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerpetualOptions {
    /// Also match elements already in the document when the query is created
    pub match_existing: bool,
    /// Run the operations again each time a matched element is re-inserted
    pub match_reappearance: bool,
}

impl Default for PerpetualOptions {
    fn default() -> Self {
        Self {
            match_existing: true,
            match_reappearance: false,
        }
    }
}

type Predicate = Box<dyn FnMut(&Document, NodeId) -> bool>;

/// A queued operation, applied with the semantics of the iterator method it
/// is named after
pub enum Operation {
    ForEach(Box<dyn FnMut(&mut Document, NodeId)>),
    Map(Box<dyn FnMut(&mut Document, NodeId) -> Box<dyn Any>>),
    Reduce(Box<dyn FnMut(&mut Document, NodeId, NodeId) -> NodeId>),
    Filter(Predicate),
    Every(Predicate),
    Some(Predicate),
    Find(Predicate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    ForEach,
    Map,
    Reduce,
    Filter,
    Every,
    Some,
    Find,
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Operation::{:?}", self.kind())
    }
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::ForEach(_) => OperationKind::ForEach,
            Operation::Map(_) => OperationKind::Map,
            Operation::Reduce(_) => OperationKind::Reduce,
            Operation::Filter(_) => OperationKind::Filter,
            Operation::Every(_) => OperationKind::Every,
            Operation::Some(_) => OperationKind::Some,
            Operation::Find(_) => OperationKind::Find,
        }
    }

    /// Run the operation over `collection`. `Reduce` has no initial value: a
    /// one-element collection yields that element without calling the reducer.
    pub fn apply(&mut self, doc: &mut Document, collection: &[NodeId]) -> Outcome {
        match self {
            Operation::ForEach(f) => {
                for &node in collection {
                    f(doc, node);
                }
                Outcome::ForEach
            }
            Operation::Map(f) => Outcome::Map(collection.iter().map(|&n| f(doc, n)).collect()),
            Operation::Reduce(f) => {
                let mut nodes = collection.iter().copied();
                let first = nodes.next();
                Outcome::Reduce(first.map(|first| nodes.fold(first, |acc, n| f(doc, acc, n))))
            }
            Operation::Filter(f) => Outcome::Filter(
                collection.iter().copied().filter(|&n| f(doc, n)).collect(),
            ),
            Operation::Every(f) => Outcome::Every(collection.iter().all(|&n| f(doc, n))),
            Operation::Some(f) => Outcome::Some(collection.iter().any(|&n| f(doc, n))),
            Operation::Find(f) => Outcome::Find(collection.iter().copied().find(|&n| f(doc, n))),
        }
    }
}

/// The result of applying one operation
pub enum Outcome {
    ForEach,
    Map(Vec<Box<dyn Any>>),
    Reduce(Option<NodeId>),
    Filter(Vec<NodeId>),
    Every(bool),
    Some(bool),
    Find(Option<NodeId>),
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::ForEach => write!(f, "ForEach"),
            Outcome::Map(values) => write!(f, "Map({} values)", values.len()),
            Outcome::Reduce(n) => write!(f, "Reduce({:?})", n),
            Outcome::Filter(n) => write!(f, "Filter({:?})", n),
            Outcome::Every(b) => write!(f, "Every({})", b),
            Outcome::Some(b) => write!(f, "Some({})", b),
            Outcome::Find(n) => write!(f, "Find({:?})", n),
        }
    }
}

/// An operation in a session's queue. The kind is kept beside the closure so
/// it can be read while the closure is running.
#[derive(Clone)]
struct Queued {
    kind: OperationKind,
    operation: Rc<RefCell<Operation>>,
}

impl Queued {
    /// Apply unless the operation is already running further up the stack
    fn apply(&self, doc: &mut Document, collection: &[NodeId]) -> Option<Outcome> {
        match self.operation.try_borrow_mut() {
            Ok(mut operation) => Some(operation.apply(doc, collection)),
            Err(_) => {
                trace!(kind = ?self.kind, "operation already running");
                None
            }
        }
    }
}

struct Session {
    selector: String,
    parsed: Rc<SelectorList>,
    options: PerpetualOptions,
    operations: Vec<Queued>,
    matched: HashSet<NodeId>,
    observer: Option<ObserverId>,
}

/// Registered with the document on behalf of a session. Holds the session
/// weakly so that dropping the last handle retires the observer.
struct SessionObserver {
    session: Weak<RefCell<Session>>,
}

impl MutationObserver for SessionObserver {
    fn notify(&mut self, document: &mut Document, records: &[MutationRecord]) {
        let session = match self.session.upgrade() {
            Some(s) => s,
            None => return,
        };
        let parsed = session.borrow().parsed.clone();
        // Only the inserted nodes themselves, not their descendants
        let added = records.iter().flat_map(|r| r.added_nodes.iter().copied());
        for node in added {
            if document.is_element(node) && document.matches_selector(node, &parsed) {
                dispatch(&session, document, node);
            }
        }
    }

    fn is_alive(&self) -> bool {
        self.session.strong_count() > 0
    }
}

fn dispatch(session: &Rc<RefCell<Session>>, doc: &mut Document, node: NodeId) {
    let operations = {
        let mut session = session.borrow_mut();
        if session.observer.is_none() {
            trace!(?node, "session disconnected");
            return;
        }
        if !session.options.match_reappearance && session.matched.contains(&node) {
            trace!(?node, "already matched");
            return;
        }
        session.matched.insert(node);
        session.operations.clone()
    };
    let span = span!(Level::DEBUG, "dispatch", ?node);
    let _enter = span.enter();
    for queued in operations {
        if let Some(outcome) = queued.apply(doc, &[node]) {
            trace!(?outcome, "applied operation");
        }
    }
}

/// Handle to a perpetual matching session. Clones share the session; the
/// session stops matching once every handle is dropped or it is disconnected.
#[derive(Clone)]
pub struct PerpetualQuery {
    session: Rc<RefCell<Session>>,
}

impl fmt::Debug for PerpetualQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let session = self.session.borrow();
        f.debug_struct("PerpetualQuery")
            .field("selector", &session.selector)
            .field("options", &session.options)
            .field("operations", &self.operation_kinds())
            .field("matched", &session.matched.len())
            .finish()
    }
}

/// Start matching `selector` against the document, now and on every later
/// insertion. Existing matches are handled at the next checkpoint, so
/// operations chained right after this call apply to them.
pub fn query_selector_perpetual(
    doc: &mut Document,
    selector: &str,
    options: PerpetualOptions,
) -> Result<PerpetualQuery, SelectorError> {
    let parsed = Rc::new(SelectorList::parse(selector)?);
    let session = Rc::new(RefCell::new(Session {
        selector: selector.to_string(),
        parsed: parsed.clone(),
        options,
        operations: Vec::new(),
        matched: HashSet::new(),
        observer: None,
    }));
    let observer = doc.observe_with(SessionObserver {
        session: Rc::downgrade(&session),
    });
    session.borrow_mut().observer = Some(observer);

    if options.match_existing {
        let existing = doc.query_selector_all_parsed(&parsed);
        debug!(selector, existing = existing.len(), "perpetual query armed");
        let weak = Rc::downgrade(&session);
        doc.queue_microtask(move |doc| {
            if let Some(session) = weak.upgrade() {
                for node in existing {
                    dispatch(&session, doc, node);
                }
            }
        });
    } else {
        debug!(selector, "perpetual query armed");
    }
    Ok(PerpetualQuery { session })
}

impl PerpetualQuery {
    fn push(self, operation: Operation) -> Self {
        let kind = operation.kind();
        trace!(?kind, "queued operation");
        self.session.borrow_mut().operations.push(Queued {
            kind,
            operation: Rc::new(RefCell::new(operation)),
        });
        self
    }

    pub fn for_each(self, f: impl FnMut(&mut Document, NodeId) + 'static) -> Self {
        self.push(Operation::ForEach(Box::new(f)))
    }

    pub fn map<T: 'static>(self, mut f: impl FnMut(&mut Document, NodeId) -> T + 'static) -> Self {
        self.push(Operation::Map(Box::new(
            move |doc: &mut Document, node: NodeId| -> Box<dyn Any> { Box::new(f(doc, node)) },
        )))
    }

    pub fn reduce(self, f: impl FnMut(&mut Document, NodeId, NodeId) -> NodeId + 'static) -> Self {
        self.push(Operation::Reduce(Box::new(f)))
    }

    pub fn filter(self, f: impl FnMut(&Document, NodeId) -> bool + 'static) -> Self {
        self.push(Operation::Filter(Box::new(f)))
    }

    pub fn every(self, f: impl FnMut(&Document, NodeId) -> bool + 'static) -> Self {
        self.push(Operation::Every(Box::new(f)))
    }

    pub fn some(self, f: impl FnMut(&Document, NodeId) -> bool + 'static) -> Self {
        self.push(Operation::Some(Box::new(f)))
    }

    pub fn find(self, f: impl FnMut(&Document, NodeId) -> bool + 'static) -> Self {
        self.push(Operation::Find(Box::new(f)))
    }

    pub fn selector(&self) -> String {
        self.session.borrow().selector.clone()
    }

    pub fn options(&self) -> PerpetualOptions {
        self.session.borrow().options
    }

    pub fn operation_kinds(&self) -> Vec<OperationKind> {
        self.session
            .borrow()
            .operations
            .iter()
            .map(|q| q.kind)
            .collect()
    }

    /// Number of distinct elements matched so far
    pub fn matched_count(&self) -> usize {
        self.session.borrow().matched.len()
    }

    pub fn has_matched(&self, node: NodeId) -> bool {
        self.session.borrow().matched.contains(&node)
    }

    pub fn observer(&self) -> Option<ObserverId> {
        self.session.borrow().observer
    }

    /// Stop observing. Returns false if the session was already disconnected.
    pub fn disconnect(&self, doc: &mut Document) -> bool {
        let mut session = self.session.borrow_mut();
        match session.observer.take() {
            Some(id) => {
                debug!(selector = session.selector.as_str(), "perpetual query disconnected");
                doc.disconnect(id)
            }
            None => false,
        }
    }

    /// Apply every queued operation to `node` right away, whether or not it
    /// matches or was matched before. Nothing is recorded. Operations that are
    /// currently running (when called from inside a callback) are skipped.
    pub fn apply_to(&self, doc: &mut Document, node: NodeId) -> Vec<Outcome> {
        let operations = self.session.borrow().operations.clone();
        operations
            .iter()
            .filter_map(|q| q.apply(doc, &[node]))
            .collect()
    }
}
