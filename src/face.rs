//! Request/response transport.
//!
//! [`Face`] is what the authority and the consumer see of the network. [`InMemoryFace`] is a
//! single-process simulation of one: producers publish into its content store, servers register
//! prefix handlers, and tests script losses and negative acknowledgments.
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::name::Name;
use crate::packet::{Data, NackReason, Outcome, Request};

/// Serves requests under a registered prefix.
pub trait RequestHandler {
    /// `Ok(None)` leaves the request unanswered; an error is returned to the requester as a
    /// [`NackReason::Refused`].
    fn on_request(&mut self, request: &Request) -> Result<Option<Data>>;
}

#[async_trait(?Send)]
pub trait Face {
    async fn express(&self, request: &Request) -> Outcome;

    fn register_prefix(&self, prefix: Name, handler: Rc<RefCell<dyn RequestHandler>>);
}

/// A scripted network failure applied to the next expressed request.
#[derive(Clone, Debug, PartialEq)]
pub enum Fault {
    Timeout,
    Nack(NackReason),
}

#[derive(Default)]
struct Network {
    handlers: Vec<(Name, Rc<RefCell<dyn RequestHandler>>)>,
    content_store: BTreeMap<Name, Data>,
    faults: VecDeque<Fault>,
    sent: Vec<Request>,
}

impl Network {
    fn lookup_store(&self, request: &Request) -> Option<Data> {
        if !request.can_be_prefix {
            return self.content_store.get(&request.name).cloned();
        }
        self.content_store
            .range(request.name.clone()..)
            .map(|(_, data)| data)
            .find(|data| request.matches(data))
            .cloned()
    }

    fn lookup_handler(&self, name: &Name) -> Option<Rc<RefCell<dyn RequestHandler>>> {
        self.handlers
            .iter()
            .filter(|(prefix, _)| prefix.is_prefix_of(name))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, handler)| handler.clone())
    }
}

/// Cloneable handle to one simulated network. All clones see the same state.
#[derive(Clone, Default)]
pub struct InMemoryFace {
    network: Rc<RefCell<Network>>,
}

impl InMemoryFace {
    pub fn new() -> InMemoryFace {
        InMemoryFace::default()
    }

    /// Makes `data` available to any matching request that does not require freshness.
    pub fn publish(&self, data: Data) {
        debug!("Publishing {}", data.name);
        self.network
            .borrow_mut()
            .content_store
            .insert(data.name.clone(), data);
    }

    pub fn inject(&self, fault: Fault) {
        self.network.borrow_mut().faults.push_back(fault);
    }

    /// Every request expressed so far, in order.
    pub fn sent_requests(&self) -> Vec<Request> {
        self.network.borrow().sent.clone()
    }

    pub fn clear_sent_requests(&self) {
        self.network.borrow_mut().sent.clear();
    }

    fn dispatch(&self, request: &Request) -> Outcome {
        let handler = {
            let mut network = self.network.borrow_mut();
            network.sent.push(request.clone());

            match network.faults.pop_front() {
                Some(Fault::Timeout) => return Outcome::Timeout,
                Some(Fault::Nack(reason)) => return Outcome::Nack(reason),
                None => {}
            }

            // stale store entries never satisfy a fresh request
            if !request.must_be_fresh {
                if let Some(data) = network.lookup_store(request) {
                    return Outcome::Data(data);
                }
            }

            match network.lookup_handler(&request.name) {
                Some(handler) => handler,
                None => return Outcome::Nack(NackReason::NoRoute),
            }
        };

        let reply = handler.borrow_mut().on_request(request);
        match reply {
            Ok(Some(data)) if request.matches(&data) => Outcome::Data(data),
            Ok(Some(data)) => {
                warn!("Handler answered {} with {}", request.name, data.name);
                Outcome::Timeout
            }
            Ok(None) => Outcome::Timeout,
            Err(e) => {
                warn!("Request {} refused: {}", request.name, e);
                Outcome::Nack(NackReason::Refused(e.to_string()))
            }
        }
    }
}

#[async_trait(?Send)]
impl Face for InMemoryFace {
    async fn express(&self, request: &Request) -> Outcome {
        self.dispatch(request)
    }

    fn register_prefix(&self, prefix: Name, handler: Rc<RefCell<dyn RequestHandler>>) {
        debug!("Registering prefix {}", prefix);
        self.network.borrow_mut().handlers.push((prefix, handler));
    }
}
