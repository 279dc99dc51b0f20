//! Canal d'événements publication/abonnement
//!
//! Chaque abonnement retourne un [`SubscriptionToken`] non clonable :
//! `cancel` le consomme, un abonnement ne peut donc être libéré qu'une fois.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::types::{GeoPoint, LocationUpdate};

/// Sujets connus du canal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    MapLoaded,
    LocationLoaded,
    ResetCenter,
}

impl Topic {
    pub fn name(&self) -> &'static str {
        match self {
            Self::MapLoaded => "map:loaded",
            Self::LocationLoaded => "location:loaded",
            Self::ResetCenter => "location:reset-center",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Événement typé, porteur de sa charge utile
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    MapLoaded,
    LocationLoaded(LocationUpdate),
    ResetCenter(GeoPoint),
}

impl ChannelEvent {
    pub fn topic(&self) -> Topic {
        match self {
            Self::MapLoaded => Topic::MapLoaded,
            Self::LocationLoaded(_) => Topic::LocationLoaded,
            Self::ResetCenter(_) => Topic::ResetCenter,
        }
    }
}

/// Jeton d'abonnement, à rendre via [`EventChannel::cancel`]
#[derive(Debug, PartialEq, Eq)]
pub struct SubscriptionToken {
    id: u64,
    topic: Topic,
}

impl SubscriptionToken {
    pub fn topic(&self) -> Topic {
        self.topic
    }
}

pub type Handler = Box<dyn FnMut(&ChannelEvent)>;

/// Canal d'événements partagé entre écrans
pub trait EventChannel {
    fn subscribe(&self, topic: Topic, handler: Handler) -> SubscriptionToken;
    fn publish(&self, event: &ChannelEvent);
    /// Libère un abonnement ; retourne `false` s'il était déjà inconnu
    fn cancel(&self, token: SubscriptionToken) -> bool;
}

struct Subscriber {
    id: u64,
    topic: Topic,
    handler: Rc<RefCell<Handler>>,
}

/// Canal mono-thread, livraison synchrone dans l'ordre d'abonnement
#[derive(Default)]
pub struct LocalChannel {
    next_id: Cell<u64>,
    subscribers: RefCell<Vec<Subscriber>>,
}

impl LocalChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nombre d'abonnements actifs sur un sujet
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.subscribers
            .borrow()
            .iter()
            .filter(|s| s.topic == topic)
            .count()
    }
}

impl fmt::Debug for LocalChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalChannel")
            .field("subscribers", &self.subscribers.borrow().len())
            .finish()
    }
}

impl EventChannel for LocalChannel {
    fn subscribe(&self, topic: Topic, handler: Handler) -> SubscriptionToken {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.subscribers.borrow_mut().push(Subscriber {
            id,
            topic,
            handler: Rc::new(RefCell::new(handler)),
        });
        debug!(topic = %topic, id, "subscribed");
        SubscriptionToken { id, topic }
    }

    fn publish(&self, event: &ChannelEvent) {
        let topic = event.topic();
        // Copier la liste : un handler peut s'abonner ou se désabonner
        let handlers: Vec<Rc<RefCell<Handler>>> = self
            .subscribers
            .borrow()
            .iter()
            .filter(|s| s.topic == topic)
            .map(|s| Rc::clone(&s.handler))
            .collect();

        debug!(topic = %topic, subscribers = handlers.len(), "publish");
        for handler in handlers {
            match handler.try_borrow_mut() {
                Ok(mut handler) => handler(event),
                Err(_) => warn!(topic = %topic, "re-entrant publish skipped for a busy handler"),
            }
        }
    }

    fn cancel(&self, token: SubscriptionToken) -> bool {
        let mut subscribers = self.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != token.id);
        let removed = subscribers.len() != before;
        debug!(topic = %token.topic, id = token.id, removed, "cancelled");
        removed
    }
}
