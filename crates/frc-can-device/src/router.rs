//! Route table mapping classified messages to handlers.
//!
//! Routes are keyed by `(category, api_id)`. Heartbeat and broadcast routes
//! have a fixed API id, so registering them under any id lands on the same
//! key. Registering a key twice replaces the earlier handler: the last
//! registration wins.

use std::collections::HashMap;

use frc_can_protocol::{
    ClassifiedMessage, MessageCategory, BROADCAST_API_ID, HEARTBEAT_API_ID,
};
use tracing::debug;

use crate::error::HandlerError;

/// A route handler. Receives the message and a mutable context.
pub type Handler<C> = Box<dyn FnMut(&ClassifiedMessage, &mut C) -> Result<(), HandlerError>>;

/// Key of a registered route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteKey {
    /// Message category.
    pub category: MessageCategory,
    /// API id; fixed for heartbeat and broadcast routes.
    pub api_id: u16,
}

impl RouteKey {
    /// Create a key, normalising the API id of heartbeat and broadcast routes.
    pub const fn new(category: MessageCategory, api_id: u16) -> Self {
        let api_id = match category {
            MessageCategory::Heartbeat => HEARTBEAT_API_ID,
            MessageCategory::Broadcast => BROADCAST_API_ID,
            MessageCategory::Device => api_id,
        };
        RouteKey { category, api_id }
    }

    /// Key a classified message dispatches to.
    pub fn of(message: &ClassifiedMessage) -> Self {
        RouteKey::new(message.category, message.api_id)
    }
}

impl std::fmt::Display for RouteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/0x{:03X}", self.category, self.api_id)
    }
}

/// Outcome of dispatching one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchResult {
    /// A handler ran and returned successfully.
    Handled,
    /// No handler is registered for this key.
    Unhandled {
        /// Category of the message.
        category: MessageCategory,
        /// API id of the message.
        api_id: u16,
    },
}

impl DispatchResult {
    /// Whether a handler ran.
    pub fn is_handled(&self) -> bool {
        matches!(self, DispatchResult::Handled)
    }
}

/// Route table.
///
/// `C` is the context handed to every handler alongside the message.
pub struct Router<C> {
    routes: HashMap<RouteKey, Handler<C>>,
}

impl<C> Router<C> {
    /// Create an empty router.
    pub fn new() -> Self {
        Router {
            routes: HashMap::new(),
        }
    }

    /// Register a handler, replacing any handler already at this key.
    ///
    /// Returns `true` if a handler was replaced.
    pub fn register<F>(&mut self, category: MessageCategory, api_id: u16, handler: F) -> bool
    where
        F: FnMut(&ClassifiedMessage, &mut C) -> Result<(), HandlerError> + 'static,
    {
        let key = RouteKey::new(category, api_id);
        let replaced = self.routes.insert(key, Box::new(handler)).is_some();
        if replaced {
            debug!(route = %key, "Replaced route handler");
        } else {
            debug!(route = %key, "Registered route");
        }
        replaced
    }

    /// Builder form of [`Router::register`].
    pub fn with_route<F>(mut self, category: MessageCategory, api_id: u16, handler: F) -> Self
    where
        F: FnMut(&ClassifiedMessage, &mut C) -> Result<(), HandlerError> + 'static,
    {
        self.register(category, api_id, handler);
        self
    }

    /// Remove a route. Returns `true` if one was registered.
    pub fn remove(&mut self, category: MessageCategory, api_id: u16) -> bool {
        self.routes.remove(&RouteKey::new(category, api_id)).is_some()
    }

    /// Whether a handler is registered for this key.
    pub fn contains(&self, category: MessageCategory, api_id: u16) -> bool {
        self.routes.contains_key(&RouteKey::new(category, api_id))
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether no routes are registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Registered keys, in no particular order. For diagnostics only.
    pub fn routes(&self) -> impl Iterator<Item = RouteKey> + '_ {
        self.routes.keys().copied()
    }

    /// Invoke the handler registered for `message`.
    ///
    /// A handler error is returned as-is. A missing route is not an error; it
    /// yields [`DispatchResult::Unhandled`].
    pub fn dispatch(
        &mut self,
        message: &ClassifiedMessage,
        context: &mut C,
    ) -> Result<DispatchResult, HandlerError> {
        let key = RouteKey::of(message);
        match self.routes.get_mut(&key) {
            Some(handler) => {
                handler(message, context)?;
                Ok(DispatchResult::Handled)
            }
            None => Ok(DispatchResult::Unhandled {
                category: key.category,
                api_id: key.api_id,
            }),
        }
    }
}

impl<C> Default for Router<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> std::fmt::Debug for Router<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes.keys().collect::<Vec<_>>())
            .finish()
    }
}
