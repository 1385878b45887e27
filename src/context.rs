use crate::config::Config;
use crate::events::{Events, InputEvent};
use crate::focus::Focus;
use crate::scheduler::Scheduler;
use crate::surface::Document;
use core::fmt;
use std::sync::Arc;

struct Services {
    document: Document,
    events: Events,
    scheduler: Scheduler,
    focus: Focus,
    config: Config,
}

/// The services every widget needs: the surface document, input events, the scheduler and
/// the focus arbiter.
///
/// Cloning a context is cheap; all clones share the same services.
#[derive(Clone)]
pub struct Context(Arc<Services>);

impl Context {
    pub fn new(config: Config) -> Context {
        Context(Arc::new(Services {
            document: Document::new(config.document.rendering_enabled),
            events: Events::new(),
            scheduler: Scheduler::new(),
            focus: Focus::new(),
            config,
        }))
    }

    pub fn document(&self) -> &Document {
        &self.0.document
    }

    pub fn events(&self) -> &Events {
        &self.0.events
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.0.scheduler
    }

    pub fn focus(&self) -> &Focus {
        &self.0.focus
    }

    pub fn config(&self) -> &Config {
        &self.0.config
    }

    /// Dispatches an input event through the document.
    pub fn dispatch(&self, event: InputEvent) -> InputEvent {
        self.0.events.dispatch(&self.0.document, event)
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::new(Config::default())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Context")
            .field("document", &self.0.document)
            .field("scheduler", &self.0.scheduler)
            .finish()
    }
}
