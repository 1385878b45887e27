//! A retained-mode widget toolkit.
//!
//! # Concepts
//! Widgets render into *surfaces*: nodes in a retained [`Document`] tree that a platform
//! backend mirrors on screen. Every widget embeds a [`View`], which owns one surface, one data
//! [`Value`] and a change event, and implements [`Renderable`] (usually through the
//! [`impl_renderable`] macro) to customize drawing and input handling.
//!
//! Events between widgets and application code are [`Subject`]s: ordered subscriber lists
//! with an exclusive capture mode. Input from the platform goes through [`Events`], which
//! dispatches to listeners on surfaces, and time passes through the [`Scheduler`]. Both, along
//! with the document and the [`Focus`] arbiter, live in a [`Context`] handed to every widget.
//!
//! A [`Host`] receives platform messages (input, finished transitions, clock ticks, layout)
//! over a channel and applies them when polled.
//!
//! # Widgets
//! - [`View`]: renders its data as text.
//! - [`Container`] and [`Card`]: compose other widgets, surfaces and text.
//! - [`Control`]: focusable and selectable, optionally bound to a [`DataSource`].
//! - [`List`]: formatted rows with a selected row.
//! - [`Stack`]: page navigation with animated transitions.
//! - [`Scroller`]: drag and flick scrolling.

#[macro_use]
mod view;

mod config;
mod container;
mod context;
mod control;
mod data_source;
mod error;
mod focus;
mod host;
mod id;
mod list;
mod rect;
mod registry;
mod scheduler;
mod scroller;
mod stack;
mod subject;
mod surface;
mod transition;
mod value;

pub mod events;

pub use config::{Config, DocumentConfig, ScrollerConfig, StackConfig};
pub use container::{draw_content, Card, Container};
pub use context::Context;
pub use control::{Control, ControlCore, DataBound, Selectable};
pub use data_source::DataSource;
pub use error::{ConfigError, StyleError};
pub use events::{EventHandler, EventKind, Events, InputEvent, ListenerId};
pub use focus::{Arbiter, Focus, Focusable};
pub use host::{Host, HostMessage};
pub use id::{ObjectId, SurfaceId};
pub use list::{CompareFn, FormatFn, List};
pub use rect::Rect;
pub use registry::{Factory, Interface, TagRegistry};
pub use scheduler::{Scheduler, TimerHandle};
pub use scroller::{Sample, ScrollTarget, Scroller};
pub use stack::{Navigable, Stack, StackLayout};
pub use subject::{Handler, Subject};
pub use surface::{Document, Style};
pub use transition::Phase;
pub use value::{compare, Value};
pub use view::{refresh_view, Renderable, View};
