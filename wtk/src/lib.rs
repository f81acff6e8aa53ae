//! The purpose of this library is to put an OpenGL capable window on the
//! screen with as little ceremony as possible, and to deliver the input of
//! every window through one event model, whatever the platform.
//!
//! Everything goes through a [`Wtk`], which owns a [`Backend`] and the
//! windows created with it. The backend is bootstrapped with the first
//! window and torn down with the last one, unless [`Wtk::init`] keeps it
//! alive in between.
//!
//! Windows are described with [`WindowAttributes`], including the callback
//! receiving their [`Event`]s and the [`ConfigTemplate`] of their context.
//! Events are delivered from [`Wtk::poll_events`], on the calling thread.
//!
//! The crate doesn't load OpenGL functions itself, hand
//! [`Wtk::get_proc_address`] to the loader of your choice.
//!
//! [`Event`]: crate::event::Event
//! [`ConfigTemplate`]: crate::config::ConfigTemplate

#![deny(rust_2018_idioms)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(clippy::all)]
#![deny(missing_debug_implementations)]
#![cfg_attr(clippy, deny(warnings))]

mod api;

pub mod backend;
pub mod config;
pub mod error;
pub mod event;
pub mod platform;
pub mod toolkit;
pub mod window;

pub use backend::Backend;
pub use toolkit::{GlobalContext, Wtk};
pub use window::{Rect, WindowAttributes, WindowId, WindowState};
