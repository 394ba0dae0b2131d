//! chatdash: a chat dashboard client and its reference backend.
//!
//! The presentation layer ([`view`]) is headless: typed state that renders
//! HTML fragments. [`dashboard::Dashboard`] owns that state together with the
//! metrics [`poller`] and talks to the backend only through
//! [`api::Backend`]. [`web`] is a small synchronous server implementing the
//! endpoints the client expects.

pub mod api;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod logging;
pub mod poller;
pub mod view;
pub mod web;
