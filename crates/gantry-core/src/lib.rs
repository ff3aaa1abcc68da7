//! # Gantry Core
//!
//! Request context and handler-chain execution for the Gantry HTTP toolkit.
//!
//! This crate provides the per-request types every handler works with:
//!
//! - [`Context`] - Request, response, key-value store, errors and the chain cursor
//! - [`Handler`] / [`HandlerChain`] - Handler functions and their flattened sequence
//! - [`ResponseWriter`] - Buffered response with first-writer-wins status
//! - [`ErrorRecord`] - Error accumulated on a context
//! - [`Validate`] / [`Renderer`] - Seams for body validation and template rendering
//!
//! Routing, groups and serving live in `gantry-server`.

#![doc(html_root_url = "https://docs.rs/gantry-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod handler;
mod response;
mod validate;

pub use context::{Context, Request};
pub use error::{CoreError, CoreResult, ErrorRecord, ValidationError, ABORTED_META};
pub use handler::{handler, Handler, HandlerChain, ABORT_INDEX, MAX_CHAIN_LEN};
pub use response::{Response, ResponseWriter};
pub use validate::{Renderer, Validate};

pub use gantry_router::Params;
