//! Infinicraft client shell.
//!
//! Runs the core [`Session`](infinicraft_core::Session) against a real
//! service: the tokio [`driver`], the reqwest-backed [`http`] service and a
//! line-oriented [`cli`] front end.

pub mod cli;
pub mod driver;
pub mod http;

pub use cli::{Command, Flow, Shell};
pub use driver::{Driver, Step};
pub use http::HttpCraftService;
