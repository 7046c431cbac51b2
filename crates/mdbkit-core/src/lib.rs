//! Driving a line-oriented debugger over its standard streams.
//!
//! [`Session`] owns a debugger child process and turns its byte stream into
//! prompt-delimited responses, intercepting asynchronous halt notices along
//! the way. [`Debugger`] layers typed commands on top, and
//! [`parse_breakpoints`] decodes `info breakpoints` listings.

pub mod breakpoint;
pub mod client;
pub mod command;
pub mod error;
pub mod framing;
pub mod intercept;
pub mod logging;
pub mod response;
pub mod session;
pub mod supervisor;

pub use breakpoint::{parse_breakpoints, Address, Breakpoint, BreakpointParser};
pub use client::Debugger;
pub use command::{Command, ListTarget, WatchTarget};
pub use error::{MdbError, MdbResult};
pub use intercept::{HaltInterceptor, Interception};
pub use session::{Session, SessionConfig, SessionState};
