//! Application processing engine for multi-page, conditionally branching forms.
//!
//! The `runner` module holds the component and page handlers, the navigation walks and the
//! use cases that drive an application through its form. `config`, `error` and `telemetry`
//! provide the ambient wiring shared with the command-line service.

pub mod config;
pub mod error;
pub mod runner;
pub mod telemetry;
