// Copyright (C) 2024 Vigil Contributors
// All rights reserved.
//
// This software may be modified and distributed under the terms
// of the included license.  See the LICENSE file for details.

//! Visual target tracking for small camera drones.
//!
//! Three independent PID controllers keep a detected face centered in the
//! camera image at a fixed distance. Each cycle the [`control::ControllerBank`]
//! turns the target observation into per axis corrections, the
//! [`control::ActuationMapper`] turns those into a remote control command and
//! the [`runtime::Tracker`] sends it over a [`driver::CommandChannel`].
//!
//! The [`runtime::Session`] wraps the tracking loop with the vehicle
//! lifecycle.

pub mod control;
pub mod core;
pub mod driver;
pub mod logger;
pub mod math;
pub mod observer;
pub mod runtime;
pub mod vision;

mod config;

pub use self::config::*;

pub use self::runtime::Error;
pub use self::runtime::Shutdown;

/// Vigil runtime module containing various constants.
pub mod consts {
    /// Vigil runtime version.
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    /// Vigil runtime major version.
    pub const VERSION_MAJOR: &str = env!("CARGO_PKG_VERSION_MAJOR");

    /// Vigil runtime minor version.
    pub const VERSION_MINOR: &str = env!("CARGO_PKG_VERSION_MINOR");

    /// Vigil runtime patch version.
    pub const VERSION_PATCH: &str = env!("CARGO_PKG_VERSION_PATCH");

    /// Default configuration file.
    pub const DEFAULT_CONFIG_PATH: &str = "/etc/vigil.conf";
}
