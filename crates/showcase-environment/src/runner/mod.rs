// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Runner module - demo environment provisioning backends.
//!
//! Only a simulated backend exists today; [`docker`] holds the commands a
//! real docker backend would issue.

pub mod docker;
pub mod simulated;
mod traits;

pub use simulated::{SimulatedRunner, SimulatedRunnerConfig};
pub use traits::*;
