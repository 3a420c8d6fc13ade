// SPDX-License-Identifier: Apache-2.0

// Command handlers
// Each returns a serializable response; failures are reported in the
// response body rather than as an `Err`.

pub mod config;
pub mod logs;
pub mod propagate;
pub mod roles;
pub mod sources;
