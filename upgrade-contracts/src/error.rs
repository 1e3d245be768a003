// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A mount/measure/unmount primitive failed.
///
/// These errors are memoized alongside the values they replaced, so the
/// variants carry owned strings instead of source errors and the whole type
/// stays cloneable.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ProbeError {
    #[error("mounting {device} failed: {reason}")]
    Mount { device: String, reason: String },

    #[error("unmounting {device} failed: {reason}")]
    Unmount { device: String, reason: String },

    #[error("assembling overlay over {rw_path} failed: {reason}")]
    Overlay { rw_path: PathBuf, reason: String },

    #[error("measuring {path} failed: {reason}")]
    Measure { path: PathBuf, reason: String },

    #[error("reading filesystem usage of {path} failed: {reason}")]
    Usage { path: PathBuf, reason: String },

    #[error("collaborator timed out: {0}")]
    Timeout(String),
}

/// Planning aborted for a device.
///
/// Insufficient space and unrecognized geometry are *not* errors; they are
/// regular plan outcomes. Only collaborator failures abort planning, and
/// they are never coerced into a default size of zero.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("size probe failed: {0}")]
    Probe(#[from] ProbeError),
}
