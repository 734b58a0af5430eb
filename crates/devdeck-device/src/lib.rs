//! devdeck-device - Device RPC collaborator for devdeck
//!
//! Defines the async seam through which every device read, settings write
//! and destructive action is executed, plus the deadline helper that bounds
//! each call.
//!
//! Enable the `test-helpers` feature to get [`test_utils::FakeDevice`].

pub mod client;
pub mod deadline;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

pub use client::{DeviceRpc, LocalDeviceRpc};
pub use deadline::{with_deadline, READ_TIMEOUT, WRITE_TIMEOUT};
