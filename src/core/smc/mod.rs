//! SMC protocol client.
//!
//! Encodes and decodes the fixed 80-byte request/response structure used to
//! read and write named 4-byte keys on the system management controller, and
//! converts raw byte encodings into engineering units.

pub mod client;
pub mod codec;

pub use client::{SmcClient, SmcPort, CPU_TEMP_KEYS};
pub use codec::{DataType, KeyInfo, SmcKey};
