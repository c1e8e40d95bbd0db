//! The command plugin protocol.
//!
//! The driver writes one bincode-encoded [`BuildRQ`] to the plugin's stdin
//! and closes it. The plugin answers with one bincode-encoded [`BuildRS`] on
//! stdout and exits. Neither message carries a length prefix; each side
//! reads to end of stream.

use std::io::{Read, Write};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use wctl_core::desc::FileDesc;

use crate::{WctlError, generator::Output};

/// Request sent to a plugin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildRQ {
    /// Files to generate for.
    pub files: Vec<String>,
    /// Descriptors of the requested files and of everything they import.
    pub programs: IndexMap<String, FileDesc>,
}

/// Response read back from a plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRS {
    pub result: Vec<Output>,
}

pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, WctlError> {
    Ok(bincode::serialize(message)?)
}

pub fn decode<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T, WctlError> {
    Ok(bincode::deserialize(bytes)?)
}

/// Read a request to end of stream, as a plugin does with its stdin.
pub fn read_request(mut reader: impl Read) -> Result<BuildRQ, WctlError> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|err| WctlError::io("<stdin>", err))?;
    decode(&bytes)
}

/// Write a response, as a plugin does to its stdout.
pub fn write_response(mut writer: impl Write, response: &BuildRS) -> Result<(), WctlError> {
    let bytes = encode(response)?;
    writer
        .write_all(&bytes)
        .and_then(|()| writer.flush())
        .map_err(|err| WctlError::io("<stdout>", err))
}
