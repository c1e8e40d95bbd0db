//! Out-of-process generators.
//!
//! A [`CmdPlugin`] runs an external command once per program and talks to
//! it through the [`wire`](crate::wire) protocol. The plugin's stderr is
//! inherited, so its diagnostics show up live on the driver's stderr.

use std::{
    io::{self, Read, Write},
    process::{Command, Stdio},
    thread,
};

use log::{debug, info};

use wctl_core::ast::{Program, ProgramLookup};

use crate::{
    WctlError,
    generator::{Generator, Output},
    wire::{self, BuildRQ, BuildRS},
};

/// A generator backed by an external command.
#[derive(Debug, Clone)]
pub struct CmdPlugin {
    command: String,
    program: String,
    args: Vec<String>,
}

impl CmdPlugin {
    /// Create a plugin from a command line split on whitespace.
    ///
    /// # Errors
    ///
    /// Returns `WctlError::Config` for an empty command line.
    pub fn new(command: &str) -> Result<Self, WctlError> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let Some(program) = parts.next() else {
            return Err(WctlError::Config("plugin command is empty".to_string()));
        };
        Ok(Self {
            command: command.trim().to_string(),
            program,
            args: parts.collect(),
        })
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Send `request` to a fresh plugin process and decode its response.
    ///
    /// The request is written on its own thread while stdout is drained, so
    /// a plugin that answers before it has read everything cannot deadlock
    /// the driver. There is no timeout.
    pub fn run(&self, request: &BuildRQ) -> Result<BuildRS, WctlError> {
        let payload = wire::encode(request)?;
        info!(command = self.command.as_str(), files = request.files.len(); "Running plugin");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|err| self.failure(format!("cannot start process: {err}")))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| self.failure("stdin is not captured"))?;
        let writer = thread::spawn(move || stdin.write_all(&payload));

        let mut response = Vec::new();
        let read = match child.stdout.take() {
            Some(mut stdout) => stdout.read_to_end(&mut response).map(|_| ()),
            None => Err(io::Error::other("stdout is not captured")),
        };
        let written = writer
            .join()
            .unwrap_or_else(|_| Err(io::Error::other("request writer panicked")));
        let status = child
            .wait()
            .map_err(|err| self.failure(format!("cannot wait for process: {err}")))?;

        debug!(
            command = self.command.as_str(),
            status = status.to_string(),
            bytes = response.len();
            "Plugin exited"
        );
        if !status.success() {
            return Err(self.failure(format!("process exited with {status}")));
        }
        read.map_err(|err| self.failure(format!("cannot read response: {err}")))?;
        match written {
            Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
                debug!(command = self.command.as_str(); "Plugin closed stdin early");
            }
            Err(err) => return Err(self.failure(format!("cannot write request: {err}"))),
            Ok(()) => {}
        }

        wire::decode(&response)
    }

    fn failure(&self, message: impl Into<String>) -> WctlError {
        WctlError::Plugin {
            command: self.command.clone(),
            message: message.into(),
        }
    }
}

impl Generator for CmdPlugin {
    fn union(&self) -> &str {
        &self.command
    }

    fn generate(
        &self,
        program: &Program,
        lookup: &dyn ProgramLookup,
    ) -> Result<Vec<Output>, WctlError> {
        let request = BuildRQ {
            files: vec![program.file.clone()],
            programs: program.file_desc_with_imports(lookup),
        };
        Ok(self.run(&request)?.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_is_split_on_whitespace() {
        let plugin = CmdPlugin::new("  wctl-gen-go   --fast\tout ").expect("plugin");
        assert_eq!(plugin.command(), "wctl-gen-go   --fast\tout");
        assert_eq!(plugin.program, "wctl-gen-go");
        assert_eq!(plugin.args, vec!["--fast", "out"]);
    }

    #[test]
    fn test_empty_command() {
        assert!(matches!(CmdPlugin::new(" \t"), Err(WctlError::Config(_))));
    }

    #[test]
    fn test_missing_executable() {
        let plugin = CmdPlugin::new("wctl-plugin-that-does-not-exist").expect("plugin");
        assert!(matches!(
            plugin.run(&BuildRQ::default()),
            Err(WctlError::Plugin { .. })
        ));
    }
}
