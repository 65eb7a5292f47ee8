// RULAT: Measuring the Latency Impact of Live Rule-Table Updates
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//! Module executing rule-update commands on the remote host over ssh.

use std::{io, process::Command};

/// Captured result of one remote command execution.
#[derive(Clone, Debug)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` if the remote process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Synchronous execution of one fixed command line on the remote host. Implemented over
/// ssh for the real harness and by fakes in tests.
pub trait CommandRunner {
    /// Run `command` and block until it exits, capturing both output streams.
    fn run(&mut self, command: &str) -> io::Result<CommandOutput>;
}

/// Runs commands through the system `ssh` client as `ssh user@host <command>`.
pub struct SshRunner {
    user: String,
    host: String,
}

impl SshRunner {
    pub fn new(user: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            host: host.into(),
        }
    }

    fn ssh_args(&self, command: &str) -> [String; 2] {
        [format!("{}@{}", self.user, self.host), command.to_string()]
    }
}

impl CommandRunner for SshRunner {
    fn run(&mut self, command: &str) -> io::Result<CommandOutput> {
        log::debug!("ssh {}@{} '{command}'", self.user, self.host);
        let output = Command::new("ssh").args(self.ssh_args(command)).output()?;
        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }
}
