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
//! Module defining the harness configuration and the remote rule-command template.

use std::{net::Ipv4Addr, time::Duration};

use pnet::util::MacAddr;
use thiserror::Error;

/// Static configuration for a full harness run, validated once at startup.
#[derive(Clone, Debug)]
pub struct HarnessConfig {
    /// Name of the network interface on which probes are sent and replies captured.
    pub interface: String,
    /// IPv4 address of the probed host.
    pub destination_ip: Ipv4Addr,
    /// Link-layer address of the first hop towards the probed host.
    pub destination_mac: MacAddr,
    /// IPv4 source address stamped into the probes. When `None`, the first IPv4 address
    /// of the interface is used.
    pub source_ip: Option<Ipv4Addr>,
    /// Number of independent experiments to run.
    pub experiments: usize,
    /// Number of probe iterations per experiment.
    pub iterations: usize,
    /// Sleep interval between consecutive probes.
    pub interval: Duration,
    /// Time to wait for a matching reply to each probe.
    pub probe_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("at least one experiment is required, got {0}")]
    TooFewExperiments(usize),
    #[error("at least one probe iteration per experiment is required, got {0}")]
    TooFewIterations(usize),
}

impl HarnessConfig {
    /// Check the fatal configuration bounds before any probing begins.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.experiments < 1 {
            return Err(ConfigError::TooFewExperiments(self.experiments));
        }
        if self.iterations < 1 {
            return Err(ConfigError::TooFewIterations(self.iterations));
        }
        Ok(())
    }

    /// Expected wall time of the whole run, assuming every probe waits the full interval.
    pub fn expected_duration(&self) -> Duration {
        Duration::from_secs_f64(
            self.interval.as_secs_f64() * (self.iterations * self.experiments) as f64,
        )
    }
}

/// Template for the compound shell command that changes the rule table on the remote
/// device: change into the tool's working directory, activate its python environment,
/// and invoke the rule-update CLI with one of two fixed rule values.
#[derive(Clone, Debug)]
pub struct RuleCommand {
    /// Working directory of the rule-update CLI on the remote host.
    pub workdir: String,
    /// Activation script of the remote python environment.
    pub venv: String,
    /// CLI invocation, e.g. `python3 moc_shell -c`.
    pub cli: String,
    /// Rule-update argument set without the trailing rule value.
    pub rule_args: String,
    /// Rule value applied at the start of every experiment.
    pub initial_value: String,
    /// Rule value applied at the midpoint of every experiment.
    pub updated_value: String,
}

impl RuleCommand {
    fn render(&self, value: &str) -> String {
        format!(
            "cd {} && source {} && {} \"{} {}\"",
            self.workdir, self.venv, self.cli, self.rule_args, value
        )
    }

    /// The command setting the initial rule value.
    pub fn initial(&self) -> String {
        self.render(&self.initial_value)
    }

    /// The command setting the updated rule value.
    pub fn updated(&self) -> String {
        self.render(&self.updated_value)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn config() -> HarnessConfig {
        HarnessConfig {
            interface: "vxlan0".to_string(),
            destination_ip: Ipv4Addr::new(192, 168, 42, 42),
            destination_mac: MacAddr::new(0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa),
            source_ip: None,
            experiments: 30,
            iterations: 60,
            interval: Duration::from_secs(1),
            probe_timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn validate_bounds() {
        assert!(config().validate().is_ok());

        let mut no_experiments = config();
        no_experiments.experiments = 0;
        assert!(matches!(
            no_experiments.validate(),
            Err(ConfigError::TooFewExperiments(0))
        ));

        let mut no_iterations = config();
        no_iterations.iterations = 0;
        assert!(matches!(
            no_iterations.validate(),
            Err(ConfigError::TooFewIterations(0))
        ));
    }

    #[test]
    fn expected_duration() {
        let cfg = config();
        assert_eq!(cfg.expected_duration(), Duration::from_secs(30 * 60));
    }

    #[test]
    fn render_rule_commands() {
        let rule = RuleCommand {
            workdir: "~/working_space/md-omuprocu".to_string(),
            venv: "~/working_space/md-omuprocu/.venv/bin/activate".to_string(),
            cli: "python3 moc_shell -c".to_string(),
            rule_args: "rules provider update s3 ipv4_host 10.100.0.200".to_string(),
            initial_value: "101".to_string(),
            updated_value: "100".to_string(),
        };
        assert_eq!(
            rule.initial(),
            "cd ~/working_space/md-omuprocu \
             && source ~/working_space/md-omuprocu/.venv/bin/activate \
             && python3 moc_shell -c \"rules provider update s3 ipv4_host 10.100.0.200 101\""
        );
        assert_eq!(
            rule.updated(),
            "cd ~/working_space/md-omuprocu \
             && source ~/working_space/md-omuprocu/.venv/bin/activate \
             && python3 moc_shell -c \"rules provider update s3 ipv4_host 10.100.0.200 100\""
        );
    }
}
