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
//! Module sequencing the experiments: N experiments of M timed probes each, with the
//! rule table re-initialized before and updated once in the middle of every experiment.

use std::{thread, time::Instant};

use crate::{
    config::{HarnessConfig, RuleCommand},
    records::ExperimentRecord,
    remote::CommandRunner,
    results::ResultsMatrix,
    transport::Prober,
    util,
};

/// Drives all experiments strictly sequentially on a single thread. Probes, remote
/// commands and the inter-probe sleep never overlap, so every latency sample can be
/// attributed to a known rule-table state (before or after the midpoint update).
pub struct Controller<P, R> {
    cfg: HarnessConfig,
    init_command: String,
    update_command: String,
    prober: P,
    runner: R,
}

impl<P: Prober, R: CommandRunner> Controller<P, R> {
    pub fn new(cfg: HarnessConfig, rule: &RuleCommand, prober: P, runner: R) -> Self {
        Self {
            init_command: rule.initial(),
            update_command: rule.updated(),
            cfg,
            prober,
            runner,
        }
    }

    /// Run all experiments and return the latency matrix together with one metadata
    /// record per experiment.
    pub fn run(mut self) -> (ResultsMatrix, Vec<ExperimentRecord>) {
        let mut matrix = ResultsMatrix::new(self.cfg.iterations, self.cfg.experiments);
        let mut records = Vec::with_capacity(self.cfg.experiments);

        // the update fires exactly once per experiment, at floor(M/2), for odd and even M
        let midpoint = self.cfg.iterations / 2;

        for e in 0..self.cfg.experiments {
            log::info!("--- experiment {}/{} ---", e + 1, self.cfg.experiments);
            let execution_timestamp = util::get_timestamp();
            let started = Instant::now();

            log::info!("initializing the rules");
            let init_exit_code = run_rule_command(&mut self.runner, &self.init_command);

            let mut update_exit_code = None;
            let mut replies_received = 0;
            for i in 0..self.cfg.iterations {
                match self.prober.probe(self.cfg.probe_timeout) {
                    Some(latency) => {
                        replies_received += 1;
                        log::info!("latency: {} us", latency.as_micros());
                        matrix.record(i, e, Some(latency));
                    }
                    None => {
                        log::info!("no matching reply");
                        matrix.record(i, e, None);
                    }
                }
                if i == midpoint {
                    log::info!("updating the rules");
                    update_exit_code = run_rule_command(&mut self.runner, &self.update_command);
                }
                thread::sleep(self.cfg.interval);
            }

            records.push(ExperimentRecord {
                experiment: e + 1,
                execution_timestamp,
                execution_duration: started.elapsed().as_secs_f64(),
                init_exit_code,
                update_exit_code,
                replies_received,
            });
        }

        (matrix, records)
    }
}

/// Execute one rule command, logging both streams. Failures are surfaced in the logs
/// and the returned exit code only; the experiment always continues.
fn run_rule_command<R: CommandRunner>(runner: &mut R, command: &str) -> Option<i32> {
    match runner.run(command) {
        Ok(output) => {
            if !output.stdout.is_empty() {
                log::info!("remote stdout:\n{}", output.stdout.trim_end());
            }
            if !output.stderr.is_empty() {
                log::info!("remote stderr:\n{}", output.stderr.trim_end());
            }
            if !output.success() {
                log::error!("remote command exited with {:?}: {command}", output.exit_code);
            }
            output.exit_code
        }
        Err(e) => {
            log::error!("failed to execute remote command {command:?}: {e}");
            None
        }
    }
}
