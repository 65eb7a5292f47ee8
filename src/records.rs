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
//! Module defining the record type for per-experiment execution metadata.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Execution metadata collected for a single experiment, written next to the latency
/// matrix for post-hoc debugging of a run.
#[derive(Debug, Deserialize, Serialize)]
pub struct ExperimentRecord {
    /// 1-based index of the experiment within the run
    pub experiment: usize,
    /// Human-readable formatted timestamp when the experiment started
    pub execution_timestamp: String,
    /// Overall duration of this experiment in seconds, including both rule commands
    pub execution_duration: f64,
    /// Exit code of the initial-rule command; empty if the ssh invocation itself failed
    /// or the remote process was killed by a signal
    pub init_exit_code: Option<i32>,
    /// Exit code of the updated-rule command, empty as above
    pub update_exit_code: Option<i32>,
    /// Number of probes that received a matching reply
    pub replies_received: usize,
}

/// Write all metadata records to `path` with a header row.
pub fn write_records(path: impl AsRef<Path>, records: &[ExperimentRecord]) -> csv::Result<()> {
    let mut csv = csv::Writer::from_path(path)?;
    for record in records {
        csv.serialize(record)?;
    }
    csv.flush()?;
    Ok(())
}
