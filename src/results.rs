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
//! Module accumulating latency samples into the iteration x experiment matrix and
//! serializing it to CSV.

use std::{fs, io, path::Path, time::Duration};

use itertools::Itertools;

/// Latency samples of a full run. Rows are probe iterations, columns are experiments;
/// lost probes stay empty rather than being recorded as zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultsMatrix {
    iterations: usize,
    /// one column of length `iterations` per experiment
    columns: Vec<Vec<Option<Duration>>>,
}

impl ResultsMatrix {
    /// Create a matrix with every cell empty. The dimensions are fixed for the lifetime
    /// of the matrix, regardless of how many probes get replies.
    pub fn new(iterations: usize, experiments: usize) -> Self {
        Self {
            iterations,
            columns: vec![vec![None; iterations]; experiments],
        }
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn experiments(&self) -> usize {
        self.columns.len()
    }

    /// Store the outcome of one probe. Lost probes are recorded as `None`.
    pub fn record(&mut self, iteration: usize, experiment: usize, outcome: Option<Duration>) {
        self.columns[experiment][iteration] = outcome;
    }

    /// Serialize the matrix: a header naming each experiment column, then one row per
    /// iteration with latencies in integer microseconds and empty fields for losses.
    pub fn write_to<W: io::Write>(&self, writer: W) -> csv::Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(
            (1..=self.experiments())
                .map(|e| format!("experiment_{e}"))
                .collect_vec(),
        )?;
        for i in 0..self.iterations {
            csv.write_record(
                self.columns
                    .iter()
                    .map(|column| match column[i] {
                        Some(latency) => latency.as_micros().to_string(),
                        None => String::new(),
                    })
                    .collect_vec(),
            )?;
        }
        csv.flush()?;
        Ok(())
    }

    /// Write the matrix to `path`, once, after all experiments completed.
    pub fn write(&self, path: impl AsRef<Path>) -> csv::Result<()> {
        self.write_to(fs::File::create(path)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn serialize(matrix: &ResultsMatrix) -> String {
        let mut buf = Vec::new();
        matrix.write_to(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn empty_matrix_keeps_shape() {
        let matrix = ResultsMatrix::new(2, 3);
        assert_eq!(
            serialize(&matrix),
            "experiment_1,experiment_2,experiment_3\n,,\n,,\n"
        );
    }

    #[test]
    fn mismatched_losses_stay_in_place() {
        let mut matrix = ResultsMatrix::new(4, 2);
        for (i, micros) in [10, 20, 30, 40].into_iter().enumerate() {
            matrix.record(i, 0, Some(Duration::from_micros(micros)));
        }
        matrix.record(0, 1, None);
        for (i, micros) in [50, 60, 70].into_iter().enumerate() {
            matrix.record(i + 1, 1, Some(Duration::from_micros(micros)));
        }
        assert_eq!(
            serialize(&matrix),
            "experiment_1,experiment_2\n10,\n20,50\n30,60\n40,70\n"
        );
    }

    #[test]
    fn recording_is_idempotent_per_cell() {
        let mut matrix = ResultsMatrix::new(1, 1);
        matrix.record(0, 0, Some(Duration::from_micros(123)));
        matrix.record(0, 0, None);
        assert_eq!(matrix, ResultsMatrix::new(1, 1));
    }
}
