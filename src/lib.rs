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
//! Library for measuring ICMP round-trip latency while the forwarding rules of a remote
//! device are updated in the middle of each experiment.

pub mod config;
pub mod experiment;
pub mod probe;
pub mod records;
pub mod remote;
pub mod results;
pub mod transport;
pub mod util;

pub mod prelude {
    pub use super::{
        config::{HarnessConfig, RuleCommand},
        experiment::Controller,
        remote::{CommandOutput, CommandRunner, SshRunner},
        results::ResultsMatrix,
        transport::{PnetProber, Prober},
    };
}
