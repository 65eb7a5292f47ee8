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
//! Utility module collection of functions

pub fn init_logging() {
    pretty_env_logger::init_timed();
}

/// Produces a timestamp `String` of the current time in YYYY-MM-DD_HH:MM:SS format.
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d_%H:%M:%S").to_string()
}
