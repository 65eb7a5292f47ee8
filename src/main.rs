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
use std::{net::Ipv4Addr, path::PathBuf, time::Duration};

use clap::Parser;
use pnet::util::MacAddr;

use rulat::{prelude::*, records, util};

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
struct Args {
    /// Network interface on which probes are sent and replies captured.
    #[arg(short, long, default_value = "vxlan0")]
    interface: String,
    /// IPv4 address of the host to ping.
    #[arg(short, long, default_value = "192.168.42.42")]
    destination: Ipv4Addr,
    /// Link-layer destination address of the first hop.
    #[arg(long, default_value = "aa:aa:aa:aa:aa:aa")]
    destination_mac: MacAddr,
    /// IPv4 source address stamped into the probes. Defaults to the first address of
    /// the interface.
    #[arg(long)]
    source_ip: Option<Ipv4Addr>,
    /// Select the number of experiments run.
    #[arg(short = 'n', long, default_value_t = 30)]
    experiments: usize,
    /// Select the number of probe iterations per experiment.
    #[arg(short = 'm', long, default_value_t = 60)]
    iterations: usize,
    /// Sleep interval between consecutive probes, in seconds.
    #[arg(long, default_value_t = 1.0)]
    interval: f64,
    /// Time to wait for each probe reply, in seconds.
    #[arg(long, default_value_t = 1.0)]
    timeout: f64,
    /// User for the ssh session on the rule-managing host.
    #[arg(long, default_value = "tiritor")]
    ssh_user: String,
    /// Host on which the rule-update CLI runs.
    #[arg(long, default_value = "sde-sw2")]
    ssh_host: String,
    /// Working directory of the rule-update CLI on the remote host.
    #[arg(long, default_value = "~/working_space/md-omuprocu")]
    remote_workdir: String,
    /// Activation script of the remote python environment.
    #[arg(long, default_value = "~/working_space/md-omuprocu/.venv/bin/activate")]
    remote_venv: String,
    /// Rule-update CLI invocation.
    #[arg(long, default_value = "python3 moc_shell -c")]
    remote_cli: String,
    /// Rule-update argument set, without the trailing rule value.
    #[arg(long, default_value = "rules provider update s3 ipv4_host 10.100.0.200")]
    rule_args: String,
    /// Rule value applied at the start of every experiment.
    #[arg(long, default_value = "101")]
    initial_value: String,
    /// Rule value applied at the midpoint of every experiment.
    #[arg(long, default_value = "100")]
    updated_value: String,
    /// Output file for the latency matrix.
    #[arg(short, long, default_value = "ping-results.csv")]
    output: PathBuf,
    /// Output file for per-experiment execution metadata.
    #[arg(long, default_value = "ping-results-metadata.csv")]
    metadata_output: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    util::init_logging();

    let args = Args::parse();
    let cfg = HarnessConfig {
        interface: args.interface,
        destination_ip: args.destination,
        destination_mac: args.destination_mac,
        source_ip: args.source_ip,
        experiments: args.experiments,
        iterations: args.iterations,
        interval: Duration::from_secs_f64(args.interval),
        probe_timeout: Duration::from_secs_f64(args.timeout),
    };
    cfg.validate()?;
    let rule = RuleCommand {
        workdir: args.remote_workdir,
        venv: args.remote_venv,
        cli: args.remote_cli,
        rule_args: args.rule_args,
        initial_value: args.initial_value,
        updated_value: args.updated_value,
    };

    let total = cfg.expected_duration();
    log::info!(
        "experiment duration: ~ {} secs (~ {:.1} min) (each experiment takes ~ {} secs)",
        total.as_secs(),
        total.as_secs_f64() / 60.0,
        (cfg.interval.as_secs_f64() * cfg.iterations as f64).round() as u64,
    );

    // opening the channel validates interface and addresses before any experiment starts
    let prober = PnetProber::open(&cfg)?;
    let runner = SshRunner::new(args.ssh_user, args.ssh_host);

    let (matrix, experiment_records) = Controller::new(cfg, &rule, prober, runner).run();

    matrix.write(&args.output)?;
    log::info!("wrote latency matrix to {}", args.output.display());
    records::write_records(&args.metadata_output, &experiment_records)?;
    log::info!(
        "wrote experiment metadata to {}",
        args.metadata_output.display()
    );

    Ok(())
}
