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
//! Module performing one send/await cycle per probe on a raw datalink channel.

use std::{
    io,
    net::Ipv4Addr,
    time::{Duration, Instant},
};

use pnet::{
    datalink::{self, Channel, DataLinkReceiver, DataLinkSender},
    ipnetwork::IpNetwork,
    util::MacAddr,
};
use thiserror::Error;

use crate::{config::HarnessConfig, probe};

/// Granularity at which the receive loop re-checks the probe deadline.
const READ_POLL: Duration = Duration::from_millis(10);

/// One send/await latency measurement. Implemented on raw sockets for the real harness
/// and by deterministic fakes in tests.
pub trait Prober {
    /// Send a single probe and wait up to `timeout` for its reply.
    ///
    /// `None` means the probe is lost: no reply arrived in time, only non-matching
    /// frames arrived, or the transport failed. Losses are expected and never fatal.
    fn probe(&mut self, timeout: Duration) -> Option<Duration>;
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("network interface {0} does not exist")]
    UnknownInterface(String),
    #[error("interface {0} has no link-layer address")]
    NoLinkAddress(String),
    #[error("no IPv4 source address configured and none assigned to interface {0}")]
    NoSourceAddress(String),
    #[error("cannot open a channel on interface {interface}: {source}")]
    Channel {
        interface: String,
        source: io::Error,
    },
    #[error("channel on interface {0} is not an Ethernet channel")]
    NotEthernet(String),
}

/// Prober sending echo requests on a `pnet` datalink channel.
pub struct PnetProber {
    src_mac: MacAddr,
    dst_mac: MacAddr,
    src_ip: Ipv4Addr,
    dst_ip: Ipv4Addr,
    tx: Box<dyn DataLinkSender>,
    rx: Box<dyn DataLinkReceiver>,
}

impl PnetProber {
    /// Open a channel on the configured interface. Fails before any probing starts if
    /// the interface is unknown, carries no usable addresses, or cannot be opened.
    pub fn open(cfg: &HarnessConfig) -> Result<Self, TransportError> {
        let interface = datalink::interfaces()
            .into_iter()
            .find(|iface| iface.name == cfg.interface)
            .ok_or_else(|| TransportError::UnknownInterface(cfg.interface.clone()))?;
        let src_mac = interface
            .mac
            .ok_or_else(|| TransportError::NoLinkAddress(cfg.interface.clone()))?;
        let src_ip = cfg
            .source_ip
            .or_else(|| {
                interface.ips.iter().find_map(|ip| match ip {
                    IpNetwork::V4(net) => Some(net.ip()),
                    IpNetwork::V6(_) => None,
                })
            })
            .ok_or_else(|| TransportError::NoSourceAddress(cfg.interface.clone()))?;

        let channel_cfg = datalink::Config {
            read_timeout: Some(READ_POLL),
            ..Default::default()
        };
        let (tx, rx) = match datalink::channel(&interface, channel_cfg) {
            Ok(Channel::Ethernet(tx, rx)) => (tx, rx),
            Ok(_) => return Err(TransportError::NotEthernet(cfg.interface.clone())),
            Err(source) => {
                return Err(TransportError::Channel {
                    interface: cfg.interface.clone(),
                    source,
                })
            }
        };

        Ok(Self {
            src_mac,
            dst_mac: cfg.destination_mac,
            src_ip,
            dst_ip: cfg.destination_ip,
            tx,
            rx,
        })
    }
}

impl Prober for PnetProber {
    fn probe(&mut self, timeout: Duration) -> Option<Duration> {
        let (frame, token) =
            probe::build_probe(self.src_mac, self.dst_mac, self.src_ip, self.dst_ip);

        let sent_at = Instant::now();
        match self.tx.send_to(&frame, None) {
            Some(Ok(())) => {}
            Some(Err(e)) => {
                log::warn!("failed to send probe: {e}");
                return None;
            }
            None => {
                log::warn!("datalink channel refused the probe frame");
                return None;
            }
        }

        // drain inbound frames until the matching reply or the deadline; the latency is
        // taken from our own send timestamp, not from any device-reported time
        let deadline = sent_at + timeout;
        while Instant::now() < deadline {
            match self.rx.next() {
                Ok(received) => {
                    if probe::match_reply(received, &token) {
                        return Some(sent_at.elapsed());
                    }
                }
                Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                    continue;
                }
                Err(e) => {
                    log::warn!("receive error while waiting for a reply: {e}");
                    return None;
                }
            }
        }
        log::trace!("no matching reply within {timeout:?}");
        None
    }
}
