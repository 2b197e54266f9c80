//! Reachability probe: a short burst of ICMP echo requests.

use std::future::Future;
use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use checkip_common::check::{Check, Info};
use checkip_common::error::CheckError;
use serde::{Deserialize, Serialize};
use surge_ping::{Client, Config as IcmpConfig, ICMP, PingIdentifier, PingSequence, SurgeError};
use tokio::task::JoinSet;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

const PAYLOAD: [u8; 56] = [0; 56];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PingStats {
    pub addr: IpAddr,
    pub packets_sent: u32,
    pub packets_recv: u32,
    /// Percentage of requests that got no reply.
    pub packet_loss: f64,
    pub min_rtt_ms: f64,
    pub avg_rtt_ms: f64,
    pub max_rtt_ms: f64,
    #[serde(skip)]
    pub samples: Vec<Duration>,
}

impl PingStats {
    pub fn from_samples(addr: IpAddr, packets_sent: u32, samples: Vec<Duration>) -> Self {
        let packets_recv = samples.len() as u32;
        let packet_loss = if packets_sent == 0 {
            0.0
        } else {
            f64::from(packets_sent - packets_recv.min(packets_sent)) * 100.0
                / f64::from(packets_sent)
        };

        let millis = samples.iter().map(|d| d.as_secs_f64() * 1000.0);
        let (min, max, total) = millis.fold((f64::MAX, 0.0_f64, 0.0), |(lo, hi, sum), ms| {
            (lo.min(ms), hi.max(ms), sum + ms)
        });

        let (min_rtt_ms, avg_rtt_ms, max_rtt_ms) = if samples.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            (min, total / samples.len() as f64, max)
        };

        Self {
            addr,
            packets_sent,
            packets_recv,
            packet_loss,
            min_rtt_ms,
            avg_rtt_ms,
            max_rtt_ms,
            samples,
        }
    }
}

impl Info for PingStats {
    fn summary(&self) -> String {
        format!(
            "{:.0}% packet loss, sent {}, recv {}, avg round-trip {:.0} ms",
            self.packet_loss, self.packets_sent, self.packets_recv, self.avg_rtt_ms
        )
    }

    fn as_structured(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

pub struct Ping {
    pub count: u32,
    pub interval: Duration,
    /// Overall budget for the whole burst.
    pub timeout: Duration,
}

impl Default for Ping {
    fn default() -> Self {
        Self {
            count: 5,
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(5),
        }
    }
}

impl Ping {
    /// Sends `count` requests, one per `interval`, without waiting for earlier
    /// replies, then collects whatever answers arrive before the deadline.
    ///
    /// `echo` sends one request with the given sequence number and waits at
    /// most the given time for its reply; `Ok(None)` is a lost packet.
    async fn burst<F, Fut>(&self, mut echo: F) -> Result<(u32, Vec<Duration>), CheckError>
    where
        F: FnMut(u16, Duration) -> Fut,
        Fut: Future<Output = Result<Option<Duration>, CheckError>> + Send + 'static,
    {
        let deadline = Instant::now() + self.timeout;
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut pending = JoinSet::new();
        let mut sent: u32 = 0;

        while sent < self.count {
            ticker.tick().await;
            let now = Instant::now();
            if now >= deadline {
                debug!("ping deadline reached after {sent} requests");
                break;
            }
            pending.spawn(echo(sent as u16, deadline - now));
            sent += 1;
        }

        let mut samples = Vec::with_capacity(sent as usize);
        loop {
            match time::timeout_at(deadline, pending.join_next()).await {
                Ok(Some(Ok(Ok(Some(rtt))))) => samples.push(rtt),
                Ok(Some(Ok(Ok(None)))) => {}
                Ok(Some(Ok(Err(e)))) => {
                    pending.abort_all();
                    return Err(e);
                }
                Ok(Some(Err(e))) => debug!("echo task failed: {e}"),
                Ok(None) => break,
                Err(_) => {
                    debug!("{} replies still pending at deadline", pending.len());
                    pending.abort_all();
                    break;
                }
            }
        }

        Ok((sent, samples))
    }
}

fn icmp_client(target: IpAddr) -> Result<Client, CheckError> {
    let config = match target {
        IpAddr::V4(_) => IcmpConfig::default(),
        IpAddr::V6(_) => IcmpConfig::builder().kind(ICMP::V6).build(),
    };
    // Fails without raw socket privileges.
    Client::new(&config).map_err(|e| CheckError::Probe(e.to_string()))
}

#[async_trait]
impl Check for Ping {
    fn id(&self) -> &'static str {
        "ping"
    }

    fn name(&self) -> &'static str {
        "ping"
    }

    async fn inspect(&self, target: IpAddr) -> Result<Option<Box<dyn Info>>, CheckError> {
        let client = icmp_client(target)?;
        let ident: u16 = rand::random();

        let (sent, samples) = self
            .burst(|seq, wait| {
                let client = client.clone();
                async move {
                    let mut pinger = client.pinger(target, PingIdentifier(ident)).await;
                    pinger.timeout(wait);
                    match pinger.ping(PingSequence(seq), &PAYLOAD).await {
                        Ok((_, rtt)) => Ok(Some(rtt)),
                        Err(SurgeError::IOError(e)) => Err(CheckError::Probe(e.to_string())),
                        Err(e) => {
                            debug!("echo request {seq} to {target} lost: {e}");
                            Ok(None)
                        }
                    }
                }
            })
            .await?;

        Ok(Some(Box::new(PingStats::from_samples(target, sent, samples))))
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    const ADDR: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 7));

    fn ms(values: &[u64]) -> Vec<Duration> {
        values.iter().copied().map(Duration::from_millis).collect()
    }

    #[test]
    fn test_from_samples() {
        let stats = PingStats::from_samples(ADDR, 5, ms(&[10, 20, 30, 40]));
        assert_eq!(stats.packets_sent, 5);
        assert_eq!(stats.packets_recv, 4);
        assert!((stats.packet_loss - 20.0).abs() < 1e-9);
        assert!((stats.min_rtt_ms - 10.0).abs() < 1e-9);
        assert!((stats.avg_rtt_ms - 25.0).abs() < 1e-9);
        assert!((stats.max_rtt_ms - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_samples_all_lost() {
        let stats = PingStats::from_samples(ADDR, 5, Vec::new());
        assert_eq!(stats.packets_recv, 0);
        assert!((stats.packet_loss - 100.0).abs() < 1e-9);
        assert_eq!(stats.min_rtt_ms, 0.0);
        assert_eq!(stats.avg_rtt_ms, 0.0);
    }

    #[test]
    fn test_from_samples_nothing_sent() {
        let stats = PingStats::from_samples(ADDR, 0, Vec::new());
        assert_eq!(stats.packet_loss, 0.0);
    }

    #[test]
    fn test_summary() {
        let stats = PingStats::from_samples(ADDR, 5, ms(&[12, 14, 13, 13, 13]));
        assert_eq!(
            stats.summary(),
            "0% packet loss, sent 5, recv 5, avg round-trip 13 ms"
        );
    }

    #[test]
    fn test_structured_skips_samples() {
        let stats = PingStats::from_samples(ADDR, 2, ms(&[5]));
        let value = stats.as_structured().unwrap();
        assert!(value.get("samples").is_none());
        assert_eq!(value["addr"], "192.0.2.7");
        assert_eq!(value["packets_recv"], 1);

        let decoded: PingStats = serde_json::from_value(value).unwrap();
        assert!(decoded.samples.is_empty());
        assert_eq!(decoded.packets_sent, 2);
    }

    #[test]
    fn test_defaults() {
        let ping = Ping::default();
        assert_eq!(ping.count, 5);
        assert_eq!(ping.interval, Duration::from_secs(1));
        assert_eq!(ping.timeout, Duration::from_secs(5));
    }

    fn quick() -> Ping {
        Ping {
            count: 5,
            interval: Duration::from_millis(20),
            timeout: Duration::from_millis(400),
        }
    }

    #[tokio::test]
    async fn test_burst_keeps_sending_when_nothing_answers() {
        // Each request waits out its whole budget, far longer than the interval.
        let (sent, samples) = quick()
            .burst(|_, wait| async move {
                time::sleep(wait).await;
                Ok(None)
            })
            .await
            .unwrap();

        assert_eq!(sent, 5);
        assert!(samples.is_empty());
        let stats = PingStats::from_samples(ADDR, sent, samples);
        assert_eq!(stats.summary(), "100% packet loss, sent 5, recv 0, avg round-trip 0 ms");
    }

    #[tokio::test]
    async fn test_burst_collects_replies_slower_than_interval() {
        let (sent, samples) = quick()
            .burst(|_, _| async move {
                time::sleep(Duration::from_millis(60)).await;
                Ok(Some(Duration::from_millis(60)))
            })
            .await
            .unwrap();

        assert_eq!(sent, 5);
        assert_eq!(samples.len(), 5);
    }

    #[tokio::test]
    async fn test_burst_uses_distinct_sequence_numbers() {
        let (_, samples) = quick()
            .burst(|seq, _| async move { Ok(Some(Duration::from_millis(u64::from(seq)))) })
            .await
            .unwrap();

        let mut seqs: Vec<u128> = samples.iter().map(|d| d.as_millis()).collect();
        seqs.sort_unstable();
        assert_eq!(seqs, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_burst_socket_error_fails_the_check() {
        let result = quick()
            .burst(|_, _| async move { Err(CheckError::Probe("permission denied".into())) })
            .await;
        assert!(matches!(result, Err(CheckError::Probe(_))));
    }

    // Needs raw socket privileges.
    #[tokio::test]
    #[ignore]
    async fn test_ping_loopback() {
        let check = Ping {
            count: 2,
            interval: Duration::from_millis(100),
            timeout: Duration::from_secs(2),
        };
        let info = check
            .inspect(IpAddr::V4(Ipv4Addr::LOCALHOST))
            .await
            .unwrap()
            .unwrap();
        assert!(info.summary().contains("sent 2, recv 2"));
    }
}
