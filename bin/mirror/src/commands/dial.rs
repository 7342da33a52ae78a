//! `mirror dial`: race the addresses of the peers serving a key.

use std::net::SocketAddr;
use std::time::Duration;

use eyre::{Result, bail};
use mirror_net_race::HappyEyeballs;
use mirror_routing::{Balancer, ClosableBalancer, Peer, Router};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cli::DialArgs;
use crate::config::RoutesConfig;

pub(crate) async fn run(args: DialArgs) -> Result<()> {
    let router = RoutesConfig::load(&args.routes.routes)?.into_router().await?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let balancer = ClosableBalancer::with_parent(router.lookup(&args.key, 1).await?, &cancel);
    if balancer.size() == 0 {
        bail!("no peers serve {}", args.key);
    }

    let mut race =
        HappyEyeballs::new().with_attempt_delay(Duration::from_millis(args.attempt_delay_ms));
    if let Some(timeout) = args.timeout_ms {
        race = race.with_timeout(Duration::from_millis(timeout));
    }

    let (peer, _stream, addr) = first_reachable(&balancer, &race, &cancel).await?;
    println!("{}\t{addr}", peer.host);
    Ok(())
}

/// Takes each peer once, in rotation order, and races its addresses until one
/// of them accepts a connection. Cancellation ends the walk immediately.
async fn first_reachable<B: Balancer>(
    balancer: &ClosableBalancer<B>,
    race: &HappyEyeballs,
    cancel: &CancellationToken,
) -> Result<(Peer, TcpStream, SocketAddr)> {
    let candidates = balancer.size();
    for _ in 0..candidates {
        let peer = balancer.next().await?;
        if peer.addresses.is_empty() {
            debug!(host = %peer.host, "peer has no addresses");
            continue;
        }

        match race.connect_tcp(cancel, &peer.addresses, peer.metadata.registry_port).await {
            Ok((stream, addr)) => {
                info!(host = %peer.host, %addr, "connected");
                return Ok((peer, stream, addr));
            }
            Err(err) if cancel.is_cancelled() => return Err(err.into()),
            Err(err) => warn!(host = %peer.host, %err, "peer unreachable"),
        }
    }

    bail!("none of the {candidates} candidate peers is reachable")
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use mirror_routing::RoundRobin;
    use tokio::net::TcpListener;

    use super::*;

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    async fn closed_port() -> u16 {
        let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
        listener.local_addr().unwrap().port()
    }

    fn peer(host: &str, addresses: Vec<IpAddr>, port: u16) -> Peer {
        Peer::new(host, addresses).with_registry_port(port)
    }

    fn race() -> HappyEyeballs {
        HappyEyeballs::new().with_timeout(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_skips_unreachable_peers() {
        let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
        let up = listener.local_addr().unwrap();

        let balancer = ClosableBalancer::new(RoundRobin::from_iter([
            peer("no-addrs", vec![], up.port()),
            peer("refused", vec![LOCALHOST], closed_port().await),
            peer("up", vec![LOCALHOST], up.port()),
        ]));
        let cancel = CancellationToken::new();

        let (peer, _stream, addr) = first_reachable(&balancer, &race(), &cancel).await.unwrap();
        assert_eq!(peer.host, "up");
        assert_eq!(addr, up);
    }

    #[tokio::test]
    async fn test_every_peer_unreachable() {
        let balancer = ClosableBalancer::new(RoundRobin::from_iter([
            peer("a", vec![LOCALHOST], closed_port().await),
            peer("b", vec![], 0),
        ]));
        let cancel = CancellationToken::new();

        let err = first_reachable(&balancer, &race(), &cancel).await.unwrap_err();
        assert!(err.to_string().contains("none of the 2 candidate peers"));
    }

    #[tokio::test]
    async fn test_cancellation_stops_the_walk() {
        let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
        let up = listener.local_addr().unwrap();

        let cancel = CancellationToken::new();
        let balancer = ClosableBalancer::with_parent(
            RoundRobin::from_iter([
                peer("a", vec![LOCALHOST], closed_port().await),
                peer("up", vec![LOCALHOST], up.port()),
            ]),
            &cancel,
        );
        cancel.cancel();

        let err = first_reachable(&balancer, &race(), &cancel).await.unwrap_err();
        assert!(err.to_string().contains("cancelled"));
        // The walk ended on the first peer.
        assert_eq!(balancer.try_next().unwrap().host, "up");
    }
}
