//! `mirror lookup`: print the rotation for a key.

use eyre::Result;
use mirror_routing::{Balancer, Router};
use tracing::warn;

use crate::cli::LookupArgs;
use crate::config::RoutesConfig;

pub(crate) async fn run(args: LookupArgs) -> Result<()> {
    let router = RoutesConfig::load(&args.routes.routes)?.into_router().await?;
    if !router.ready().await? {
        warn!("router is not ready, results may be incomplete");
    }

    let balancer = router.lookup(&args.key, args.count).await?;
    if balancer.size() == 0 {
        println!("no peers serve {}", args.key);
        return Ok(());
    }

    for position in 0..balancer.size() {
        let peer = balancer.try_next()?;
        let addrs: Vec<String> = peer.socket_addrs().iter().map(ToString::to_string).collect();
        println!("{position}\t{}\t{}", peer.host, addrs.join(","));
    }
    Ok(())
}
