//! TCP dialing over a raced set of addresses.

use std::io;
use std::net::{IpAddr, SocketAddr};

use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::RaceError;
use crate::happy_eyeballs::HappyEyeballs;

impl HappyEyeballs {
    /// Opens a TCP connection to `port` on whichever of `ips` answers first.
    ///
    /// The other attempts are cancelled as soon as a handshake completes.
    pub async fn connect_tcp(
        &self,
        cancel: &CancellationToken,
        ips: &[IpAddr],
        port: u16,
    ) -> Result<(TcpStream, SocketAddr), RaceError<io::Error>> {
        let (stream, addr) = self
            .race(cancel, ips, |attempt, ip| async move {
                let addr = SocketAddr::new(ip, port);
                let stream = TcpStream::connect(addr).await?;
                attempt.established();
                Ok::<_, io::Error>((stream, addr))
            })
            .await?;
        debug!(%addr, "tcp connection established");
        Ok((stream, addr))
    }
}
