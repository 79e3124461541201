//! # Radio Link Module
//!
//! Transport for ground commands (in) and telemetry (out).
//!
//! This module handles:
//! - The [`RadioLink`] abstraction used by the control loop
//! - A UDP datagram transport for bench and simulator setups
//! - Link supervision and the COMM_LOST status flag

pub mod monitor;

use std::io;
use std::net::SocketAddr;

use tokio::net::UdpSocket;
use tracing::{debug, info};

use crate::error::Result;

/// Receive buffer size; larger than any valid packet so oversized
/// datagrams are seen at their real length and rejected by the parser.
pub const RADIO_MTU: usize = 64;

/// Non-blocking datagram radio.
///
/// Both calls must return immediately so they can run inside the fixed-rate
/// control loop.
#[cfg_attr(test, mockall::automock)]
pub trait RadioLink {
    /// Receive one pending datagram into `buf`.
    ///
    /// Returns `Ok(None)` when nothing is waiting.
    fn try_receive(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>>;

    /// Send one datagram to the ground station.
    fn transmit(&mut self, packet: &[u8]) -> io::Result<()>;
}

/// Receive one pending datagram, if any.
///
/// Radio errors are logged and treated as "nothing received" so the control
/// loop keeps its rate; link supervision catches a dead radio.
pub fn poll_datagram<R: RadioLink + ?Sized>(radio: &mut R, buf: &mut [u8]) -> Option<usize> {
    match radio.try_receive(buf) {
        Ok(len) => len,
        Err(e) => {
            debug!("Radio receive failed: {}", e);
            None
        }
    }
}

/// UDP transport standing in for the radio driver.
#[derive(Debug)]
pub struct UdpRadio {
    socket: UdpSocket,
    ground_addr: SocketAddr,
}

impl UdpRadio {
    /// Bind the local socket.
    ///
    /// # Arguments
    ///
    /// * `bind_addr` - Local address to receive commands on
    /// * `ground_addr` - Where telemetry is sent
    ///
    /// # Errors
    ///
    /// Returns error if the socket cannot be bound.
    pub async fn bind(bind_addr: SocketAddr, ground_addr: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(bind_addr).await?;
        info!("Radio listening on {}, telemetry to {}", socket.local_addr()?, ground_addr);
        Ok(Self { socket, ground_addr })
    }

    /// Local address the socket is bound to
    ///
    /// # Errors
    ///
    /// Returns error if the OS cannot report the address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Wait until a datagram can be read.
    ///
    /// # Errors
    ///
    /// Returns error if the socket fails.
    pub async fn readable(&self) -> Result<()> {
        self.socket.readable().await?;
        Ok(())
    }
}

impl RadioLink for UdpRadio {
    fn try_receive(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>> {
        match self.socket.try_recv_from(buf) {
            Ok((len, from)) => {
                debug!("Received {} bytes from {}", len, from);
                Ok(Some(len))
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn transmit(&mut self, packet: &[u8]) -> io::Result<()> {
        self.socket.try_send_to(packet, self.ground_addr)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::UdpSocket as StdUdpSocket;
    use std::time::Duration;

    #[test]
    fn test_poll_datagram() {
        let mut radio = MockRadioLink::new();
        let mut seq = mockall::Sequence::new();
        radio
            .expect_try_receive()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|buf| {
                buf[..3].copy_from_slice(&[1, 2, 3]);
                Ok(Some(3))
            });
        radio
            .expect_try_receive()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(None));
        radio
            .expect_try_receive()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(io::Error::new(io::ErrorKind::ConnectionRefused, "down")));

        let mut buf = [0u8; RADIO_MTU];
        assert_eq!(poll_datagram(&mut radio, &mut buf), Some(3));
        assert_eq!(&buf[..3], &[1, 2, 3]);
        assert_eq!(poll_datagram(&mut radio, &mut buf), None);
        assert_eq!(poll_datagram(&mut radio, &mut buf), None);
    }

    #[test]
    fn test_udp_radio_receive_and_transmit() {
        tokio_test::block_on(async {
            let ground = StdUdpSocket::bind("127.0.0.1:0").unwrap();
            ground.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
            let ground_addr = ground.local_addr().unwrap();

            let mut radio = UdpRadio::bind("127.0.0.1:0".parse().unwrap(), ground_addr)
                .await
                .unwrap();
            let radio_addr = radio.local_addr().unwrap();

            let mut buf = [0u8; RADIO_MTU];
            assert_eq!(radio.try_receive(&mut buf).unwrap(), None);

            ground.send_to(&[7u8; 20], radio_addr).unwrap();
            radio.readable().await.unwrap();
            assert_eq!(radio.try_receive(&mut buf).unwrap(), Some(20));
            assert_eq!(&buf[..20], &[7u8; 20]);

            radio.transmit(&[1u8; 18]).unwrap();
            let mut reply = [0u8; RADIO_MTU];
            let (len, from) = ground.recv_from(&mut reply).unwrap();
            assert_eq!(len, 18);
            assert_eq!(from, radio_addr);
            assert_eq!(&reply[..18], &[1u8; 18]);
        });
    }
}
