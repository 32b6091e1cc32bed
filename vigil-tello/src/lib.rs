// Copyright (C) 2024 Vigil Contributors
// All rights reserved.
//
// This software may be modified and distributed under the terms
// of the included license.  See the LICENSE file for details.

//! Tello SDK command driver.
//!
//! The vehicle listens for plain text commands on a UDP port. Control
//! commands are answered with `ok` or `error ...`, read commands (ending in
//! `?`) are answered with the value. The `rc` command is never answered and
//! may be sent at the control rate.

use std::time::Duration;

use tokio::net::{ToSocketAddrs, UdpSocket};

mod error;

pub use error::{Error, Result};

/// Default vehicle command address.
pub const DEFAULT_ADDRESS: &str = "192.168.10.1:8889";

/// Default local bind address. The vehicle replies to the sending port.
pub const DEFAULT_BIND: &str = "0.0.0.0:8889";

/// Default time to wait for a command reply.
///
/// Takeoff and landing are only acknowledged once the manoeuvre is complete.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(7);

/// Lower bound of any remote control velocity.
pub const RC_MIN: i8 = -100;

/// Upper bound of any remote control velocity.
pub const RC_MAX: i8 = 100;

/// Accepted range for relative movement commands in centimeters.
pub const MOVE_RANGE: std::ops::RangeInclusive<u16> = 20..=500;

const REPLY_BUFFER_SIZE: usize = 1_518;

pub struct Tello {
    socket: UdpSocket,
    timeout: Duration,
}

impl Tello {
    /// Bind the local socket and associate it with the vehicle.
    ///
    /// This does not put the vehicle in SDK mode, call `connect` for that.
    pub async fn bind(bind: impl ToSocketAddrs, address: impl ToSocketAddrs) -> Result<Self> {
        let socket = UdpSocket::bind(bind).await?;
        socket.connect(address).await?;

        log::debug!("Command socket bound to {}", socket.local_addr()?);

        Ok(Self {
            socket,
            timeout: DEFAULT_COMMAND_TIMEOUT,
        })
    }

    /// Set the time to wait for a command reply.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Enter SDK mode.
    pub async fn connect(&self) -> Result {
        self.command("command").await.map(|_| ())
    }

    /// Send a command and wait for the reply.
    ///
    /// Stale replies from earlier commands which timed out are discarded
    /// before the command is sent.
    pub async fn command(&self, command: &str) -> Result<String> {
        let mut buffer = [0u8; REPLY_BUFFER_SIZE];

        while self.socket.try_recv(&mut buffer).is_ok() {
            log::trace!("Discarding stale reply");
        }

        log::trace!("Command: {}", command);

        self.socket.send(command.as_bytes()).await?;

        let size = tokio::time::timeout(self.timeout, self.socket.recv(&mut buffer))
            .await
            .map_err(|_| Error::Timeout)??;

        let reply = String::from_utf8_lossy(&buffer[..size]).trim().to_string();

        log::trace!("Reply: {}", reply);

        if reply.starts_with("error") {
            Err(Error::Rejected(reply))
        } else {
            Ok(reply)
        }
    }

    /// Send a control command which must be acknowledged with `ok`.
    async fn control(&self, command: &str) -> Result {
        let reply = self.command(command).await?;
        if reply == "ok" {
            Ok(())
        } else {
            Err(Error::InvalidResponse(reply))
        }
    }

    /// Send the remote control velocities.
    ///
    /// Each channel is clamped to the accepted range. The vehicle does not
    /// reply to this command.
    pub async fn rc(&self, left_right: i8, forward_back: i8, up_down: i8, yaw: i8) -> Result {
        let command = format!(
            "rc {} {} {} {}",
            left_right.clamp(RC_MIN, RC_MAX),
            forward_back.clamp(RC_MIN, RC_MAX),
            up_down.clamp(RC_MIN, RC_MAX),
            yaw.clamp(RC_MIN, RC_MAX)
        );

        self.socket.send(command.as_bytes()).await?;

        Ok(())
    }

    pub async fn stream_on(&self) -> Result {
        self.control("streamon").await
    }

    pub async fn stream_off(&self) -> Result {
        self.control("streamoff").await
    }

    pub async fn takeoff(&self) -> Result {
        self.control("takeoff").await
    }

    pub async fn land(&self) -> Result {
        self.control("land").await
    }

    /// Stop all motors immediately.
    pub async fn emergency(&self) -> Result {
        self.control("emergency").await
    }

    /// Hover in place.
    pub async fn stop(&self) -> Result {
        self.control("stop").await
    }

    /// Ascend the given distance in centimeters.
    pub async fn up(&self, distance: u16) -> Result {
        if !MOVE_RANGE.contains(&distance) {
            return Err(Error::InvalidInput);
        }

        self.control(&format!("up {}", distance)).await
    }

    /// Query the battery level in percent.
    pub async fn battery(&self) -> Result<u8> {
        let reply = self.command("battery?").await?;
        reply
            .parse::<u8>()
            .map_err(|_| Error::InvalidResponse(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn vehicle_pair() -> (Tello, UdpSocket) {
        let vehicle = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let tello = Tello::bind("127.0.0.1:0", vehicle.local_addr().unwrap())
            .await
            .unwrap();

        (tello, vehicle)
    }

    async fn reply_once(vehicle: &UdpSocket, reply: &str) -> String {
        let mut buffer = [0u8; 64];
        let (size, peer) = vehicle.recv_from(&mut buffer).await.unwrap();
        vehicle.send_to(reply.as_bytes(), peer).await.unwrap();
        String::from_utf8_lossy(&buffer[..size]).to_string()
    }

    #[tokio::test]
    async fn test_connect() {
        let (tello, vehicle) = vehicle_pair().await;

        let (result, received) = tokio::join!(tello.connect(), reply_once(&vehicle, "ok"));

        assert!(result.is_ok());
        assert_eq!(received, "command");
    }

    #[tokio::test]
    async fn test_battery() {
        let (tello, vehicle) = vehicle_pair().await;

        let (result, received) = tokio::join!(tello.battery(), reply_once(&vehicle, "87\r\n"));

        assert_eq!(result.unwrap(), 87);
        assert_eq!(received, "battery?");
    }

    #[tokio::test]
    async fn test_rejected() {
        let (tello, vehicle) = vehicle_pair().await;

        let (result, _) = tokio::join!(
            tello.takeoff(),
            reply_once(&vehicle, "error Motor stop")
        );

        assert!(matches!(result, Err(Error::Rejected(_))));
    }

    #[tokio::test]
    async fn test_timeout() {
        let (mut tello, _vehicle) = vehicle_pair().await;
        tello.set_timeout(Duration::from_millis(20));

        assert!(matches!(tello.land().await, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn test_rc_clamped() {
        let (tello, vehicle) = vehicle_pair().await;

        tello.rc(0, 3, -5, 10).await.unwrap();
        tello.rc(i8::MIN, i8::MAX, 0, 0).await.unwrap();

        let mut buffer = [0u8; 64];
        let (size, _) = vehicle.recv_from(&mut buffer).await.unwrap();
        assert_eq!(&buffer[..size], b"rc 0 3 -5 10");
        let (size, _) = vehicle.recv_from(&mut buffer).await.unwrap();
        assert_eq!(&buffer[..size], b"rc -100 100 0 0");
    }

    #[tokio::test]
    async fn test_up_out_of_range() {
        let (tello, _vehicle) = vehicle_pair().await;

        assert!(matches!(tello.up(10).await, Err(Error::InvalidInput)));
        assert!(matches!(tello.up(600).await, Err(Error::InvalidInput)));
    }
}
