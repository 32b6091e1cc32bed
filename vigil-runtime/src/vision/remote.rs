use tokio::net::{ToSocketAddrs, UdpSocket};

use super::{Frame, FrameSource};
use crate::core::Detection;

const REPORT_BUFFER_SIZE: usize = 65_507;

/// Frame report sent by an external detector.
///
/// One report is sent per analysed frame. Frames without a face still
/// produce a report with an empty face list.
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct FrameReport {
    pub sequence: u64,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub faces: Vec<Detection>,
}

impl From<FrameReport> for Frame {
    fn from(report: FrameReport) -> Self {
        Self {
            detections: report.faces,
            ..Frame::new(report.sequence, report.width, report.height)
        }
    }
}

/// Frame source fed by an external detector over UDP.
///
/// Each datagram holds a single JSON encoded [`FrameReport`]. Reports older
/// than the last accepted report are dropped.
pub struct RemoteVision {
    socket: UdpSocket,
    last_sequence: Option<u64>,
}

impl RemoteVision {
    pub async fn bind(address: impl ToSocketAddrs) -> std::io::Result<Self> {
        let socket = UdpSocket::bind(address).await?;

        log::debug!("Listening for frame reports on {}", socket.local_addr()?);

        Ok(Self {
            socket,
            last_sequence: None,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.socket.local_addr()
    }
}

#[async_trait::async_trait]
impl FrameSource for RemoteVision {
    async fn next_frame(&mut self) -> crate::runtime::Result<Frame> {
        let mut buffer = vec![0u8; REPORT_BUFFER_SIZE];

        loop {
            let (size, peer) = self.socket.recv_from(&mut buffer).await?;

            let report = match serde_json::from_slice::<FrameReport>(&buffer[..size]) {
                Ok(report) => report,
                Err(e) => {
                    log::warn!("Malformed frame report from {}: {}", peer, e);
                    continue;
                }
            };

            if self
                .last_sequence
                .is_some_and(|last| report.sequence <= last)
            {
                log::debug!("Dropping out of order frame report {}", report.sequence);
                continue;
            }

            self.last_sequence = Some(report.sequence);

            return Ok(report.into());
        }
    }
}
