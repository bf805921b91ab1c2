//! Network input thread
//!
//! Reads ArtNet or LM datagrams on a fixed poll cadence, decodes them and
//! pushes the results into the frame queue. ArtNet discovery polls are
//! answered with one PollReply per advertised universe.

use std::net::SocketAddr;
use std::thread::{self, JoinHandle};

use ledmap_core::{
    DatagramSocket, Frame, FramePacer, InputConfig, InputMode, ShutdownToken, MAX_CHANNELS_IN,
};
use tracing::{debug, info, trace, warn};

use crate::dmx::artnet::{self, ArtNetPacket, NodeInfo};
use crate::error::{ControlError, Result};
use crate::lm::{LmPacket, LM_MAX_PAYLOAD};
use crate::pool::{BufferPool, PooledBuffer};
use crate::queue::{Consumer, Producer};

/// Item carried from the input thread to the render loop
#[derive(Debug)]
pub enum InputFrame {
    /// One ArtNet universe
    Dmx(Frame),
    /// One LM datagram, validated by [`LmPacket::parse`]
    Lm(LmFrame),
}

/// A pooled LM datagram
#[derive(Debug)]
pub struct LmFrame {
    buffer: PooledBuffer,
}

impl LmFrame {
    /// Wrap a pooled datagram
    pub fn new(buffer: PooledBuffer) -> Self {
        Self { buffer }
    }

    /// Parse the held datagram
    pub fn packet(&self) -> Option<LmPacket<'_>> {
        LmPacket::parse(self.buffer.as_slice())
    }

    /// Raw datagram bytes
    pub fn bytes(&self) -> &[u8] {
        self.buffer.as_slice()
    }
}

/// Counters for one poll cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    /// Frames pushed into the queue
    pub frames: usize,
    /// Frames dropped because the queue was full
    pub dropped: usize,
    /// PollReply packets sent
    pub poll_replies: usize,
}

/// Sockets and identity the input thread works with
pub struct InputEndpoints {
    /// ArtNet socket, required for ArtNet input
    pub artnet: Option<Box<dyn DatagramSocket>>,
    /// LM socket, required for LM input
    pub lm: Option<Box<dyn DatagramSocket>>,
    /// Where PollReply packets are sent (the subnet broadcast address)
    pub reply_target: SocketAddr,
    /// Host identity for PollReply
    pub node: NodeInfo,
}

/// State owned by the input thread
pub struct InputWorker {
    config: InputConfig,
    poll_universes: Vec<u16>,
    config_rx: Consumer<InputConfig>,
    frames: Producer<InputFrame>,
    endpoints: InputEndpoints,
    pool: BufferPool,
    max_frames_per_poll: usize,
    recv_buf: Vec<u8>,
}

impl InputWorker {
    /// Create a worker.
    ///
    /// Fails if the socket for the configured input mode is missing.
    pub fn new(
        config: InputConfig,
        config_rx: Consumer<InputConfig>,
        frames: Producer<InputFrame>,
        endpoints: InputEndpoints,
        pool: BufferPool,
        max_frames_per_poll: usize,
    ) -> Result<Self> {
        let mut worker = Self {
            config: InputConfig::default(),
            poll_universes: Vec::new(),
            config_rx,
            frames,
            endpoints,
            pool,
            max_frames_per_poll: max_frames_per_poll.clamp(1, MAX_CHANNELS_IN),
            recv_buf: vec![0u8; LM_MAX_PAYLOAD],
        };
        worker.apply_config(config);
        if !worker.has_socket_for_mode() {
            return Err(ControlError::InvalidParameter(format!(
                "no socket bound for {} input",
                worker.config.mode()
            )));
        }
        Ok(worker)
    }

    /// Active input configuration
    pub fn config(&self) -> &InputConfig {
        &self.config
    }

    /// Universes answered in PollReply
    pub fn poll_universes(&self) -> &[u16] {
        &self.poll_universes
    }

    fn apply_config(&mut self, config: InputConfig) {
        self.poll_universes = config.poll_universes();
        debug!(
            "InputThread config: {} input, active universes {:?}",
            config.mode(),
            config.active_universes()
        );
        self.config = config;
        if !self.has_socket_for_mode() {
            warn!("No socket bound for {} input, nothing will be received", self.config.mode());
        }
    }

    fn has_socket_for_mode(&self) -> bool {
        match self.config.mode() {
            InputMode::ArtNet => self.endpoints.artnet.is_some(),
            InputMode::Lm => self.endpoints.lm.is_some(),
        }
    }

    /// Run one poll cycle: pick up configuration, read pending datagrams and
    /// answer discovery.
    pub fn poll_once(&mut self) -> PollSummary {
        if let Some(config) = self.config_rx.latest() {
            self.apply_config(config);
        }

        let mut summary = PollSummary::default();
        let mut needs_poll_reply = false;

        for _ in 0..self.max_frames_per_poll {
            let mode = self.config.mode();
            let socket = match mode {
                InputMode::ArtNet => self.endpoints.artnet.as_mut(),
                InputMode::Lm => self.endpoints.lm.as_mut(),
            };
            let Some(socket) = socket else {
                break;
            };

            let n = match socket.recv_from(&mut self.recv_buf) {
                Ok(Some((n, from))) => {
                    trace!("Received {} bytes from {}", n, from);
                    n
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Receive failed on {} socket: {}", mode, e);
                    break;
                }
            };

            let packet = &self.recv_buf[..n];
            let item = match mode {
                InputMode::ArtNet => self.decode_artnet(packet, &mut needs_poll_reply),
                InputMode::Lm => self.decode_lm(packet),
            };

            if let Some(item) = item {
                match self.frames.try_push(item) {
                    Ok(()) => summary.frames += 1,
                    Err(_) => summary.dropped += 1,
                }
            }
        }

        if needs_poll_reply {
            summary.poll_replies = self.send_poll_replies();
        }
        summary
    }

    fn decode_artnet(&self, packet: &[u8], needs_poll_reply: &mut bool) -> Option<InputFrame> {
        match artnet::parse(packet) {
            Ok(Some(ArtNetPacket::Poll)) => {
                *needs_poll_reply = true;
                None
            }
            Ok(Some(ArtNetPacket::Dmx { universe, data, .. })) => {
                if !self.config.accepts(universe) {
                    debug!("Dropping ArtDMX on inactive universe {}", universe);
                    return None;
                }
                let mut frame = Frame::default();
                frame.fill_from(universe, data);
                Some(InputFrame::Dmx(frame))
            }
            Ok(None) => {
                debug!("Ignoring non ArtNet datagram ({} bytes)", packet.len());
                None
            }
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }

    fn decode_lm(&self, packet: &[u8]) -> Option<InputFrame> {
        if LmPacket::parse(packet).is_none() {
            debug!("Ignoring short LM datagram ({} bytes)", packet.len());
            return None;
        }
        match self.pool.try_acquire_copy(packet) {
            Some(buffer) => Some(InputFrame::Lm(LmFrame { buffer })),
            None => {
                warn!("LM buffer pool exhausted, datagram dropped");
                None
            }
        }
    }

    fn send_poll_replies(&mut self) -> usize {
        let target = self.endpoints.reply_target;
        let Some(socket) = self.endpoints.artnet.as_mut() else {
            return 0;
        };

        let mut sent = 0;
        for (index, &universe) in self.poll_universes.iter().enumerate() {
            let reply = artnet::build_poll_reply(&self.endpoints.node, universe, index as u8);
            match socket.send_to(&reply, target) {
                Ok(_) => sent += 1,
                Err(e) => warn!("Failed to send PollReply for universe {}: {}", universe, e),
            }
        }
        debug!("Answered ArtPoll with {} replies", sent);
        sent
    }
}

/// Handle to the running input thread
pub struct InputThread {
    handle: Option<JoinHandle<()>>,
}

impl InputThread {
    /// Start polling at `poll_fps` until `shutdown` fires
    pub fn spawn(mut worker: InputWorker, poll_fps: u32, shutdown: ShutdownToken) -> Result<Self> {
        let handle = thread::Builder::new()
            .name("input".to_string())
            .spawn(move || {
                info!("Input thread started ({} input)", worker.config().mode());
                let mut pacer = FramePacer::new(poll_fps);
                while shutdown.is_running() {
                    pacer.begin();
                    worker.poll_once();
                    pacer.finish();
                }
                info!("Input thread stopped");
            })
            .map_err(|source| ControlError::Spawn {
                name: "input".to_string(),
                source,
            })?;

        Ok(Self {
            handle: Some(handle),
        })
    }

    /// Wait for the thread to exit
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Input thread panicked");
            }
        }
    }
}
