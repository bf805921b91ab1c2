//! Application initialization and lifecycle.

use std::net::SocketAddr;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use ledmap_control::lm::LM_MAX_PAYLOAD;
use ledmap_control::{
    frame_queue, BufferPool, InputEndpoints, InputThread, InputWorker, ModeListener, NodeInfo,
};
use ledmap_core::{
    AppConfig, ChannelBuffers, ChipEncoder, DatagramSocket, HardwareOutput, InputMode,
    OutputModeFlag, ShutdownToken,
};
use ledmap_io::{DryRunOutput, HostInfo, LinuxOutput, UdpEndpoint};
use tracing::{error, info, warn};

use super::app_struct::{App, RunOptions};
use crate::app::loops::RenderLoop;
use crate::signals;

const CONFIG_QUEUE_CAPACITY: usize = 4;
const SIGNAL_POLL_INTERVAL: Duration = Duration::from_millis(100);

impl App {
    /// Acquire sockets and devices, then start every worker thread.
    ///
    /// Any failure here is fatal to the process.
    pub fn new(config: AppConfig, options: RunOptions) -> Result<Self> {
        let shutdown = ShutdownToken::new();

        let host = HostInfo::discover().unwrap_or_else(|e| {
            warn!("{}; PollReply will advertise 0.0.0.0", e);
            HostInfo::unspecified()
        });
        let endpoints = bind_inputs(&config, &host)?;
        let strip_type = UdpEndpoint::bind(config.input.strip_type_port, false)
            .context("Failed to bind strip-type port")?;

        let output: Box<dyn HardwareOutput> = if options.dry_run {
            info!("Dry run: LED output is recorded, not transmitted");
            Box::new(DryRunOutput::new())
        } else {
            Box::new(LinuxOutput::open(&config.output).context("Failed to open LED output")?)
        };

        let (frames_tx, frames_rx) = frame_queue(config.input.queue_capacity);
        let (input_config_tx, input_config_rx) = frame_queue(CONFIG_QUEUE_CAPACITY);
        let (routing_tx, routing_rx) = frame_queue(CONFIG_QUEUE_CAPACITY);
        let pool = BufferPool::new(
            config.input.queue_capacity + config.input.max_frames_per_poll,
            LM_MAX_PAYLOAD,
        );

        let worker = InputWorker::new(
            config.input_config(),
            input_config_rx,
            frames_tx,
            endpoints,
            pool,
            config.input.max_frames_per_poll,
        )?;

        let mode = OutputModeFlag::new(config.output.chip);
        let render = RenderLoop::new(
            frames_rx,
            routing_rx,
            config.routing_table(),
            ChannelBuffers::new(&config.led_counts()),
            ChipEncoder::new(config.output.chip, config.gamma_table()),
            mode.clone(),
            output,
        );

        let workers = vec![
            ModeListener::new(Box::new(strip_type), mode).spawn(shutdown.clone())?,
            render.spawn(config.render_fps, shutdown.clone())?,
        ];
        let input = InputThread::spawn(worker, config.input.poll_fps, shutdown.clone())?;

        info!(
            "Pipeline running: {} input, {} output, {} channels",
            config.input.mode,
            config.output.chip,
            config.output.channels.len()
        );

        Ok(Self {
            config,
            options,
            shutdown,
            input_config_tx,
            routing_tx,
            input,
            workers,
        })
    }

    /// Serve until a termination signal, reloading on `SIGHUP`
    pub fn run(mut self) -> Result<()> {
        info!("--- Entering main loop ---");
        while !signals::shutdown_requested() && self.shutdown.is_running() {
            if signals::take_reload() {
                self.reload();
            }
            thread::sleep(SIGNAL_POLL_INTERVAL);
        }
        info!("Shutdown requested");
        self.stop();
        Ok(())
    }

    /// Push a new configuration to the running threads.
    ///
    /// Input filtering and routing change on the threads' next cycle; other
    /// settings need a restart.
    pub fn apply(&mut self, config: AppConfig) {
        if self.input_config_tx.try_push(config.input_config()).is_err() {
            warn!("Input thread has not consumed earlier updates; input config dropped");
        }
        if self.routing_tx.try_push(config.routing_table()).is_err() {
            warn!("Render loop has not consumed earlier updates; routing dropped");
        }
        if config.led_counts() != self.config.led_counts()
            || config.output.chip != self.config.output.chip
            || config.render_fps != self.config.render_fps
        {
            warn!("LED counts, startup chip and frame rate take effect on restart");
        }
        self.config = config;
    }

    /// Stop every thread and wait for them
    pub fn stop(self) {
        self.shutdown.shutdown();
        self.input.join();
        for handle in self.workers {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                error!("{} thread panicked", name);
            }
        }
        info!("LedMap stopped");
    }

    /// Re-read the configuration file and apply it; a bad file is logged and
    /// the running configuration kept
    pub fn reload(&mut self) {
        let Some(path) = self.options.config_path.clone() else {
            info!("SIGHUP ignored: no configuration file");
            return;
        };
        match AppConfig::load(&path) {
            Ok(config) => {
                info!("Reloaded configuration from {:?}", path);
                self.apply(config);
            }
            Err(e) => error!("Reload of {:?} failed, keeping current configuration: {}", path, e),
        }
    }
}

/// Bind the input sockets. The socket for the configured mode is required;
/// the other one is bound if possible so a reload can switch modes.
fn bind_inputs(config: &AppConfig, host: &HostInfo) -> Result<InputEndpoints> {
    let artnet = bind_input(config.input.artnet_port, true, config.input.mode == InputMode::ArtNet)
        .context("Failed to bind ArtNet port")?;
    let lm = bind_input(config.input.lm_port, false, config.input.mode == InputMode::Lm)
        .context("Failed to bind LM port")?;

    Ok(InputEndpoints {
        artnet,
        lm,
        reply_target: SocketAddr::from((host.broadcast, config.input.artnet_port)),
        node: NodeInfo::new(host.ip, host.mac, &config.input.broadcast_name),
    })
}

fn bind_input(
    port: u16,
    broadcast: bool,
    required: bool,
) -> ledmap_io::Result<Option<Box<dyn DatagramSocket>>> {
    match UdpEndpoint::bind(port, broadcast) {
        Ok(socket) => Ok(Some(Box::new(socket))),
        Err(e) if !required => {
            warn!("{}; switching to this input needs a restart", e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
