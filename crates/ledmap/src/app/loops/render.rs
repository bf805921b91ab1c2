//! Render loop: drain input frames, merge them into the channel buffers,
//! encode for the active chip and hand the result to the hardware.

use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use ledmap_control::{Consumer, InputFrame, LmFrame};
use ledmap_core::{
    ChannelBuffers, ChipEncoder, ChipWireBuffer, Frame, FramePacer, HardwareOutput,
    OutputModeFlag, Pace, RoutingTable, ShutdownToken, MAX_CHANNELS_IN,
};
use tracing::{debug, error, info, trace, warn};

/// Counters for one render cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    /// Input frames drained from the queue
    pub frames: usize,
    /// Pixels written into channel buffers
    pub pixels: usize,
    /// Output route was switched before transmitting
    pub route_switched: bool,
    /// Channels handed to the hardware
    pub channels_sent: usize,
    /// The cycle stopped on a single-wire failure
    pub aborted: bool,
}

/// Everything the render thread owns
pub struct RenderLoop {
    frames: Consumer<InputFrame>,
    routing_rx: Consumer<RoutingTable>,
    routing: RoutingTable,
    buffers: ChannelBuffers,
    encoder: ChipEncoder,
    wire: Vec<ChipWireBuffer>,
    mode: OutputModeFlag,
    output: Box<dyn HardwareOutput>,
    burst_limit: usize,
    last_dropped: u64,
}

impl RenderLoop {
    /// Build a loop around its buffers and collaborators
    pub fn new(
        frames: Consumer<InputFrame>,
        routing_rx: Consumer<RoutingTable>,
        routing: RoutingTable,
        buffers: ChannelBuffers,
        encoder: ChipEncoder,
        mode: OutputModeFlag,
        output: Box<dyn HardwareOutput>,
    ) -> Self {
        let wire = vec![ChipWireBuffer::default(); buffers.len()];
        Self {
            frames,
            routing_rx,
            routing,
            buffers,
            encoder,
            wire,
            mode,
            output,
            burst_limit: MAX_CHANNELS_IN,
            last_dropped: 0,
        }
    }

    /// Channel buffers as last merged
    pub fn buffers(&self) -> &ChannelBuffers {
        &self.buffers
    }

    /// Active routing table
    pub fn routing(&self) -> &RoutingTable {
        &self.routing
    }

    /// Run one Draining, Encoding, Transmitting cycle
    pub fn run_cycle(&mut self) -> RenderSummary {
        if let Some(routing) = self.routing_rx.latest() {
            self.apply_routing(routing);
        }

        let mut summary = RenderSummary {
            route_switched: self.sync_mode(),
            ..Default::default()
        };

        while summary.frames < self.burst_limit {
            let Some(item) = self.frames.try_pop() else {
                break;
            };
            summary.frames += 1;
            summary.pixels += match &item {
                InputFrame::Dmx(frame) => self.merge_dmx(frame),
                InputFrame::Lm(lm) => self.merge_lm(lm),
            };
            // Dropping an LM item returns its buffer to the pool
        }
        self.report_drops();

        match self.transmit() {
            Some(sent) => summary.channels_sent = sent,
            None => summary.aborted = true,
        }
        summary
    }

    /// Black out every channel and send it once
    pub fn blank(&mut self) {
        self.buffers.clear();
        for buffer in self.buffers.iter_mut() {
            buffer.set_active_leds(buffer.led_count());
        }
        if self.transmit().is_some() {
            info!("Outputs blanked");
        }
    }

    /// Run on a named thread at `fps` until `shutdown` fires, then blank
    pub fn spawn(mut self, fps: u32, shutdown: ShutdownToken) -> Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("render".to_string())
            .spawn(move || {
                info!("Render loop started at {} fps ({})", fps, self.encoder.chip());
                let mut pacer = FramePacer::new(fps);
                while shutdown.is_running() {
                    pacer.begin();
                    self.run_cycle();
                    if let Pace::Overrun { elapsed } = pacer.finish() {
                        warn!(
                            "Render cycle overran: {:?} > {:?} ({} total)",
                            elapsed,
                            pacer.period(),
                            pacer.overruns()
                        );
                    }
                }
                self.blank();
                info!("Render loop stopped");
            })
            .context("Failed to spawn render thread")
    }

    fn apply_routing(&mut self, routing: RoutingTable) {
        info!(
            "Routing updated: {} channels, {} universes",
            routing.channel_count(),
            routing.universes().count()
        );
        self.routing = routing;
        for buffer in self.buffers.iter_mut() {
            buffer.set_active_leds(buffer.led_count());
        }
    }

    fn sync_mode(&mut self) -> bool {
        let chip = self.mode.load();
        if chip == self.encoder.chip() {
            return false;
        }
        info!("Output mode {} -> {}", self.encoder.chip(), chip);
        if let Err(e) = self.output.switch_output_route(chip) {
            error!("Failed to switch output route to {}: {}", chip, e);
        }
        self.encoder.set_chip(chip);
        true
    }

    fn merge_dmx(&mut self, frame: &Frame) -> usize {
        match self.routing.route(frame.universe) {
            Some(route) => self.buffers.merge_frame(route, frame),
            None => {
                trace!("Universe {} not routed", frame.universe);
                0
            }
        }
    }

    fn merge_lm(&mut self, lm: &LmFrame) -> usize {
        let Some(packet) = lm.packet() else {
            return 0;
        };

        let mut written = 0;
        for run in packet.channel_runs() {
            let Some(buffer) = self.buffers.get_mut(run.channel) else {
                debug!("LM channel {} has no output", run.channel);
                continue;
            };
            if run.requested > buffer.led_count() {
                warn!(
                    "LM channel {} requests {} LEDs, only {} allocated; dropped",
                    run.channel,
                    run.requested,
                    buffer.led_count()
                );
                continue;
            }
            buffer.set_active_leds(run.requested);
            written += self.buffers.write_run(run.channel, 0, run.pixels());
        }
        written
    }

    fn report_drops(&mut self) {
        let dropped = self.frames.stats().dropped();
        if dropped != self.last_dropped {
            debug!(
                "{} input frames dropped on a full queue ({} total)",
                dropped - self.last_dropped,
                dropped
            );
            self.last_dropped = dropped;
        }
    }

    /// Encode every channel and send it, returning channels sent.
    ///
    /// `None` means the single-wire render failed and the cycle is aborted.
    fn transmit(&mut self) -> Option<usize> {
        for (buffer, wire) in self.buffers.iter().zip(self.wire.iter_mut()) {
            self.encoder.encode(buffer.active_pixels(), wire);
        }

        if !self.encoder.chip().is_spi() {
            return match self.output.render_single_wire(&self.wire) {
                Ok(()) => Some(self.wire.len()),
                Err(e) => {
                    error!("Single-wire render failed, cycle aborted: {}", e);
                    None
                }
            };
        }

        let mut sent = 0;
        for (channel, (buffer, wire)) in self.buffers.iter().zip(&self.wire).enumerate() {
            if buffer.active_leds() == 0 {
                continue;
            }
            match self.output.send_spi_channel(channel, wire.bytes()) {
                Ok(_) => sent += 1,
                Err(e) => error!("SPI send on channel {} failed: {}", channel, e),
            }
        }
        Some(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledmap_control::dmx::artnet;
    use ledmap_control::{frame_queue, BufferPool, Producer};
    use ledmap_core::{ChipType, Rgb};
    use ledmap_io::DryRunOutput;

    struct Harness {
        render: RenderLoop,
        frames: Producer<InputFrame>,
        routing: Producer<RoutingTable>,
        output: DryRunOutput,
        mode: OutputModeFlag,
        pool: BufferPool,
    }

    fn harness(chip: ChipType) -> Harness {
        let (frames, frames_rx) = frame_queue(32);
        let (routing, routing_rx) = frame_queue(2);
        let output = DryRunOutput::new();
        let mode = OutputModeFlag::new(chip);
        let render = RenderLoop::new(
            frames_rx,
            routing_rx,
            RoutingTable::new(vec![vec![0, 1], vec![2]]),
            ChannelBuffers::new(&[340, 170]),
            ChipEncoder::new(chip, None),
            mode.clone(),
            Box::new(output.clone()),
        );
        Harness {
            render,
            frames,
            routing,
            output,
            mode,
            pool: BufferPool::new(4, 1024),
        }
    }

    fn dmx(universe: u16, data: &[u8]) -> InputFrame {
        let mut frame = Frame::default();
        frame.fill_from(universe, data);
        InputFrame::Dmx(frame)
    }

    fn lm(pool: &BufferPool, payload: &[u8]) -> InputFrame {
        InputFrame::Lm(LmFrame::new(pool.try_acquire_copy(payload).unwrap()))
    }

    #[test]
    fn test_lm_two_pixels_on_channel_zero() {
        let mut h = harness(ChipType::Ws281x);
        let payload = [0x02, 0x00, 0xFF, 0xFF, 10, 20, 30, 40, 50, 60];
        h.frames.try_push(lm(&h.pool, &payload)).unwrap();

        let summary = h.render.run_cycle();
        assert_eq!(summary.pixels, 2);

        let ch0 = h.render.buffers().get(0).unwrap();
        assert_eq!(
            ch0.active_pixels(),
            &[Rgb::new(10, 20, 30), Rgb::new(40, 50, 60)]
        );
        let ch1 = h.render.buffers().get(1).unwrap();
        assert!(ch1.pixels().iter().all(|&p| p == Rgb::BLACK));

        let record = h.output.record();
        assert_eq!(record.single_wire[0], vec![0x000A_141E, 0x0028_323C]);
        // Buffer returned to the pool once merged
        assert_eq!(h.pool.available(), 4);
    }

    #[test]
    fn test_lm_oversize_channel_dropped() {
        let mut h = harness(ChipType::Ws281x);
        // Channel 1 has 170 LEDs allocated
        let mut payload = vec![0x01, 0x00, 0xC8, 0x00, 0xFF, 0xFF];
        payload.extend_from_slice(&[7; 3 * 201]);
        h.frames.try_push(lm(&h.pool, &payload)).unwrap();

        let summary = h.render.run_cycle();
        assert_eq!(summary.pixels, 1);
        assert_eq!(h.render.buffers().get(1).unwrap().pixels()[0], Rgb::BLACK);
    }

    #[test]
    fn test_dmx_routed_by_universe() {
        let mut h = harness(ChipType::Ws281x);
        h.frames.try_push(dmx(1, &[1, 2, 3])).unwrap();
        h.frames.try_push(dmx(2, &[4, 5, 6])).unwrap();
        h.frames.try_push(dmx(9, &[7, 8, 9])).unwrap();

        let summary = h.render.run_cycle();
        assert_eq!(summary.frames, 3);

        let buffers = h.render.buffers();
        assert_eq!(buffers.get(0).unwrap().pixels()[170], Rgb::new(1, 2, 3));
        assert_eq!(buffers.get(1).unwrap().pixels()[0], Rgb::new(4, 5, 6));
    }

    #[test]
    fn test_empty_queue_retransmits_unchanged() {
        let mut h = harness(ChipType::Ws281x);
        h.frames.try_push(dmx(0, &[9, 9, 9])).unwrap();
        h.render.run_cycle();
        let summary = h.render.run_cycle();

        assert_eq!(summary.frames, 0);
        assert_eq!(summary.channels_sent, 2);
        let record = h.output.record();
        assert_eq!(record.single_wire_renders, 2);
        assert_eq!(record.single_wire[0][0], 0x0009_0909);
    }

    #[test]
    fn test_burst_limit() {
        let mut h = harness(ChipType::Ws281x);
        for _ in 0..MAX_CHANNELS_IN + 3 {
            h.frames.try_push(dmx(0, &[1])).unwrap();
        }
        assert_eq!(h.render.run_cycle().frames, MAX_CHANNELS_IN);
        assert_eq!(h.render.run_cycle().frames, 3);
    }

    #[test]
    fn test_mode_change_switches_route() {
        let mut h = harness(ChipType::Ws281x);
        assert!(!h.render.run_cycle().route_switched);

        h.mode.store(ChipType::Sk9822);
        let summary = h.render.run_cycle();
        assert!(summary.route_switched);
        assert_eq!(summary.channels_sent, 2);

        let record = h.output.record();
        assert_eq!(record.route, Some(ChipType::Sk9822));
        assert_eq!(record.route_switches, 1);
        assert_eq!(record.spi[0].len(), (340 + 2) * 4);
        assert_eq!(record.spi[1].len(), (170 + 2) * 4);

        assert!(!h.render.run_cycle().route_switched);
    }

    #[test]
    fn test_spi_skips_empty_lm_channel() {
        let mut h = harness(ChipType::Sk9822);
        let payload = [0x01, 0x00, 0x00, 0x00, 0xFF, 0xFF, 1, 2, 3];
        h.frames.try_push(lm(&h.pool, &payload)).unwrap();

        let summary = h.render.run_cycle();
        assert_eq!(summary.channels_sent, 1);
        assert_eq!(h.render.buffers().get(1).unwrap().active_leds(), 0);

        let record = h.output.record();
        assert_eq!(record.spi_sends, 1);
        assert_eq!(record.spi[0].len(), (1 + 2) * 4);
    }

    #[test]
    fn test_single_wire_failure_aborts_cycle() {
        let mut h = harness(ChipType::Ws281x);
        h.output.set_fail_single_wire(true);
        let summary = h.render.run_cycle();
        assert!(summary.aborted);
        assert_eq!(summary.channels_sent, 0);

        h.output.set_fail_single_wire(false);
        assert!(!h.render.run_cycle().aborted);
    }

    #[test]
    fn test_routing_update_applied() {
        let mut h = harness(ChipType::Ws281x);
        h.routing
            .try_push(RoutingTable::new(vec![vec![], vec![5]]))
            .unwrap();
        h.frames.try_push(dmx(5, &[3, 3, 3])).unwrap();

        h.render.run_cycle();
        assert_eq!(h.render.routing().route(0), None);
        assert_eq!(
            h.render.buffers().get(1).unwrap().pixels()[0],
            Rgb::new(3, 3, 3)
        );
    }

    #[test]
    fn test_drop_counter_tracked() {
        let (frames, frames_rx) = frame_queue(1);
        let (_routing, routing_rx) = frame_queue(1);
        let mut render = RenderLoop::new(
            frames_rx,
            routing_rx,
            RoutingTable::default(),
            ChannelBuffers::new(&[1]),
            ChipEncoder::new(ChipType::P9813, None),
            OutputModeFlag::new(ChipType::P9813),
            Box::new(DryRunOutput::new()),
        );
        frames.try_push(dmx(0, &[])).unwrap();
        assert!(frames.try_push(dmx(0, &[])).is_err());

        render.run_cycle();
        assert_eq!(render.last_dropped, 1);
    }

    #[test]
    fn test_blank_sends_black() {
        let mut h = harness(ChipType::Lpd8806);
        h.frames.try_push(dmx(2, &[255, 255, 255])).unwrap();
        h.render.run_cycle();
        assert_eq!(h.output.record().spi[1][0], 0xFF);

        h.render.blank();
        let record = h.output.record();
        assert_eq!(&record.spi[1][..3], &[0x80, 0x80, 0x80]);
        assert!(h
            .render
            .buffers()
            .iter()
            .all(|b| b.pixels().iter().all(|&p| p == Rgb::BLACK)));
    }

    #[test]
    fn test_artnet_packet_through_render() {
        let mut h = harness(ChipType::Ws281x);
        let packet = artnet::build_dmx_packet(0, 1, &[0x11, 0x22, 0x33]);
        let Ok(Some(artnet::ArtNetPacket::Dmx { universe, data, .. })) = artnet::parse(&packet)
        else {
            panic!("not a Dmx packet");
        };
        h.frames.try_push(dmx(universe, data)).unwrap();
        h.render.run_cycle();
        assert_eq!(h.output.record().single_wire[0][0], 0x0011_2233);
    }
}
