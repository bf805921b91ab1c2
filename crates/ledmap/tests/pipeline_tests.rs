//! End-to-end tests over loopback UDP with a dry-run output

use std::net::{Ipv4Addr, SocketAddr};
use std::thread;
use std::time::Duration;

use ledmap::app::core::{App, RunOptions};
use ledmap::app::loops::RenderLoop;
use ledmap_control::dmx::artnet;
use ledmap_control::lm::LM_MAX_PAYLOAD;
use ledmap_control::{
    frame_queue, BufferPool, Consumer, InputEndpoints, InputFrame, InputWorker, NodeInfo,
    PollSummary,
};
use ledmap_core::{
    AppConfig, ChannelBuffers, ChipEncoder, ChipType, DatagramSocket, InputConfig,
    OutputModeFlag, RoutingTable, Rgb,
};
use ledmap_io::{DryRunOutput, UdpEndpoint};

fn loopback(endpoint: &UdpEndpoint) -> SocketAddr {
    let port = endpoint.local_addr().unwrap().port();
    SocketAddr::from((Ipv4Addr::LOCALHOST, port))
}

/// Poll until something arrives or a second has passed
fn poll_until<F: FnMut() -> PollSummary>(mut poll: F, done: impl Fn(&PollSummary) -> bool) {
    for _ in 0..100 {
        if done(&poll()) {
            return;
        }
        thread::sleep(Duration::from_millis(10));
    }
    panic!("nothing received");
}

fn worker(
    config: InputConfig,
    socket: UdpEndpoint,
    reply_target: SocketAddr,
) -> (InputWorker, Consumer<InputFrame>) {
    let (frames_tx, frames_rx) = frame_queue(16);
    let (_config_tx, config_rx) = frame_queue(1);
    let lm_mode = matches!(config, InputConfig::Lm { .. });
    let socket: Box<dyn DatagramSocket> = Box::new(socket);
    let (artnet, lm) = if lm_mode {
        (None, Some(socket))
    } else {
        (Some(socket), None)
    };
    let endpoints = InputEndpoints {
        artnet,
        lm,
        reply_target,
        node: NodeInfo::new(Ipv4Addr::new(10, 0, 0, 2), [2, 0, 0, 0, 0, 1], "Loopback"),
    };
    let worker = InputWorker::new(
        config,
        config_rx,
        frames_tx,
        endpoints,
        BufferPool::new(4, LM_MAX_PAYLOAD),
        12,
    )
    .unwrap();
    (worker, frames_rx)
}

#[test]
fn test_poll_answered_once_per_universe() {
    let node = UdpEndpoint::bind(0, true).unwrap();
    let mut controller = UdpEndpoint::bind(0, false).unwrap();
    let node_addr = loopback(&node);
    let config = InputConfig::ArtNet {
        broadcast_name: String::new(),
        active_universes: vec![0x10, 0x23],
    };
    let (mut worker, _frames) = worker(config, node, loopback(&controller));

    controller
        .send_to(&artnet::build_poll_packet(), node_addr)
        .unwrap();
    poll_until(|| worker.poll_once(), |s| s.poll_replies == 2);

    let mut buf = [0u8; 512];
    let mut swout = Vec::new();
    for _ in 0..100 {
        match controller.recv_from(&mut buf).unwrap() {
            Some((n, _)) => {
                assert_eq!(n, artnet::POLL_REPLY_SIZE);
                swout.push(buf[190]);
            }
            None if swout.len() == 2 => break,
            None => thread::sleep(Duration::from_millis(10)),
        }
    }
    assert_eq!(swout, vec![0x00, 0x03]);
}

#[test]
fn test_lm_datagram_reaches_hardware() {
    let node = UdpEndpoint::bind(0, false).unwrap();
    let mut sender = UdpEndpoint::bind(0, false).unwrap();
    let node_addr = loopback(&node);
    let config = InputConfig::Lm {
        active_universes: vec![],
    };
    let (mut worker, frames) = worker(config, node, loopback(&sender));

    let payload = [0x02, 0x00, 0xFF, 0xFF, 255, 0, 0, 0, 0, 255];
    sender.send_to(&payload, node_addr).unwrap();
    poll_until(|| worker.poll_once(), |s| s.frames == 1);

    let output = DryRunOutput::new();
    let (_routing_tx, routing_rx) = frame_queue(1);
    let mut render = RenderLoop::new(
        frames,
        routing_rx,
        RoutingTable::default(),
        ChannelBuffers::new(&[16, 16]),
        ChipEncoder::new(ChipType::Ws281x, None),
        OutputModeFlag::new(ChipType::Ws281x),
        Box::new(output.clone()),
    );
    render.run_cycle();

    assert_eq!(
        render.buffers().get(0).unwrap().active_pixels(),
        &[Rgb::new(255, 0, 0), Rgb::new(0, 0, 255)]
    );
    let record = output.record();
    assert_eq!(record.single_wire[0], vec![0x00FF_0000, 0x0000_00FF]);
    assert_eq!(record.single_wire[1].len(), 16);
}

#[test]
fn test_dry_run_app_lifecycle() {
    let mut config = AppConfig::default();
    config.input.artnet_port = 0;
    config.input.lm_port = 0;
    config.input.strip_type_port = 0;
    config.logging.console_output = false;

    let mut app = App::new(
        config.clone(),
        RunOptions {
            config_path: None,
            dry_run: true,
        },
    )
    .unwrap();
    assert!(app.shutdown_token().is_running());

    config.input.active_universes = vec![3];
    app.apply(config.clone());
    assert_eq!(app.config(), &config);

    let token = app.shutdown_token();
    app.stop();
    assert!(!token.is_running());
}

#[test]
fn test_reload_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledmap.toml");

    let mut config = AppConfig::default();
    config.input.artnet_port = 0;
    config.input.lm_port = 0;
    config.input.strip_type_port = 0;
    config.logging.console_output = false;
    config.save(&path).unwrap();

    let mut app = App::new(
        config.clone(),
        RunOptions {
            config_path: Some(path.clone()),
            dry_run: true,
        },
    )
    .unwrap();

    config.input.active_universes = vec![7, 8];
    config.save(&path).unwrap();
    app.reload();
    assert_eq!(app.config(), &config);

    // An unreadable file keeps the running configuration
    std::fs::write(&path, "render_fps = \"fast\"").unwrap();
    app.reload();
    assert_eq!(app.config().input.active_universes, vec![7, 8]);

    app.stop();
}
