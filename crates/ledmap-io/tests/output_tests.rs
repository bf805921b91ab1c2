//! Output path tests against a fake sysfs and dry-run recorder

use std::fs;
use std::path::Path;

use ledmap_core::{
    ChannelBuffers, ChipEncoder, ChipType, ChipWireBuffer, GpioSettings, HardwareOutput,
    OutputSettings, Rgb,
};
use ledmap_io::{DryRunOutput, LinuxOutput};

fn fake_sysfs(root: &Path, pins: &[u32]) {
    for pin in pins {
        let dir = root.join(format!("gpio{}", pin));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("direction"), "in").unwrap();
        fs::write(dir.join("value"), "0").unwrap();
    }
}

fn value(root: &Path, pin: u32) -> String {
    fs::read_to_string(root.join(format!("gpio{}", pin)).join("value")).unwrap()
}

#[test]
fn test_linux_output_routes_on_open_and_switch() {
    let dir = tempfile::tempdir().unwrap();
    let sysfs = dir.path().join("gpio");
    fake_sysfs(&sysfs, &[5, 6, 24]);
    let node = dir.path().join("ws281x");
    fs::write(&node, b"").unwrap();

    let settings = OutputSettings {
        chip: ChipType::Ws281x,
        spi_device: dir.path().join("spidev0.0"),
        single_wire_device: node,
        gpio: Some(GpioSettings {
            sysfs_root: sysfs.clone(),
            ..Default::default()
        }),
        ..Default::default()
    };

    let mut output = LinuxOutput::open(&settings).unwrap();
    assert_eq!(value(&sysfs, 5), "0");

    output.switch_output_route(ChipType::Lpd8806).unwrap();
    assert_eq!(value(&sysfs, 5), "1");
    assert_eq!(value(&sysfs, 6), "1");
}

#[test]
fn test_dry_run_spi_frames_per_channel() {
    let mut buffers = ChannelBuffers::new(&[4, 2]);
    buffers.write_run(0, 0, [Rgb::new(255, 0, 0); 4]);
    buffers.write_run(1, 0, [Rgb::new(0, 0, 255); 2]);

    let encoder = ChipEncoder::new(ChipType::Sk9822, None);
    let mut output = DryRunOutput::new();
    let mut wire = ChipWireBuffer::default();
    for (channel, buffer) in buffers.iter().enumerate() {
        encoder.encode(buffer.active_pixels(), &mut wire);
        output.send_spi_channel(channel, wire.bytes()).unwrap();
    }

    let record = output.record();
    assert_eq!(record.spi[0].len(), (4 + 2) * 4);
    assert_eq!(record.spi[1].len(), (2 + 2) * 4);
    assert_eq!(&record.spi[1][4..8], &[0xFF, 0xFF, 0x00, 0x00]);
}
