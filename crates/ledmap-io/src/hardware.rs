//! `HardwareOutput` implementations
//!
//! [`LinuxOutput`] drives the LED shield through spidev, the single-wire
//! driver node and the sysfs GPIO multiplexer. [`DryRunOutput`] records what
//! would have been sent so the pipeline runs on any host.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ledmap_core::{ChipType, ChipWireBuffer, HardwareOutput, OutputSettings};

use crate::error::{IoError, Result};
use crate::gpio::RouteSwitcher;
use crate::single_wire::SingleWireDevice;
use crate::spi::SpiDevice;

/// LED shield output on Linux
#[derive(Debug)]
pub struct LinuxOutput {
    spi: Option<SpiDevice>,
    single_wire: Option<SingleWireDevice>,
    router: Option<RouteSwitcher>,
}

impl LinuxOutput {
    /// Open the devices described by `settings`.
    ///
    /// The device needed by the startup chip must open; the other one is
    /// optional and only logged when missing.
    pub fn open(settings: &OutputSettings) -> Result<Self> {
        let spi = SpiDevice::open(&settings.spi_device, settings.spi_speed_hz);
        let single_wire = SingleWireDevice::open(&settings.single_wire_device);

        let (spi, single_wire) = if settings.chip.is_spi() {
            (Some(spi?), optional(single_wire))
        } else {
            (optional(spi), Some(single_wire?))
        };

        let router = settings.gpio.as_ref().map(RouteSwitcher::new).transpose()?;
        let mut output = Self {
            spi,
            single_wire,
            router,
        };
        if let Some(router) = output.router.as_mut() {
            router.set_route(settings.chip)?;
        }
        Ok(output)
    }
}

fn optional<T>(device: Result<T>) -> Option<T> {
    match device {
        Ok(device) => Some(device),
        Err(e) => {
            tracing::warn!("{}; outputs needing it are disabled", e);
            None
        }
    }
}

impl HardwareOutput for LinuxOutput {
    fn render_single_wire(&mut self, channels: &[ChipWireBuffer]) -> ledmap_core::Result<()> {
        let device = self
            .single_wire
            .as_mut()
            .ok_or_else(|| IoError::NotAvailable("single-wire driver".into()))?;
        device.render(channels.iter().map(ChipWireBuffer::words))?;
        Ok(())
    }

    fn send_spi_channel(&mut self, channel: usize, wire: &[u8]) -> ledmap_core::Result<usize> {
        let device = self
            .spi
            .as_mut()
            .ok_or_else(|| IoError::NotAvailable("SPI device".into()))?;
        if let Some(router) = self.router.as_mut() {
            router.select_spi_channel(channel)?;
        }
        Ok(device.write_frame(wire)?)
    }

    fn switch_output_route(&mut self, chip: ChipType) -> ledmap_core::Result<()> {
        if let Some(router) = self.router.as_mut() {
            router.set_route(chip)?;
        }
        Ok(())
    }
}

/// What a [`DryRunOutput`] has been asked to send
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DryRunRecord {
    /// Last single-wire words per channel
    pub single_wire: Vec<Vec<u32>>,
    /// Last SPI stream per channel
    pub spi: Vec<Vec<u8>>,
    /// Last route requested
    pub route: Option<ChipType>,
    /// Single-wire renders accepted
    pub single_wire_renders: u64,
    /// SPI sends accepted
    pub spi_sends: u64,
    /// Route switches requested
    pub route_switches: u64,
}

/// Output that records instead of transmitting.
///
/// Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct DryRunOutput {
    record: Arc<Mutex<DryRunRecord>>,
    fail_single_wire: Arc<Mutex<bool>>,
}

impl DryRunOutput {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far
    pub fn record(&self) -> DryRunRecord {
        self.lock().clone()
    }

    /// Make single-wire renders fail, for exercising the abort path
    pub fn set_fail_single_wire(&self, fail: bool) {
        *self
            .fail_single_wire
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = fail;
    }

    fn lock(&self) -> MutexGuard<'_, DryRunRecord> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HardwareOutput for DryRunOutput {
    fn render_single_wire(&mut self, channels: &[ChipWireBuffer]) -> ledmap_core::Result<()> {
        if *self
            .fail_single_wire
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
        {
            return Err(IoError::NotAvailable("single-wire driver (dry run)".into()).into());
        }
        let mut record = self.lock();
        record.single_wire = channels.iter().map(|c| c.words().to_vec()).collect();
        record.single_wire_renders += 1;
        Ok(())
    }

    fn send_spi_channel(&mut self, channel: usize, wire: &[u8]) -> ledmap_core::Result<usize> {
        let mut record = self.lock();
        if record.spi.len() <= channel {
            record.spi.resize(channel + 1, Vec::new());
        }
        record.spi[channel] = wire.to_vec();
        record.spi_sends += 1;
        Ok(wire.len())
    }

    fn switch_output_route(&mut self, chip: ChipType) -> ledmap_core::Result<()> {
        let mut record = self.lock();
        record.route = Some(chip);
        record.route_switches += 1;
        tracing::debug!("Dry run route: {}", chip);
        Ok(())
    }
}
