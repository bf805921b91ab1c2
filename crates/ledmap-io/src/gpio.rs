//! Sysfs GPIO and the LED shield's output multiplexer

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ledmap_core::{ChipType, GpioSettings};

use crate::error::{IoError, Result};

/// One exported output pin
#[derive(Debug, Clone)]
pub struct GpioPin {
    pin: u32,
    dir: PathBuf,
    level: Option<bool>,
}

impl GpioPin {
    /// Export `pin` under `sysfs_root` and configure it as an output
    pub fn output(sysfs_root: &Path, pin: u32) -> Result<Self> {
        let gpio_err = |source| IoError::Gpio { pin, source };
        let dir = sysfs_root.join(format!("gpio{}", pin));

        if !dir.exists() {
            fs::write(sysfs_root.join("export"), pin.to_string()).map_err(gpio_err)?;
            // udev needs a moment to fix permissions on the new node
            for _ in 0..10 {
                if dir.join("direction").exists() {
                    break;
                }
                std::thread::sleep(Duration::from_millis(10));
            }
        }
        fs::write(dir.join("direction"), "out").map_err(gpio_err)?;

        tracing::debug!("GPIO {} exported as output", pin);
        Ok(Self {
            pin,
            dir,
            level: None,
        })
    }

    /// Pin number
    pub fn pin(&self) -> u32 {
        self.pin
    }

    /// Drive the pin, skipping the write if the level is unchanged
    pub fn set(&mut self, high: bool) -> Result<()> {
        if self.level == Some(high) {
            return Ok(());
        }
        fs::write(self.dir.join("value"), if high { "1" } else { "0" })
            .map_err(|source| IoError::Gpio {
                pin: self.pin,
                source,
            })?;
        self.level = Some(high);
        Ok(())
    }

    /// Last level written
    pub fn level(&self) -> Option<bool> {
        self.level
    }
}

/// Routes the shield's outputs between the single-wire driver and SPI
#[derive(Debug)]
pub struct RouteSwitcher {
    single_wire_switch: Vec<GpioPin>,
    spi_select: GpioPin,
}

impl RouteSwitcher {
    /// Export the multiplexer pins
    pub fn new(settings: &GpioSettings) -> Result<Self> {
        let single_wire_switch = settings
            .single_wire_switch_pins
            .iter()
            .map(|&pin| GpioPin::output(&settings.sysfs_root, pin))
            .collect::<Result<Vec<_>>>()?;
        let spi_select = GpioPin::output(&settings.sysfs_root, settings.spi_select_pin)?;
        Ok(Self {
            single_wire_switch,
            spi_select,
        })
    }

    /// Switch pins low for the single-wire driver, high for SPI chips
    pub fn set_route(&mut self, chip: ChipType) -> Result<()> {
        let spi = chip.is_spi();
        for pin in &mut self.single_wire_switch {
            pin.set(spi)?;
        }
        tracing::info!(
            "Output routed to {}",
            if spi { "SPI" } else { "single-wire driver" }
        );
        Ok(())
    }

    /// Select the SPI channel (high = channel 0, low = channel 1)
    pub fn select_spi_channel(&mut self, channel: usize) -> Result<()> {
        self.spi_select.set(channel == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_sysfs(pins: &[u32]) -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        for pin in pins {
            let dir = root.path().join(format!("gpio{}", pin));
            fs::create_dir(&dir).unwrap();
            fs::write(dir.join("direction"), "in").unwrap();
            fs::write(dir.join("value"), "0").unwrap();
        }
        root
    }

    fn read(root: &Path, pin: u32, file: &str) -> String {
        fs::read_to_string(root.join(format!("gpio{}", pin)).join(file)).unwrap()
    }

    #[test]
    fn test_pin_output_and_set() {
        let root = fake_sysfs(&[17]);
        let mut pin = GpioPin::output(root.path(), 17).unwrap();
        assert_eq!(read(root.path(), 17, "direction"), "out");

        pin.set(true).unwrap();
        assert_eq!(read(root.path(), 17, "value"), "1");
        assert_eq!(pin.level(), Some(true));
    }

    #[test]
    fn test_missing_pin_exports() {
        let root = tempfile::tempdir().unwrap();
        // Export succeeds (plain file) but no gpio dir appears
        let err = GpioPin::output(root.path(), 4).unwrap_err();
        assert!(matches!(err, IoError::Gpio { pin: 4, .. }));
        assert_eq!(fs::read_to_string(root.path().join("export")).unwrap(), "4");
    }

    #[test]
    fn test_route_switching() {
        let root = fake_sysfs(&[5, 6, 24]);
        let settings = GpioSettings {
            sysfs_root: root.path().to_path_buf(),
            ..Default::default()
        };
        let mut switcher = RouteSwitcher::new(&settings).unwrap();

        switcher.set_route(ChipType::Sk9822).unwrap();
        assert_eq!(read(root.path(), 5, "value"), "1");
        assert_eq!(read(root.path(), 6, "value"), "1");

        switcher.set_route(ChipType::Ws281x).unwrap();
        assert_eq!(read(root.path(), 5, "value"), "0");
        assert_eq!(read(root.path(), 6, "value"), "0");

        switcher.select_spi_channel(0).unwrap();
        assert_eq!(read(root.path(), 24, "value"), "1");
        switcher.select_spi_channel(1).unwrap();
        assert_eq!(read(root.path(), 24, "value"), "0");
    }
}
