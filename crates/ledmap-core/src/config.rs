//! Application and input configuration
//!
//! Everything is loaded from a single TOML file. Every field has a default
//! so an empty (or missing) file describes the stock two-channel shield.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::chip::ChipType;
use crate::color::GammaTable;
use crate::error::{CoreError, Result};
use crate::frame::{MAX_OUTPUT_CHANNELS, MAX_UNIVERSES_PER_OUTPUT};
use crate::logging::LogConfig;
use crate::routing::RoutingTable;

/// ArtNet UDP port
pub const ARTNET_PORT: u16 = 6454;
/// LM UDP port
pub const LM_PORT: u16 = 3001;
/// Strip-type UDP port
pub const STRIP_TYPE_PORT: u16 = 3002;
/// LEDs per channel for single-wire strips
pub const LED_COUNT_SINGLE_WIRE: usize = 1020;
/// Largest LED count a channel may allocate (SPI strips)
pub const LED_COUNT_SPI: usize = 2000;
/// Universes answered in PollReply when none are configured
pub const DEFAULT_POLL_UNIVERSES: [u16; 2] = [0, 1];

/// Input protocol selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// ArtNet on UDP 6454
    #[default]
    ArtNet,
    /// LM protocol on UDP 3001
    Lm,
}

impl std::fmt::Display for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputMode::ArtNet => write!(f, "artnet"),
            InputMode::Lm => write!(f, "lm"),
        }
    }
}

/// What the input thread listens to and answers for.
///
/// Immutable once delivered; replaced wholesale on update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputConfig {
    /// ArtNet input
    ArtNet {
        /// Long name advertised in PollReply
        broadcast_name: String,
        /// Universes acted on (empty = all)
        active_universes: Vec<u16>,
    },
    /// LM input
    Lm {
        /// Universes acted on (empty = all)
        active_universes: Vec<u16>,
    },
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig::ArtNet {
            broadcast_name: String::new(),
            active_universes: Vec::new(),
        }
    }
}

impl InputConfig {
    /// Input protocol
    pub fn mode(&self) -> InputMode {
        match self {
            InputConfig::ArtNet { .. } => InputMode::ArtNet,
            InputConfig::Lm { .. } => InputMode::Lm,
        }
    }

    /// Configured active universes
    pub fn active_universes(&self) -> &[u16] {
        match self {
            InputConfig::ArtNet {
                active_universes, ..
            }
            | InputConfig::Lm { active_universes } => active_universes,
        }
    }

    /// Check if frames for `universe` should be forwarded.
    ///
    /// An empty active set accepts every universe.
    pub fn accepts(&self, universe: u16) -> bool {
        let active = self.active_universes();
        active.is_empty() || active.contains(&universe)
    }

    /// Universes advertised in PollReply
    pub fn poll_universes(&self) -> Vec<u16> {
        match self.active_universes() {
            [] => DEFAULT_POLL_UNIVERSES.to_vec(),
            active => active.to_vec(),
        }
    }

    /// Broadcast name, empty for LM input
    pub fn broadcast_name(&self) -> &str {
        match self {
            InputConfig::ArtNet { broadcast_name, .. } => broadcast_name,
            InputConfig::Lm { .. } => "",
        }
    }
}

/// Input side settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    /// Input protocol
    pub mode: InputMode,
    /// Long name advertised in PollReply
    pub broadcast_name: String,
    /// Universes acted on (empty = all)
    pub active_universes: Vec<u16>,
    /// ArtNet UDP port
    pub artnet_port: u16,
    /// LM UDP port
    pub lm_port: u16,
    /// Strip-type UDP port
    pub strip_type_port: u16,
    /// Socket poll rate of the input thread
    pub poll_fps: u32,
    /// Frame queue capacity
    pub queue_capacity: usize,
    /// Maximum datagrams read per poll cycle
    pub max_frames_per_poll: usize,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            mode: InputMode::ArtNet,
            broadcast_name: String::new(),
            active_universes: Vec::new(),
            artnet_port: ARTNET_PORT,
            lm_port: LM_PORT,
            strip_type_port: STRIP_TYPE_PORT,
            poll_fps: 120,
            queue_capacity: 64,
            max_frames_per_poll: 12,
        }
    }
}

/// Per-channel gamma exponents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GammaSettings {
    /// Red exponent
    pub red: f64,
    /// Green exponent
    pub green: f64,
    /// Blue exponent
    pub blue: f64,
}

impl Default for GammaSettings {
    fn default() -> Self {
        Self {
            red: 2.2,
            green: 2.2,
            blue: 2.2,
        }
    }
}

/// One physical output channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSettings {
    /// Allocated LED count
    pub leds: usize,
    /// Universes routed to this channel, in pixel order
    #[serde(default)]
    pub universes: Vec<u16>,
}

/// Sysfs GPIO settings for the output multiplexer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpioSettings {
    /// Sysfs GPIO root
    pub sysfs_root: PathBuf,
    /// Pins that route the outputs to the single-wire driver (low) or SPI (high)
    pub single_wire_switch_pins: Vec<u32>,
    /// Pin selecting the SPI channel (high = channel 0)
    pub spi_select_pin: u32,
}

impl Default for GpioSettings {
    fn default() -> Self {
        Self {
            sysfs_root: PathBuf::from("/sys/class/gpio"),
            single_wire_switch_pins: vec![5, 6],
            spi_select_pin: 24,
        }
    }
}

/// Output side settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Chip family at startup
    pub chip: ChipType,
    /// Spidev device node
    pub spi_device: PathBuf,
    /// SPI clock in Hz
    pub spi_speed_hz: u32,
    /// Device node of the single-wire driver
    pub single_wire_device: PathBuf,
    /// Optional gamma correction
    pub gamma: Option<GammaSettings>,
    /// Output channels
    pub channels: Vec<ChannelSettings>,
    /// Output multiplexer pins; `None` leaves routing to the board defaults
    pub gpio: Option<GpioSettings>,
}

impl Default for OutputSettings {
    fn default() -> Self {
        let per_channel = MAX_UNIVERSES_PER_OUTPUT as u16;
        let channels = (0..MAX_OUTPUT_CHANNELS as u16)
            .map(|c| ChannelSettings {
                leds: LED_COUNT_SINGLE_WIRE,
                universes: (c * per_channel..(c + 1) * per_channel).collect(),
            })
            .collect();
        Self {
            chip: ChipType::Ws281x,
            spi_device: PathBuf::from("/dev/spidev0.0"),
            spi_speed_hz: 3_906_250,
            single_wire_device: PathBuf::from("/dev/ws281x"),
            gamma: None,
            channels,
            gpio: Some(GpioSettings::default()),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Render loop rate
    pub render_fps: u32,
    /// Network input
    pub input: InputSettings,
    /// LED output
    pub output: OutputSettings,
    /// Logging
    pub logging: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            render_fps: 60,
            input: InputSettings::default(),
            output: OutputSettings::default(),
            logging: LogConfig::default(),
        }
    }
}

impl AppConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        config.validate()?;
        tracing::debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Write the configuration to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.render_fps == 0 {
            return Err(CoreError::InvalidConfig("render_fps must be > 0".into()));
        }
        if self.input.poll_fps == 0 {
            return Err(CoreError::InvalidConfig("input.poll_fps must be > 0".into()));
        }
        if self.input.queue_capacity == 0 {
            return Err(CoreError::InvalidConfig(
                "input.queue_capacity must be > 0".into(),
            ));
        }
        if self.output.channels.len() > MAX_OUTPUT_CHANNELS {
            return Err(CoreError::InvalidConfig(format!(
                "{} output channels configured, at most {} supported",
                self.output.channels.len(),
                MAX_OUTPUT_CHANNELS
            )));
        }
        if let Some(i) = self.output.channels.iter().position(|c| c.leds == 0) {
            return Err(CoreError::InvalidConfig(format!(
                "output channel {} has no LEDs",
                i
            )));
        }
        if let Some(i) = self
            .output
            .channels
            .iter()
            .position(|c| c.leds > LED_COUNT_SPI)
        {
            return Err(CoreError::InvalidConfig(format!(
                "output channel {} allocates more than {} LEDs",
                i, LED_COUNT_SPI
            )));
        }
        if let Some(gamma) = &self.output.gamma {
            for (name, value) in [
                ("red", gamma.red),
                ("green", gamma.green),
                ("blue", gamma.blue),
            ] {
                if !(value > 0.0 && value <= 10.0) {
                    return Err(CoreError::InvalidConfig(format!(
                        "gamma.{} = {} is outside (0, 10]",
                        name, value
                    )));
                }
            }
        }
        Ok(())
    }

    /// Input thread configuration
    pub fn input_config(&self) -> InputConfig {
        let active_universes = self.input.active_universes.clone();
        match self.input.mode {
            InputMode::ArtNet => InputConfig::ArtNet {
                broadcast_name: self.input.broadcast_name.clone(),
                active_universes,
            },
            InputMode::Lm => InputConfig::Lm { active_universes },
        }
    }

    /// Universe routing derived from the channel list
    pub fn routing_table(&self) -> RoutingTable {
        RoutingTable::new(
            self.output
                .channels
                .iter()
                .map(|c| c.universes.clone())
                .collect(),
        )
    }

    /// Allocated LED count per channel
    pub fn led_counts(&self) -> Vec<usize> {
        self.output.channels.iter().map(|c| c.leds).collect()
    }

    /// Precomputed gamma tables, if enabled
    pub fn gamma_table(&self) -> Option<GammaTable> {
        self.output
            .gamma
            .map(|g| GammaTable::new(g.red, g.green, g.blue))
    }
}
