//! Single-wire LED driver device node
//!
//! The driver accepts one record per channel per render:
//! `[u16 LE channel][u16 LE led count][u32 LE 0x00RRGGBB per LED]`.
//! It owns the pulse timing; this side only hands over the colors.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{IoError, Result};

/// An open single-wire driver node
#[derive(Debug)]
pub struct SingleWireDevice {
    file: File,
    path: PathBuf,
    scratch: Vec<u8>,
}

impl SingleWireDevice {
    /// Open the driver node for writing
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|source| IoError::Device {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::info!("Opened single-wire driver {:?}", path);
        Ok(Self {
            file,
            path: path.to_path_buf(),
            scratch: Vec::new(),
        })
    }

    /// Device path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Render every channel in one write
    pub fn render<'a, I>(&mut self, channels: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a [u32]>,
    {
        encode_records(channels, &mut self.scratch);
        self.file
            .write_all(&self.scratch)
            .map_err(|source| IoError::Device {
                path: self.path.clone(),
                source,
            })
    }
}

/// Serialize channel records into `out`
pub fn encode_records<'a, I>(channels: I, out: &mut Vec<u8>)
where
    I: IntoIterator<Item = &'a [u32]>,
{
    out.clear();
    for (channel, words) in channels.into_iter().enumerate() {
        let count = words.len().min(u16::MAX as usize);
        out.extend_from_slice(&(channel as u16).to_le_bytes());
        out.extend_from_slice(&(count as u16).to_le_bytes());
        for word in &words[..count] {
            out.extend_from_slice(&word.to_le_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_layout() {
        let ch0: &[u32] = &[0x00FF_0000];
        let ch1: &[u32] = &[0x0000_00FF, 0x0001_0203];
        let mut out = Vec::new();
        encode_records([ch0, ch1], &mut out);

        assert_eq!(&out[..4], &[0, 0, 1, 0]);
        assert_eq!(&out[4..8], &[0x00, 0x00, 0xFF, 0x00]);
        assert_eq!(&out[8..12], &[1, 0, 2, 0]);
        assert_eq!(&out[12..16], &[0xFF, 0, 0, 0]);
        assert_eq!(&out[16..20], &[0x03, 0x02, 0x01, 0x00]);
    }

    #[test]
    fn test_render_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ws281x");
        std::fs::write(&path, b"").unwrap();

        let mut device = SingleWireDevice::open(&path).unwrap();
        let words: &[u32] = &[1, 2];
        device.render([words]).unwrap();

        assert_eq!(std::fs::read(&path).unwrap().len(), 4 + 8);
    }

    #[test]
    fn test_open_missing() {
        assert!(SingleWireDevice::open(Path::new("/nonexistent/ws281x")).is_err());
    }
}
