//! Linux spidev output
//!
//! The device is opened write-only and configured for mode 0, 8 bit words at
//! the requested clock. Large frames are written in chunks; the kernel
//! rejects transfers above its `bufsiz` with `EMSGSIZE`, in which case the
//! chunk size is halved and the write retried.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use nix::errno::Errno;

use crate::error::{IoError, Result};

/// Initial chunk size, the default spidev `bufsiz`
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

const SPI_MODE_0: u8 = 0;
const BITS_PER_WORD: u8 = 8;

mod ioctl {
    const SPI_IOC_MAGIC: u8 = b'k';

    nix::ioctl_write_ptr!(spi_write_mode, SPI_IOC_MAGIC, 1, u8);
    nix::ioctl_write_ptr!(spi_write_bits_per_word, SPI_IOC_MAGIC, 3, u8);
    nix::ioctl_write_ptr!(spi_write_max_speed_hz, SPI_IOC_MAGIC, 4, u32);
}

/// An open spidev device
#[derive(Debug)]
pub struct SpiDevice {
    file: File,
    path: PathBuf,
    chunk_size: usize,
}

impl SpiDevice {
    /// Open and configure a spidev node
    pub fn open(path: &Path, speed_hz: u32) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|source| IoError::Device {
                path: path.to_path_buf(),
                source,
            })?;

        let fd = file.as_raw_fd();
        // SAFETY: fd is an open spidev descriptor and each pointer refers to a
        // live value of the type the request expects.
        unsafe {
            ioctl::spi_write_mode(fd, &SPI_MODE_0)?;
            ioctl::spi_write_bits_per_word(fd, &BITS_PER_WORD)?;
            ioctl::spi_write_max_speed_hz(fd, &speed_hz)?;
        }

        tracing::info!("Opened SPI device {:?} at {} Hz", path, speed_hz);
        Ok(Self {
            file,
            path: path.to_path_buf(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        })
    }

    /// Device path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a whole frame, returning bytes written.
    ///
    /// A chunk size reduced by `EMSGSIZE` is remembered for later frames.
    pub fn write_frame(&mut self, data: &[u8]) -> io::Result<usize> {
        write_chunked(&mut self.file, data, &mut self.chunk_size)
    }
}

/// Write `data` in chunks of at most `chunk_size` bytes.
///
/// Retries on `EINTR`, halves `chunk_size` on `EMSGSIZE` and fails once a
/// single byte is rejected.
pub fn write_chunked<W: Write>(out: &mut W, data: &[u8], chunk_size: &mut usize) -> io::Result<usize> {
    *chunk_size = (*chunk_size).max(1);
    let mut written = 0;

    while written < data.len() {
        let end = (written + *chunk_size).min(data.len());
        match out.write(&data[written..end]) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "SPI device accepted no data",
                ))
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if e.raw_os_error() == Some(Errno::EMSGSIZE as i32) && *chunk_size > 1 => {
                *chunk_size /= 2;
                tracing::debug!("SPI transfer too large, chunk size now {}", chunk_size);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(written)
}
