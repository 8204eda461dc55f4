//! Read/write deadlines of the underlying stream.

use std::io::Result;
use std::net::TcpStream;
use std::time::Duration;

/// Deadline control over a byte stream.
///
/// A deadline bounds how long a single read or write may block.
/// Expiry surfaces as an io error from the pending operation and the
/// connection is not usable afterwards. `None` removes the bound.
pub trait Deadline {
    /// Bound the blocking time of reads.
    fn set_read_deadline(&mut self, timeout: Option<Duration>) -> Result<()>;

    /// Bound the blocking time of writes.
    fn set_write_deadline(&mut self, timeout: Option<Duration>) -> Result<()>;

    /// Bound both directions at once.
    fn set_deadline(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.set_read_deadline(timeout)?;
        self.set_write_deadline(timeout)
    }
}

impl Deadline for TcpStream {
    fn set_read_deadline(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.set_read_timeout(timeout)
    }

    fn set_write_deadline(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.set_write_timeout(timeout)
    }
}

impl<T: Deadline + ?Sized> Deadline for &mut T {
    fn set_read_deadline(&mut self, timeout: Option<Duration>) -> Result<()> {
        (**self).set_read_deadline(timeout)
    }

    fn set_write_deadline(&mut self, timeout: Option<Duration>) -> Result<()> {
        (**self).set_write_deadline(timeout)
    }
}
