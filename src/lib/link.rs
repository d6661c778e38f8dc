//! Outbound half of the vehicle link.

use log::{debug, error};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use waynav_core::{Command, Emitter};

/// Writes each command as one line and flushes it.
///
/// Write errors are logged and otherwise dropped: the controller does not
/// wait for acknowledgments.
pub struct LineEmitter<W: Write> {
    writer: W,
    sent: usize,
}

impl<W: Write> LineEmitter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, sent: 0 }
    }

    /// Number of commands written successfully
    pub fn sent(&self) -> usize {
        self.sent
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line(&mut self, command: Command) -> io::Result<()> {
        writeln!(self.writer, "{}", command)?;
        self.writer.flush()
    }
}

impl<W: Write> Emitter for LineEmitter<W> {
    fn emit(&mut self, command: Command) {
        match self.write_line(command) {
            Ok(()) => {
                self.sent += 1;
                debug!("Sent {}", command);
            }
            Err(e) => error!("Failed to send {}: {}", command, e),
        }
    }
}

/// Open the write side of a serial device.
///
/// Line settings are left as they are, the port has to be configured beforehand.
pub fn open_device(path: &Path) -> io::Result<LineEmitter<Box<dyn Write + Send>>> {
    let file = OpenOptions::new().write(true).open(path)?;
    Ok(LineEmitter::new(Box::new(file)))
}

pub fn stdout() -> LineEmitter<Box<dyn Write + Send>> {
    LineEmitter::new(Box::new(io::stdout()))
}
