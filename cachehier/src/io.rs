use std::fs::File;
use std::ops::Deref;
use std::path::Path;

use crate::error::Result;

/// The bytes of a trace file, either memory mapped or read into a buffer
pub enum TraceBytes {
    #[cfg(unix)]
    Mapped(memmap2::Mmap),
    Buffered(Vec<u8>),
}

impl Deref for TraceBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            #[cfg(unix)]
            TraceBytes::Mapped(m) => &m[..],
            TraceBytes::Buffered(b) => &b[..],
        }
    }
}

/// Opens a trace file for sequential reading
pub fn read_trace(path: impl AsRef<Path>) -> Result<TraceBytes> {
    let file = File::open(path)?;
    // Compatibility on other systems
    #[cfg(not(unix))]
    {
        use std::io::{BufReader, Read};
        // Keep reads aligned with the 40 byte records, 4096 is the standard block size (or a multiple of it) on most systems
        const BUFFER_SIZE: usize = 40 * 4096;
        let mut buf = Vec::new();
        BufReader::with_capacity(BUFFER_SIZE, file).read_to_end(&mut buf)?;
        Ok(TraceBytes::Buffered(buf))
    }
    // Memory map the file for speed on unix systems
    #[cfg(unix)]
    {
        use memmap2::{Advice, Mmap};
        // Mapping an empty file fails on some platforms
        if file.metadata()?.len() == 0 {
            return Ok(TraceBytes::Buffered(Vec::new()));
        }
        // Safety: the map is read only, and the trace is not expected to be modified while the
        // simulation runs
        let m = unsafe { Mmap::map(&file)? };
        m.advise(Advice::Sequential)?;
        Ok(TraceBytes::Mapped(m))
    }
}
