use std::fs::File;
use std::io::BufRead;
use std::path::Path;

/// Opens a trace file for sequential reading
pub fn open_trace(path: &Path) -> Result<impl BufRead, String> {
    let file = File::open(path).map_err(|e| format!("Couldn't open the trace file at path {}: {e}", path.display()))?;
    get_reader(file)
}

pub fn get_reader(file: File) -> Result<impl BufRead, String> {
    // Compatibility on other systems
    #[cfg(not(unix))]
    {
        use std::io::BufReader;
        // Traces are a few hundred MB of short lines, read them in large chunks
        const BUFFER_SIZE: usize = 64 * 4096;
        Ok(BufReader::with_capacity(BUFFER_SIZE, file))
    }
    // Memory map the file for speed on unix systems
    #[cfg(unix)]
    {
        use std::io::Cursor;
        use memmap2::{Advice, Mmap};
        // The simulator never writes the trace and reads it front to back exactly once
        unsafe {
            let m = Mmap::map(&file).map_err(|e| format!("Couldn't memory map the file: {e}"))?;
            m.advise(Advice::Sequential).map_err(|e| format!("Failed to provide access advice to the OS, {e}"))?;
            Ok(Cursor::new(m))
        }
    }
}
