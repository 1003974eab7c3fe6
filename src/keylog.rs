use std::io::{self, Write};
use std::sync::Mutex;

use rustc_serialize::hex::ToHex;

use crate::report::Probability;

struct KeyLogState {
    out: Box<dyn Write + Send>,
    lowest: Option<f64>,
    highest: Option<f64>,
}

/*
Per-key diagnostic lines shared by all workers.
A line is written while holding the lock so lines from different workers never interleave.
*/
pub struct KeyLog {
    state: Mutex<KeyLogState>,
}

impl KeyLog {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            state: Mutex::new(KeyLogState {
                out,
                lowest: None,
                highest: None,
            }),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    pub fn record(&self, key: &[u8], returned: u64, trials: u64) -> io::Result<()> {
        let probability = Probability::estimate(returned as f64, trials as f64);
        let log2 = probability.log2();

        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "key log poisoned"))?;
        state.lowest = Some(state.lowest.map_or(log2, |l| l.min(log2)));
        state.highest = Some(state.highest.map_or(log2, |h| h.max(log2)));
        writeln!(
            state.out,
            "key: {}: {} ({}/{})",
            key.to_hex(),
            probability.short(),
            returned,
            trials
        )
    }

    /// Lowest and highest per-key log2 probability seen so far.
    pub fn range(&self) -> Option<(f64, f64)> {
        let state = self.state.lock().ok()?;
        Some((state.lowest?, state.highest?))
    }

    pub fn flush(&self) -> io::Result<()> {
        match self.state.lock() {
            Ok(mut state) => state.out.flush(),
            Err(_) => Err(io::Error::new(io::ErrorKind::Other, "key log poisoned")),
        }
    }
}

/* In-memory sink that stays readable after being handed to a KeyLog. */
#[cfg(test)]
#[derive(Clone, Default)]
pub struct Shared(std::sync::Arc<Mutex<Vec<u8>>>);

#[cfg(test)]
impl Shared {
    pub fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

#[cfg(test)]
impl Write for Shared {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
