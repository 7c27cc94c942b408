use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::components::boss::BossSnapshot;

/// Writes the authority's snapshots as JSON lines, one per broadcast, so a
/// fight can be inspected or replayed into an observer later.
pub struct Recorder<W: Write = BufWriter<File>> {
    out: W,
    lines: usize,
}

#[derive(Serialize)]
struct Line<'a> {
    tick: u64,
    snapshot: &'a BossSnapshot,
}

impl Recorder {
    pub fn create(path: &Path) -> io::Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let file = File::create(path)?;
        tracing::info!(path = %path.display(), "recording snapshots");
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> Recorder<W> {
    pub fn new(out: W) -> Self {
        Self { out, lines: 0 }
    }

    pub fn record(&mut self, tick: u64, snapshot: &BossSnapshot) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, &Line { tick, snapshot })?;
        self.out.write_all(b"\n")?;
        self.lines += 1;
        Ok(())
    }

    /// Flush and hand back the writer along with how many lines went out.
    pub fn finish(mut self) -> io::Result<(W, usize)> {
        self.out.flush()?;
        tracing::info!(lines = self.lines, "recording finished");
        Ok((self.out, self.lines))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::arena::{spawn_fight, ArenaSetup};

    #[test]
    fn writes_one_json_line_per_snapshot() {
        let peer = spawn_fight(ArenaSetup::default()).unwrap();
        let mut recorder = Recorder::new(Vec::new());
        recorder.record(1, &peer.snapshot()).unwrap();
        recorder.record(2, &peer.snapshot()).unwrap();
        let (bytes, lines) = recorder.finish().unwrap();
        assert_eq!(lines, 2);

        let text = String::from_utf8(bytes).unwrap();
        let parsed: Vec<serde_json::Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1]["tick"], 2);
        assert_eq!(parsed[0]["snapshot"]["state"], "Awaken");
    }
}
