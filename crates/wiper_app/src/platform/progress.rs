use std::io::{self, Write};
use std::sync::mpsc;
use std::thread;

use wiper_engine::EngineEvent;

const BAR_WIDTH: u32 = 40;
const FILLED: char = '\u{2588}';
const EMPTY: char = '\u{2591}';

/// Turns engine events into a single, redrawn terminal status line.
#[derive(Debug, Clone, Default)]
pub struct ProgressLine {
    limit: Option<u32>,
    processed: u32,
    failed: u32,
}

impl ProgressLine {
    pub fn new(limit: Option<u32>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// The line to redraw, when the event changed it.
    pub fn apply(&mut self, event: &EngineEvent) -> Option<String> {
        match event {
            EngineEvent::MessageFinished(report) => {
                if report.succeeded() {
                    self.processed += 1;
                } else {
                    self.failed += 1;
                }
                Some(self.render())
            }
            EngineEvent::RunFinished(summary) => {
                self.processed = summary.processed;
                self.failed = summary.failed;
                Some(self.render())
            }
            EngineEvent::BatchScanned { .. } | EngineEvent::Paginated { .. } => None,
        }
    }

    pub fn render(&self) -> String {
        match self.limit {
            Some(limit) => {
                let done = self.processed.min(limit);
                let filled = if limit == 0 {
                    0
                } else {
                    // Widened so large limits cannot overflow.
                    (u64::from(done) * u64::from(BAR_WIDTH) / u64::from(limit)) as u32
                };
                let bar: String = std::iter::repeat(FILLED)
                    .take(filled as usize)
                    .chain(std::iter::repeat(EMPTY).take((BAR_WIDTH - filled) as usize))
                    .collect();
                format!(
                    "Progress |{bar}| {}/{} messages wiped & deleted",
                    self.processed, limit
                )
            }
            None => format!(
                "{} messages wiped & deleted, {} failed",
                self.processed, self.failed
            ),
        }
    }
}

/// Draw progress on stdout until the engine drops its sender.
pub fn spawn_renderer(rx: mpsc::Receiver<EngineEvent>, limit: Option<u32>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut line = ProgressLine::new(limit);
        let mut stdout = io::stdout();
        for event in rx {
            let finished = matches!(event, EngineEvent::RunFinished(_));
            if let Some(text) = line.apply(&event) {
                let _ = write!(stdout, "\r{text}");
                if finished {
                    let _ = writeln!(stdout);
                }
                let _ = stdout.flush();
            }
        }
    })
}
