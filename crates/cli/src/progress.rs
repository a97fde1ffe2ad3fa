use wcdb::progress::ProgressSink;

/// Logs a phase's progress at info level in 10% steps.
#[derive(Default)]
pub struct LogProgress {
    label: String,
    total: u64,
    done: u64,
    next_decile: u64,
}

impl ProgressSink for LogProgress {
    fn start(&mut self, label: &str, total: u64) {
        self.label = label.to_string();
        self.total = total;
        self.done = 0;
        self.next_decile = 1;
        tracing::info!(phase = %self.label, total, "started");
    }

    fn advance(&mut self, delta: u64) {
        self.done = self.done.saturating_add(delta);
        if self.total == 0 {
            return;
        }
        while self.next_decile <= 9
            && u128::from(self.done) * 10 >= u128::from(self.total) * u128::from(self.next_decile)
        {
            tracing::info!(
                phase = %self.label,
                done = self.done,
                total = self.total,
                "{}%",
                self.next_decile * 10
            );
            self.next_decile += 1;
        }
    }

    fn finish(&mut self) {
        tracing::info!(phase = %self.label, done = self.done, "finished");
    }
}
