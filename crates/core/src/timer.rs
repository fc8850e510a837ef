/// One-shot deadline driven by clock readings the caller supplies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevealTimer {
    deadline: Option<u64>,
}

impl RevealTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any pending deadline.
    pub fn arm(&mut self, now_ms: u64, delay_ms: u64) {
        self.deadline = Some(now_ms.saturating_add(delay_ms));
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<u64> {
        self.deadline
    }

    pub fn fired(&self, now_ms: u64) -> bool {
        matches!(self.deadline, Some(deadline) if now_ms >= deadline)
    }

    pub fn remaining(&self, now_ms: u64) -> Option<u64> {
        self.deadline
            .map(|deadline| deadline.saturating_sub(now_ms))
    }
}
