//! Step budget

/// Bounds the number of model → tools round-trips in one run.
///
/// One round-trip of slack is reserved: the last permitted model call is
/// the one made when `step_count >= max_steps - 1`, so a forced-stop answer
/// can still be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepBudget {
    max_steps: u32,
    step_count: u32,
}

impl StepBudget {
    pub fn new(max_steps: u32) -> Self {
        Self {
            max_steps,
            step_count: 0,
        }
    }

    pub fn max_steps(&self) -> u32 {
        self.max_steps
    }

    pub fn step_count(&self) -> u32 {
        self.step_count
    }

    pub fn is_last_step(&self) -> bool {
        self.step_count >= self.max_steps.saturating_sub(1)
    }

    /// Record one completed tool dispatch
    pub fn advance(&mut self) {
        self.step_count += 1;
    }
}
