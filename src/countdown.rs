//! Countdown before capture: `Idle -> Counting(n) -> Idle`.

/// Countdown state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Countdown {
    #[default]
    Idle,
    Counting(u32),
}

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Still counting, value is what to display next
    Continue(u32),
    /// Countdown finished, take the photo now
    Fire,
    /// Tick arrived while idle
    Ignored,
}

impl Countdown {
    pub fn is_idle(&self) -> bool {
        matches!(self, Countdown::Idle)
    }

    /// Current display value, if counting
    pub fn value(&self) -> Option<u32> {
        match self {
            Countdown::Counting(n) => Some(*n),
            Countdown::Idle => None,
        }
    }

    /// Start counting down from `from`. Only valid while idle.
    pub fn start(&mut self, from: u32) -> bool {
        if !self.is_idle() {
            return false;
        }
        *self = Countdown::Counting(from.max(1));
        true
    }

    /// Advance by one second
    pub fn tick(&mut self) -> Tick {
        match *self {
            Countdown::Idle => Tick::Ignored,
            Countdown::Counting(n) if n <= 1 => {
                *self = Countdown::Idle;
                Tick::Fire
            }
            Countdown::Counting(n) => {
                *self = Countdown::Counting(n - 1);
                Tick::Continue(n - 1)
            }
        }
    }

    /// Abort without firing. Returns whether a countdown was running.
    pub fn cancel(&mut self) -> bool {
        let was_counting = !self.is_idle();
        *self = Countdown::Idle;
        was_counting
    }
}
