/// Server-authoritative session countdown
#[derive(Debug, Clone)]
pub struct GameClock {
    remaining: f32,
    announced: u32,
}

impl GameClock {
    pub fn new(duration_secs: f32) -> Self {
        let remaining = duration_secs.max(0.0);
        Self {
            remaining,
            announced: remaining.ceil() as u32,
        }
    }

    /// Counts down by `dt` seconds. Returns the whole seconds left whenever that number changes.
    pub fn tick(&mut self, dt: f32) -> Option<u32> {
        if self.remaining > 0.0 {
            self.remaining = (self.remaining - dt).max(0.0);
        }

        let secs = self.remaining_secs();
        if secs != self.announced {
            self.announced = secs;
            Some(secs)
        } else {
            None
        }
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining.ceil() as u32
    }

    pub fn is_finished(&self) -> bool {
        self.remaining <= 0.0
    }
}
