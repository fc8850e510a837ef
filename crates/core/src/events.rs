use crate::{GoalCategory, SpinCue, WearCode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Event {
    OpenRequested {
        case_id: String,
    },
    OpenRejected {
        case_id: String,
        reason: String,
    },
    FundsWithdrawn {
        case_id: String,
        price: f64,
        balance: f64,
    },
    RollStarted {
        case_id: String,
        strip_length: usize,
        winner_index: usize,
        duration_ms: u64,
    },
    RollSkipped {
        remaining_ms: u64,
    },
    Settled {
        case_id: String,
        item: String,
        rarity: String,
        wear: WearCode,
        price: f64,
        cue: SpinCue,
    },
    ExperienceGained {
        amount: u64,
        total: u64,
    },
    LevelUp {
        level: u32,
    },
    GoalCompleted {
        id: String,
        category: GoalCategory,
    },
    ItemsSold {
        count: u32,
    },
}

#[derive(Debug, Default)]
pub struct EventBus {
    queue: Vec<Event>,
}

impl EventBus {
    pub fn push(&mut self, event: Event) {
        self.queue.push(event);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = Event> + '_ {
        self.queue.drain(..)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
