//! Page transitions.
//!
//! A transition moves through `Idle -> Entering -> Settling -> Idle`. Each one gets a new
//! generation number; callbacks carry the generation they were scheduled for, so a callback
//! from an earlier transition is ignored once a newer one has begun.

use crate::events::ListenerId;
use crate::id::SurfaceId;
use crate::scheduler::TimerHandle;

/// Where a stack transition is at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing is animating.
    Idle,
    /// The incoming page has been inserted with its start class.
    Entering,
    /// Classes have been swapped; waiting for the host to finish or the timeout.
    Settling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Forward,
    Backward,
    None,
}

impl Direction {
    pub fn between(index: usize, last_index: usize) -> Direction {
        if index > last_index {
            Direction::Forward
        } else if index < last_index {
            Direction::Backward
        } else {
            Direction::None
        }
    }

    /// Class the incoming page starts out with.
    pub fn incoming_class(self) -> Option<&'static str> {
        match self {
            Direction::Forward => Some("next"),
            Direction::Backward => Some("prev"),
            Direction::None => None,
        }
    }

    /// Class the outgoing page moves to.
    pub fn outgoing_class(self) -> Option<&'static str> {
        match self {
            Direction::Forward => Some("prev"),
            Direction::Backward => Some("next"),
            Direction::None => None,
        }
    }
}

/// What needs undoing once a transition ends.
#[derive(Debug)]
pub(crate) struct Settled {
    pub incoming: Option<SurfaceId>,
    pub outgoing: Option<SurfaceId>,
    pub timer: Option<TimerHandle>,
    pub listener: Option<ListenerId>,
}

#[derive(Debug)]
pub(crate) struct Transition {
    generation: u64,
    phase: Phase,
    direction: Direction,
    incoming: Option<SurfaceId>,
    outgoing: Option<SurfaceId>,
    pub timer: Option<TimerHandle>,
    pub listener: Option<ListenerId>,
}

impl Transition {
    pub fn new() -> Transition {
        Transition {
            generation: 0,
            phase: Phase::Idle,
            direction: Direction::None,
            incoming: None,
            outgoing: None,
            timer: None,
            listener: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn incoming(&self) -> Option<SurfaceId> {
        self.incoming
    }

    pub fn outgoing(&self) -> Option<SurfaceId> {
        self.outgoing
    }

    /// Starts a new transition. Any previous one must have been settled.
    pub fn begin(
        &mut self,
        direction: Direction,
        incoming: SurfaceId,
        outgoing: Option<SurfaceId>,
    ) -> u64 {
        self.generation += 1;
        self.phase = Phase::Entering;
        self.direction = direction;
        self.incoming = Some(incoming);
        self.outgoing = outgoing;
        self.timer = None;
        self.listener = None;
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation && self.phase != Phase::Idle
    }

    /// Moves to `Settling` if `generation` is still entering.
    pub fn start_settling(&mut self, generation: u64) -> bool {
        if self.generation == generation && self.phase == Phase::Entering {
            self.phase = Phase::Settling;
            true
        } else {
            false
        }
    }

    /// Ends the current transition, if any. Returns what to clean up; `None` if already idle.
    pub fn settle(&mut self) -> Option<Settled> {
        if self.phase == Phase::Idle {
            return None;
        }
        self.phase = Phase::Idle;
        self.direction = Direction::None;
        Some(Settled {
            incoming: self.incoming.take(),
            outgoing: self.outgoing.take(),
            timer: self.timer.take(),
            listener: self.listener.take(),
        })
    }
}
