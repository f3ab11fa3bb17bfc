// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Clocks and the simulation-wide timeline.
//!
//! Tasks sleep on a [`Clock`] with [`Clock::wait_ticks`]; the executor asks
//! the [`Timeline`] for the earliest sleeper across all clocks when it runs
//! out of ready work.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use spur_track::entity::Entity;
use spur_track::set_time;

/// A point in the life of one clock: a whole tick count plus a phase within
/// the tick. Ordering is by tick first, then phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClockTick {
    tick: u64,
    phase: u32,
}

impl ClockTick {
    #[must_use]
    pub const fn new(tick: u64, phase: u32) -> Self {
        Self { tick, phase }
    }

    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    #[must_use]
    pub fn phase(&self) -> u32 {
        self.phase
    }

    /// This time moved forward by `ticks` whole ticks.
    #[must_use]
    pub fn advance(mut self, ticks: u64) -> Self {
        self.tick += ticks;
        self
    }
}

impl std::fmt::Display for ClockTick {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}.{}", self.tick, self.phase)
    }
}

/// A task asleep until its scheduled tick comes around.
pub struct Sleeper {
    pub waker: Waker,

    /// Background sleepers never hold the simulation open: once only they
    /// remain, the simulation may finish.
    pub background: bool,
}

/// State shared between a [`Clock`] and the delay futures it hands out.
struct ClockCore {
    now: Cell<ClockTick>,

    /// Sleepers keyed by wake-up time, so the first entry is always next.
    sleepers: RefCell<BTreeMap<ClockTick, Vec<Sleeper>>>,
}

impl ClockCore {
    fn park(&self, due: ClockTick, cx: &mut Context<'_>, background: bool) {
        self.sleepers.borrow_mut().entry(due).or_default().push(Sleeper {
            waker: cx.waker().clone(),
            background,
        });
    }

    fn step_to(&self, due: ClockTick) {
        assert!(due >= self.now.get(), "Time moving backwards");
        self.now.set(due);
    }
}

/// A frequency domain of the simulation.
///
/// Clones share the same underlying state; the [`Timeline`] deduplicates
/// clocks by frequency, so every component asking for the same frequency
/// sleeps on the same queue.
#[derive(Clone)]
pub struct Clock {
    freq_mhz: f64,
    core: Rc<ClockCore>,
}

impl Clock {
    #[must_use]
    pub fn new(freq_mhz: f64) -> Self {
        Self {
            freq_mhz,
            core: Rc::new(ClockCore {
                now: Cell::new(ClockTick::default()),
                sleepers: RefCell::new(BTreeMap::new()),
            }),
        }
    }

    #[must_use]
    pub fn freq_mhz(&self) -> f64 {
        self.freq_mhz
    }

    #[must_use]
    pub fn tick_now(&self) -> ClockTick {
        self.core.now.get()
    }

    #[must_use]
    pub fn time_now_ns(&self) -> f64 {
        self.to_ns(&self.tick_now())
    }

    /// The time in ns of this clock's earliest sleeper, or `f64::MAX` when
    /// nothing is scheduled.
    #[must_use]
    pub fn time_of_next(&self) -> f64 {
        match self.core.sleepers.borrow().keys().next() {
            Some(due) => self.to_ns(due),
            None => f64::MAX,
        }
    }

    /// Convert a [`ClockTick`] into ns for this clock's frequency.
    #[must_use]
    pub fn to_ns(&self, at: &ClockTick) -> f64 {
        at.tick() as f64 / self.freq_mhz * 1000.0
    }

    /// Sleep for `ticks` ticks of this clock.
    #[must_use = "Futures do nothing unless you `.await` or otherwise use them"]
    pub fn wait_ticks(&self, ticks: u64) -> ClockDelay {
        self.delay(ticks, false)
    }

    /// Sleep for `ticks` ticks, but let the simulation finish without this
    /// sleeper. For tasks that loop forever alongside the real work.
    #[must_use = "Futures do nothing unless you `.await` or otherwise use them"]
    pub fn wait_ticks_or_exit(&self, ticks: u64) -> ClockDelay {
        self.delay(ticks, true)
    }

    fn delay(&self, ticks: u64, background: bool) -> ClockDelay {
        ClockDelay {
            core: self.core.clone(),
            due: self.tick_now().advance(ticks),
            parked: false,
            background,
        }
    }
}

/// Future of a sleeping task. Parks itself on the first poll and advances
/// its clock to the due time on the second.
pub struct ClockDelay {
    core: Rc<ClockCore>,
    due: ClockTick,
    parked: bool,
    background: bool,
}

impl Future for ClockDelay {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.parked {
            self.core.step_to(self.due);
            Poll::Ready(())
        } else {
            self.core.park(self.due, cx, self.background);
            self.parked = true;
            Poll::Pending
        }
    }
}

/// Owns every clock and the current wall-clock time of the simulation.
pub struct Timeline {
    pub entity: Rc<Entity>,
    now_ns: f64,
    clocks: Vec<Clock>,
}

impl Timeline {
    #[must_use]
    pub fn new(parent: &Rc<Entity>) -> Self {
        Self {
            entity: Rc::new(Entity::new(parent, "time")),
            now_ns: 0.0,
            clocks: Vec::new(),
        }
    }

    /// The clock for `freq_mhz`, created on first request.
    pub fn get_clock(&mut self, freq_mhz: f64) -> Clock {
        if let Some(clock) = self.clocks.iter().find(|c| c.freq_mhz() == freq_mhz) {
            return clock.clone();
        }
        let clock = Clock::new(freq_mhz);
        self.clocks.push(clock.clone());
        clock
    }

    /// Move to the earliest scheduled time across all clocks and pop the
    /// sleepers due then. `None` when nothing is scheduled anywhere.
    pub fn advance(&mut self) -> Option<Vec<Sleeper>> {
        let clock = self
            .clocks
            .iter()
            .min_by(|a, b| a.time_of_next().total_cmp(&b.time_of_next()))?;

        let (due, sleepers) = clock.core.sleepers.borrow_mut().pop_first()?;
        let due_ns = clock.to_ns(&due);
        if due_ns != self.now_ns {
            set_time!(self.entity ; due_ns);
            self.now_ns = due_ns;
        }
        Some(sleepers)
    }

    #[must_use]
    pub fn time_now_ns(&self) -> f64 {
        self.now_ns
    }

    /// Whether only background sleepers remain scheduled.
    #[must_use]
    pub fn idle(&self) -> bool {
        self.clocks.iter().all(|clock| {
            clock
                .core
                .sleepers
                .borrow()
                .values()
                .flatten()
                .all(|sleeper| sleeper.background)
        })
    }
}

#[cfg(test)]
mod tests {
    use spur_track::entity::toplevel;
    use spur_track::tracker::null_tracker;

    use super::*;

    #[test]
    fn tick_to_ns() {
        let ghz = Clock::new(1000.0);
        assert_eq!(ghz.to_ns(&ClockTick::new(1, 0)), 1.0);

        let half_mhz = Clock::new(0.5);
        assert_eq!(half_mhz.to_ns(&ClockTick::new(1, 0)), 2000.0);
    }

    #[test]
    fn ticks_order_by_tick_then_phase() {
        assert!(ClockTick::new(1, 0) < ClockTick::new(2, 0));
        assert!(ClockTick::new(2, 0) < ClockTick::new(2, 1));
        assert_eq!(ClockTick::new(3, 1).advance(2), ClockTick::new(5, 1));
    }

    #[test]
    fn clocks_deduplicated_by_frequency() {
        let tracker = null_tracker();
        let top = toplevel(&tracker, "top");

        let mut timeline = Timeline::new(&top);
        let _a = timeline.get_clock(1000.0);
        let _b = timeline.get_clock(1000.0);
        assert_eq!(timeline.clocks.len(), 1);

        let _c = timeline.get_clock(1800.0);
        assert_eq!(timeline.clocks.len(), 2);
    }
}
