//! Readiness polling.
//!
//! A fixed-interval wait loop over up to two HTTP targets. Each target's
//! readiness is recorded the first time its probe succeeds and is never
//! re-checked afterwards. The loop exits as soon as every target is ready;
//! otherwise it stops once the accumulated wait reaches the budget and
//! reports whichever targets are still pending. Time is injected through
//! `Clock` so the termination behavior is testable in virtual time.

use std::time::Duration;
use tracing::info;

pub trait Clock {
    fn sleep(&mut self, duration: Duration);
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Target {
    pub name: &'static str,
    pub url: &'static str,
}

/// Poll cadence and ceiling for one wait loop.
#[derive(Debug, Clone, Copy)]
pub struct PollBudget {
    pub max_wait: Duration,
    pub interval: Duration,
}

/// Containerized stacks build images before serving; give them longer.
pub const COMPOSE_BUDGET: PollBudget = PollBudget {
    max_wait: Duration::from_secs(120),
    interval: Duration::from_secs(3),
};

pub const LOCAL_BUDGET: PollBudget = PollBudget {
    max_wait: Duration::from_secs(60),
    interval: Duration::from_secs(2),
};

#[derive(Debug)]
pub struct WaitOutcome {
    pub ready: Vec<&'static str>,
    pub pending: Vec<&'static str>,
}

impl WaitOutcome {
    pub fn all_ready(&self) -> bool {
        self.pending.is_empty()
    }
}

pub fn wait_for_targets<P, C>(
    targets: &[Target],
    budget: &PollBudget,
    mut probe: P,
    clock: &mut C,
) -> WaitOutcome
where
    P: FnMut(&Target) -> bool,
    C: Clock,
{
    let mut ready = vec![false; targets.len()];
    let mut waited = Duration::ZERO;
    loop {
        for (idx, target) in targets.iter().enumerate() {
            if !ready[idx] && probe(target) {
                ready[idx] = true;
                info!("{} is ready at {}", target.name, target.url);
            }
        }
        if ready.iter().all(|flag| *flag) {
            break;
        }
        if waited >= budget.max_wait {
            break;
        }
        clock.sleep(budget.interval);
        waited += budget.interval;
    }

    let mut outcome = WaitOutcome {
        ready: Vec::new(),
        pending: Vec::new(),
    };
    for (idx, target) in targets.iter().enumerate() {
        if ready[idx] {
            outcome.ready.push(target.name);
        } else {
            outcome.pending.push(target.name);
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct VirtualClock<'a> {
        elapsed: &'a Cell<Duration>,
    }

    impl Clock for VirtualClock<'_> {
        fn sleep(&mut self, duration: Duration) {
            self.elapsed.set(self.elapsed.get() + duration);
        }
    }

    const TARGETS: [Target; 2] = [
        Target {
            name: "api",
            url: "http://localhost:4000/health",
        },
        Target {
            name: "web",
            url: "http://localhost:3000",
        },
    ];

    const BUDGET: PollBudget = PollBudget {
        max_wait: Duration::from_secs(60),
        interval: Duration::from_secs(2),
    };

    #[test]
    fn reports_late_target_and_stops_exactly_at_max_wait() {
        let elapsed = Cell::new(Duration::ZERO);
        let mut clock = VirtualClock { elapsed: &elapsed };
        let probe = |target: &Target| {
            target.name == "api" && elapsed.get() >= Duration::from_secs(10)
        };

        let outcome = wait_for_targets(&TARGETS, &BUDGET, probe, &mut clock);

        assert_eq!(outcome.ready, vec!["api"]);
        assert_eq!(outcome.pending, vec!["web"]);
        assert_eq!(elapsed.get(), BUDGET.max_wait);
    }

    #[test]
    fn stops_immediately_once_all_targets_are_ready() {
        let elapsed = Cell::new(Duration::ZERO);
        let mut clock = VirtualClock { elapsed: &elapsed };
        let probe = |_: &Target| elapsed.get() >= Duration::from_secs(6);

        let outcome = wait_for_targets(&TARGETS, &BUDGET, probe, &mut clock);

        assert!(outcome.all_ready());
        assert_eq!(elapsed.get(), Duration::from_secs(6));
    }

    #[test]
    fn ready_flags_are_monotonic() {
        let elapsed = Cell::new(Duration::ZERO);
        let mut clock = VirtualClock { elapsed: &elapsed };
        // A probe that would regress after 20s; the recorded flag must not.
        let probe = |target: &Target| {
            target.name == "api"
                && elapsed.get() >= Duration::from_secs(10)
                && elapsed.get() < Duration::from_secs(20)
        };

        let outcome = wait_for_targets(&TARGETS, &BUDGET, probe, &mut clock);

        assert_eq!(outcome.ready, vec!["api"]);
        assert_eq!(outcome.pending, vec!["web"]);
    }
}
