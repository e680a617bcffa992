//! Engine-wide linker and compiler counters

use std::cell::Cell;

/// Running totals kept by the runtime.
#[derive(Debug, Default)]
pub struct Stats {
    specializations: Cell<u64>,
    resolutions: Cell<u64>,
    relinks: Cell<u64>,
    megamorphic_sites: Cell<u64>,
    guard_hits: Cell<u64>,
}

/// A copy of [`Stats`] at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub specializations: u64,
    pub resolutions: u64,
    pub relinks: u64,
    pub megamorphic_sites: u64,
    pub guard_hits: u64,
}

fn bump(counter: &Cell<u64>) {
    counter.set(counter.get() + 1);
}

impl Stats {
    pub fn record_specialization(&self) {
        bump(&self.specializations);
    }

    pub fn record_resolution(&self) {
        bump(&self.resolutions);
    }

    pub fn record_relink(&self) {
        bump(&self.relinks);
    }

    pub fn record_megamorphic(&self) {
        bump(&self.megamorphic_sites);
    }

    pub fn record_guard_hit(&self) {
        bump(&self.guard_hits);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            specializations: self.specializations.get(),
            resolutions: self.resolutions.get(),
            relinks: self.relinks.get(),
            megamorphic_sites: self.megamorphic_sites.get(),
            guard_hits: self.guard_hits.get(),
        }
    }
}
