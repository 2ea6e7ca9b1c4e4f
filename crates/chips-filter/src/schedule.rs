//! Deferred work, keyed by purpose and driven by explicit ticks.
//!
//! Each purpose owns one slot. Tasks run on the tick after they are armed,
//! which lets a host (or a test) settle pending UI updates before focus moves
//! or a click-away check fires.

use std::collections::BTreeMap;

use tracing::trace;

/// Which input a focus task targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FocusTarget {
    OptionField,
    ValueField,
}

/// What a click-away check inspects before cancelling an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClickAwayCheck {
    /// Armed by opening or closing the option popup.
    Popup,
    /// Armed when an input loses focus; spares unsaved typing.
    Blur,
}

/// The slot a task occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskSlot {
    Focus,
    ClickAway,
    TagCommit,
}

/// A unit of deferred work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Focus(FocusTarget),
    ClickAway(ClickAwayCheck),
    TagCommit,
}

impl Task {
    pub fn slot(&self) -> TaskSlot {
        match self {
            Task::Focus(_) => TaskSlot::Focus,
            Task::ClickAway(_) => TaskSlot::ClickAway,
            Task::TagCommit => TaskSlot::TagCommit,
        }
    }
}

/// One-slot-per-purpose task queue.
#[derive(Debug, Default)]
pub struct Scheduler {
    tick: u64,
    slots: BTreeMap<TaskSlot, (u64, Task)>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms `task` for the next tick, replacing whatever its slot held.
    pub fn arm(&mut self, task: Task) {
        trace!(?task, tick = self.tick, "arming task");
        self.slots.insert(task.slot(), (self.tick + 1, task));
    }

    /// Arms `task` only if its slot is empty. Returns whether it was armed.
    pub fn arm_if_idle(&mut self, task: Task) -> bool {
        if self.slots.contains_key(&task.slot()) {
            return false;
        }
        self.arm(task);
        true
    }

    pub fn cancel(&mut self, slot: TaskSlot) -> Option<Task> {
        self.slots.remove(&slot).map(|(_, task)| task)
    }

    pub fn is_pending(&self, slot: TaskSlot) -> bool {
        self.slots.contains_key(&slot)
    }

    pub fn has_pending(&self) -> bool {
        !self.slots.is_empty()
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Advances one tick and returns the tasks that became due, in slot order.
    pub fn advance(&mut self) -> Vec<Task> {
        self.tick += 1;
        let tick = self.tick;
        let due: Vec<TaskSlot> = self
            .slots
            .iter()
            .filter(|(_, (at, _))| *at <= tick)
            .map(|(slot, _)| *slot)
            .collect();

        due.into_iter()
            .filter_map(|slot| self.slots.remove(&slot))
            .map(|(_, task)| task)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_runs_on_next_tick_only() {
        let mut scheduler = Scheduler::new();
        scheduler.arm(Task::Focus(FocusTarget::ValueField));
        assert!(scheduler.is_pending(TaskSlot::Focus));

        assert_eq!(scheduler.advance(), vec![Task::Focus(FocusTarget::ValueField)]);
        assert!(scheduler.advance().is_empty());
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn test_rearming_replaces_pending_task() {
        let mut scheduler = Scheduler::new();
        scheduler.arm(Task::Focus(FocusTarget::ValueField));
        scheduler.arm(Task::Focus(FocusTarget::OptionField));

        assert_eq!(scheduler.advance(), vec![Task::Focus(FocusTarget::OptionField)]);
    }

    #[test]
    fn test_arm_if_idle_keeps_first() {
        let mut scheduler = Scheduler::new();
        assert!(scheduler.arm_if_idle(Task::ClickAway(ClickAwayCheck::Popup)));
        assert!(!scheduler.arm_if_idle(Task::ClickAway(ClickAwayCheck::Blur)));

        assert_eq!(scheduler.advance(), vec![Task::ClickAway(ClickAwayCheck::Popup)]);
    }

    #[test]
    fn test_slots_are_independent() {
        let mut scheduler = Scheduler::new();
        scheduler.arm(Task::TagCommit);
        scheduler.arm(Task::Focus(FocusTarget::ValueField));
        assert_eq!(scheduler.cancel(TaskSlot::TagCommit), Some(Task::TagCommit));

        assert_eq!(scheduler.advance(), vec![Task::Focus(FocusTarget::ValueField)]);
    }
}
