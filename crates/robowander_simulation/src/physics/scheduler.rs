//! Deferred task queue (scheduleAfter)
//!
//! Задачи срабатывают по часам симуляции; при одинаковом времени —
//! в порядке постановки.

use crate::wander::DeferredTask;

#[derive(Debug)]
struct Scheduled {
    fire_at: f32,
    sequence: u64,
    task: DeferredTask,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    pending: Vec<Scheduled>,
    next_sequence: u64,
}

impl Scheduler {
    /// Поставить задачу, возвращает время срабатывания
    pub fn schedule(&mut self, now: f32, delay: f32, task: DeferredTask) -> f32 {
        let fire_at = now + delay.max(0.0);
        self.pending.push(Scheduled {
            fire_at,
            sequence: self.next_sequence,
            task,
        });
        self.next_sequence += 1;
        fire_at
    }

    /// Забрать все задачи с fire_at <= now (по времени, затем по порядку постановки)
    pub fn take_due(&mut self, now: f32) -> Vec<DeferredTask> {
        let (mut due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|scheduled| scheduled.fire_at <= now);
        self.pending = pending;

        due.sort_by(|a, b| {
            a.fire_at
                .total_cmp(&b.fire_at)
                .then(a.sequence.cmp(&b.sequence))
        });
        due.into_iter().map(|scheduled| scheduled.task).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wander::{CancelToken, ColliderId};

    fn reenable(other: u32) -> DeferredTask {
        DeferredTask::ReEnableCollision {
            agent: ColliderId(1),
            other: ColliderId(other),
            token: CancelToken::new(),
        }
    }

    fn other_of(task: &DeferredTask) -> u32 {
        match task {
            DeferredTask::ReEnableCollision { other, .. } => other.0,
        }
    }

    #[test]
    fn test_task_fires_after_delay() {
        let mut scheduler = Scheduler::default();
        assert_eq!(scheduler.schedule(1.0, 0.5, reenable(2)), 1.5);

        assert!(scheduler.take_due(1.25).is_empty());
        assert_eq!(scheduler.len(), 1);

        let due = scheduler.take_due(1.5);
        assert_eq!(due.len(), 1);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_due_tasks_ordered_by_time_then_sequence() {
        let mut scheduler = Scheduler::default();
        scheduler.schedule(0.0, 0.5, reenable(2));
        scheduler.schedule(0.0, 0.25, reenable(3));
        scheduler.schedule(0.0, 0.5, reenable(4));

        let order: Vec<u32> = scheduler.take_due(1.0).iter().map(other_of).collect();
        assert_eq!(order, vec![3, 2, 4]);
    }

    #[test]
    fn test_negative_delay_fires_immediately() {
        let mut scheduler = Scheduler::default();
        scheduler.schedule(2.0, -1.0, reenable(2));
        assert_eq!(scheduler.take_due(2.0).len(), 1);
    }
}
