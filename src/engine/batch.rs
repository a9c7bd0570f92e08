// src/engine/batch.rs

use crate::engine::runtime::TaskName;

/// A set of task triggers that should start together as one run.
///
/// `reload` is `Some(full)` for batches that originate from the watcher
/// and should end with a browser notification; `None` for seeded or
/// manual runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerBatch {
    tasks: Vec<TaskName>,
    reload: Option<bool>,
}

impl TriggerBatch {
    /// A batch with no reload notification attached.
    pub fn manual<I, S>(tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        let mut batch = Self {
            tasks: Vec::new(),
            reload: None,
        };
        for t in tasks {
            batch.insert(t.into());
        }
        batch
    }

    /// A watcher-originated batch for one task.
    pub fn from_watch(task: TaskName, full_reload: bool) -> Self {
        Self {
            tasks: vec![task],
            reload: Some(full_reload),
        }
    }

    pub fn tasks(&self) -> &[TaskName] {
        &self.tasks
    }

    pub fn reload(&self) -> Option<bool> {
        self.reload
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn insert(&mut self, task: TaskName) {
        if !self.tasks.contains(&task) {
            self.tasks.push(task);
        }
    }

    /// Record one watcher hit into this batch.
    pub fn record(&mut self, task: TaskName, full_reload: bool) {
        self.insert(task);
        self.reload = merge_reload(self.reload, Some(full_reload));
    }

    /// Coalesce another batch into this one: task set union, and a full
    /// reload wins over a style-only one.
    pub fn merge(&mut self, other: TriggerBatch) {
        for task in other.tasks {
            self.insert(task);
        }
        self.reload = merge_reload(self.reload, other.reload);
    }
}

fn merge_reload(a: Option<bool>, b: Option<bool>) -> Option<bool> {
    match (a, b) {
        (None, x) => x,
        (x, None) => x,
        (Some(a), Some(b)) => Some(a || b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_unions_tasks_and_keeps_one_entry_per_task() {
        let mut a = TriggerBatch::from_watch("styles".into(), false);
        a.merge(TriggerBatch::from_watch("pages".into(), true));
        a.merge(TriggerBatch::from_watch("styles".into(), false));

        assert_eq!(a.tasks(), &["styles".to_string(), "pages".to_string()]);
        assert_eq!(a.reload(), Some(true));
    }

    #[test]
    fn style_only_batches_stay_injectable() {
        let mut a = TriggerBatch::from_watch("styles".into(), false);
        a.merge(TriggerBatch::from_watch("styles".into(), false));
        assert_eq!(a.reload(), Some(false));
    }

    #[test]
    fn manual_batches_carry_no_reload() {
        let batch = TriggerBatch::manual(vec!["build"]);
        assert_eq!(batch.reload(), None);
        assert_eq!(batch.tasks(), &["build".to_string()]);
    }
}
