use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::models::{Pocket, Task, TaskPatch};

/// In-memory copies of the remote pockets and their tasks.
///
/// Task lists are held once per pocket id. `Pocket::tasks` and the task
/// store's flat list are both views over that single copy.
#[derive(Debug, Default)]
pub struct CacheState {
    pockets: Vec<Pocket>,
    tasks: HashMap<String, Vec<Task>>,
    selected_pocket_id: Option<String>,
    active_pocket_id: Option<String>,
}

#[derive(Clone, Default)]
pub struct Cache {
    inner: Arc<RwLock<CacheState>>,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read<R>(&self, f: impl FnOnce(&CacheState) -> R) -> R {
        f(&self.inner.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn write<R>(&self, f: impl FnOnce(&mut CacheState) -> R) -> R {
        f(&mut self.inner.write().unwrap_or_else(PoisonError::into_inner))
    }
}

impl CacheState {
    /// Pockets with their task lists attached; `tasks` is `None` for a pocket
    /// whose tasks were never loaded.
    pub fn pockets(&self) -> Vec<Pocket> {
        self.pockets
            .iter()
            .map(|pocket| Pocket {
                tasks: self.tasks.get(&pocket.id).cloned(),
                ..pocket.clone()
            })
            .collect()
    }

    pub fn pocket(&self, pocket_id: &str) -> Option<Pocket> {
        self.pockets
            .iter()
            .find(|p| p.id == pocket_id)
            .map(|pocket| Pocket {
                tasks: self.tasks.get(&pocket.id).cloned(),
                ..pocket.clone()
            })
    }

    /// Replaces the pocket list. Task lists of pockets that are gone are dropped.
    pub fn replace_pockets(&mut self, pockets: Vec<Pocket>) {
        self.pockets = pockets.into_iter().map(strip_tasks).collect();
        let pockets = &self.pockets;
        self.tasks.retain(|id, _| pockets.iter().any(|p| &p.id == id));
    }

    /// Replaces pockets and every task list in one step.
    pub fn replace_all(&mut self, pockets: Vec<Pocket>, tasks: HashMap<String, Vec<Task>>) {
        self.pockets = pockets.into_iter().map(strip_tasks).collect();
        self.tasks = tasks;
    }

    pub fn push_pocket(&mut self, pocket: Pocket) {
        if let Some(tasks) = pocket.tasks.clone() {
            self.tasks.insert(pocket.id.clone(), tasks);
        }
        self.pockets.push(strip_tasks(pocket));
    }

    /// Removes a pocket and its tasks, clearing any reference to it.
    pub fn remove_pocket(&mut self, pocket_id: &str) -> bool {
        let before = self.pockets.len();
        self.pockets.retain(|p| p.id != pocket_id);
        self.tasks.remove(pocket_id);
        if self.selected_pocket_id.as_deref() == Some(pocket_id) {
            self.selected_pocket_id = None;
        }
        if self.active_pocket_id.as_deref() == Some(pocket_id) {
            self.active_pocket_id = None;
        }
        self.pockets.len() != before
    }

    pub fn select(&mut self, pocket_id: Option<String>) {
        self.selected_pocket_id = pocket_id;
    }

    pub fn selected_pocket_id(&self) -> Option<&str> {
        self.selected_pocket_id.as_deref()
    }

    pub fn active_pocket_id(&self) -> Option<&str> {
        self.active_pocket_id.as_deref()
    }

    /// Stores the task list of one pocket and makes it the active one.
    pub fn set_tasks(&mut self, pocket_id: &str, tasks: Vec<Task>) {
        self.tasks.insert(pocket_id.to_string(), tasks);
        self.active_pocket_id = Some(pocket_id.to_string());
    }

    /// Tasks of the active pocket.
    pub fn active_tasks(&self) -> Vec<Task> {
        self.active_pocket_id
            .as_ref()
            .and_then(|id| self.tasks.get(id))
            .cloned()
            .unwrap_or_default()
    }

    pub fn tasks_for(&self, pocket_id: &str) -> Option<&[Task]> {
        self.tasks.get(pocket_id).map(Vec::as_slice)
    }

    pub fn push_task(&mut self, pocket_id: &str, task: Task) {
        self.tasks.entry(pocket_id.to_string()).or_default().push(task);
        if self.active_pocket_id.is_none() {
            self.active_pocket_id = Some(pocket_id.to_string());
        }
    }

    pub fn patch_task(&mut self, pocket_id: &str, task_id: &str, patch: &TaskPatch) -> bool {
        match self
            .tasks
            .get_mut(pocket_id)
            .and_then(|tasks| tasks.iter_mut().find(|t| t.id == task_id))
        {
            Some(task) => {
                patch.apply(task);
                true
            }
            None => false,
        }
    }

    pub fn remove_task(&mut self, pocket_id: &str, task_id: &str) -> bool {
        let Some(tasks) = self.tasks.get_mut(pocket_id) else {
            return false;
        };
        let before = tasks.len();
        tasks.retain(|t| t.id != task_id);
        tasks.len() != before
    }

    pub fn clear(&mut self) {
        *self = CacheState::default();
    }
}

fn strip_tasks(mut pocket: Pocket) -> Pocket {
    pocket.tasks = None;
    pocket
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pocket(id: &str) -> Pocket {
        Pocket {
            id: id.to_string(),
            name: format!("pocket {id}"),
            emoji: "📦".to_string(),
            tasks: None,
        }
    }

    fn task(id: &str, pocket_id: &str) -> Task {
        Task {
            id: id.to_string(),
            description: format!("task {id}"),
            is_completed: false,
            pocket_id: pocket_id.to_string(),
        }
    }

    #[test]
    fn pocket_view_embeds_loaded_tasks_only() {
        let mut cache = CacheState::default();
        cache.replace_pockets(vec![pocket("p1"), pocket("p2")]);
        cache.set_tasks("p1", vec![task("t1", "p1")]);

        let pockets = cache.pockets();
        assert_eq!(pockets[0].tasks.as_ref().map(Vec::len), Some(1));
        assert_eq!(pockets[1].tasks, None);
    }

    #[test]
    fn removing_a_pocket_clears_references() {
        let mut cache = CacheState::default();
        cache.replace_pockets(vec![pocket("p1"), pocket("p2")]);
        cache.set_tasks("p1", vec![task("t1", "p1")]);
        cache.select(Some("p1".to_string()));

        assert!(cache.remove_pocket("p1"));
        assert_eq!(cache.selected_pocket_id(), None);
        assert_eq!(cache.active_pocket_id(), None);
        assert!(cache.tasks_for("p1").is_none());
        assert!(!cache.remove_pocket("p1"));
    }

    #[test]
    fn replacing_pockets_drops_orphaned_task_lists() {
        let mut cache = CacheState::default();
        cache.replace_pockets(vec![pocket("p1"), pocket("p2")]);
        cache.set_tasks("p1", vec![task("t1", "p1")]);
        cache.set_tasks("p2", vec![task("t2", "p2")]);

        cache.replace_pockets(vec![pocket("p2")]);
        assert!(cache.tasks_for("p1").is_none());
        assert_eq!(cache.tasks_for("p2").map(<[Task]>::len), Some(1));
    }

    #[test]
    fn active_view_follows_last_loaded_pocket() {
        let mut cache = CacheState::default();
        cache.set_tasks("p1", vec![task("t1", "p1")]);
        cache.set_tasks("p2", vec![task("t2", "p2"), task("t3", "p2")]);

        let ids: Vec<_> = cache.active_tasks().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["t2", "t3"]);
    }
}
