// In-memory working set of tasks
//
// A command loads a snapshot, applies one action here, then saves the whole
// collection back. Nothing is shared between snapshots.

use crate::filter::Filter;
use crate::task::{Task, TaskDraft, next_id, now_ms};
use eyre::{Result, eyre};

/// Owned snapshot of the task collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl From<Vec<Task>> for TaskList {
    fn from(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn into_tasks(self) -> Vec<Task> {
        self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn get_mut(&mut self, id: i64) -> Result<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| eyre!("Task not found: {}", id))
    }

    // ========================================================================
    // Actions
    // ========================================================================

    /// Append a new, not-yet-done task
    pub fn create(&mut self, draft: TaskDraft) -> Result<&Task> {
        self.create_at(draft, now_ms())
    }

    fn create_at(&mut self, draft: TaskDraft, now: i64) -> Result<&Task> {
        let draft = draft.normalized()?;
        let id = next_id(&self.tasks, now)?;
        self.tasks.push(Task::new(id, draft));
        Ok(&self.tasks[self.tasks.len() - 1])
    }

    /// Replace title and category
    ///
    /// The image is only replaced when the draft carries one.
    pub fn edit(&mut self, id: i64, draft: TaskDraft) -> Result<&Task> {
        let draft = draft.normalized()?;
        let task = self.get_mut(id)?;
        task.title = draft.title;
        task.category = draft.category;
        if let Some(image) = draft.image {
            task.image = Some(image);
        }
        Ok(&*task)
    }

    /// Drop the image from a task
    pub fn clear_image(&mut self, id: i64) -> Result<&Task> {
        let task = self.get_mut(id)?;
        task.image = None;
        Ok(&*task)
    }

    /// Mark a task done. Completing twice is harmless.
    pub fn complete(&mut self, id: i64) -> Result<&Task> {
        let task = self.get_mut(id)?;
        task.done = true;
        Ok(&*task)
    }

    /// Remove a task and hand it back
    pub fn delete(&mut self, id: i64) -> Result<Task> {
        let idx = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| eyre!("Task not found: {}", id))?;
        Ok(self.tasks.remove(idx))
    }

    // ========================================================================
    // Views
    // ========================================================================

    pub fn list(&self, filter: &Filter) -> Vec<&Task> {
        self.tasks.iter().filter(|t| filter.matches(t)).collect()
    }

    /// Tasks still to do, optionally limited to one category
    pub fn active(&self, category: Option<&str>) -> Vec<&Task> {
        self.list(&Filter::active().with_category(category))
    }

    pub fn completed(&self) -> Vec<&Task> {
        self.list(&Filter::completed())
    }

    /// Distinct categories in the order they first appear
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for task in &self.tasks {
            if !seen.contains(&task.category.as_str()) {
                seen.push(&task.category);
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> TaskList {
        let mut list = TaskList::new();
        list.create_at(TaskDraft::new("Buy milk", "Errands"), 1000).unwrap();
        list.create_at(TaskDraft::new("Call mom", "Family"), 2000).unwrap();
        list.create_at(TaskDraft::new("Post letter", "Errands"), 3000).unwrap();
        list
    }

    #[test]
    fn test_create_appends_active_task() {
        let mut list = TaskList::new();
        let task = list
            .create(TaskDraft::new(" Buy milk ", "Errands").with_image("file:///milk.png"))
            .unwrap()
            .clone();

        assert_eq!(task.title, "Buy milk");
        assert!(!task.done);
        assert_eq!(task.image.as_deref(), Some("file:///milk.png"));
        assert_eq!(list.tasks(), &[task]);
    }

    #[test]
    fn test_create_rejects_blank_title() {
        let mut list = TaskList::new();
        assert!(list.create(TaskDraft::new("", "Errands")).is_err());
        assert!(list.is_empty());
    }

    #[test]
    fn test_create_same_tick_gets_unique_ids() {
        let mut list = TaskList::new();
        let a = list.create_at(TaskDraft::new("a", "x"), 5000).unwrap().id;
        let b = list.create_at(TaskDraft::new("b", "x"), 5000).unwrap().id;
        let c = list.create_at(TaskDraft::new("c", "x"), 5000).unwrap().id;

        assert_eq!((a, b, c), (5000, 5001, 5002));
    }

    #[test]
    fn test_create_fails_when_ids_exhausted() {
        let mut list = TaskList::from(vec![Task::new(i64::MAX, TaskDraft::new("Last", "Edge"))]);
        assert!(list.create(TaskDraft::new("One more", "Edge")).is_err());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_edit_keeps_image_when_draft_has_none() {
        let mut list = TaskList::new();
        let id = list
            .create_at(TaskDraft::new("Buy milk", "Errands").with_image("file:///milk.png"), 1000)
            .unwrap()
            .id;

        let task = list.edit(id, TaskDraft::new("Buy oat milk", "Groceries")).unwrap();
        assert_eq!(task.title, "Buy oat milk");
        assert_eq!(task.category, "Groceries");
        assert_eq!(task.image.as_deref(), Some("file:///milk.png"));

        let task = list
            .edit(id, TaskDraft::new("Buy oat milk", "Groceries").with_image("https://example.com/oat.png"))
            .unwrap();
        assert_eq!(task.image.as_deref(), Some("https://example.com/oat.png"));

        let task = list.clear_image(id).unwrap();
        assert_eq!(task.image, None);
    }

    #[test]
    fn test_edit_does_not_touch_done() {
        let mut list = seeded();
        list.complete(1000).unwrap();
        let task = list.edit(1000, TaskDraft::new("Buy bread", "Errands")).unwrap();
        assert!(task.done);
    }

    #[test]
    fn test_complete_moves_task_between_views() {
        let mut list = seeded();
        list.complete(2000).unwrap();

        let active: Vec<i64> = list.active(None).iter().map(|t| t.id).collect();
        let completed: Vec<i64> = list.completed().iter().map(|t| t.id).collect();
        assert_eq!(active, vec![1000, 3000]);
        assert_eq!(completed, vec![2000]);

        // Completing again keeps it done
        assert!(list.complete(2000).unwrap().done);
    }

    #[test]
    fn test_delete_returns_task() {
        let mut list = seeded();
        let removed = list.delete(2000).unwrap();
        assert_eq!(removed.title, "Call mom");
        assert_eq!(list.len(), 2);
        assert!(list.get(2000).is_none());
    }

    #[test]
    fn test_unknown_id() {
        let mut list = seeded();
        assert!(list.complete(42).is_err());
        assert!(list.delete(42).is_err());
        assert!(list.edit(42, TaskDraft::new("x", "y")).is_err());
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_active_by_category() {
        let list = seeded();
        let errands: Vec<&str> = list.active(Some("Errands")).iter().map(|t| t.title.as_str()).collect();
        assert_eq!(errands, vec!["Buy milk", "Post letter"]);
        assert!(list.active(Some("Work")).is_empty());
    }

    #[test]
    fn test_categories_distinct_in_first_seen_order() {
        let mut list = seeded();
        assert_eq!(list.categories(), vec!["Errands", "Family"]);

        // A category disappears with its last task
        list.delete(2000).unwrap();
        assert_eq!(list.categories(), vec!["Errands"]);
    }
}
