// View selection over a task collection

use crate::task::Task;

/// Which tasks a view shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Active,    // done == false
    Completed, // done == true
    All,
}

impl View {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            View::Active => !task.done,
            View::Completed => task.done,
            View::All => true,
        }
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            View::Active => write!(f, "active"),
            View::Completed => write!(f, "completed"),
            View::All => write!(f, "all"),
        }
    }
}

/// Filter for listing tasks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub view: View,
    /// Exact category match; `None` shows every category
    pub category: Option<String>,
}

impl Filter {
    pub fn active() -> Self {
        Self {
            view: View::Active,
            category: None,
        }
    }

    pub fn completed() -> Self {
        Self {
            view: View::Completed,
            category: None,
        }
    }

    pub fn all() -> Self {
        Self {
            view: View::All,
            category: None,
        }
    }

    pub fn with_category(mut self, category: Option<impl Into<String>>) -> Self {
        self.category = category.map(Into::into);
        self
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.view.matches(task) && self.category.as_deref().is_none_or(|c| task.category == c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskDraft;

    fn task(id: i64, category: &str, done: bool) -> Task {
        Task {
            done,
            ..Task::new(id, TaskDraft::new("t", category))
        }
    }

    #[test]
    fn test_default_filter_is_active() {
        assert_eq!(Filter::default(), Filter::active());
    }

    #[test]
    fn test_view_matches() {
        let open = task(1, "Home", false);
        let closed = task(2, "Home", true);

        assert!(View::Active.matches(&open));
        assert!(!View::Active.matches(&closed));
        assert!(View::Completed.matches(&closed));
        assert!(!View::Completed.matches(&open));
        assert!(View::All.matches(&open) && View::All.matches(&closed));
    }

    #[test]
    fn test_category_filter() {
        let filter = Filter::active().with_category(Some("Home"));
        assert!(filter.matches(&task(1, "Home", false)));
        assert!(!filter.matches(&task(2, "Work", false)));
        assert!(!filter.matches(&task(3, "Home", true)));

        let filter = Filter::active().with_category(None::<String>);
        assert!(filter.matches(&task(2, "Work", false)));
    }

    #[test]
    fn test_view_display() {
        assert_eq!(View::Active.to_string(), "active");
        assert_eq!(View::Completed.to_string(), "completed");
    }
}
