use crate::category::{
    Category, UNCATEGORIZED_COLOR, UNCATEGORIZED_ID, UNCATEGORIZED_NAME,
};
use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub all: usize,
    pub completed: usize,
}

/// One board column: a real category, or the synthetic bucket when
/// `synthetic` is set.
#[derive(Debug, Clone)]
pub struct Lane {
    pub id: String,
    pub name: String,
    pub color: String,
    pub synthetic: bool,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone)]
pub struct BoardView {
    pub totals: Totals,
    pub lanes: Vec<Lane>,
}

pub fn totals(tasks: &[Task]) -> Totals {
    Totals {
        all: tasks.len(),
        completed: tasks.iter().filter(|t| t.completed).count(),
    }
}

pub fn active_tasks(tasks: &[Task]) -> Vec<&Task> {
    tasks.iter().filter(|t| t.is_active()).collect()
}

pub fn completed_tasks(tasks: &[Task]) -> Vec<&Task> {
    tasks.iter().filter(|t| t.completed).collect()
}

/// Groups active tasks into lanes in category creation order, preserving the
/// task sequence order inside each lane. Active tasks with an empty or
/// dangling category land in the synthetic bucket, appended only when it has
/// something in it. Real categories keep their lane even when empty.
pub fn board_view(tasks: &[Task], categories: &[Category]) -> BoardView {
    let mut lanes: Vec<Lane> = categories
        .iter()
        .map(|c| Lane {
            id: c.id.clone(),
            name: c.name.clone(),
            color: c.color.clone(),
            synthetic: false,
            tasks: Vec::new(),
        })
        .collect();

    let mut stray: Vec<Task> = Vec::new();
    for task in tasks.iter().filter(|t| t.is_active()) {
        match lanes.iter_mut().find(|lane| lane.id == task.category_id) {
            Some(lane) => lane.tasks.push(task.clone()),
            None => stray.push(task.clone()),
        }
    }

    if !stray.is_empty() {
        lanes.push(Lane {
            id: UNCATEGORIZED_ID.to_string(),
            name: UNCATEGORIZED_NAME.to_string(),
            color: UNCATEGORIZED_COLOR.to_string(),
            synthetic: true,
            tasks: stray,
        });
    }

    BoardView {
        totals: totals(tasks),
        lanes,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{board_view, totals};
    use crate::category::{Category, UNCATEGORIZED_ID};
    use crate::task::Task;

    fn task(id: &str, title: &str, category_id: &str, completed: bool) -> Task {
        Task {
            id: id.to_string(),
            title: title.to_string(),
            notes: String::new(),
            recommended_date: String::new(),
            deadline: String::new(),
            category_id: category_id.to_string(),
            completed,
            created_at: Utc
                .with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
                .single()
                .expect("valid timestamp"),
        }
    }

    fn category(id: &str, name: &str) -> Category {
        Category {
            id: id.to_string(),
            name: name.to_string(),
            color: "#0ea5e9".to_string(),
        }
    }

    #[test]
    fn groups_active_tasks_by_lane_with_bucket_last() {
        let categories = vec![category("work", "Work"), category("home", "Home")];
        let tasks = vec![
            task("t1", "report", "work", false),
            task("t2", "dishes", "home", false),
            task("t3", "shipped", "work", true),
            task("t4", "stray", "", false),
            task("t5", "dangling", "gone", false),
        ];

        let view = board_view(&tasks, &categories);
        let names: Vec<&str> = view.lanes.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(names, vec!["work", "home", UNCATEGORIZED_ID]);

        assert_eq!(view.lanes[0].tasks.len(), 1, "completed task stays out");
        assert_eq!(view.lanes[1].tasks.len(), 1);
        assert!(view.lanes[2].synthetic);
        assert_eq!(view.lanes[2].tasks.len(), 2);
        assert_eq!(view.totals.all, 5);
        assert_eq!(view.totals.completed, 1);
    }

    #[test]
    fn bucket_is_absent_when_every_active_task_has_a_lane() {
        let categories = vec![category("work", "Work")];
        let tasks = vec![
            task("t1", "report", "work", false),
            task("t2", "stray done", "", true),
        ];

        let view = board_view(&tasks, &categories);
        assert_eq!(view.lanes.len(), 1, "completed stray does not force a bucket");
        assert!(!view.lanes[0].synthetic);
    }

    #[test]
    fn empty_categories_keep_their_lanes() {
        let categories = vec![category("work", "Work"), category("idle", "Idle")];
        let tasks = vec![task("t1", "report", "work", false)];

        let view = board_view(&tasks, &categories);
        assert_eq!(view.lanes.len(), 2);
        assert!(view.lanes[1].tasks.is_empty());
    }

    #[test]
    fn totals_count_all_and_completed() {
        let tasks = vec![
            task("t1", "a", "", false),
            task("t2", "b", "", true),
            task("t3", "c", "", true),
        ];
        let t = totals(&tasks);
        assert_eq!(t.all, 3);
        assert_eq!(t.completed, 2);
    }
}
