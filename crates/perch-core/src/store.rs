use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::category::{self, Category, CategoryDraft};
use crate::clock::{Clock, SystemClock};
use crate::datastore::DataStore;
use crate::ids::{IdGen, UuidIds};
use crate::task::{Task, TaskDraft};
use crate::views::{self, BoardView};

/// Owns the ordered task sequence. Every successful mutation writes the full
/// sequence back through the datastore; rejected input is a quiet no-op, not
/// an error.
#[derive(Debug)]
pub struct TaskStore {
    store: DataStore,
    clock: Box<dyn Clock>,
    ids: Box<dyn IdGen>,
    tasks: Vec<Task>,
}

impl TaskStore {
    pub fn open(store: DataStore) -> Self {
        Self::with_capabilities(store, Box::new(SystemClock), Box::new(UuidIds))
    }

    pub fn with_capabilities(
        store: DataStore,
        clock: Box<dyn Clock>,
        ids: Box<dyn IdGen>,
    ) -> Self {
        let tasks = store.load_tasks();
        Self {
            store,
            clock,
            ids,
            tasks,
        }
    }

    pub fn all(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Creates from a draft, newest first. A title that trims to empty is
    /// rejected without touching the sequence.
    #[tracing::instrument(skip(self, draft))]
    pub fn create(&mut self, draft: TaskDraft) -> anyhow::Result<Option<&Task>> {
        if draft.title.trim().is_empty() {
            debug!("ignoring task create with blank title");
            return Ok(None);
        }

        let task = Task::new(draft, self.clock.now(), self.ids.next_id());
        info!(id = %task.id, title = %task.title, "created task");
        self.tasks.insert(0, task);
        self.store.save_tasks(&self.tasks)?;
        Ok(self.tasks.first())
    }

    /// Wholesale replacement of the mutable fields; `id` and `createdAt`
    /// survive. Unknown ids and blank titles are no-ops.
    #[tracing::instrument(skip(self, draft), fields(id = id))]
    pub fn update(&mut self, id: &str, draft: TaskDraft) -> anyhow::Result<bool> {
        if draft.title.trim().is_empty() {
            debug!("ignoring task update with blank title");
            return Ok(false);
        }
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            debug!("task not found");
            return Ok(false);
        };

        task.apply(draft);
        info!("updated task");
        self.store.save_tasks(&self.tasks)?;
        Ok(true)
    }

    /// Flips `completed`, returning the new state. Applied twice this is a
    /// no-op pair.
    #[tracing::instrument(skip(self), fields(id = id))]
    pub fn toggle_completed(&mut self, id: &str) -> anyhow::Result<Option<bool>> {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            debug!("task not found");
            return Ok(None);
        };

        task.completed = !task.completed;
        let completed = task.completed;
        info!(completed, "toggled task");
        self.store.save_tasks(&self.tasks)?;
        Ok(Some(completed))
    }

    #[tracing::instrument(skip(self), fields(id = id))]
    pub fn remove(&mut self, id: &str) -> anyhow::Result<bool> {
        let Some(idx) = self.tasks.iter().position(|t| t.id == id) else {
            debug!("task not found");
            return Ok(false);
        };

        self.tasks.remove(idx);
        info!("deleted task");
        self.store.save_tasks(&self.tasks)?;
        Ok(true)
    }

    /// Empties `categoryId` on every task referencing the given category and
    /// returns how many were detached. Runs when a category is deleted.
    #[tracing::instrument(skip(self), fields(category_id = category_id))]
    pub fn clear_category_references(&mut self, category_id: &str) -> anyhow::Result<usize> {
        let mut detached = 0usize;
        for task in &mut self.tasks {
            if task.category_id == category_id {
                task.category_id.clear();
                detached += 1;
            }
        }
        if detached > 0 {
            info!(detached, "detached tasks from deleted category");
            self.store.save_tasks(&self.tasks)?;
        }
        Ok(detached)
    }

    /// Bulk replacement used by import; callers are responsible for keeping
    /// the sequence invariants.
    pub(crate) fn replace_all(&mut self, tasks: Vec<Task>) -> anyhow::Result<()> {
        self.tasks = tasks;
        self.store.save_tasks(&self.tasks)
    }
}

/// Owns the ordered category sequence; creation appends, so creation order
/// is lane order on the board.
#[derive(Debug)]
pub struct CategoryStore {
    store: DataStore,
    categories: Vec<Category>,
    palette: Vec<String>,
}

impl CategoryStore {
    pub fn open(store: DataStore) -> Self {
        let categories = store.load_categories();
        Self {
            store,
            categories,
            palette: category::PALETTE.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Replaces the default lane palette (the `palette` config key).
    pub fn set_palette(&mut self, palette: Vec<String>) {
        if !palette.is_empty() {
            self.palette = palette;
        }
    }

    pub fn palette(&self) -> &[String] {
        &self.palette
    }

    /// The color the next created category would get when none is chosen,
    /// cycling the palette by creation order.
    pub fn next_color(&self) -> String {
        self.palette[self.categories.len() % self.palette.len()].clone()
    }

    pub fn all(&self) -> &[Category] {
        &self.categories
    }

    pub fn get(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Derives the id from the name and returns it so callers can default
    /// new tasks into the fresh lane. A blank name is a no-op. Without an
    /// explicit color the palette is cycled by creation order.
    #[tracing::instrument(skip(self, name, color))]
    pub fn create(&mut self, name: &str, color: Option<String>) -> anyhow::Result<Option<String>> {
        if name.trim().is_empty() {
            debug!("ignoring category create with blank name");
            return Ok(None);
        }

        let id = category::derive_id(name, &self.categories)?;
        let color = color.unwrap_or_else(|| self.next_color());
        info!(id = %id, "created category");
        self.categories.push(Category::new(name, color, id.clone()));
        self.store.save_categories(&self.categories)?;
        Ok(Some(id))
    }

    /// Renames/recolors in place; the id never changes, so task references
    /// stay valid across renames.
    #[tracing::instrument(skip(self, draft), fields(id = id))]
    pub fn update(&mut self, id: &str, draft: CategoryDraft) -> anyhow::Result<bool> {
        if draft.name.trim().is_empty() {
            debug!("ignoring category update with blank name");
            return Ok(false);
        }
        let Some(cat) = self.categories.iter_mut().find(|c| c.id == id) else {
            debug!("category not found");
            return Ok(false);
        };

        cat.apply(draft);
        info!("updated category");
        self.store.save_categories(&self.categories)?;
        Ok(true)
    }

    #[tracing::instrument(skip(self), fields(id = id))]
    pub fn remove(&mut self, id: &str) -> anyhow::Result<bool> {
        let Some(idx) = self.categories.iter().position(|c| c.id == id) else {
            debug!("category not found");
            return Ok(false);
        };

        self.categories.remove(idx);
        info!("deleted category");
        self.store.save_categories(&self.categories)?;
        Ok(true)
    }

    pub(crate) fn replace_all(&mut self, categories: Vec<Category>) -> anyhow::Result<()> {
        self.categories = categories;
        self.store.save_categories(&self.categories)
    }
}

/// Top-level application state: the two stores over one datastore.
#[derive(Debug)]
pub struct Board {
    pub tasks: TaskStore,
    pub categories: CategoryStore,
}

impl Board {
    pub fn open(store: DataStore) -> Self {
        Self {
            tasks: TaskStore::open(store.clone()),
            categories: CategoryStore::open(store),
        }
    }

    pub fn with_capabilities(
        store: DataStore,
        clock: Box<dyn Clock>,
        ids: Box<dyn IdGen>,
    ) -> Self {
        Self {
            tasks: TaskStore::with_capabilities(store.clone(), clock, ids),
            categories: CategoryStore::open(store),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.tasks.now()
    }

    /// Deleting a category detaches (never deletes) the tasks that pointed
    /// at it. `None` means the id matched nothing; otherwise the count of
    /// detached tasks.
    #[tracing::instrument(skip(self), fields(id = id))]
    pub fn remove_category(&mut self, id: &str) -> anyhow::Result<Option<usize>> {
        if !self.categories.remove(id)? {
            return Ok(None);
        }
        let detached = self.tasks.clear_category_references(id)?;
        Ok(Some(detached))
    }

    /// Lanes, bucket, and totals recomputed from scratch; nothing cached.
    pub fn view(&self) -> BoardView {
        views::board_view(self.tasks.all(), self.categories.all())
    }
}
