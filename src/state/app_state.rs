use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use icb_reader::{IdAllocator, Project};

pub type ProjectHandle = Arc<Mutex<Project>>;

/// Open projects by handle id, plus the directory each one owns.
///
/// A directory is owned by at most one handle, so only one annotation store
/// ever writes its annotation file.
#[derive(Default)]
pub struct ProjectRegistry {
    by_id: HashMap<Uuid, ProjectHandle>,
    by_dir: HashMap<PathBuf, Uuid>,
}

/// Result of `ProjectRegistry::register`.
pub struct Registration {
    pub id: Uuid,
    pub handle: ProjectHandle,
    /// False when the directory was already open and the existing handle was returned.
    pub created: bool,
}

impl ProjectRegistry {
    pub fn get(&self, id: &Uuid) -> Option<&ProjectHandle> {
        self.by_id.get(id)
    }

    pub fn id_for_dir(&self, dir: &Path) -> Option<Uuid> {
        self.by_dir.get(dir).copied()
    }

    /// Add `project` under a fresh id, unless its directory is already open.
    /// In that case `project` is dropped and the existing handle comes back.
    pub fn register(&mut self, project: Project) -> Registration {
        if let Some(id) = self.id_for_dir(project.dir()) {
            if let Some(handle) = self.by_id.get(&id) {
                return Registration {
                    id,
                    handle: handle.clone(),
                    created: false,
                };
            }
        }

        let id = Uuid::new_v4();
        let dir = project.dir().to_path_buf();
        let handle = Arc::new(Mutex::new(project));
        self.by_id.insert(id, handle.clone());
        self.by_dir.insert(dir, id);

        Registration {
            id,
            handle,
            created: true,
        }
    }

    pub fn remove(&mut self, id: &Uuid) -> Option<ProjectHandle> {
        let handle = self.by_id.remove(id)?;
        self.by_dir.retain(|_, owner| owner != id);
        Some(handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Uuid, &ProjectHandle)> {
        self.by_id.iter()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub projects: Arc<RwLock<ProjectRegistry>>,
    // Shared by every open project so annotation ids never collide
    pub ids: IdAllocator,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_ids(IdAllocator::process())
    }

    pub fn with_ids(ids: IdAllocator) -> Self {
        Self {
            projects: Arc::new(RwLock::new(ProjectRegistry::default())),
            ids,
        }
    }

    pub async fn project(&self, id: &Uuid) -> Option<ProjectHandle> {
        self.projects.read().await.get(id).cloned()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn project_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("01-01-2023_10_00_00_1_0000.cal"),
            "01-01-2023 10:00:00\n",
        )
        .unwrap();
        fs::write(dir.path().join("01-01-2023_10_00_00_1_0000.wav"), [1u8, 0, 2, 0]).unwrap();
        dir
    }

    #[test]
    fn test_same_directory_registers_once() {
        let dir = project_dir();
        let ids = IdAllocator::new();
        let mut registry = ProjectRegistry::default();

        let first = registry.register(Project::open(dir.path(), ids.clone()).unwrap());
        assert!(first.created);

        // A different spelling of the same directory
        let again = Project::open(dir.path().join("."), ids).unwrap();
        let second = registry.register(again);
        assert!(!second.created);
        assert_eq!(second.id, first.id);
        assert!(Arc::ptr_eq(&second.handle, &first.handle));
        assert_eq!(registry.iter().count(), 1);
    }

    #[test]
    fn test_single_owner_keeps_every_annotation() {
        let dir = project_dir();
        let ids = IdAllocator::new();
        let mut registry = ProjectRegistry::default();

        let a = registry.register(Project::open(dir.path(), ids.clone()).unwrap());
        let b = registry.register(Project::open(dir.path(), ids.clone()).unwrap());

        let start: chrono::NaiveDateTime = "2023-01-01T10:00:00".parse().unwrap();
        for (handle, title) in [(&a.handle, "from a"), (&b.handle, "from b")] {
            let mut project = handle.try_lock().unwrap();
            project
                .annotations
                .create(icb_reader::NewAnnotation {
                    title: title.to_string(),
                    content: String::new(),
                    start,
                    end: start,
                    color: None,
                })
                .unwrap();
        }

        let reopened = Project::open(dir.path(), ids).unwrap();
        let titles: Vec<_> = reopened
            .annotations
            .annotations()
            .iter()
            .map(|a| a.title.as_str())
            .collect();
        assert_eq!(titles, vec!["from a", "from b"]);
    }

    #[test]
    fn test_remove_releases_directory() {
        let dir = project_dir();
        let ids = IdAllocator::new();
        let mut registry = ProjectRegistry::default();

        let first = registry.register(Project::open(dir.path(), ids.clone()).unwrap());
        assert!(registry.remove(&first.id).is_some());
        assert!(registry.remove(&first.id).is_none());

        let project = Project::open(dir.path(), ids).unwrap();
        assert!(registry.id_for_dir(project.dir()).is_none());
        let second = registry.register(project);
        assert!(second.created);
        assert_ne!(second.id, first.id);
    }
}
