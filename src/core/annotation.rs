// Annotation store: identity, in-memory collection and JSON persistence
//
// Every mutation rewrites the whole file, so the file on disk is always a
// complete snapshot of the collection.

use crate::core::constants::BACKUP_SUFFIX;
use crate::core::error::{ProjectError, Result};
use crate::core::format::{Annotation, AnnotationLoad, AnnotationWarning, Rgb};
use crate::core::ids::IdAllocator;
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Fields supplied by the user when confirming a new annotation.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAnnotation {
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(default)]
    pub color: Option<Rgb>,
}

/// Editable fields; `None` leaves the field as it is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnotationUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Read and validate an annotation file.
pub fn load_annotations(path: &Path) -> Result<Vec<Annotation>> {
    let format_err = |reason: String| ProjectError::AnnotationFormat {
        path: path.to_path_buf(),
        reason,
    };

    let text = fs::read_to_string(path).map_err(|e| format_err(e.to_string()))?;
    let annotations: Vec<Annotation> =
        serde_json::from_str(&text).map_err(|e| format_err(e.to_string()))?;

    let mut seen = HashSet::with_capacity(annotations.len());
    for annotation in &annotations {
        if !seen.insert(annotation.id) {
            return Err(format_err(format!("duplicate id {}", annotation.id)));
        }
        if annotation.start > annotation.end {
            return Err(format_err(format!(
                "annotation {} ends before it starts",
                annotation.id
            )));
        }
    }

    Ok(annotations)
}

/// Like `load_annotations`, but a bad file degrades to a warning instead of an error.
pub fn read_annotations(path: &Path) -> AnnotationLoad {
    info!("Loading annotations from {}", path.display());
    match load_annotations(path) {
        Ok(annotations) => AnnotationLoad::Loaded(annotations),
        Err(e) => {
            warn!(
                "The annotations could not be loaded from file at {}: {}",
                path.display(),
                e
            );
            AnnotationLoad::Degraded(AnnotationWarning {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        }
    }
}

/// Overwrite `path` with the full collection.
///
/// Written to a sibling temp file first and renamed over the target, so a
/// failed write never leaves a half-written snapshot behind.
pub fn save_annotations(path: &Path, annotations: &[Annotation]) -> Result<()> {
    let json = serde_json::to_vec_pretty(annotations)?;

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    fs::write(&tmp_path, json)?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

/// Copy `path` to `<name>.bak` next to it and return the copy's path.
///
/// A file that no longer exists has nothing to keep and yields `None`.
pub fn backup_annotations(path: &Path) -> Result<Option<PathBuf>> {
    let mut backup_name = path.file_name().unwrap_or_default().to_os_string();
    backup_name.push(BACKUP_SUFFIX);
    let backup_path = path.with_file_name(backup_name);

    match fs::copy(path, &backup_path) {
        Ok(_) => {
            info!(
                "Kept unreadable annotation file as {}",
                backup_path.display()
            );
            Ok(Some(backup_path))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// The annotations of one project.
#[derive(Debug, Clone)]
pub struct AnnotationStore {
    path: PathBuf,
    annotations: Vec<Annotation>,
    ids: IdAllocator,
    // Unreadable source file, copied aside before the first write
    unreadable_source: Option<PathBuf>,
}

impl AnnotationStore {
    pub fn new(path: impl Into<PathBuf>, ids: IdAllocator) -> Self {
        Self::with_annotations(path, Vec::new(), ids)
    }

    /// Wrap already loaded annotations. The shared counter is moved past the
    /// largest loaded id so later `create` calls cannot collide with them.
    pub fn with_annotations(
        path: impl Into<PathBuf>,
        annotations: Vec<Annotation>,
        ids: IdAllocator,
    ) -> Self {
        if let Some(max_id) = annotations.iter().map(|a| a.id).max() {
            ids.reserve_through(max_id);
        }
        Self {
            path: path.into(),
            annotations,
            ids,
            unreadable_source: None,
        }
    }

    /// Build a store that persists to `target`, seeded from `source` if given.
    ///
    /// A malformed source yields an empty store plus the warning. The
    /// malformed file is copied to `<name>.bak` before the store first
    /// writes.
    pub fn open(
        target: impl Into<PathBuf>,
        source: Option<&Path>,
        ids: IdAllocator,
    ) -> (Self, Option<AnnotationWarning>) {
        let load = match source {
            Some(path) => read_annotations(path),
            None => AnnotationLoad::Loaded(Vec::new()),
        };
        let (annotations, warning) = load.into_parts();
        let mut store = Self::with_annotations(target, annotations, ids);
        if warning.is_some() {
            store.unreadable_source = source.map(Path::to_path_buf);
        }
        (store, warning)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    pub fn get(&self, id: u64) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Assign the next id, append, persist.
    pub fn create(&mut self, draft: NewAnnotation) -> Result<Annotation> {
        let title = validate_title(draft.title)?;
        if draft.start > draft.end {
            return Err(ProjectError::InvalidSpan {
                start: draft.start,
                end: draft.end,
            });
        }

        let annotation = Annotation {
            id: self.ids.next_id(),
            title,
            content: draft.content,
            start: draft.start,
            end: draft.end,
            color: draft.color.unwrap_or_default(),
        };

        self.annotations.push(annotation.clone());
        if let Err(e) = self.persist() {
            self.annotations.pop();
            return Err(e);
        }

        info!("Created annotation {} '{}'", annotation.id, annotation.title);
        Ok(annotation)
    }

    /// Change title and/or content in place, then persist.
    pub fn update(&mut self, id: u64, changes: AnnotationUpdate) -> Result<&Annotation> {
        let title = changes.title.map(validate_title).transpose()?;
        let index = self.index_of(id)?;

        let previous = self.annotations[index].clone();
        {
            let annotation = &mut self.annotations[index];
            if let Some(title) = title {
                annotation.title = title;
            }
            if let Some(content) = changes.content {
                annotation.content = content;
            }
        }

        if let Err(e) = self.persist() {
            self.annotations[index] = previous;
            return Err(e);
        }

        info!("Updated annotation {}", id);
        Ok(&self.annotations[index])
    }

    /// Remove from memory and from the file.
    pub fn delete(&mut self, id: u64) -> Result<Annotation> {
        let index = self.index_of(id)?;
        let removed = self.annotations.remove(index);

        if let Err(e) = self.persist() {
            self.annotations.insert(index, removed);
            return Err(e);
        }

        info!("Deleted annotation {}", id);
        Ok(removed)
    }

    /// Write the collection to the store's own file.
    pub fn persist(&mut self) -> Result<()> {
        if let Some(source) = &self.unreadable_source {
            backup_annotations(source)?;
        }
        self.persist_to(&self.path)?;
        self.unreadable_source = None;
        Ok(())
    }

    pub fn persist_to(&self, path: &Path) -> Result<()> {
        save_annotations(path, &self.annotations)
    }

    fn index_of(&self, id: u64) -> Result<usize> {
        self.annotations
            .iter()
            .position(|a| a.id == id)
            .ok_or(ProjectError::AnnotationNotFound(id))
    }
}

fn validate_title(title: String) -> Result<String> {
    if title.trim().is_empty() {
        Err(ProjectError::MissingTitle)
    } else {
        Ok(title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::ANNOTATION_FILE_NAME;
    use chrono::NaiveDate;

    fn at(s: u32, ms: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_milli_opt(10, 0, s, ms)
            .unwrap()
    }

    fn draft(title: &str, start: NaiveDateTime, end: NaiveDateTime) -> NewAnnotation {
        NewAnnotation {
            title: title.to_string(),
            content: format!("{title} notes"),
            start,
            end,
            color: Some(Rgb(0, 128, 255)),
        }
    }

    #[test]
    fn test_persist_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ANNOTATION_FILE_NAME);
        let mut store = AnnotationStore::new(&path, IdAllocator::new());

        store.create(draft("seizure", at(1, 0), at(4, 500))).unwrap();
        store.create(draft("artifact", at(7, 20), at(7, 20))).unwrap();
        store
            .create(NewAnnotation {
                color: None,
                ..draft("drift", at(9, 0), at(12, 0))
            })
            .unwrap();

        let loaded = load_annotations(&path).unwrap();
        assert_eq!(loaded, store.annotations());
        assert_eq!(loaded[2].color, Rgb(255, 0, 0));
    }

    #[test]
    fn test_create_then_delete_restores_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ANNOTATION_FILE_NAME);
        let mut store = AnnotationStore::new(&path, IdAllocator::new());
        store.create(draft("keep", at(1, 0), at(2, 0))).unwrap();
        let before = load_annotations(&path).unwrap();

        let created = store.create(draft("temp", at(3, 0), at(4, 0))).unwrap();
        assert_eq!(load_annotations(&path).unwrap().len(), 2);

        store.delete(created.id).unwrap();
        assert_eq!(load_annotations(&path).unwrap(), before);
    }

    #[test]
    fn test_update_only_touches_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ANNOTATION_FILE_NAME);
        let mut store = AnnotationStore::new(&path, IdAllocator::new());
        let created = store.create(draft("old", at(1, 0), at(2, 0))).unwrap();

        let updated = store
            .update(
                created.id,
                AnnotationUpdate {
                    title: Some("new".to_string()),
                    content: None,
                },
            )
            .unwrap()
            .clone();

        assert_eq!(updated.title, "new");
        assert_eq!(updated.content, created.content);
        assert_eq!(updated.start, created.start);
        assert_eq!(updated.color, created.color);
        assert_eq!(load_annotations(&path).unwrap(), vec![updated]);
    }

    #[test]
    fn test_unknown_id() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AnnotationStore::new(dir.path().join("a.json"), IdAllocator::new());

        assert!(matches!(
            store.delete(9),
            Err(ProjectError::AnnotationNotFound(9))
        ));
        assert!(matches!(
            store.update(9, AnnotationUpdate::default()),
            Err(ProjectError::AnnotationNotFound(9))
        ));
    }

    #[test]
    fn test_rejects_blank_title_and_reversed_span() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.json");
        let mut store = AnnotationStore::new(&path, IdAllocator::new());

        assert!(matches!(
            store.create(draft("   ", at(1, 0), at(2, 0))),
            Err(ProjectError::MissingTitle)
        ));
        assert!(matches!(
            store.create(draft("x", at(2, 0), at(1, 0))),
            Err(ProjectError::InvalidSpan { .. })
        ));
        assert!(store.is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn test_two_stores_never_share_ids() {
        let dir = tempfile::tempdir().unwrap();
        let ids = IdAllocator::new();
        let mut first = AnnotationStore::new(dir.path().join("a.json"), ids.clone());
        let mut second = AnnotationStore::new(dir.path().join("b.json"), ids);

        let mut issued = HashSet::new();
        for i in 0..10 {
            let store = if i % 2 == 0 { &mut first } else { &mut second };
            let created = store.create(draft("t", at(1, 0), at(2, 0))).unwrap();
            assert!(issued.insert(created.id));
        }
        assert_eq!(issued.len(), 10);
    }

    #[test]
    fn test_loaded_ids_are_not_reissued() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ANNOTATION_FILE_NAME);
        let ids = IdAllocator::new();

        let loaded = vec![Annotation {
            id: 40,
            title: "old".to_string(),
            content: String::new(),
            start: at(1, 0),
            end: at(1, 0),
            color: Rgb::default(),
        }];
        save_annotations(&path, &loaded).unwrap();

        let (mut store, warning) = AnnotationStore::open(&path, Some(path.as_path()), ids.clone());
        assert!(warning.is_none());
        assert_eq!(store.annotations(), loaded.as_slice());

        let created = store.create(draft("new", at(2, 0), at(3, 0))).unwrap();
        assert_eq!(created.id, 41);
    }

    #[test]
    fn test_malformed_file_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ANNOTATION_FILE_NAME);
        fs::write(&path, "{ not a list").unwrap();

        let load = read_annotations(&path);
        assert!(load.annotations().is_empty());
        assert_eq!(load.warning().unwrap().path, path);

        let (store, warning) = AnnotationStore::open(&path, Some(path.as_path()), IdAllocator::new());
        assert!(store.is_empty());
        assert!(warning.is_some());
    }

    #[test]
    fn test_malformed_file_kept_as_backup_on_first_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ANNOTATION_FILE_NAME);
        let backup = dir.path().join("annotations.json.bak");
        // Colour component out of u8 range
        let original = r#"[{"id":1,"title":"a","content":"","start":"2023-01-01T10:00:01","end":"2023-01-01T10:00:02","color":[256,0,0]}]"#;
        fs::write(&path, original).unwrap();

        let (mut store, warning) =
            AnnotationStore::open(&path, Some(path.as_path()), IdAllocator::new());
        assert!(warning.is_some());
        assert!(!backup.exists());

        let first = store.create(draft("first", at(3, 0), at(4, 0))).unwrap();
        assert_eq!(fs::read_to_string(&backup).unwrap(), original);
        assert_eq!(load_annotations(&path).unwrap(), vec![first.clone()]);

        // Later writes leave the backup alone
        store.delete(first.id).unwrap();
        assert_eq!(fs::read_to_string(&backup).unwrap(), original);
    }

    #[test]
    fn test_good_file_gets_no_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ANNOTATION_FILE_NAME);
        save_annotations(&path, &[]).unwrap();

        let (mut store, _) = AnnotationStore::open(&path, Some(path.as_path()), IdAllocator::new());
        store.create(draft("t", at(1, 0), at(2, 0))).unwrap();
        assert!(!dir.path().join("annotations.json.bak").exists());
    }

    #[test]
    fn test_duplicate_ids_are_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ANNOTATION_FILE_NAME);
        let one = Annotation {
            id: 3,
            title: "a".to_string(),
            content: String::new(),
            start: at(1, 0),
            end: at(2, 0),
            color: Rgb::default(),
        };
        save_annotations(&path, &[one.clone(), one]).unwrap();

        assert!(matches!(
            load_annotations(&path),
            Err(ProjectError::AnnotationFormat { .. })
        ));
    }

    #[test]
    fn test_failed_persist_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join(ANNOTATION_FILE_NAME);
        let mut store = AnnotationStore::new(&path, IdAllocator::new());

        assert!(store.create(draft("t", at(1, 0), at(2, 0))).is_err());
        assert!(store.is_empty());
    }
}
