use std::path::{Path, PathBuf};

use derive_more::From;
use serde::{Deserialize, Serialize};
use stylus::Annotation;
use thiserror::Error;

#[derive(Debug, From, Error)]
pub enum LessonError {
    #[error("Failed to read lessons directory '{directory}': {error}")]
    #[from(skip)]
    ReadDirectory {
        directory: PathBuf,
        error: std::io::Error,
    },

    #[error("Failed to access lessons: {0}")]
    Io(std::io::Error),

    #[error("Failed to parse lesson '{path}': {error}")]
    #[from(skip)]
    ParseFile {
        path: PathBuf,
        error: toml::de::Error,
    },

    #[error("Lesson id '{0}' is used by more than one lesson")]
    #[from(skip)]
    DuplicateId(String),
}

/// Read every `*.toml` lesson in a directory, creating the directory if it is missing
pub fn get_lessons(from_dir: &Path) -> Result<Catalog, LessonError> {
    if !from_dir.exists() {
        std::fs::create_dir_all(from_dir)?;
    }

    let files = from_dir
        .read_dir()
        .map_err(|error| LessonError::ReadDirectory {
            directory: from_dir.to_path_buf(),
            error,
        })?;

    let mut lessons = Vec::new();

    for entry in files {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "toml") {
            let content = std::fs::read_to_string(&path)?;
            let lesson: LessonConfig = toml::from_str(&content)
                .map_err(|error| LessonError::ParseFile { path, error })?;
            lessons.push(lesson);
        }
    }

    tracing::debug!(count = lessons.len(), directory = %from_dir.display(), "lessons loaded");

    Catalog::new(lessons)
}

/// A single lesson
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonConfig {
    pub meta: LessonMeta,
    /// Markdown instructions shown next to the editor
    #[serde(default)]
    pub instructions: String,
    /// The code the learner has to reproduce
    pub target_code: String,
    /// What the editor contains before the learner starts
    #[serde(default)]
    pub starting_code: String,
    #[serde(default)]
    pub comments: Vec<CommentConfig>,
}

impl LessonConfig {
    pub fn annotations(&self) -> Vec<Annotation> {
        self.comments.iter().map(Annotation::from).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonMeta {
    pub id: String,
    pub title: String,
    /// Module label shown in the lesson list
    pub category: String,
    pub track: String,
    pub module_number: u32,
    pub lesson_number: u32,
    #[serde(default)]
    pub language: Option<String>,
}

/// An instructor comment attached to a line of the learner's code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentConfig {
    pub line: usize,
    pub text: String,
}

impl From<&CommentConfig> for Annotation {
    fn from(comment: &CommentConfig) -> Self {
        Self {
            line: comment.line,
            text: comment.text.clone(),
        }
    }
}

/// All lessons, in curriculum order
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    lessons: Vec<LessonConfig>,
}

impl Catalog {
    /// Order lessons by track, module and lesson number
    pub fn new(mut lessons: Vec<LessonConfig>) -> Result<Self, LessonError> {
        lessons.sort_by(|a, b| {
            (&a.meta.track, a.meta.module_number, a.meta.lesson_number, &a.meta.id).cmp(&(
                &b.meta.track,
                b.meta.module_number,
                b.meta.lesson_number,
                &b.meta.id,
            ))
        });

        let mut ids: Vec<&str> = lessons.iter().map(|lesson| lesson.meta.id.as_str()).collect();
        ids.sort_unstable();
        if let Some(pair) = ids.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(LessonError::DuplicateId(pair[0].to_string()));
        }

        Ok(Self { lessons })
    }

    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LessonConfig> {
        self.lessons.iter()
    }

    pub fn get(&self, index: usize) -> Option<&LessonConfig> {
        self.lessons.get(index)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.lessons.iter().position(|lesson| lesson.meta.id == id)
    }

    pub fn find(&self, id: &str) -> Option<&LessonConfig> {
        self.position(id).and_then(|index| self.get(index))
    }

    /// The lesson after the one with the given id
    pub fn next_after(&self, id: &str) -> Option<&LessonConfig> {
        self.position(id).and_then(|index| self.get(index + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LESSON: &str = r#"
instructions = "Declare a constant."
target_code = "const a = 1;"

[meta]
id = "ts-1-1"
title = "Constants"
category = "Strict Types"
track = "frontend"
module_number = 1
lesson_number = 1
language = "typescript"

[[comments]]
line = 1
text = "const cannot be reassigned"
"#;

    fn lesson(id: &str, track: &str, module_number: u32, lesson_number: u32) -> LessonConfig {
        LessonConfig {
            meta: LessonMeta {
                id: id.to_string(),
                title: id.to_string(),
                category: "Module".to_string(),
                track: track.to_string(),
                module_number,
                lesson_number,
                language: None,
            },
            instructions: String::new(),
            target_code: "x".to_string(),
            starting_code: String::new(),
            comments: Vec::new(),
        }
    }

    #[test]
    fn test_parse_lesson() {
        let lesson: LessonConfig = toml::from_str(LESSON).unwrap();

        assert_eq!(lesson.meta.id, "ts-1-1");
        assert_eq!(lesson.meta.language.as_deref(), Some("typescript"));
        assert_eq!(lesson.target_code, "const a = 1;");
        assert!(lesson.starting_code.is_empty());
        assert_eq!(
            lesson.annotations(),
            vec![Annotation {
                line: 1,
                text: "const cannot be reassigned".to_string()
            }]
        );
    }

    #[test]
    fn test_catalog_order_and_navigation() {
        let catalog = Catalog::new(vec![
            lesson("b-2-1", "backend", 2, 1),
            lesson("f-1-2", "frontend", 1, 2),
            lesson("b-1-1", "backend", 1, 1),
            lesson("f-1-1", "frontend", 1, 1),
        ])
        .unwrap();

        let ids: Vec<&str> = catalog.iter().map(|l| l.meta.id.as_str()).collect();
        assert_eq!(ids, vec!["b-1-1", "b-2-1", "f-1-1", "f-1-2"]);
        assert_eq!(catalog.next_after("b-2-1").unwrap().meta.id, "f-1-1");
        assert!(catalog.next_after("f-1-2").is_none());
        assert!(catalog.find("missing").is_none());
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let result = Catalog::new(vec![
            lesson("same", "backend", 1, 1),
            lesson("same", "frontend", 1, 1),
        ]);
        assert!(matches!(result, Err(LessonError::DuplicateId(id)) if id == "same"));
    }

    #[test]
    fn test_get_lessons_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("constants.toml"), LESSON).unwrap();
        std::fs::write(dir.path().join("notes.md"), "not a lesson").unwrap();

        let catalog = get_lessons(dir.path()).unwrap();
        assert_eq!(catalog.len(), 1);

        std::fs::write(dir.path().join("broken.toml"), "meta = 3").unwrap();
        assert!(matches!(
            get_lessons(dir.path()),
            Err(LessonError::ParseFile { .. })
        ));
    }

    #[test]
    fn test_bundled_lessons_parse() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../lessons");
        let catalog = get_lessons(&dir).unwrap();

        assert!(!catalog.is_empty());
        assert!(catalog.iter().all(|lesson| !lesson.target_code.trim().is_empty()));
    }

    #[test]
    fn test_missing_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let lessons_dir = dir.path().join("lessons");

        let catalog = get_lessons(&lessons_dir).unwrap();
        assert!(catalog.is_empty());
        assert!(lessons_dir.exists());
    }
}
