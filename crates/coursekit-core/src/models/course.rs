use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A course as listed in the catalog. `enrolled` and `progress_percent` are
/// only meaningful for authenticated requests; anonymous callers get
/// `false` and `0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CourseListItem {
    pub id: i64,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cover_image: String,
    pub modules_count: u32,
    pub lessons_count: u32,
    #[serde(default)]
    pub enrolled: bool,
    #[serde(default)]
    pub progress_percent: u8,
}

impl CourseListItem {
    pub fn display_size(&self) -> String {
        format!("{} modules, {} lessons", self.modules_count, self.lessons_count)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CourseDetail {
    pub id: i64,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cover_image: String,
    #[serde(default)]
    pub is_published: bool,
    pub modules_count: u32,
    pub lessons_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct LessonTreeNode {
    pub id: i64,
    pub title: String,
    pub order: i32,
    #[serde(default)]
    pub duration_minutes: u32,
    #[serde(default)]
    pub lesson_completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ModuleTreeNode {
    pub id: i64,
    pub title: String,
    pub order: i32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub lessons: Vec<LessonTreeNode>,
}

/// Course structure with per-lesson completion for the current user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CourseTree {
    pub course: CourseDetail,
    #[serde(default)]
    pub modules: Vec<ModuleTreeNode>,
    #[serde(default)]
    pub course_progress: u8,
}

impl CourseTree {
    /// All lessons in module order.
    pub fn lessons(&self) -> impl Iterator<Item = &LessonTreeNode> {
        self.modules.iter().flat_map(|m| m.lessons.iter())
    }

    pub fn completed_lessons(&self) -> usize {
        self.lessons().filter(|l| l.lesson_completed).count()
    }

    /// First lesson not yet completed, falling back to the first lesson.
    pub fn next_lesson(&self) -> Option<&LessonTreeNode> {
        self.lessons()
            .find(|l| !l.lesson_completed)
            .or_else(|| self.lessons().next())
    }

    pub fn total_minutes(&self) -> u32 {
        self.lessons().map(|l| l.duration_minutes).sum()
    }
}

/// Enrollment as listed by `/me/enrollments/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Enrollment {
    pub id: i64,
    pub progress_percent: u8,
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
    pub course: CourseListItem,
}

/// Enrollment record returned by `/courses/{id}/enroll/`; `user` and
/// `course` are bare ids here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct EnrollmentRecord {
    pub id: i64,
    pub user: i64,
    pub course: i64,
    pub progress_percent: u8,
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
}

/// A course is addressed either by numeric id or by slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CourseRef {
    Id(i64),
    Slug(String),
}

impl FromStr for CourseRef {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(id) = s.parse() {
                return Ok(CourseRef::Id(id));
            }
        }
        Ok(CourseRef::Slug(s.to_string()))
    }
}

impl fmt::Display for CourseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CourseRef::Id(id) => write!(f, "{}", id),
            CourseRef::Slug(slug) => f.write_str(slug),
        }
    }
}

impl From<i64> for CourseRef {
    fn from(id: i64) -> Self {
        CourseRef::Id(id)
    }
}
