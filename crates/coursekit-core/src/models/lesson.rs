use serde::{Deserialize, Serialize};

/// A practice problem without its answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ProblemPublic {
    pub id: i64,
    pub order: i32,
    pub prompt: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub points: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct LessonDetail {
    pub id: i64,
    pub module_id: i64,
    pub course_id: i64,
    pub title: String,
    pub order: i32,
    #[serde(default)]
    pub video_url: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub duration_minutes: u32,
    #[serde(default)]
    pub problems: Vec<ProblemPublic>,
}

impl LessonDetail {
    pub fn total_points(&self) -> u32 {
        self.problems.iter().map(|p| p.points).sum()
    }

    pub fn has_video(&self) -> bool {
        !self.video_url.trim().is_empty()
    }
}

/// Grading outcome of a submitted answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct AttemptResult {
    pub attempt_id: i64,
    pub is_correct: bool,
    pub awarded_points: u32,
    pub lesson_progress: u8,
    pub course_progress: u8,
    pub correct_answer_if_wrong: Option<String>,
}
