//! Data models for the learning API.
//!
//! This module contains the wire types exchanged with the backend:
//!
//! - `UserIdentity`, `TokenPair`, `AuthResponse`: authentication payloads
//! - `CourseListItem`, `CourseDetail`, `CourseTree`: course catalog and structure
//! - `LessonDetail`, `ProblemPublic`, `AttemptResult`: lesson content and grading
//! - `Enrollment`, `EnrollmentRecord`: per-user course enrollment

pub mod course;
pub mod lesson;
pub mod user;

pub use course::{
    CourseDetail, CourseListItem, CourseRef, CourseTree, Enrollment, EnrollmentRecord,
    LessonTreeNode, ModuleTreeNode,
};
pub use lesson::{AttemptResult, LessonDetail, ProblemPublic};
pub use user::{AuthResponse, RefreshResponse, TokenPair, UserIdentity};
