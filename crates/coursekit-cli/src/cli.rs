//! Command line definition.

use clap::{Parser, Subcommand};
use coursekit_core::models::CourseRef;

/// Browse courses and practice problems from the terminal
#[derive(Parser, Debug)]
#[command(name = "coursekit", version, about)]
pub struct Cli {
    /// Override the API base URL for this run
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and persist the session
    Login {
        #[arg(short, long)]
        username: Option<String>,
        /// Page to continue at after logging in
        #[arg(long)]
        next: Option<String>,
    },
    /// Create an account and log in
    Register {
        #[arg(short, long)]
        username: Option<String>,
        #[arg(short, long)]
        email: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged in user
    Whoami,
    /// List published courses
    Courses,
    /// Show a course by id or slug
    Course { course: CourseRef },
    /// Show a lesson and its problems
    Lesson { id: i64 },
    /// Enroll in a course
    Enroll { course_id: i64 },
    /// Submit an answer to a problem
    Submit { problem_id: i64, answer: String },
    /// List your enrollments and progress
    Enrollments,
    /// Check that the backend is reachable
    Health,
}

impl Command {
    /// Destination a protected command stands for, or `None` if anyone may
    /// run it.
    pub fn protected_destination(&self) -> Option<String> {
        match self {
            Command::Whoami | Command::Enrollments => Some("/dashboard".to_string()),
            Command::Lesson { id } => Some(format!("/lessons/{}", id)),
            Command::Enroll { course_id } => Some(format!("/courses/{}", course_id)),
            Command::Submit { problem_id, .. } => Some(format!("/problems/{}", problem_id)),
            Command::Login { .. }
            | Command::Register { .. }
            | Command::Logout
            | Command::Courses
            | Command::Course { .. }
            | Command::Health => None,
        }
    }
}
