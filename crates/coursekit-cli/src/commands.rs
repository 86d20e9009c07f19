//! Command handlers.
//!
//! Each handler runs against a bootstrapped [`SessionController`]; output
//! goes to stdout, diagnostics go through `tracing`.

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use coursekit_core::api::ApiError;
use coursekit_core::guard::{self, Access};
use coursekit_core::models::{CourseRef, CourseTree};
use coursekit_core::utils::{format_minutes, progress_bar, truncate_string};
use coursekit_core::{Config, SessionController};
use tracing::warn;

use crate::cli::Command;

/// Width of progress bars in listings
const PROGRESS_WIDTH: usize = 20;

/// Maximum description length shown in course listings
const DESCRIPTION_WIDTH: usize = 60;

/// Minimum password length accepted at registration
const MIN_PASSWORD_LEN: usize = 8;

pub struct App {
    pub config: Config,
    pub session: SessionController,
}

impl App {
    pub async fn run(&mut self, command: Command) -> Result<()> {
        if let Some(destination) = command.protected_destination() {
            let state = if self.session.is_loading() {
                self.session.ready().await
            } else {
                self.session.state()
            };
            match guard::check(&state, &destination) {
                Access::Granted => {}
                Access::RedirectToLogin { next } => {
                    bail!("Not logged in. Run `coursekit login` first (continue at {})", next);
                }
                Access::Pending => bail!("Session is still being restored"),
            }
        }

        match command {
            Command::Login { username, next } => self.login(username, next).await,
            Command::Register { username, email } => self.register(username, email).await,
            Command::Logout => {
                self.session.logout();
                println!("Logged out.");
                Ok(())
            }
            Command::Whoami => self.whoami(),
            Command::Courses => self.courses().await,
            Command::Course { course } => self.course(&course).await,
            Command::Lesson { id } => self.lesson(id).await,
            Command::Enroll { course_id } => self.enroll(course_id).await,
            Command::Submit { problem_id, answer } => self.submit(problem_id, &answer).await,
            Command::Enrollments => self.enrollments().await,
            Command::Health => self.health().await,
        }
    }

    // ===== Session =====

    async fn login(&mut self, username: Option<String>, next: Option<String>) -> Result<()> {
        let username = match username {
            Some(username) => username,
            None => prompt_username(self.config.last_username.as_deref())?,
        };
        let password = rpassword::prompt_password("Password: ")?;

        let user = match self.session.login(&username, &password).await {
            Ok(user) => user,
            Err(ApiError::InvalidCredentials(_)) => bail!("Invalid username or password"),
            Err(e) => return Err(e).context("Login failed"),
        };

        self.remember_username(&user.username);
        println!("Logged in as {}.", user.username);
        println!("Continue at {}", guard::next_destination(next.as_deref()));
        Ok(())
    }

    async fn register(&mut self, username: Option<String>, email: Option<String>) -> Result<()> {
        let username = match username {
            Some(username) => username,
            None => prompt("Username: ")?,
        };
        let email = match email {
            Some(email) => email,
            None => prompt("Email: ")?,
        };
        let password = rpassword::prompt_password("Password: ")?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            bail!("Password must be at least {} characters", MIN_PASSWORD_LEN);
        }
        let confirm = rpassword::prompt_password("Confirm password: ")?;
        if password != confirm {
            bail!("Passwords do not match");
        }

        let user = match self.session.register(&username, &email, &password).await {
            Ok(user) => user,
            Err(ApiError::InvalidCredentials(details)) => {
                bail!("Registration rejected: {}", details)
            }
            Err(e) => return Err(e).context("Registration failed"),
        };

        self.remember_username(&user.username);
        println!("Welcome, {}! You are logged in.", user.username);
        Ok(())
    }

    fn remember_username(&mut self, username: &str) {
        self.config.last_username = Some(username.to_string());
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
    }

    fn whoami(&self) -> Result<()> {
        let user = self
            .session
            .user()
            .context("No user in an authenticated session")?;
        println!("{} (id {})", user.username, user.id);
        if !user.email.is_empty() {
            println!("{}", user.email);
        }
        Ok(())
    }

    // ===== Courses =====

    async fn courses(&self) -> Result<()> {
        let courses = self.session.api().fetch_courses().await?;
        if courses.is_empty() {
            println!("No courses published yet.");
            return Ok(());
        }

        for course in &courses {
            let marker = if course.enrolled { "*" } else { " " };
            println!(
                "{} {:>4}  {:<40} {}",
                marker,
                course.id,
                truncate_string(&course.title, 40),
                course.display_size()
            );
            if !course.description.is_empty() {
                println!("        {}", truncate_string(&course.description, DESCRIPTION_WIDTH));
            }
            if course.enrolled {
                println!("        {}", progress_bar(course.progress_percent, PROGRESS_WIDTH));
            }
        }
        Ok(())
    }

    async fn course(&self, course: &CourseRef) -> Result<()> {
        let api = self.session.api();

        // The tree is addressed by id and carries per-user completion
        let (detail, tree) = match course {
            CourseRef::Id(id) if self.session.is_authenticated() => {
                let (detail, tree) =
                    futures::future::try_join(api.fetch_course(course), api.fetch_course_tree(*id))
                        .await?;
                (detail, Some(tree))
            }
            _ => {
                let detail = api.fetch_course(course).await?;
                let tree = if self.session.is_authenticated() {
                    Some(api.fetch_course_tree(detail.id).await?)
                } else {
                    None
                };
                (detail, tree)
            }
        };

        println!("{} ({})", detail.title, detail.slug);
        println!("{} modules, {} lessons", detail.modules_count, detail.lessons_count);
        if !detail.description.is_empty() {
            println!("\n{}", detail.description);
        }

        match tree {
            Some(tree) => print_tree(&tree),
            None => println!("\nLog in to see lessons and your progress."),
        }
        Ok(())
    }

    async fn enroll(&self, course_id: i64) -> Result<()> {
        let record = self.session.api().enroll(course_id).await?;
        println!(
            "Enrolled in course {} on {}.",
            record.course,
            record.created_at.format("%Y-%m-%d")
        );
        Ok(())
    }

    async fn enrollments(&self) -> Result<()> {
        let enrollments = self.session.api().fetch_enrollments().await?;
        if enrollments.is_empty() {
            println!("You are not enrolled in any course.");
            return Ok(());
        }

        for enrollment in &enrollments {
            println!(
                "{:>4}  {:<40} {}",
                enrollment.course.id,
                truncate_string(&enrollment.course.title, 40),
                progress_bar(enrollment.progress_percent, PROGRESS_WIDTH)
            );
        }
        Ok(())
    }

    // ===== Lessons =====

    async fn lesson(&self, id: i64) -> Result<()> {
        let lesson = self.session.api().fetch_lesson(id).await?;

        println!("{} ({})", lesson.title, format_minutes(lesson.duration_minutes));
        if lesson.has_video() {
            println!("Video: {}", lesson.video_url);
        }
        if !lesson.content.is_empty() {
            println!("\n{}\n", lesson.content);
        }

        if !lesson.problems.is_empty() {
            println!("Problems ({} points):", lesson.total_points());
            for problem in &lesson.problems {
                println!("  [{}] {} ({} pts)", problem.id, problem.prompt, problem.points);
            }
        }
        Ok(())
    }

    async fn submit(&self, problem_id: i64, answer: &str) -> Result<()> {
        let result = self.session.api().submit_attempt(problem_id, answer).await?;

        if result.is_correct {
            println!("Correct! +{} points", result.awarded_points);
        } else {
            match result.correct_answer_if_wrong {
                Some(ref correct) => println!("Not quite. Expected: {}", correct),
                None => println!("Not quite."),
            }
        }
        println!("Lesson  {}", progress_bar(result.lesson_progress, PROGRESS_WIDTH));
        println!("Course  {}", progress_bar(result.course_progress, PROGRESS_WIDTH));
        Ok(())
    }

    async fn health(&self) -> Result<()> {
        let health = self
            .session
            .api()
            .health()
            .await
            .with_context(|| format!("Backend at {} is unreachable", self.session.api().base_url()))?;
        println!("{}: {}", health.service, health.status);
        Ok(())
    }
}

fn print_tree(tree: &CourseTree) {
    println!(
        "\nProgress {}  ({}/{} lessons, {})",
        progress_bar(tree.course_progress, PROGRESS_WIDTH),
        tree.completed_lessons(),
        tree.lessons().count(),
        format_minutes(tree.total_minutes())
    );

    for module in &tree.modules {
        println!("\n{}. {}", module.order, module.title);
        for lesson in &module.lessons {
            let check = if lesson.lesson_completed { "x" } else { " " };
            println!(
                "   [{}] {:>4}  {:<40} {}",
                check,
                lesson.id,
                truncate_string(&lesson.title, 40),
                format_minutes(lesson.duration_minutes)
            );
        }
    }

    if let Some(next) = tree.next_lesson() {
        println!("\nUp next: {} (coursekit lesson {})", next.title, next.id);
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn prompt_username(last_username: Option<&str>) -> Result<String> {
    match last_username {
        Some(last) => {
            let input = prompt(&format!("Username [{}]: ", last))?;
            if input.is_empty() {
                Ok(last.to_string())
            } else {
                Ok(input)
            }
        }
        None => prompt("Username: "),
    }
}
