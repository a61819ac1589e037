mod pagination;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use reqwest::{Client, Response, StatusCode};
use url::Url;

use crate::config::Config;
use crate::models::*;
use crate::records::*;
use pagination::next_page_url;

// ─── Error types ────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    #[error("Unauthorized (401) at {endpoint} – check your API token")]
    Unauthorized { endpoint: String },
    #[error("Forbidden (403) at {endpoint} – insufficient permissions")]
    Forbidden { endpoint: String },
    #[error("Not found (404): {endpoint}")]
    NotFound { endpoint: String },
    #[error("HTTP {status} at {endpoint}: {message}")]
    Http {
        status: u16,
        endpoint: String,
        message: String,
    },
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

// ─── Client ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct CanvasClient {
    client: Client,
    base_url: Url,
    token: String,
}

impl CanvasClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        if token.trim().is_empty() {
            anyhow::bail!("Canvas access token must not be empty");
        }
        let base_url =
            Url::parse(base_url).with_context(|| format!("Invalid Canvas URL: {base_url}"))?;

        let client = Client::builder()
            .user_agent("canvas-tools/0.1.0")
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url,
            token: token.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.canvas_url, &config.access_token)
    }

    fn api_url(&self, path: &str) -> Result<Url> {
        let full = format!("/api/v1{path}");
        self.base_url
            .join(&full)
            .with_context(|| format!("Bad API path: {path}"))
    }

    async fn check_status(resp: Response, endpoint: &str) -> Result<Response, CanvasError> {
        match resp.status() {
            StatusCode::UNAUTHORIZED => Err(CanvasError::Unauthorized {
                endpoint: endpoint.to_string(),
            }),
            StatusCode::FORBIDDEN => Err(CanvasError::Forbidden {
                endpoint: endpoint.to_string(),
            }),
            StatusCode::NOT_FOUND => Err(CanvasError::NotFound {
                endpoint: endpoint.to_string(),
            }),
            s if s.is_client_error() || s.is_server_error() => {
                let status = s.as_u16();
                let message = resp.text().await.unwrap_or_default();
                Err(CanvasError::Http {
                    status,
                    endpoint: endpoint.to_string(),
                    message,
                })
            }
            _ => Ok(resp),
        }
    }

    async fn get_url(&self, url: Url, endpoint: &str) -> Result<Response, CanvasError> {
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::check_status(resp, endpoint).await
    }

    /// Single GET returning one JSON object.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, CanvasError> {
        let mut url = self.api_url(path).map_err(CanvasError::Other)?;
        for (k, v) in params {
            url.query_pairs_mut().append_pair(k, v);
        }
        let resp = self.get_url(url, path).await?;
        Ok(resp.json().await?)
    }

    async fn get_paginated<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<(Vec<T>, Option<String>), CanvasError> {
        let mut url = self.api_url(path).map_err(CanvasError::Other)?;
        for (k, v) in params {
            url.query_pairs_mut().append_pair(k, v);
        }
        url.query_pairs_mut().append_pair("per_page", "50");
        let resp = self.get_url(url, path).await?;
        let next = next_page_url(resp.headers());
        let items: Vec<T> = resp.json().await?;
        Ok((items, next))
    }

    /// GET a list endpoint, following the `Link` header until exhausted.
    async fn get_all_pages<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<T>, CanvasError> {
        let mut all = Vec::new();
        let (items, mut next) = self.get_paginated(path, params).await?;
        all.extend(items);

        while let Some(next_url) = next.take() {
            let url = Url::parse(&next_url)
                .map_err(|e| CanvasError::Other(anyhow::anyhow!("Bad pagination URL: {e}")))?;
            let resp = self.get_url(url, path).await?;
            next = next_page_url(resp.headers());
            let items: Vec<T> = resp.json().await?;
            all.extend(items);
        }

        Ok(all)
    }

    // ── Courses ─────────────────────────────────────────────────────────

    pub async fn get_courses(&self) -> Result<Vec<CourseRecord>, CanvasError> {
        let courses: Vec<Course> = self
            .get_all_pages(
                "/courses",
                &[
                    ("enrollment_state", "active"),
                    ("include[]", "term"),
                    ("include[]", "total_scores"),
                ],
            )
            .await?;
        Ok(courses.iter().map(CourseRecord::from_api).collect())
    }

    // ── Assignments ─────────────────────────────────────────────────────

    pub async fn get_assignments(
        &self,
        course_id: u64,
    ) -> Result<Vec<AssignmentRecord>, CanvasError> {
        let assignments: Vec<Assignment> = self
            .get_all_pages(
                &format!("/courses/{course_id}/assignments"),
                &[
                    ("include[]", "submission"),
                    ("include[]", "score_statistics"),
                    ("order_by", "due_at"),
                ],
            )
            .await?;
        Ok(assignments.iter().map(AssignmentRecord::from_api).collect())
    }

    /// Assignments due within `[now, now + days]` across every enrolled
    /// course. A course whose fetch fails is skipped, not fatal.
    pub async fn get_upcoming_assignments(
        &self,
        days: i64,
    ) -> Result<Vec<UpcomingAssignmentRecord>, CanvasError> {
        let courses = self.get_courses().await?;
        let now = Utc::now();

        let mut per_course = Vec::new();
        for course in &courses {
            match self.get_assignments(course.id).await {
                Ok(assignments) => per_course.push((
                    course.name.clone(),
                    course.course_code.clone(),
                    assignments,
                )),
                Err(err) => {
                    tracing::warn!(course = %course.name, error = %err,
                        "skipping course: assignment fetch failed");
                }
            }
        }

        Ok(select_upcoming(per_course, now, days))
    }

    // ── Grades ──────────────────────────────────────────────────────────

    /// The caller's own grades for one course; `None` when there is no
    /// enrollment to read them from.
    pub async fn get_grades(&self, course_id: u64) -> Result<Option<GradeRecord>, CanvasError> {
        let enrollments: Vec<Enrollment> = self
            .get_all_pages(
                &format!("/courses/{course_id}/enrollments"),
                &[("user_id", "self")],
            )
            .await?;
        Ok(enrollments.first().map(GradeRecord::from_enrollment))
    }

    pub async fn get_all_grades(&self) -> Result<Vec<CourseGradesRecord>, CanvasError> {
        let courses = self.get_courses().await?;
        let mut all = Vec::new();
        for course in &courses {
            match self.get_grades(course.id).await {
                Ok(Some(grades)) => all.push(CourseGradesRecord {
                    course_id: course.id,
                    course_name: course.name.clone(),
                    course_code: course.course_code.clone(),
                    grades,
                }),
                Ok(None) => {}
                Err(err) => {
                    tracing::debug!(course = %course.name, error = %err,
                        "skipping course: grade fetch failed");
                }
            }
        }
        Ok(all)
    }

    // ── Course summary ──────────────────────────────────────────────────

    /// One-stop record for "how am I doing in this course": grades, the
    /// week's assignments, and the latest announcements. Each section
    /// degrades to empty on failure instead of failing the summary.
    pub async fn get_course_summary(
        &self,
        course_id: u64,
    ) -> Result<CourseSummaryRecord, CanvasError> {
        let grades = match self.get_grades(course_id).await {
            Ok(grades) => grades,
            Err(err) => {
                tracing::debug!(course_id, error = %err, "summary: grade fetch failed");
                None
            }
        };

        let now = Utc::now();
        let upcoming_assignments = match self.get_assignments(course_id).await {
            Ok(records) => records
                .into_iter()
                .filter(|a| due_within(a, now, 7).is_some())
                .collect(),
            Err(err) => {
                tracing::debug!(course_id, error = %err, "summary: assignment fetch failed");
                Vec::new()
            }
        };

        let context_code = format!("course_{course_id}");
        let recent_announcements = match self
            .announcements_since(std::slice::from_ref(&context_code), 14)
            .await
        {
            Ok(mut list) => {
                list.truncate(3);
                list
            }
            Err(err) => {
                tracing::debug!(course_id, error = %err, "summary: announcement fetch failed");
                Vec::new()
            }
        };

        Ok(CourseSummaryRecord {
            course_id,
            grades,
            upcoming_assignments,
            recent_announcements,
        })
    }

    // ── Announcements ───────────────────────────────────────────────────

    /// Announcements across every enrolled course posted within the last
    /// `days` days, fetched with one combined context-code query.
    pub async fn get_announcements(
        &self,
        days: i64,
    ) -> Result<Vec<AnnouncementRecord>, CanvasError> {
        let courses = self.get_courses().await?;
        let context_codes: Vec<String> = courses
            .iter()
            .map(|c| format!("course_{}", c.id))
            .collect();
        self.announcements_since(&context_codes, days).await
    }

    async fn announcements_since(
        &self,
        context_codes: &[String],
        days: i64,
    ) -> Result<Vec<AnnouncementRecord>, CanvasError> {
        let start_date = (Utc::now() - Duration::days(days)).to_rfc3339();
        let mut params: Vec<(&str, &str)> = vec![("start_date", start_date.as_str())];
        for code in context_codes {
            params.push(("context_codes[]", code.as_str()));
        }
        let topics: Vec<DiscussionTopic> = self.get_all_pages("/announcements", &params).await?;
        Ok(topics.iter().map(AnnouncementRecord::from_api).collect())
    }

    // ── Discussions ─────────────────────────────────────────────────────

    pub async fn get_discussions(
        &self,
        course_id: u64,
    ) -> Result<Vec<DiscussionRecord>, CanvasError> {
        let topics: Vec<DiscussionTopic> = self
            .get_all_pages(&format!("/courses/{course_id}/discussion_topics"), &[])
            .await?;
        Ok(topics.iter().map(DiscussionRecord::from_api).collect())
    }

    // ── Files ───────────────────────────────────────────────────────────

    pub async fn get_course_files(
        &self,
        course_id: u64,
    ) -> Result<Vec<FileRecord>, CanvasError> {
        let files: Vec<CourseFile> = self
            .get_all_pages(&format!("/courses/{course_id}/files"), &[])
            .await?;
        Ok(files.iter().map(FileRecord::from_api).collect())
    }

    // ── Calendar ────────────────────────────────────────────────────────

    /// Assignment-type calendar events over the next `days_ahead` days.
    /// When the calendar endpoint is inaccessible (some institutions
    /// restrict it), upcoming assignments stand in as the event feed.
    pub async fn get_calendar_events(
        &self,
        days_ahead: i64,
    ) -> Result<Vec<CalendarEventRecord>, CanvasError> {
        let now = Utc::now();
        let end = now + Duration::days(days_ahead);
        let courses = self.get_courses().await?;
        let context_codes: Vec<String> = courses
            .iter()
            .map(|c| format!("course_{}", c.id))
            .collect();

        match self
            .fetch_assignment_events(&context_codes, &now.to_rfc3339(), &end.to_rfc3339())
            .await
        {
            Ok(events) => Ok(events.iter().map(CalendarEventRecord::from_api).collect()),
            Err(err) => {
                tracing::debug!(error = %err,
                    "calendar fetch failed, substituting upcoming assignments");
                let upcoming = self.get_upcoming_assignments(days_ahead).await?;
                Ok(upcoming
                    .iter()
                    .map(CalendarEventRecord::from_upcoming)
                    .collect())
            }
        }
    }

    async fn fetch_assignment_events(
        &self,
        context_codes: &[String],
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<CalendarEvent>, CanvasError> {
        let mut params: Vec<(&str, &str)> = vec![
            ("type", "assignment"),
            ("start_date", start_date),
            ("end_date", end_date),
        ];
        for code in context_codes {
            params.push(("context_codes[]", code.as_str()));
        }
        self.get_all_pages("/calendar_events", &params).await
    }

    // ── Modules ─────────────────────────────────────────────────────────

    /// Course modules with their items. Courses that publish files without
    /// any module structure get a single synthetic "Course Files" module.
    pub async fn get_modules(&self, course_id: u64) -> Result<Vec<ModuleRecord>, CanvasError> {
        let modules: Vec<Module> = self
            .get_all_pages(
                &format!("/courses/{course_id}/modules"),
                &[("include[]", "items")],
            )
            .await?;

        if modules.is_empty() {
            tracing::debug!(course_id, "no modules published, substituting course files");
            let files = self.get_course_files(course_id).await?;
            return Ok(vec![fallback_files_module(&files)]);
        }

        Ok(modules.iter().map(ModuleRecord::from_api).collect())
    }

    // ── Quizzes ─────────────────────────────────────────────────────────

    /// Quizzes derived from the assignment list. The dedicated quizzes
    /// endpoint misses New Quizzes (LTI) entirely, and assignments already
    /// carry the submission state the grade queries need.
    pub async fn get_quizzes(&self, course_id: u64) -> Result<Vec<AssignmentRecord>, CanvasError> {
        let assignments = self.get_assignments(course_id).await?;
        Ok(assignments.into_iter().filter(|a| a.is_quiz).collect())
    }

    pub async fn get_quiz_submissions(
        &self,
        course_id: u64,
    ) -> Result<Vec<AssignmentRecord>, CanvasError> {
        self.get_quizzes(course_id).await
    }

    // ── Submissions ─────────────────────────────────────────────────────

    /// The caller's own submission for one assignment, instructor comments
    /// included.
    pub async fn get_assignment_submission(
        &self,
        course_id: u64,
        assignment_id: u64,
    ) -> Result<SubmissionRecord, CanvasError> {
        let submission: Submission = self
            .get_json(
                &format!("/courses/{course_id}/assignments/{assignment_id}/submissions/self"),
                &[("include[]", "submission_comments")],
            )
            .await?;
        Ok(SubmissionRecord::from_api(&submission))
    }

    /// Look an assignment up by case-insensitive name fragment, then fetch
    /// the caller's submission for it. `None` when nothing matches.
    pub async fn get_assignment_submission_by_name(
        &self,
        course_id: u64,
        name: &str,
    ) -> Result<Option<SubmissionRecord>, CanvasError> {
        let assignments = self.get_assignments(course_id).await?;
        let needle = name.to_lowercase();
        let Some(hit) = assignments
            .iter()
            .find(|a| a.name.to_lowercase().contains(&needle))
        else {
            return Ok(None);
        };

        let mut submission = self.get_assignment_submission(course_id, hit.id).await?;
        submission.assignment_name = Some(hit.name.clone());
        Ok(Some(submission))
    }
}
