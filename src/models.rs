use serde::Deserialize;

// Raw Canvas API resources. Field presence varies across Canvas versions and
// course configurations, so everything except the id is optional and falls
// back to a default at projection time.
//
// Timestamps are kept as the raw ISO-8601 strings Canvas sends; parsing is
// deferred to the call sites that need real datetimes, so a malformed value
// degrades a single field instead of failing the whole fetch.

// ─── Courses ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Course {
    pub id: u64,
    pub name: Option<String>,
    pub course_code: Option<String>,
    pub workflow_state: Option<String>,
    pub term: Option<Term>,
    pub enrollments: Option<Vec<Enrollment>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Term {
    pub id: Option<u64>,
    pub name: Option<String>,
}

/// Enrollment as embedded in a course (`computed_*` fields) or returned by
/// the enrollments endpoint (`grades` sub-object). One struct covers both.
#[derive(Debug, Clone, Deserialize)]
pub struct Enrollment {
    #[serde(rename = "type")]
    pub enrollment_type: Option<String>,
    pub role: Option<String>,
    pub computed_current_score: Option<f64>,
    pub computed_current_grade: Option<String>,
    pub computed_final_score: Option<f64>,
    pub computed_final_grade: Option<String>,
    pub grades: Option<Grades>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Grades {
    pub current_score: Option<f64>,
    pub current_grade: Option<String>,
    pub final_score: Option<f64>,
    pub final_grade: Option<String>,
    pub unposted_current_score: Option<f64>,
    pub unposted_current_grade: Option<String>,
}

// ─── Assignments ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Assignment {
    pub id: u64,
    pub name: Option<String>,
    pub due_at: Option<String>,
    pub points_possible: Option<f64>,
    #[serde(default)]
    pub submission_types: Vec<String>,
    pub is_quiz_assignment: Option<bool>,
    pub is_quiz_lti_assignment: Option<bool>,
    pub submission: Option<Submission>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Submission {
    pub id: Option<u64>,
    pub assignment_id: Option<u64>,
    pub submitted_at: Option<String>,
    pub graded_at: Option<String>,
    pub score: Option<f64>,
    pub grade: Option<String>,
    pub attempt: Option<u64>,
    pub workflow_state: Option<String>,
    pub late: Option<bool>,
    pub missing: Option<bool>,
    pub excused: Option<bool>,
    #[serde(default)]
    pub submission_comments: Vec<SubmissionComment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionComment {
    pub comment: Option<String>,
    pub author_name: Option<String>,
    pub created_at: Option<String>,
}

// ─── Announcements / Discussion Topics ──────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct DiscussionTopic {
    pub id: u64,
    pub title: Option<String>,
    pub message: Option<String>,
    pub posted_at: Option<String>,
    pub user_name: Option<String>,
    pub author: Option<TopicAuthor>,
    pub unread_count: Option<u64>,
    pub discussion_subentry_count: Option<u64>,
    pub context_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopicAuthor {
    pub display_name: Option<String>,
}

// ─── Files ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct CourseFile {
    pub id: u64,
    pub display_name: Option<String>,
    pub filename: Option<String>,
    pub size: Option<u64>,
    // Canvas sends this one hyphenated.
    #[serde(rename = "content-type")]
    pub content_type: Option<String>,
    pub url: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub folder_id: Option<u64>,
}

// ─── Modules ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Module {
    pub id: u64,
    pub name: Option<String>,
    pub position: Option<u64>,
    pub state: Option<String>,
    pub unlock_at: Option<String>,
    pub published: Option<bool>,
    pub items_count: Option<u64>,
    #[serde(default)]
    pub items: Vec<ModuleItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModuleItem {
    pub id: u64,
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    pub indent: Option<u64>,
}

// ─── Calendar Events ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarEvent {
    // Assignment-backed events carry string ids like "assignment_615240",
    // plain events carry numbers. Passed through as-is.
    pub id: serde_json::Value,
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_at: Option<String>,
    pub end_at: Option<String>,
    pub location_name: Option<String>,
    pub context_code: Option<String>,
    pub context_name: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
}
