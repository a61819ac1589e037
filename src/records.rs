use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::format::{format_datetime, parse_utc, sanitize_html};
use crate::models::*;

/// Discussion messages are clamped to this many characters for chat display.
pub const MESSAGE_PREVIEW_CHARS: usize = 300;

/// Cap on items shown per module.
pub const MODULE_ITEM_LIMIT: usize = 10;

/// Cap on files listed in the synthetic "Course Files" module.
pub const FALLBACK_FILE_LIMIT: usize = 20;

// ─── Courses ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct CourseRecord {
    pub id: u64,
    pub name: String,
    pub course_code: String,
    pub enrollment_term: String,
    pub current_grade: Option<String>,
}

impl CourseRecord {
    pub fn from_api(course: &Course) -> Self {
        Self {
            id: course.id,
            name: course.name.clone().unwrap_or_else(|| "Unnamed".into()),
            course_code: course.course_code.clone().unwrap_or_default(),
            enrollment_term: course
                .term
                .as_ref()
                .and_then(|t| t.name.clone())
                .unwrap_or_default(),
            current_grade: course
                .enrollments
                .as_ref()
                .and_then(|e| e.first())
                .and_then(|e| e.computed_current_grade.clone()),
        }
    }
}

// ─── Assignments ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentRecord {
    pub id: u64,
    pub name: String,
    /// Raw ISO-8601 due date as Canvas sent it.
    pub due_at: Option<String>,
    /// Human-readable form of `due_at`.
    pub due_at_display: String,
    pub points_possible: Option<f64>,
    pub submission_types: Vec<String>,
    pub submitted: bool,
    pub grade: Option<String>,
    pub score: Option<f64>,
    pub is_quiz: bool,
}

impl AssignmentRecord {
    pub fn from_api(assignment: &Assignment) -> Self {
        let submission = assignment.submission.as_ref();
        Self {
            id: assignment.id,
            name: assignment.name.clone().unwrap_or_else(|| "Untitled".into()),
            due_at: assignment.due_at.clone(),
            due_at_display: format_datetime(assignment.due_at.as_deref()),
            points_possible: assignment.points_possible,
            submission_types: assignment.submission_types.clone(),
            submitted: submission.is_some_and(|s| s.submitted_at.is_some()),
            grade: submission.and_then(|s| s.grade.clone()),
            score: submission.and_then(|s| s.score),
            is_quiz: classify_quiz(assignment),
        }
    }
}

/// Canvas marks quizzes three different ways depending on whether the course
/// uses Classic Quizzes, New Quizzes (LTI), or just a naming convention.
pub fn classify_quiz(assignment: &Assignment) -> bool {
    if assignment
        .submission_types
        .iter()
        .any(|t| t == "online_quiz")
    {
        return true;
    }
    if assignment.is_quiz_assignment == Some(true)
        || assignment.is_quiz_lti_assignment == Some(true)
    {
        return true;
    }
    assignment
        .name
        .as_deref()
        .is_some_and(|n| n.to_lowercase().contains("quiz"))
}

#[derive(Debug, Clone, Serialize)]
pub struct UpcomingAssignmentRecord {
    #[serde(flatten)]
    pub assignment: AssignmentRecord,
    pub course_name: String,
    pub course_code: String,
}

/// Parse an assignment's due date and keep it when it falls inside
/// `[now, now + days]` UTC, bounds inclusive.
pub fn due_within(
    record: &AssignmentRecord,
    now: DateTime<Utc>,
    days: i64,
) -> Option<DateTime<Utc>> {
    let due = parse_utc(record.due_at.as_deref()?)?;
    let end = now + Duration::days(days);
    (due >= now && due <= end).then_some(due)
}

/// Flatten per-course assignment lists into one upcoming feed, course
/// name/code attached, sorted ascending by due date.
pub fn select_upcoming(
    per_course: Vec<(String, String, Vec<AssignmentRecord>)>,
    now: DateTime<Utc>,
    days: i64,
) -> Vec<UpcomingAssignmentRecord> {
    let mut upcoming: Vec<(DateTime<Utc>, UpcomingAssignmentRecord)> = Vec::new();
    for (course_name, course_code, assignments) in per_course {
        for assignment in assignments {
            if let Some(due) = due_within(&assignment, now, days) {
                upcoming.push((
                    due,
                    UpcomingAssignmentRecord {
                        assignment,
                        course_name: course_name.clone(),
                        course_code: course_code.clone(),
                    },
                ));
            }
        }
    }
    upcoming.sort_by_key(|(due, _)| *due);
    upcoming.into_iter().map(|(_, record)| record).collect()
}

// ─── Grades ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct GradeRecord {
    pub current_score: Option<f64>,
    pub current_grade: Option<String>,
    pub final_score: Option<f64>,
    pub final_grade: Option<String>,
    pub unposted_current_score: Option<f64>,
    pub unposted_current_grade: Option<String>,
}

impl GradeRecord {
    pub fn from_enrollment(enrollment: &Enrollment) -> Self {
        let grades = enrollment.grades.clone().unwrap_or_default();
        Self {
            current_score: grades.current_score,
            current_grade: grades.current_grade,
            final_score: grades.final_score,
            final_grade: grades.final_grade,
            unposted_current_score: grades.unposted_current_score,
            unposted_current_grade: grades.unposted_current_grade,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseGradesRecord {
    pub course_id: u64,
    pub course_name: String,
    pub course_code: String,
    #[serde(flatten)]
    pub grades: GradeRecord,
}

// ─── Announcements ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct AnnouncementRecord {
    pub id: u64,
    pub title: String,
    pub message: String,
    pub posted_at: Option<String>,
    pub author: String,
    /// Recovered from the `course_<id>` context code.
    pub course_id: String,
}

impl AnnouncementRecord {
    pub fn from_api(topic: &DiscussionTopic) -> Self {
        Self {
            id: topic.id,
            title: topic.title.clone().unwrap_or_default(),
            message: topic.message.clone().unwrap_or_default(),
            posted_at: topic.posted_at.clone(),
            author: topic
                .author
                .as_ref()
                .and_then(|a| a.display_name.clone())
                .or_else(|| topic.user_name.clone())
                .unwrap_or_else(|| "Unknown".into()),
            course_id: course_id_from_context(topic.context_code.as_deref().unwrap_or_default()),
        }
    }
}

pub fn course_id_from_context(context_code: &str) -> String {
    context_code
        .strip_prefix("course_")
        .unwrap_or(context_code)
        .to_string()
}

// ─── Discussions ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct DiscussionRecord {
    pub id: u64,
    pub title: String,
    /// HTML-stripped and truncated for chat display.
    pub message: String,
    pub posted_at: Option<String>,
    pub author: String,
    pub unread_count: u64,
    pub reply_count: u64,
}

impl DiscussionRecord {
    pub fn from_api(topic: &DiscussionTopic) -> Self {
        Self {
            id: topic.id,
            title: topic.title.clone().unwrap_or_default(),
            message: sanitize_html(
                topic.message.as_deref().unwrap_or_default(),
                MESSAGE_PREVIEW_CHARS,
            ),
            posted_at: topic.posted_at.clone(),
            author: topic.user_name.clone().unwrap_or_else(|| "Unknown".into()),
            unread_count: topic.unread_count.unwrap_or(0),
            reply_count: topic.discussion_subentry_count.unwrap_or(0),
        }
    }
}

// ─── Files ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct FileRecord {
    pub id: u64,
    pub display_name: String,
    pub filename: String,
    pub size: Option<u64>,
    pub content_type: Option<String>,
    pub url: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub folder_id: Option<u64>,
}

impl FileRecord {
    pub fn from_api(file: &CourseFile) -> Self {
        Self {
            id: file.id,
            display_name: file.display_name.clone().unwrap_or_default(),
            filename: file.filename.clone().unwrap_or_default(),
            size: file.size,
            content_type: file.content_type.clone(),
            url: file.url.clone(),
            created_at: file.created_at.clone(),
            updated_at: file.updated_at.clone(),
            folder_id: file.folder_id,
        }
    }
}

// ─── Modules ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ModuleRecord {
    pub id: u64,
    pub name: String,
    pub position: Option<u64>,
    pub state: Option<String>,
    pub unlock_at: Option<String>,
    pub published: Option<bool>,
    pub items_count: u64,
    pub items: Vec<ModuleItemRecord>,
    /// True only for the synthetic module built from course files when the
    /// course has no modules of its own.
    pub file_fallback: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleItemRecord {
    pub id: u64,
    pub title: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub indent: u64,
}

impl ModuleRecord {
    pub fn from_api(module: &Module) -> Self {
        let items: Vec<ModuleItemRecord> = module
            .items
            .iter()
            .take(MODULE_ITEM_LIMIT)
            .map(|item| ModuleItemRecord {
                id: item.id,
                title: item.title.clone().unwrap_or_default(),
                item_type: item.item_type.clone().unwrap_or_default(),
                indent: item.indent.unwrap_or(0),
            })
            .collect();
        Self {
            id: module.id,
            name: module.name.clone().unwrap_or_default(),
            position: module.position,
            state: module.state.clone(),
            unlock_at: module.unlock_at.clone(),
            published: module.published,
            items_count: module.items_count.unwrap_or(module.items.len() as u64),
            items,
            file_fallback: false,
        }
    }
}

/// Stand-in module for courses that publish files but no module structure.
pub fn fallback_files_module(files: &[FileRecord]) -> ModuleRecord {
    let items: Vec<ModuleItemRecord> = files
        .iter()
        .take(FALLBACK_FILE_LIMIT)
        .map(|file| ModuleItemRecord {
            id: file.id,
            title: file.display_name.clone(),
            item_type: "File".into(),
            indent: 0,
        })
        .collect();
    ModuleRecord {
        id: 0,
        name: "Course Files".into(),
        position: Some(1),
        state: Some("active".into()),
        unlock_at: None,
        published: Some(true),
        items_count: items.len() as u64,
        items,
        file_fallback: true,
    }
}

// ─── Submissions ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionRecord {
    pub id: Option<u64>,
    pub assignment_id: Option<u64>,
    /// Set when the submission was looked up by assignment name.
    pub assignment_name: Option<String>,
    pub submitted_at: Option<String>,
    pub score: Option<f64>,
    pub grade: Option<String>,
    pub attempt: Option<u64>,
    pub workflow_state: Option<String>,
    pub late: bool,
    pub missing: bool,
    pub excused: bool,
    pub comments: Vec<CommentRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentRecord {
    pub comment: String,
    pub author: String,
    pub created_at: Option<String>,
}

impl SubmissionRecord {
    pub fn from_api(submission: &Submission) -> Self {
        Self {
            id: submission.id,
            assignment_id: submission.assignment_id,
            assignment_name: None,
            submitted_at: submission.submitted_at.clone(),
            score: submission.score,
            grade: submission.grade.clone(),
            attempt: submission.attempt,
            workflow_state: submission.workflow_state.clone(),
            late: submission.late.unwrap_or(false),
            missing: submission.missing.unwrap_or(false),
            excused: submission.excused.unwrap_or(false),
            comments: submission
                .submission_comments
                .iter()
                .map(|c| CommentRecord {
                    comment: c.comment.clone().unwrap_or_default(),
                    author: c.author_name.clone().unwrap_or_else(|| "Unknown".into()),
                    created_at: c.created_at.clone(),
                })
                .collect(),
        }
    }
}

// ─── Calendar Events ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct CalendarEventRecord {
    pub id: serde_json::Value,
    pub title: String,
    pub description: Option<String>,
    pub start_at: Option<String>,
    pub end_at: Option<String>,
    pub location_name: Option<String>,
    pub context_name: Option<String>,
    pub event_type: String,
}

impl CalendarEventRecord {
    pub fn from_api(event: &CalendarEvent) -> Self {
        Self {
            id: event.id.clone(),
            title: event.title.clone().unwrap_or_default(),
            description: event.description.clone(),
            start_at: event.start_at.clone(),
            end_at: event.end_at.clone(),
            location_name: event.location_name.clone(),
            context_name: event
                .context_name
                .clone()
                .or_else(|| event.context_code.clone()),
            event_type: event.event_type.clone().unwrap_or_default(),
        }
    }

    /// Substitute shape used when the calendar endpoint is inaccessible and
    /// upcoming assignments stand in as the event feed.
    pub fn from_upcoming(upcoming: &UpcomingAssignmentRecord) -> Self {
        Self {
            id: serde_json::json!(upcoming.assignment.id),
            title: upcoming.assignment.name.clone(),
            description: None,
            start_at: upcoming.assignment.due_at.clone(),
            end_at: upcoming.assignment.due_at.clone(),
            location_name: None,
            context_name: Some(upcoming.course_name.clone()),
            event_type: "assignment".into(),
        }
    }
}

// ─── Course Summary ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct CourseSummaryRecord {
    pub course_id: u64,
    pub grades: Option<GradeRecord>,
    pub upcoming_assignments: Vec<AssignmentRecord>,
    pub recent_announcements: Vec<AnnouncementRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn assignment_from(value: serde_json::Value) -> Assignment {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn course_record_projection() {
        let course: Course = serde_json::from_value(json!({
            "id": 1,
            "name": "CS 101",
            "course_code": "CS101",
            "term": {"name": "Fall"},
            "enrollments": [{"computed_current_grade": "A"}]
        }))
        .unwrap();

        assert_eq!(
            serde_json::to_value(CourseRecord::from_api(&course)).unwrap(),
            json!({
                "id": 1,
                "name": "CS 101",
                "course_code": "CS101",
                "enrollment_term": "Fall",
                "current_grade": "A"
            })
        );
    }

    #[test]
    fn course_record_defaults_for_sparse_payload() {
        let course: Course = serde_json::from_value(json!({"id": 7})).unwrap();
        let record = CourseRecord::from_api(&course);
        assert_eq!(record.name, "Unnamed");
        assert_eq!(record.course_code, "");
        assert_eq!(record.enrollment_term, "");
        assert_eq!(record.current_grade, None);
    }

    #[test]
    fn submitted_tracks_submitted_at() {
        let submitted = assignment_from(json!({
            "id": 1, "name": "HW1",
            "submission": {"submitted_at": "2025-10-01T12:00:00Z", "score": 9.5}
        }));
        let unsubmitted = assignment_from(json!({
            "id": 2, "name": "HW2",
            "submission": {"submitted_at": null}
        }));
        let no_submission = assignment_from(json!({"id": 3, "name": "HW3"}));

        assert!(AssignmentRecord::from_api(&submitted).submitted);
        assert!(!AssignmentRecord::from_api(&unsubmitted).submitted);
        assert!(!AssignmentRecord::from_api(&no_submission).submitted);
    }

    #[test]
    fn quiz_classification() {
        let by_type = assignment_from(json!({
            "id": 1, "name": "Midterm", "submission_types": ["online_quiz"]
        }));
        let by_lti = assignment_from(json!({
            "id": 2, "name": "Checkpoint",
            "submission_types": ["external_tool"],
            "is_quiz_lti_assignment": true
        }));
        let by_name = assignment_from(json!({"id": 3, "name": "Pop Quiz 3"}));
        let not_quiz = assignment_from(json!({
            "id": 4, "name": "Essay", "submission_types": ["online_text_entry"]
        }));

        assert!(classify_quiz(&by_type));
        assert!(classify_quiz(&by_lti));
        assert!(classify_quiz(&by_name));
        assert!(!classify_quiz(&not_quiz));
    }

    #[test]
    fn upcoming_window_is_inclusive_and_sorted() {
        let now = parse_utc("2025-10-01T00:00:00Z").unwrap();
        let mk = |id: u64, due: &str| {
            AssignmentRecord::from_api(&assignment_from(json!({
                "id": id, "name": format!("A{id}"), "due_at": due
            })))
        };

        let per_course = vec![
            (
                "CS 101".to_string(),
                "CS101".to_string(),
                vec![
                    mk(1, "2025-10-08T00:00:00Z"), // exactly now + 7d
                    mk(2, "2025-10-08T00:00:01Z"), // one second past the window
                    mk(3, "2025-09-30T23:59:59Z"), // already due
                ],
            ),
            (
                "ML 559".to_string(),
                "CS559".to_string(),
                vec![
                    mk(4, "2025-10-01T00:00:00Z"), // exactly now
                    mk(5, "2025-10-03T12:00:00Z"),
                ],
            ),
        ];

        let upcoming = select_upcoming(per_course, now, 7);
        let ids: Vec<u64> = upcoming.iter().map(|u| u.assignment.id).collect();
        assert_eq!(ids, vec![4, 5, 1]);
        assert_eq!(upcoming[0].course_name, "ML 559");
        assert_eq!(upcoming[2].course_code, "CS101");
    }

    #[test]
    fn assignments_without_due_dates_never_upcoming() {
        let now = parse_utc("2025-10-01T00:00:00Z").unwrap();
        let record = AssignmentRecord::from_api(&assignment_from(json!({
            "id": 1, "name": "Ungraded survey"
        })));
        assert!(due_within(&record, now, 7).is_none());
        assert_eq!(record.due_at_display, "No date");
    }

    #[test]
    fn announcement_recovers_course_id_from_context_code() {
        assert_eq!(course_id_from_context("course_123"), "123");
        assert_eq!(course_id_from_context("user_5"), "user_5");

        let topic: DiscussionTopic = serde_json::from_value(json!({
            "id": 10,
            "title": "Welcome",
            "message": "<p>Hi</p>",
            "context_code": "course_123",
            "author": {"display_name": "Prof. Chen"}
        }))
        .unwrap();
        let record = AnnouncementRecord::from_api(&topic);
        assert_eq!(record.course_id, "123");
        assert_eq!(record.author, "Prof. Chen");
    }

    #[test]
    fn discussion_messages_are_sanitized() {
        let topic: DiscussionTopic = serde_json::from_value(json!({
            "id": 1,
            "title": "Week 3",
            "message": format!("<div>{}</div>", "word ".repeat(100)),
            "user_name": "TA Kim",
            "unread_count": 2,
            "discussion_subentry_count": 14
        }))
        .unwrap();
        let record = DiscussionRecord::from_api(&topic);
        assert!(!record.message.contains('<'));
        assert!(record.message.chars().count() <= MESSAGE_PREVIEW_CHARS + 3);
        assert_eq!(record.unread_count, 2);
        assert_eq!(record.reply_count, 14);
    }

    #[test]
    fn module_items_capped_at_ten() {
        let items: Vec<serde_json::Value> = (0..15)
            .map(|i| json!({"id": i, "title": format!("Item {i}"), "type": "Page"}))
            .collect();
        let module: Module = serde_json::from_value(json!({
            "id": 42, "name": "Week 1", "items_count": 15, "items": items
        }))
        .unwrap();
        let record = ModuleRecord::from_api(&module);
        assert_eq!(record.items.len(), MODULE_ITEM_LIMIT);
        assert_eq!(record.items_count, 15);
        assert!(!record.file_fallback);
    }

    #[test]
    fn fallback_module_lists_up_to_twenty_files() {
        let files: Vec<FileRecord> = (0..30)
            .map(|i| {
                FileRecord::from_api(
                    &serde_json::from_value(json!({
                        "id": i, "display_name": format!("lecture{i}.pdf")
                    }))
                    .unwrap(),
                )
            })
            .collect();
        let module = fallback_files_module(&files);
        assert!(module.file_fallback);
        assert_eq!(module.name, "Course Files");
        assert_eq!(module.items.len(), FALLBACK_FILE_LIMIT);
        assert_eq!(module.items_count, FALLBACK_FILE_LIMIT as u64);
        assert_eq!(module.items[0].item_type, "File");
    }

    #[test]
    fn submission_record_carries_comments_and_flags() {
        let submission: Submission = serde_json::from_value(json!({
            "id": 99,
            "assignment_id": 7,
            "submitted_at": "2025-10-02T04:00:00Z",
            "score": 8.5,
            "grade": "8.5",
            "attempt": 2,
            "workflow_state": "graded",
            "late": true,
            "submission_comments": [
                {"comment": "Nice work", "author_name": "Prof. Chen",
                 "created_at": "2025-10-03T00:00:00Z"},
                {"comment": "See rubric"}
            ]
        }))
        .unwrap();
        let record = SubmissionRecord::from_api(&submission);
        assert!(record.late);
        assert!(!record.missing);
        assert!(!record.excused);
        assert_eq!(record.comments.len(), 2);
        assert_eq!(record.comments[0].author, "Prof. Chen");
        assert_eq!(record.comments[1].author, "Unknown");
    }

    #[test]
    fn calendar_fallback_event_mirrors_the_assignment() {
        let upcoming = UpcomingAssignmentRecord {
            assignment: AssignmentRecord::from_api(&assignment_from(json!({
                "id": 11, "name": "HW4", "due_at": "2025-10-05T23:59:00Z"
            }))),
            course_name: "CS 101".into(),
            course_code: "CS101".into(),
        };
        let event = CalendarEventRecord::from_upcoming(&upcoming);
        assert_eq!(event.id, json!(11));
        assert_eq!(event.title, "HW4");
        assert_eq!(event.event_type, "assignment");
        assert_eq!(event.start_at.as_deref(), Some("2025-10-05T23:59:00Z"));
        assert_eq!(event.context_name.as_deref(), Some("CS 101"));
    }
}
