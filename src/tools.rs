//! The named operations exposed to the agent orchestrator.
//!
//! Each tool maps 1:1 to a `CanvasClient` method: plain JSON arguments in,
//! plain JSON data out. Failures never escape as errors — they come back as
//! sentinel values (`{"error": ...}` for object-shaped tools, a single
//! `[{"error": ...}]` entry for list-shaped ones) so the orchestrator can
//! relay them to the model instead of crashing the turn.

use serde::Serialize;
use serde_json::{json, Value};

use crate::api::{CanvasClient, CanvasError};

pub struct ToolDef {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

fn course_id_property() -> Value {
    json!({
        "type": "integer",
        "description": "Canvas course ID (see get_courses)"
    })
}

pub fn tool_defs() -> Vec<ToolDef> {
    vec![
        ToolDef {
            name: "get_courses",
            description: "List all enrolled courses with id, name, course code, \
                          term, and current grade",
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
        ToolDef {
            name: "get_assignments",
            description: "List all assignments for a course with due dates, points, \
                          submission status, and grades",
            input_schema: json!({
                "type": "object",
                "properties": { "course_id": course_id_property() },
                "required": ["course_id"]
            }),
        },
        ToolDef {
            name: "get_upcoming_assignments",
            description: "List assignments due in the next N days across all courses, \
                          sorted by due date",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "days": {
                        "type": "integer",
                        "description": "Number of days to look ahead",
                        "default": 7
                    }
                }
            }),
        },
        ToolDef {
            name: "get_grades",
            description: "Get current and final grades for a course, unposted \
                          grades included",
            input_schema: json!({
                "type": "object",
                "properties": { "course_id": course_id_property() },
                "required": ["course_id"]
            }),
        },
        ToolDef {
            name: "get_all_grades",
            description: "Get grades for every enrolled course",
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
        ToolDef {
            name: "get_course_summary",
            description: "One-call course overview: grades, assignments due this week, \
                          and the latest announcements",
            input_schema: json!({
                "type": "object",
                "properties": { "course_id": course_id_property() },
                "required": ["course_id"]
            }),
        },
        ToolDef {
            name: "get_announcements",
            description: "List announcements from all courses posted in the last N days",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "days": {
                        "type": "integer",
                        "description": "Number of days to look back",
                        "default": 7
                    }
                }
            }),
        },
        ToolDef {
            name: "get_discussions",
            description: "List discussion topics for a course with message previews \
                          and reply counts",
            input_schema: json!({
                "type": "object",
                "properties": { "course_id": course_id_property() },
                "required": ["course_id"]
            }),
        },
        ToolDef {
            name: "get_course_files",
            description: "List files uploaded to a course",
            input_schema: json!({
                "type": "object",
                "properties": { "course_id": course_id_property() },
                "required": ["course_id"]
            }),
        },
        ToolDef {
            name: "get_calendar_events",
            description: "List assignment calendar events for the next N days, falling \
                          back to upcoming assignments if the calendar is unavailable",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "days_ahead": {
                        "type": "integer",
                        "description": "Number of days to look ahead",
                        "default": 7
                    }
                }
            }),
        },
        ToolDef {
            name: "get_modules",
            description: "List course modules and their items; courses without modules \
                          get a synthetic Course Files module",
            input_schema: json!({
                "type": "object",
                "properties": { "course_id": course_id_property() },
                "required": ["course_id"]
            }),
        },
        ToolDef {
            name: "get_quizzes",
            description: "List quizzes for a course, LTI/external-tool quizzes included",
            input_schema: json!({
                "type": "object",
                "properties": { "course_id": course_id_property() },
                "required": ["course_id"]
            }),
        },
        ToolDef {
            name: "get_quiz_submissions",
            description: "List quiz grades and scores for a course",
            input_schema: json!({
                "type": "object",
                "properties": { "course_id": course_id_property() },
                "required": ["course_id"]
            }),
        },
        ToolDef {
            name: "get_assignment_submission",
            description: "Get your submission for one assignment, instructor comments \
                          included",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "course_id": course_id_property(),
                    "assignment_id": {
                        "type": "integer",
                        "description": "Canvas assignment ID"
                    }
                },
                "required": ["course_id", "assignment_id"]
            }),
        },
        ToolDef {
            name: "get_assignment_submission_by_name",
            description: "Find an assignment by (partial) name and get your submission \
                          for it",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "course_id": course_id_property(),
                    "assignment_name": {
                        "type": "string",
                        "description": "Full or partial assignment name, case-insensitive"
                    }
                },
                "required": ["course_id", "assignment_name"]
            }),
        },
    ]
}

// ─── Argument parsing ───────────────────────────────────────────────────────

// LLM orchestrators send ids as numbers or numeric strings interchangeably;
// accept both.
fn arg_u64(args: &Value, key: &str) -> Result<u64, String> {
    let value = args
        .get(key)
        .ok_or_else(|| format!("Missing required argument: {key}"))?;
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    if let Some(n) = value.as_str().and_then(|s| s.trim().parse().ok()) {
        return Ok(n);
    }
    Err(format!("Argument '{key}' must be a numeric id"))
}

fn arg_i64_or(args: &Value, key: &str, default: i64) -> Result<i64, String> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(value) => value
            .as_i64()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
            .ok_or_else(|| format!("Argument '{key}' must be a number")),
    }
}

fn arg_str(args: &Value, key: &str) -> Result<String, String> {
    args.get(key)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| format!("Missing required argument: {key}"))
}

// ─── Result shaping ─────────────────────────────────────────────────────────

fn error_object(message: impl Into<String>) -> Value {
    json!({ "error": message.into() })
}

fn error_list(message: impl Into<String>) -> Value {
    json!([{ "error": message.into() }])
}

fn list_result<T: Serialize>(result: Result<Vec<T>, CanvasError>) -> Value {
    match result {
        Ok(items) => json!(items),
        Err(err) => error_list(err.to_string()),
    }
}

fn object_result<T: Serialize>(result: Result<T, CanvasError>) -> Value {
    match result {
        Ok(record) => json!(record),
        Err(err) => error_object(err.to_string()),
    }
}

// ─── Dispatch ───────────────────────────────────────────────────────────────

/// Run one named tool against an explicitly passed client.
pub async fn dispatch(client: &CanvasClient, name: &str, args: &Value) -> Value {
    match name {
        "get_courses" => list_result(client.get_courses().await),

        "get_assignments" => match arg_u64(args, "course_id") {
            Ok(course_id) => list_result(client.get_assignments(course_id).await),
            Err(message) => error_list(message),
        },

        "get_upcoming_assignments" => match arg_i64_or(args, "days", 7) {
            Ok(days) => list_result(client.get_upcoming_assignments(days).await),
            Err(message) => error_list(message),
        },

        "get_grades" => match arg_u64(args, "course_id") {
            Ok(course_id) => match client.get_grades(course_id).await {
                Ok(Some(grades)) => json!(grades),
                Ok(None) => error_object("No enrollment found"),
                Err(err) => error_object(err.to_string()),
            },
            Err(message) => error_object(message),
        },

        "get_all_grades" => list_result(client.get_all_grades().await),

        "get_course_summary" => match arg_u64(args, "course_id") {
            Ok(course_id) => object_result(client.get_course_summary(course_id).await),
            Err(message) => error_object(message),
        },

        "get_announcements" => match arg_i64_or(args, "days", 7) {
            Ok(days) => list_result(client.get_announcements(days).await),
            Err(message) => error_list(message),
        },

        "get_discussions" => match arg_u64(args, "course_id") {
            Ok(course_id) => list_result(client.get_discussions(course_id).await),
            Err(message) => error_list(message),
        },

        "get_course_files" => match arg_u64(args, "course_id") {
            Ok(course_id) => list_result(client.get_course_files(course_id).await),
            Err(message) => error_list(message),
        },

        "get_calendar_events" => match arg_i64_or(args, "days_ahead", 7) {
            Ok(days_ahead) => list_result(client.get_calendar_events(days_ahead).await),
            Err(message) => error_list(message),
        },

        "get_modules" => match arg_u64(args, "course_id") {
            Ok(course_id) => list_result(client.get_modules(course_id).await),
            Err(message) => error_list(message),
        },

        "get_quizzes" => match arg_u64(args, "course_id") {
            Ok(course_id) => list_result(client.get_quizzes(course_id).await),
            Err(message) => error_list(message),
        },

        "get_quiz_submissions" => match arg_u64(args, "course_id") {
            Ok(course_id) => list_result(client.get_quiz_submissions(course_id).await),
            Err(message) => error_list(message),
        },

        "get_assignment_submission" => {
            match (arg_u64(args, "course_id"), arg_u64(args, "assignment_id")) {
                (Ok(course_id), Ok(assignment_id)) => object_result(
                    client
                        .get_assignment_submission(course_id, assignment_id)
                        .await,
                ),
                (Err(message), _) | (_, Err(message)) => error_object(message),
            }
        }

        "get_assignment_submission_by_name" => {
            match (arg_u64(args, "course_id"), arg_str(args, "assignment_name")) {
                (Ok(course_id), Ok(assignment_name)) => {
                    match client
                        .get_assignment_submission_by_name(course_id, &assignment_name)
                        .await
                    {
                        Ok(Some(submission)) => json!(submission),
                        Ok(None) => {
                            error_object(format!("No assignment matching '{assignment_name}'"))
                        }
                        Err(err) => error_object(err.to_string()),
                    }
                }
                (Err(message), _) | (_, Err(message)) => error_object(message),
            }
        }

        other => error_object(format!("Unknown tool: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn offline_client() -> CanvasClient {
        CanvasClient::new("https://canvas.test", "test-token").unwrap()
    }

    #[test]
    fn tool_names_are_unique_and_schemas_are_objects() {
        let defs = tool_defs();
        let names: HashSet<&str> = defs.iter().map(|d| d.name).collect();
        assert_eq!(names.len(), defs.len());
        for def in &defs {
            assert!(!def.description.is_empty());
            assert_eq!(def.input_schema["type"], "object");
        }
    }

    #[test]
    fn numeric_ids_parse_from_numbers_and_strings() {
        assert_eq!(arg_u64(&json!({"course_id": 42}), "course_id"), Ok(42));
        assert_eq!(arg_u64(&json!({"course_id": "42"}), "course_id"), Ok(42));
        assert!(arg_u64(&json!({"course_id": "CS 101"}), "course_id").is_err());
        assert!(arg_u64(&json!({}), "course_id").is_err());
    }

    #[test]
    fn days_default_when_absent() {
        assert_eq!(arg_i64_or(&json!({}), "days", 7), Ok(7));
        assert_eq!(arg_i64_or(&json!({"days": null}), "days", 7), Ok(7));
        assert_eq!(arg_i64_or(&json!({"days": 14}), "days", 7), Ok(14));
        assert_eq!(arg_i64_or(&json!({"days": "14"}), "days", 7), Ok(14));
        assert!(arg_i64_or(&json!({"days": "soon"}), "days", 7).is_err());
    }

    #[tokio::test]
    async fn unknown_tool_returns_error_sentinel() {
        let client = offline_client();
        let result = dispatch(&client, "get_weather", &json!({})).await;
        assert_eq!(result, json!({"error": "Unknown tool: get_weather"}));
    }

    #[tokio::test]
    async fn missing_arguments_return_sentinels_without_a_request() {
        let client = offline_client();

        let result = dispatch(&client, "get_assignments", &json!({})).await;
        assert_eq!(
            result,
            json!([{"error": "Missing required argument: course_id"}])
        );

        let result = dispatch(&client, "get_assignment_submission_by_name", &json!({"course_id": 1}))
            .await;
        assert_eq!(
            result,
            json!({"error": "Missing required argument: assignment_name"})
        );
    }
}
