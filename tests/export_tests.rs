use chrono::Utc;
use serde_json::{Value, json};
use training_portal::export::{group_instructors, group_questions, manuals_to_legacy};
use training_portal::models::{InstructorExportRow, Manual, QuestionExportRow};
use uuid::Uuid;

// --- Test Data Helpers ---

fn instructor_row(course: &str, server_id: i64) -> InstructorExportRow {
    InstructorExportRow {
        course_name: course.to_string(),
        server_id,
    }
}

fn question_row(course: &str, text: &str, options: &[&str], correct: i32) -> QuestionExportRow {
    QuestionExportRow {
        course_name: course.to_string(),
        question: text.to_string(),
        alternatives: options.iter().map(|o| o.to_string()).collect(),
        correct_answer: correct,
    }
}

fn manual(title: &str, url: &str, description: &str) -> Manual {
    Manual {
        id: Uuid::new_v4(),
        title: title.to_string(),
        url: url.to_string(),
        description: description.to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

// --- Instructor Export ---

#[test]
fn test_instructor_grouping_and_stringified_ids() {
    // Rows arrive oldest-first; the grouping must keep first-seen course order
    // and per-course insertion order, with server IDs stringified.
    let rows = vec![
        instructor_row("A", 1),
        instructor_row("A", 2),
        instructor_row("B", 3),
    ];

    let grouped = group_instructors(&rows);

    assert_eq!(grouped["A"], json!(["1", "2"]));
    assert_eq!(grouped["B"], json!(["3"]));

    let keys: Vec<&String> = grouped.keys().collect();
    assert_eq!(keys, vec!["A", "B"], "first-seen course order must hold");
}

#[test]
fn test_instructor_grouping_interleaved_courses() {
    // A course reappearing later appends to its existing bucket; the key
    // order stays where the course was first seen.
    let rows = vec![
        instructor_row("Bravo", 10),
        instructor_row("Alpha", 20),
        instructor_row("Bravo", 30),
    ];

    let grouped = group_instructors(&rows);

    let keys: Vec<&String> = grouped.keys().collect();
    assert_eq!(keys, vec!["Bravo", "Alpha"]);
    assert_eq!(grouped["Bravo"], json!(["10", "30"]));
}

#[test]
fn test_instructor_grouping_empty_input() {
    assert!(group_instructors(&[]).is_empty());
}

// --- Question Export ---

#[test]
fn test_question_ids_are_sequential_across_courses() {
    // The legacy id counter is global for the whole export, starting at 1,
    // not reset per course.
    let rows = vec![
        question_row("A", "first", &["x", "y"], 0),
        question_row("B", "second", &["x", "y", "z"], 2),
        question_row("A", "third", &["x", "y"], 1),
    ];

    let grouped = group_questions(&rows);

    let a = grouped["A"].as_array().unwrap();
    let b = grouped["B"].as_array().unwrap();

    assert_eq!(a[0]["id"], json!(1));
    assert_eq!(b[0]["id"], json!(2));
    assert_eq!(a[1]["id"], json!(3));
}

#[test]
fn test_question_legacy_shape() {
    let rows = vec![question_row(
        "Basics",
        "What is the speed limit?",
        &["80", "100", "120"],
        1,
    )];

    let grouped = group_questions(&rows);
    let entry = &grouped["Basics"].as_array().unwrap()[0];

    // The legacy file used text/options/correct, not the column names.
    assert_eq!(entry["text"], json!("What is the speed limit?"));
    assert_eq!(entry["options"], json!(["80", "100", "120"]));
    assert_eq!(entry["correct"], json!(1));
    assert!(entry.get("question").is_none());
    assert!(entry.get("alternatives").is_none());
}

// --- Manual Export ---

#[test]
fn test_manuals_stay_flat_and_rename_url_to_content() {
    // Manuals are global: the export is a flat list, never grouped by course,
    // and the legacy key for the URL is `content`.
    let rows = vec![
        manual("Handbook", "https://example.com/handbook", "The basics"),
        manual("Radio Codes", "https://example.com/codes", ""),
    ];

    let legacy = manuals_to_legacy(&rows);
    assert_eq!(legacy.len(), 2);
    assert_eq!(legacy[0].content, "https://example.com/handbook");

    let serialized: Value = serde_json::to_value(&legacy).unwrap();
    assert_eq!(serialized[0]["content"], json!("https://example.com/handbook"));
    assert_eq!(serialized[1]["title"], json!("Radio Codes"));
    assert!(serialized[0].get("url").is_none());
}
