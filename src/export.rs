use serde_json::{Map, Value, json};

use crate::models::{InstructorExportRow, LegacyManual, LegacyQuestion, Manual, QuestionExportRow};

/// Legacy export transforms.
///
/// The system's predecessor kept its data in plain JSON files; an external
/// (non-admin) consumer still reads that shape. These are pure, stateless
/// folds over rows already fetched oldest-first, so grouping preserves
/// first-seen course order and per-course insertion order. `serde_json::Map`
/// is insertion-ordered here (the `preserve_order` feature).

/// group_instructors
///
/// `{course name: ["<server id>", ...]}`. The legacy file carried bare
/// stringified role-play-server IDs, nothing else.
pub fn group_instructors(rows: &[InstructorExportRow]) -> Map<String, Value> {
    let mut grouped = Map::new();

    for row in rows {
        let entry = grouped
            .entry(row.course_name.clone())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(ids) = entry {
            ids.push(Value::String(row.server_id.to_string()));
        }
    }

    grouped
}

/// group_questions
///
/// `{course name: [{id, text, options, correct}, ...]}`. The legacy `id` is
/// assigned at transform time, sequentially from 1 across the whole export
/// (not per course).
pub fn group_questions(rows: &[QuestionExportRow]) -> Map<String, Value> {
    let mut grouped = Map::new();
    let mut next_id: i32 = 1;

    for row in rows {
        let legacy = LegacyQuestion {
            id: next_id,
            text: row.question.clone(),
            options: row.alternatives.clone(),
            correct: row.correct_answer,
        };
        next_id += 1;

        let entry = grouped
            .entry(row.course_name.clone())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(items) = entry {
            items.push(json!(legacy));
        }
    }

    grouped
}

/// manuals_to_legacy
///
/// Manuals are global, so the export is a flat list, not grouped by course.
/// The legacy key for the URL is `content`.
pub fn manuals_to_legacy(rows: &[Manual]) -> Vec<LegacyManual> {
    rows.iter()
        .map(|m| LegacyManual {
            title: m.title.clone(),
            content: m.url.clone(),
            description: m.description.clone(),
        })
        .collect()
}
