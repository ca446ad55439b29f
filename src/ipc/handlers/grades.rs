use crate::engine;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

/// Derived values are computed over the session's working copy, so unsaved
/// grid edits are already reflected.
fn handle_grade_for_points(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_class_selected", "open a class first", None);
    };

    let points = req.params.get("points").and_then(|v| v.as_f64());
    let max_points = req.params.get("maxPoints").and_then(|v| v.as_f64());
    let scale_type = req
        .params
        .get("scaleType")
        .and_then(|v| v.as_str())
        .unwrap_or("60% Scale");

    let result = engine::grade_for_points(points, max_points, scale_type, &session.document.config);
    ok(&req.id, json!({ "result": result }))
}

fn handle_weighted_average(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_class_selected", "open a class first", None);
    };
    let student_id = match req.params.get("studentId").and_then(|v| v.as_str()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing studentId", None),
    };
    let subject = match req.params.get("subject").and_then(|v| v.as_str()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing subject", None),
    };

    let average = engine::weighted_average(&session.document.assignments, student_id, subject);
    ok(
        &req.id,
        json!({
            "average": average,
            "reportCard": engine::round_to_half(average)
        }),
    )
}

fn handle_student_trend(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_class_selected", "open a class first", None);
    };
    let student_id = match req.params.get("studentId").and_then(|v| v.as_str()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing studentId", None),
    };
    let subject = match req.params.get("subject").and_then(|v| v.as_str()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing subject", None),
    };

    let trend = engine::trend(&session.document.assignments, student_id, subject);
    ok(&req.id, json!({ "trend": trend }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "calc.gradeForPoints" => Some(handle_grade_for_points(state, req)),
        "calc.weightedAverage" => Some(handle_weighted_average(state, req)),
        "calc.studentTrend" => Some(handle_student_trend(state, req)),
        _ => None,
    }
}
