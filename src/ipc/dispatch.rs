//! Driver message dispatch: parse s-expressions and route to the session.

use lexpr::Value;
use tracing::{debug, warn};

use super::DriverState;
use crate::hand::{HoldOutcome, LandmarkFrame, Point};
use crate::session::{Session, SessionUpdate};

/// Parse one message and dispatch it.
///
/// Returns the outgoing messages in order: any events first, then the
/// response.
pub fn handle_message(state: &mut DriverState, raw: &str) -> Vec<String> {
    let value = match lexpr::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!("malformed s-expression: {}", e);
            return vec![error_response(0, &format!("malformed s-expression: {e}"))];
        }
    };

    let msg_type = get_keyword(&value, "type");
    let msg_id = get_int(&value, "id").unwrap_or(0);

    match msg_type.as_deref() {
        Some("frame") => handle_frame(state, msg_id, &value),
        Some("no-hand") => handle_no_hand(state, msg_id, &value),
        Some("tick") => handle_tick(state, msg_id, &value),
        Some("camera") => vec![handle_camera(state, msg_id, &value)],
        Some("reset") => vec![handle_reset(state, msg_id)],
        Some("status") => vec![handle_status(state, msg_id)],
        Some("config") => vec![handle_config(state, msg_id, &value)],
        Some(other) => {
            warn!("unknown message type: {}", other);
            vec![error_response(msg_id, &format!("unknown message type: {other}"))]
        }
        None => vec![error_response(msg_id, "missing :type")],
    }
}

// ── Sample handlers ────────────────────────────────────────

fn handle_frame(state: &mut DriverState, msg_id: i64, value: &Value) -> Vec<String> {
    let now_ms = match require_time(state, msg_id, value) {
        Ok(t) => t,
        Err(resp) => return vec![resp],
    };

    let frame = get_value(value, "landmarks")
        .and_then(parse_points)
        .and_then(|points| LandmarkFrame::from_points(&points));
    if frame.is_none() {
        debug!(msg_id, "frame without valid landmarks, treating as no hand");
    }

    let update = state.session.process_frame(frame.as_ref(), now_ms);
    sample_response(state, msg_id, update, now_ms)
}

fn handle_no_hand(state: &mut DriverState, msg_id: i64, value: &Value) -> Vec<String> {
    let now_ms = match require_time(state, msg_id, value) {
        Ok(t) => t,
        Err(resp) => return vec![resp],
    };
    let update = state.session.process_frame(None, now_ms);
    sample_response(state, msg_id, update, now_ms)
}

fn handle_tick(state: &mut DriverState, msg_id: i64, value: &Value) -> Vec<String> {
    let now_ms = match require_time(state, msg_id, value) {
        Ok(t) => t,
        Err(resp) => return vec![resp],
    };
    if !state.session.camera_active() {
        return vec![ignored_response(msg_id)];
    }
    match state.session.tick(now_ms) {
        Some(update) => sample_response(state, msg_id, Some(update), now_ms),
        None => vec![format!(
            "(:type :response :id {} :status :ok :coalesced t)",
            msg_id
        )],
    }
}

fn sample_response(
    state: &mut DriverState,
    msg_id: i64,
    update: Option<SessionUpdate>,
    now_ms: u64,
) -> Vec<String> {
    let Some(update) = update else {
        return vec![ignored_response(msg_id)];
    };

    let mut out = Vec::new();
    if let Some(answer) = update.answer {
        Session::dispatch(&update, &mut state.answers);
        let pose = format!(":{}", answer.pose.as_str());
        let difficulty = format!(":{}", answer.difficulty.as_str());
        let code = answer.difficulty.code().to_string();
        let time = answer.time_ms.to_string();
        out.push(format_event(
            "pose-triggered",
            &[
                ("pose", pose.as_str()),
                ("difficulty", difficulty.as_str()),
                ("answer", code.as_str()),
                ("time-ms", time.as_str()),
            ],
        ));
    }

    out.push(format!(
        "(:type :response :id {} :status :ok :pose :{} :label \"{}\" :hold :{} :progress {:.3} :remaining-s {})",
        msg_id,
        update.pose.as_str(),
        escape_string(update.pose.label()),
        outcome_keyword(&update.outcome),
        update.progress(),
        state.session.hold().remaining_secs(now_ms),
    ));
    out
}

fn outcome_keyword(outcome: &HoldOutcome) -> &'static str {
    match outcome {
        HoldOutcome::Idle => "idle",
        HoldOutcome::Cancelled { .. } => "cancelled",
        HoldOutcome::Holding { .. } => "holding",
        HoldOutcome::Triggered { .. } => "triggered",
    }
}

// ── Control handlers ───────────────────────────────────────

fn handle_camera(state: &mut DriverState, msg_id: i64, value: &Value) -> String {
    let enabled = match get_bool(value, "enabled") {
        Some(e) => e,
        None => return error_response(msg_id, "missing :enabled"),
    };
    state.session.set_camera_active(enabled);
    format!(
        "(:type :response :id {} :status :ok :camera {})",
        msg_id,
        if enabled { "t" } else { "nil" }
    )
}

fn handle_reset(state: &mut DriverState, msg_id: i64) -> String {
    state.session.reset();
    ok_response(msg_id)
}

fn handle_status(state: &mut DriverState, msg_id: i64) -> String {
    let status = state.session.status_sexp(state.last_time_ms);
    format!(
        "(:type :response :id {} :status :ok :session {})",
        msg_id, status
    )
}

fn handle_config(state: &mut DriverState, msg_id: i64, value: &Value) -> String {
    let mut config = state.session.config().clone();
    if let Some(hold) = get_int(value, "hold-ms") {
        match u64::try_from(hold) {
            Ok(h) => config.hold_duration_ms = h,
            Err(_) => return error_response(msg_id, "invalid :hold-ms"),
        }
    }
    if let Some(tick) = get_int(value, "tick-ms") {
        match u64::try_from(tick) {
            Ok(t) => config.tick_interval_ms = t,
            Err(_) => return error_response(msg_id, "invalid :tick-ms"),
        }
    }
    if let Err(e) = config.validate() {
        warn!("rejected config: {}", e);
        return error_response(msg_id, &e.to_string());
    }
    let sexp = config.config_sexp();
    state.session.set_config(config);
    format!(
        "(:type :response :id {} :status :ok :config {})",
        msg_id, sexp
    )
}

/// Read `:time-ms`, enforcing a non-negative value, and record it as the
/// latest timestamp seen.
fn require_time(state: &mut DriverState, msg_id: i64, value: &Value) -> Result<u64, String> {
    let raw = get_int(value, "time-ms").ok_or_else(|| error_response(msg_id, "missing :time-ms"))?;
    let now_ms = u64::try_from(raw).map_err(|_| error_response(msg_id, "negative :time-ms"))?;
    state.last_time_ms = now_ms;
    Ok(now_ms)
}

// ── Landmark parsing ───────────────────────────────────────

/// Parse `((x y) (x y z) ...)` or vector forms into points.  Any malformed
/// entry makes the whole frame absent.
fn parse_points(value: &Value) -> Option<Vec<Point>> {
    list_items(value)?.into_iter().map(parse_point).collect()
}

fn parse_point(value: &Value) -> Option<Point> {
    let coords = list_items(value)?;
    if coords.len() < 2 || coords.len() > 3 {
        return None;
    }
    let x = as_f64(coords[0])?;
    let y = as_f64(coords[1])?;
    Some(Point::new(x as f32, y as f32))
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Elements of a proper list or vector.  `()` is the empty list.
fn list_items(value: &Value) -> Option<Vec<&Value>> {
    match value {
        Value::Vector(items) => Some(items.iter().collect()),
        Value::Null | Value::Nil => Some(Vec::new()),
        Value::Cons(_) => {
            let mut items = Vec::new();
            let mut current = value;
            loop {
                match current {
                    Value::Cons(pair) => {
                        items.push(pair.car());
                        current = pair.cdr();
                    }
                    Value::Null | Value::Nil => return Some(items),
                    // Dotted list
                    _ => return None,
                }
            }
        }
        _ => None,
    }
}

// ── Helpers ────────────────────────────────────────────────

fn ok_response(id: i64) -> String {
    format!("(:type :response :id {} :status :ok)", id)
}

fn ignored_response(id: i64) -> String {
    format!("(:type :response :id {} :status :ok :ignored t)", id)
}

fn error_response(id: i64, reason: &str) -> String {
    format!(
        "(:type :response :id {} :status :error :reason \"{}\")",
        id,
        escape_string(reason)
    )
}

/// Escape a string for s-expression output.
fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Value following `:key` in a plist.
///
/// Handles both `Value::Keyword("key")` (elisp parser) and
/// `Value::Symbol(":key")` (default parser) forms.
fn get_value<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let prefixed = format!(":{}", key);
    let mut current = value;
    // Step over key/value pairs so a value is never mistaken for a key.
    while let Value::Cons(pair) = current {
        let is_key = match pair.car() {
            Value::Keyword(k) => k.as_ref() == key,
            Value::Symbol(s) => s.as_ref() == prefixed,
            _ => false,
        };
        let Value::Cons(val) = pair.cdr() else {
            return None;
        };
        if is_key {
            return Some(val.car());
        }
        current = val.cdr();
    }
    None
}

/// Extract a plist value rendered as a string (keywords lose their colon).
fn get_keyword(value: &Value, key: &str) -> Option<String> {
    let val = get_value(value, key)?;
    Some(match val {
        Value::Keyword(v) => v.to_string(),
        Value::Symbol(v) => {
            let s = v.to_string();
            s.strip_prefix(':').unwrap_or(&s).to_string()
        }
        Value::String(v) => v.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => if *b { "t" } else { "nil" }.to_string(),
        Value::Null | Value::Nil => "nil".to_string(),
        _ => val.to_string(),
    })
}

fn get_int(value: &Value, key: &str) -> Option<i64> {
    get_keyword(value, key).and_then(|s| s.parse().ok())
}

/// Treats "t" as true, "nil" as false.
fn get_bool(value: &Value, key: &str) -> Option<bool> {
    get_keyword(value, key).map(|s| s != "nil")
}

/// Format an event s-expression.
pub fn format_event(event_type: &str, fields: &[(&str, &str)]) -> String {
    let mut s = format!("(:type :event :event :{}", event_type);
    for (key, val) in fields {
        s.push_str(&format!(" :{} {}", key, val));
    }
    s.push(')');
    s
}
