//! Structured output envelope (spec §6): `{_meta, success, …}` on success,
//! `{_meta, success:false, error:{...}}` on failure. Plain-text rendering
//! is a `Display`-based one-liner per value; JSON rendering is the
//! structured envelope verbatim. No ANSI escapes or glyphs are emitted —
//! that styling layer is explicitly out of scope (spec §1).

use chrono::Utc;
use serde_json::{Value, json};
use todo_utils::error::TodoError;

fn meta(command: &str) -> Value {
    json!({
        "format": "todo-engine/v1",
        "version": env!("CARGO_PKG_VERSION"),
        "command": command,
        "timestamp": Utc::now().to_rfc3339(),
    })
}

/// Print a successful result and return exit code 0.
pub fn success(command: &str, json_mode: bool, payload: Value) -> i32 {
    if json_mode {
        let envelope = json!({
            "_meta": meta(command),
            "success": true,
            "data": payload,
        });
        println!("{}", serde_json::to_string_pretty(&envelope).unwrap_or_default());
    } else {
        print_plain(&payload);
    }
    0
}

/// Print an error envelope (to stderr when plain-text) and return the
/// error's mapped exit code.
pub fn failure(command: &str, json_mode: bool, err: &TodoError) -> i32 {
    let code = err.to_exit_code().as_i32();
    if json_mode {
        let envelope = json!({
            "_meta": meta(command),
            "success": false,
            "error": {
                "code": err.code(),
                "message": err.to_string(),
                "exitCode": code,
                "recoverable": err.recoverable(),
                "suggestion": err.suggestion(),
            },
        });
        println!("{}", serde_json::to_string_pretty(&envelope).unwrap_or_default());
    } else {
        eprintln!("error: {err}");
        if let Some(suggestion) = err.suggestion() {
            eprintln!("  hint: {suggestion}");
        }
    }
    code
}

fn print_plain(payload: &Value) {
    match payload {
        Value::String(s) => println!("{s}"),
        Value::Null => {}
        other => println!("{}", serde_json::to_string_pretty(other).unwrap_or_default()),
    }
}
