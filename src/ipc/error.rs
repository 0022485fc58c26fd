//! Response envelopes. Every reply is `{id, ok, result}` or
//! `{id, ok, error: {code, message, details?}}`; the shell switches on
//! `ok` and shows `error.message` to the user as-is.

use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelopes_round_trip_id_and_shape() {
        let v = ok("42", json!({ "x": 1 }));
        assert_eq!(v["id"], json!("42"));
        assert_eq!(v["ok"], json!(true));
        assert_eq!(v["result"]["x"], json!(1));

        let v = err("42", "validation", "Please fill in all fields.", None);
        assert_eq!(v["ok"], json!(false));
        assert_eq!(v["error"]["code"], json!("validation"));
        assert_eq!(v["error"]["message"], json!("Please fill in all fields."));
        assert!(v["error"].get("details").is_none());

        let v = err("42", "http_error", "boom", Some(json!({ "status": 500 })));
        assert_eq!(v["error"]["details"]["status"], json!(500));
    }
}
