use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::note::{Author, Note, Priority};

/// Build a `Note` from the raw arguments of a `save_note` tool call.
///
/// Absent and `null` optional fields take their defaults. Required text
/// fields that are absent, `null` or empty are reported as missing.
pub fn validate(raw: &Value) -> Result<Note, ValidationError> {
    let obj = raw
        .as_object()
        .ok_or_else(|| ValidationError::format("input", "expected a JSON object"))?;

    let text = required_str(obj, "note", "note")?;

    let author = match present(obj, "author") {
        None => return Err(ValidationError::missing("author")),
        Some(Value::Object(author)) => author,
        Some(_) => return Err(ValidationError::format("author", "expected an object")),
    };
    let name = required_str(author, "name", "author.name")?;
    let email = required_str(author, "email", "author.email")?;

    let mut note = Note::new(text, Author::new(name, email)?)?;

    if let Some(value) = present(obj, "priority") {
        note = note.with_priority(priority(value)?);
    }

    if let Some(value) = present(obj, "is_public") {
        let is_public = value.as_bool().ok_or_else(|| {
            ValidationError::format("is_public", format!("expected a boolean, got {value}"))
        })?;
        note = note.with_public(is_public);
    }

    if let Some(value) = present(obj, "tags") {
        let tags = value
            .as_array()
            .ok_or_else(|| ValidationError::format("tags", "expected an array of strings"))?
            .iter()
            .map(|t| {
                t.as_str().map(String::from).ok_or_else(|| {
                    ValidationError::format("tags", format!("expected a string, got {t}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        note = note.with_tags(tags);
    }

    Ok(note)
}

/// Whole numbers only, including `4.0`. Integers too large for `i64` are out of range.
fn priority(value: &Value) -> Result<Priority, ValidationError> {
    if let Some(p) = value.as_i64() {
        return Priority::new(p);
    }
    if value.is_u64() {
        return Priority::new(i64::MAX);
    }
    match value.as_f64() {
        // `as` saturates, so huge whole floats land outside the range too.
        Some(f) if f.is_finite() && f.fract() == 0.0 => Priority::new(f as i64),
        _ => Err(ValidationError::format(
            "priority",
            format!("expected an integer, got {value}"),
        )),
    }
}

fn present<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

fn required_str<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<&'a str, ValidationError> {
    match present(obj, key) {
        None => Err(ValidationError::missing(path)),
        Some(Value::String(s)) if s.is_empty() => Err(ValidationError::missing(path)),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(ValidationError::format(
            path,
            format!("expected a string, got {other}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> Value {
        json!({
            "note": "Buy milk",
            "author": {"name": "John Doe", "email": "johndoe@gmail.com"},
        })
    }

    fn without(mut raw: Value, path: &[&str]) -> Value {
        let (last, parents) = path.split_last().unwrap();
        let mut target = &mut raw;
        for p in parents {
            target = &mut target[*p];
        }
        target.as_object_mut().unwrap().remove(*last);
        raw
    }

    #[test]
    fn missing_required_fields() {
        for (path, field) in [
            (&["note"][..], "note"),
            (&["author"][..], "author"),
            (&["author", "name"][..], "author.name"),
            (&["author", "email"][..], "author.email"),
        ] {
            let err = validate(&without(base(), path)).unwrap_err();
            assert_eq!(err, ValidationError::missing(field), "removing {path:?}");
        }
    }

    #[test]
    fn empty_and_null_required_text_is_missing() {
        let mut raw = base();
        raw["note"] = json!("");
        assert_eq!(validate(&raw).unwrap_err(), ValidationError::missing("note"));

        let mut raw = base();
        raw["note"] = json!("   ");
        assert_eq!(validate(&raw).unwrap_err(), ValidationError::missing("note"));

        let mut raw = base();
        raw["author"]["email"] = Value::Null;
        assert_eq!(
            validate(&raw).unwrap_err(),
            ValidationError::missing("author.email")
        );
    }

    #[test]
    fn defaults_when_omitted() {
        let note = validate(&base()).unwrap();
        assert_eq!(note.priority().get(), 3);
        assert!(!note.is_public());
        assert!(note.tags().is_none());
    }

    #[test]
    fn null_optionals_take_defaults() {
        let mut raw = base();
        raw["priority"] = Value::Null;
        raw["is_public"] = Value::Null;
        let note = validate(&raw).unwrap();
        assert_eq!(note.priority().get(), 3);
        assert!(!note.is_public());
    }

    #[test]
    fn priority_in_range_round_trips() {
        for p in 1..=5u8 {
            let mut raw = base();
            raw["priority"] = json!(p);
            assert_eq!(validate(&raw).unwrap().priority().get(), p);
        }
    }

    #[test]
    fn priority_out_of_range_is_constraint_violation() {
        for p in [json!(0), json!(6), json!(-3), json!(100), json!(u64::MAX), json!(7.0)] {
            let mut raw = base();
            raw["priority"] = p;
            assert!(matches!(
                validate(&raw),
                Err(ValidationError::ConstraintViolation { ref field, .. }) if field == "priority"
            ));
        }
    }

    #[test]
    fn whole_float_priority_is_accepted() {
        let mut raw = base();
        raw["priority"] = json!(4.0);
        assert_eq!(validate(&raw).unwrap().priority().get(), 4);
    }

    #[test]
    fn non_integer_priority_is_invalid_format() {
        for p in [json!(2.5), json!("4"), json!(true)] {
            let mut raw = base();
            raw["priority"] = p;
            assert!(matches!(
                validate(&raw),
                Err(ValidationError::InvalidFormat { ref field, .. }) if field == "priority"
            ));
        }
    }

    #[test]
    fn malformed_email_is_invalid_format() {
        let raw = json!({"note": "x", "author": {"name": "A", "email": "bad"}});
        assert!(matches!(
            validate(&raw),
            Err(ValidationError::InvalidFormat { ref field, .. }) if field == "author.email"
        ));

        let raw = json!({"note": "x", "author": {"name": "A", "email": "a@b.com"}});
        assert!(validate(&raw).is_ok());
    }

    #[test]
    fn wrong_types() {
        let mut raw = base();
        raw["is_public"] = json!("yes");
        assert_eq!(validate(&raw).unwrap_err().field(), "is_public");

        let mut raw = base();
        raw["author"] = json!("John Doe");
        assert_eq!(validate(&raw).unwrap_err().field(), "author");

        let mut raw = base();
        raw["tags"] = json!(["ok", 3]);
        assert_eq!(validate(&raw).unwrap_err().field(), "tags");

        assert_eq!(validate(&json!([1, 2])).unwrap_err().field(), "input");
    }

    #[test]
    fn full_input() {
        let raw = json!({
            "note": "Quarterly review",
            "author": {"name": "Ada", "email": "ada@example.com"},
            "tags": ["work", "q3"],
            "priority": 5,
            "is_public": true,
        });
        let note = validate(&raw).unwrap();
        assert_eq!(note.note(), "Quarterly review");
        assert_eq!(note.author().name(), "Ada");
        assert_eq!(note.author().email(), "ada@example.com");
        assert_eq!(note.tags().unwrap(), ["work".to_string(), "q3".to_string()]);
        assert_eq!(note.priority().get(), 5);
        assert!(note.is_public());
    }
}
