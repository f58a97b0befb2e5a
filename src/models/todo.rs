use std::fmt;

use chrono::NaiveDateTime;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Completion state of a todo. Crosses the wire and the store as 0/1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Completion {
    #[default]
    Pending,
    Completed,
}

impl Completion {
    pub fn as_flag(self) -> i64 {
        match self {
            Completion::Pending => 0,
            Completion::Completed => 1,
        }
    }

    pub fn from_flag(flag: i64) -> Option<Self> {
        match flag {
            0 => Some(Completion::Pending),
            1 => Some(Completion::Completed),
            _ => None,
        }
    }
}

impl From<bool> for Completion {
    fn from(done: bool) -> Self {
        if done {
            Completion::Completed
        } else {
            Completion::Pending
        }
    }
}

impl Serialize for Completion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.as_flag())
    }
}

// Accepts booleans, integers and whole-number floats; nonzero counts as completed.
impl<'de> Deserialize<'de> for Completion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CompletionVisitor;

        impl Visitor<'_> for CompletionVisitor {
            type Value = Completion;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a boolean or a whole number")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Completion, E> {
                Ok(Completion::from(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Completion, E> {
                Ok(Completion::from(v != 0))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Completion, E> {
                Ok(Completion::from(v != 0))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Completion, E> {
                if !v.is_finite() || v.fract() != 0.0 {
                    return Err(E::invalid_value(de::Unexpected::Float(v), &self));
                }
                Ok(Completion::from(v != 0.0))
            }
        }

        deserializer.deserialize_any(CompletionVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub completed: Completion,
    #[serde(with = "sqlite_timestamp")]
    pub created_at: NaiveDateTime,
    #[serde(with = "sqlite_timestamp")]
    pub updated_at: NaiveDateTime,
}

/// Timestamps go over the wire in SQLite's `CURRENT_TIMESTAMP` layout.
mod sqlite_timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTodo {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Full replacement payload for `PUT /todos/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct TodoUpdate {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub completed: Completion,
}

/// Field-level checks applied after a payload has deserialized.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

fn validate_title(title: &str) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("title must not be empty".to_string());
    }
    Ok(())
}

impl Validate for NewTodo {
    fn validate(&self) -> Result<(), String> {
        validate_title(&self.title)
    }
}

impl Validate for TodoUpdate {
    fn validate(&self) -> Result<(), String> {
        validate_title(&self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_accepts_truthy_values() {
        let cases = [
            ("true", Completion::Completed),
            ("false", Completion::Pending),
            ("1", Completion::Completed),
            ("0", Completion::Pending),
            ("7", Completion::Completed),
            ("-1", Completion::Completed),
            ("1.0", Completion::Completed),
            ("0.0", Completion::Pending),
        ];
        for (input, expected) in cases {
            let got: Completion = serde_json::from_str(input).expect(input);
            assert_eq!(got, expected, "input {}", input);
        }
    }

    #[test]
    fn test_completion_rejects_strings() {
        assert!(serde_json::from_str::<Completion>(r#""yes""#).is_err());
        assert!(serde_json::from_str::<Completion>("null").is_err());
    }

    #[test]
    fn test_completion_rejects_fractional_floats() {
        assert!(serde_json::from_str::<Completion>("0.5").is_err());
        assert!(serde_json::from_str::<Completion>("1.25").is_err());
    }

    #[test]
    fn test_timestamps_use_sqlite_layout() {
        let at = NaiveDateTime::parse_from_str("2026-10-19 03:23:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let todo = Todo {
            id: 1,
            title: "a".to_string(),
            description: None,
            completed: Completion::Pending,
            created_at: at,
            updated_at: at,
        };

        let value = serde_json::to_value(&todo).unwrap();
        assert_eq!(value["created_at"], "2026-10-19 03:23:00");
        assert_eq!(value["updated_at"], "2026-10-19 03:23:00");

        let back: Todo = serde_json::from_value(value).unwrap();
        assert_eq!(back, todo);
    }

    #[test]
    fn test_completion_serializes_as_flag() {
        assert_eq!(serde_json::to_string(&Completion::Completed).unwrap(), "1");
        assert_eq!(serde_json::to_string(&Completion::Pending).unwrap(), "0");
    }

    #[test]
    fn test_update_requires_completed() {
        let err = serde_json::from_str::<TodoUpdate>(r#"{"title":"a"}"#).unwrap_err();
        assert!(err.to_string().contains("completed"));
    }

    #[test]
    fn test_new_todo_description_is_optional() {
        let req: NewTodo = serde_json::from_str(r#"{"title":"a"}"#).unwrap();
        assert_eq!(req.description, None);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_blank_title_is_rejected() {
        let req = NewTodo {
            title: "   ".to_string(),
            description: None,
        };
        assert!(req.validate().is_err());

        let update = TodoUpdate {
            title: String::new(),
            description: None,
            completed: Completion::Pending,
        };
        assert!(update.validate().is_err());
    }
}
