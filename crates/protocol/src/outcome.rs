//! Uniform `{code, message, data}` outcome.
//!
//! Library operations return `Result<T, E>`; callers that need the flat
//! three-field shape (the CLI, JSON output) convert with
//! [`Outcome::from_result`]. Codes follow one convention everywhere:
//! `0` success, `> 0` advisory (the caller must choose a policy), `< 0`
//! failure.

use serde::Serialize;

use crate::constants::CODE_OK;

/// Something that maps onto an outcome code and a human readable message.
pub trait Report {
    fn code(&self) -> i32;
    fn message(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome<T> {
    pub code: i32,
    pub message: String,
    /// Present on success and advisory outcomes only.
    pub data: Option<T>,
}

impl<T> Outcome<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            code: CODE_OK,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failure(code: i32, message: impl Into<String>) -> Self {
        debug_assert!(code < 0, "failure codes are negative");
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == CODE_OK
    }

    pub fn is_advisory(&self) -> bool {
        self.code > 0
    }

    pub fn is_failure(&self) -> bool {
        self.code < 0
    }

    /// Flattens a typed result. Both sides supply their own code and message.
    pub fn from_result<E: Report>(result: Result<T, E>) -> Self
    where
        T: Report,
    {
        match result {
            Ok(value) => Self {
                code: value.code(),
                message: value.message(),
                data: Some(value),
            },
            Err(err) => Self {
                code: err.code(),
                message: err.message(),
                data: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Done(u32);

    impl Report for Done {
        fn code(&self) -> i32 {
            if self.0 == 0 { 0 } else { 5060 }
        }
        fn message(&self) -> String {
            "done".into()
        }
    }

    #[derive(Debug)]
    struct Broken;

    impl Report for Broken {
        fn code(&self) -> i32 {
            -2
        }
        fn message(&self) -> String {
            "bad json".into()
        }
    }

    #[test]
    fn success_keeps_data() {
        let o = Outcome::from_result::<Broken>(Ok(Done(0)));
        assert!(o.is_success());
        assert!(o.data.is_some());
    }

    #[test]
    fn advisory_keeps_data() {
        let o = Outcome::from_result::<Broken>(Ok(Done(1)));
        assert!(o.is_advisory());
        assert_eq!(o.code, 5060);
        assert!(o.data.is_some());
    }

    #[test]
    fn failure_drops_data() {
        let o = Outcome::<Done>::from_result(Err(Broken));
        assert!(o.is_failure());
        assert_eq!(o.message, "bad json");
        assert!(o.data.is_none());
    }

    #[test]
    fn serializes_three_fields() {
        let o = Outcome::ok("ok", 3);
        let json = serde_json::to_value(&o).unwrap();
        assert_eq!(json, serde_json::json!({"code": 0, "message": "ok", "data": 3}));
    }
}
