#[cfg(test)]
pub mod test {
    use serde::{Deserialize, Serialize};

    use crate::error::BoxError;
    use crate::field::{
        ConsumesEnvironmentText, ConsumesOption, Delegate, Field, FieldTable, Record, Slot,
    };
    use crate::nullable::*;
    use crate::types::Value;

    // -- One field of every bindable kind ---------------------------------------

    #[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
    #[serde(rename_all = "PascalCase")]
    pub struct Everything {
        pub int: isize,
        pub null_int: NullInt,
        pub int8: i8,
        pub null_int8: NullInt8,
        pub int16: i16,
        pub null_int16: NullInt16,
        pub int32: i32,
        pub null_int32: NullInt32,
        pub int64: i64,
        pub null_int64: NullInt64,
        pub float32: f32,
        pub null_float32: NullFloat32,
        pub float64: f64,
        pub null_float64: NullFloat64,
        pub bool: bool,
        pub null_bool: NullBool,
        pub string: String,
        pub null_string: NullString,
    }

    impl Everything {
        pub fn expected() -> Self {
            Everything {
                int: 1,
                null_int: NullInt::new(1),
                int8: 8,
                null_int8: NullInt8::new(8),
                int16: 16,
                null_int16: NullInt16::new(16),
                int32: 32,
                null_int32: NullInt32::new(32),
                int64: 64,
                null_int64: NullInt64::new(64),
                float32: 3.2,
                null_float32: NullFloat32::new(3.2),
                float64: 6.4,
                null_float64: NullFloat64::new(6.4),
                bool: true,
                null_bool: NullBool::new(true),
                string: "string".into(),
                null_string: NullString::new("string".into()),
            }
        }
    }

    impl Record for Everything {
        fn fields() -> FieldTable<Self> {
            FieldTable::<Self>::new()
                .field("Int", |c| &mut c.int)
                .env("TEST_INT")
                .field("NullInt", |c| &mut c.null_int)
                .env("TEST_NULLINT")
                .field("Int8", |c| &mut c.int8)
                .env("TEST_INT8")
                .field("NullInt8", |c| &mut c.null_int8)
                .env("TEST_NULLINT8")
                .field("Int16", |c| &mut c.int16)
                .env("TEST_INT16")
                .field("NullInt16", |c| &mut c.null_int16)
                .env("TEST_NULLINT16")
                .field("Int32", |c| &mut c.int32)
                .env("TEST_INT32")
                .field("NullInt32", |c| &mut c.null_int32)
                .env("TEST_NULLINT32")
                .field("Int64", |c| &mut c.int64)
                .env("TEST_INT64")
                .field("NullInt64", |c| &mut c.null_int64)
                .env("TEST_NULLINT64")
                .field("Float32", |c| &mut c.float32)
                .env("TEST_FLOAT32")
                .field("NullFloat32", |c| &mut c.null_float32)
                .env("TEST_NULLFLOAT32")
                .field("Float64", |c| &mut c.float64)
                .env("TEST_FLOAT64")
                .field("NullFloat64", |c| &mut c.null_float64)
                .env("TEST_NULLFLOAT64")
                .field("Bool", |c| &mut c.bool)
                .env("TEST_BOOL")
                .field("NullBool", |c| &mut c.null_bool)
                .env("TEST_NULLBOOL")
                .field("String", |c| &mut c.string)
                .env("TEST_STRING")
                .field("NullString", |c| &mut c.null_string)
                .env("TEST_NULLSTRING")
        }
    }

    // -- The same fields, each behind an Option ---------------------------------

    #[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
    #[serde(rename_all = "PascalCase")]
    pub struct Pointers {
        pub int: Option<isize>,
        pub null_int: Option<NullInt>,
        pub int8: Option<i8>,
        pub null_int8: Option<NullInt8>,
        pub int16: Option<i16>,
        pub null_int16: Option<NullInt16>,
        pub int32: Option<i32>,
        pub null_int32: Option<NullInt32>,
        pub int64: Option<i64>,
        pub null_int64: Option<NullInt64>,
        pub float32: Option<f32>,
        pub null_float32: Option<NullFloat32>,
        pub float64: Option<f64>,
        pub null_float64: Option<NullFloat64>,
        pub bool: Option<bool>,
        pub null_bool: Option<NullBool>,
        pub string: Option<String>,
        pub null_string: Option<NullString>,
    }

    impl Pointers {
        pub fn expected() -> Self {
            let e = Everything::expected();
            Pointers {
                int: Some(e.int),
                null_int: Some(e.null_int),
                int8: Some(e.int8),
                null_int8: Some(e.null_int8),
                int16: Some(e.int16),
                null_int16: Some(e.null_int16),
                int32: Some(e.int32),
                null_int32: Some(e.null_int32),
                int64: Some(e.int64),
                null_int64: Some(e.null_int64),
                float32: Some(e.float32),
                null_float32: Some(e.null_float32),
                float64: Some(e.float64),
                null_float64: Some(e.null_float64),
                bool: Some(e.bool),
                null_bool: Some(e.null_bool),
                string: Some(e.string),
                null_string: Some(e.null_string),
            }
        }
    }

    impl Record for Pointers {
        fn fields() -> FieldTable<Self> {
            FieldTable::<Self>::new()
                .optional("Int", |c| &mut c.int)
                .env("TEST_INT")
                .optional("NullInt", |c| &mut c.null_int)
                .env("TEST_NULLINT")
                .optional("Int8", |c| &mut c.int8)
                .env("TEST_INT8")
                .optional("NullInt8", |c| &mut c.null_int8)
                .env("TEST_NULLINT8")
                .optional("Int16", |c| &mut c.int16)
                .env("TEST_INT16")
                .optional("NullInt16", |c| &mut c.null_int16)
                .env("TEST_NULLINT16")
                .optional("Int32", |c| &mut c.int32)
                .env("TEST_INT32")
                .optional("NullInt32", |c| &mut c.null_int32)
                .env("TEST_NULLINT32")
                .optional("Int64", |c| &mut c.int64)
                .env("TEST_INT64")
                .optional("NullInt64", |c| &mut c.null_int64)
                .env("TEST_NULLINT64")
                .optional("Float32", |c| &mut c.float32)
                .env("TEST_FLOAT32")
                .optional("NullFloat32", |c| &mut c.null_float32)
                .env("TEST_NULLFLOAT32")
                .optional("Float64", |c| &mut c.float64)
                .env("TEST_FLOAT64")
                .optional("NullFloat64", |c| &mut c.null_float64)
                .env("TEST_NULLFLOAT64")
                .optional("Bool", |c| &mut c.bool)
                .env("TEST_BOOL")
                .optional("NullBool", |c| &mut c.null_bool)
                .env("TEST_NULLBOOL")
                .optional("String", |c| &mut c.string)
                .env("TEST_STRING")
                .optional("NullString", |c| &mut c.null_string)
                .env("TEST_NULLSTRING")
        }
    }

    // -- A realistic record with custom and unsupported fields ------------------

    #[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
    #[serde(rename_all = "lowercase")]
    pub enum Mode {
        #[default]
        Fast,
        Slow,
    }

    impl Mode {
        fn parse(text: &str) -> Result<Self, BoxError> {
            match text {
                "fast" => Ok(Mode::Fast),
                "slow" => Ok(Mode::Slow),
                other => Err(format!("unknown mode {other:?} (expected fast or slow)").into()),
            }
        }
    }

    impl ConsumesOption for Mode {
        fn consume_option(&mut self, value: &Value) -> Result<(), BoxError> {
            match value.deref_once() {
                Value::Text(text) => {
                    *self = Mode::parse(&text)?;
                    Ok(())
                }
                other => Err(format!("mode must be text, got {}", other.type_name()).into()),
            }
        }
    }

    impl ConsumesEnvironmentText for Mode {
        fn consume_env_text(&mut self, text: &str) -> Result<(), BoxError> {
            *self = Mode::parse(text)?;
            Ok(())
        }
    }

    impl Delegate for Mode {
        fn as_option_consumer(&mut self) -> Option<&mut dyn ConsumesOption> {
            Some(self)
        }

        fn as_env_consumer(&mut self) -> Option<&mut dyn ConsumesEnvironmentText> {
            Some(self)
        }
    }

    impl Field for Mode {
        fn slot(&mut self) -> Slot<'_> {
            Slot::Aggregate(self)
        }
    }

    /// A composite that only documents may fill.
    #[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
    pub struct Limits {
        pub max_connections: i64,
        pub burst: i64,
    }

    impl Delegate for Limits {}

    impl Field for Limits {
        fn slot(&mut self) -> Slot<'_> {
            Slot::Aggregate(self)
        }
    }

    #[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
    #[serde(rename_all = "PascalCase")]
    pub struct Server {
        pub host: String,
        pub port: i64,
        pub verbose: bool,
        pub workers: u16,
        pub mode: Mode,
        pub timeout: NullFloat64,
        pub limits: Limits,
    }

    impl Record for Server {
        fn fields() -> FieldTable<Self> {
            FieldTable::<Self>::new()
                .field("Host", |s| &mut s.host)
                .env("SERVER_HOST")
                .field("Port", |s| &mut s.port)
                .env("SERVER_PORT")
                .field("Verbose", |s| &mut s.verbose)
                .field("Workers", |s| &mut s.workers)
                .env("SERVER_WORKERS")
                .field("Mode", |s| &mut s.mode)
                .env("SERVER_MODE")
                .field("Timeout", |s| &mut s.timeout)
                .env("SERVER_TIMEOUT")
                .field("Limits", |s| &mut s.limits)
        }
    }

    // -- Bound from the real process environment -------------------------------

    /// `CARGO_PKG_NAME` is set for test binaries run by cargo. The port key is
    /// never set by anything.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Package {
        pub name: String,
        pub port: i64,
    }

    pub const UNSET_PORT_KEY: &str = "CONFBIND_FIXTURE_NEVER_SET_PORT";

    impl Package {
        /// What `name` should hold after a process-env bind over `fallback`.
        pub fn expected_name(fallback: &str) -> String {
            std::env::var("CARGO_PKG_NAME")
                .ok()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| fallback.to_string())
        }
    }

    impl Record for Package {
        fn fields() -> FieldTable<Self> {
            FieldTable::<Self>::new()
                .field("Name", |p| &mut p.name)
                .env("CARGO_PKG_NAME")
                .field("Port", |p| &mut p.port)
                .env(UNSET_PORT_KEY)
        }
    }

    #[test]
    fn fixture_tables_are_well_formed() {
        assert!(Everything::fields().validate().is_ok());
        assert!(Pointers::fields().validate().is_ok());
        assert!(Server::fields().validate().is_ok());
        assert!(Package::fields().validate().is_ok());
        assert_eq!(Everything::fields().len(), 18);
    }
}
