//! Configuration record for the confbind demo application.
//!
//! Each field is registered once in [`DemoConfig::fields`], which gives it
//! an option-map key and, for most fields, an environment variable:
//!
//! | Env var                 | Field      |
//! |-------------------------|------------|
//! | `CONFBIND_DEMO_HOST`    | `host`     |
//! | `CONFBIND_DEMO_PORT`    | `port`     |
//! | `CONFBIND_DEMO_TIMEOUT` | `timeout`  |
//! | `CONFBIND_DEMO_WORKERS` | `workers`  |
//! | `CONFBIND_DEMO_COLOR`   | `color`    |
//!
//! `name` and `verbose` have no env key, so only documents and flags reach
//! them.

use confbind::{FieldTable, NullFloat64, Record};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DemoConfig {
    /// Application name shown in the echo banner.
    pub name: String,
    pub host: String,
    pub port: i64,
    pub verbose: bool,
    /// Request timeout in seconds. `null` in a document means "no timeout".
    pub timeout: NullFloat64,
    /// Worker count; unset until some source provides one.
    pub workers: Option<i32>,
    /// Terminal color for the echo output.
    pub color: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        DemoConfig {
            name: "confbind-demo".into(),
            host: "127.0.0.1".into(),
            port: 3000,
            verbose: false,
            timeout: NullFloat64::absent(),
            workers: None,
            color: "yellow".into(),
        }
    }
}

impl Record for DemoConfig {
    fn fields() -> FieldTable<Self> {
        FieldTable::<Self>::new()
            .field("Name", |c| &mut c.name)
            .field("Host", |c| &mut c.host)
            .env("CONFBIND_DEMO_HOST")
            .field("Port", |c| &mut c.port)
            .env("CONFBIND_DEMO_PORT")
            .field("Verbose", |c| &mut c.verbose)
            .field("Timeout", |c| &mut c.timeout)
            .env("CONFBIND_DEMO_TIMEOUT")
            .optional("Workers", |c| &mut c.workers)
            .env("CONFBIND_DEMO_WORKERS")
            .field("Color", |c| &mut c.color)
            .env("CONFBIND_DEMO_COLOR")
    }
}
