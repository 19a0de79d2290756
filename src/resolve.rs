//! Core resolution pipeline: apply every layer to one destination record.
//!
//! Operates on pre-loaded data (`ResolveInput`) with no file I/O, making the
//! full pipeline testable with synthetic inputs. Steps:
//!
//! 1. Parse every non-empty document
//! 2. Validate each parsed document against the record (if strict mode)
//! 3. Decode the documents onto the record (later documents override earlier)
//! 4. Bind environment variables on top
//! 5. Bind the option map on top (highest priority, opt-in)
//!
//! The first failure stops the pipeline. Layers applied before it stay applied.

use tracing::debug;

use crate::bind;
use crate::document::{self, Document};
use crate::env::EnvSource;
use crate::error::ConfbindError;
use crate::field::Record;
use crate::types::Options;
use crate::validate;

/// A record the full loader can populate.
///
/// Documents reach the record field by field through its table, so the record
/// itself needs no serde impls. Only registered fields are decoded: a field
/// left out of the table (say one marked `#[serde(skip)]`) keeps its value.
pub trait Loadable: Record + Default {}

impl<T: Record + Default> Loadable for T {}

/// All pre-loaded data needed to resolve a config. No file I/O happens here.
pub struct ResolveInput<'a> {
    /// Documents in precedence order: first = lowest priority, last = highest.
    pub documents: Vec<Document>,
    /// Environment to bind from. `None` means env disabled.
    pub env: Option<&'a dyn EnvSource>,
    /// Option-map layer. `None` means no option layer.
    pub options: Option<&'a Options>,
    /// Whether to reject unknown keys in documents.
    pub strict: bool,
}

/// Resolve every layer of `input` onto `dest`.
pub fn resolve_into<T: Loadable>(input: ResolveInput<'_>, dest: &mut T) -> Result<(), ConfbindError> {
    // 1-2: Parse and validate before the record is touched
    let mut layers = Vec::with_capacity(input.documents.len());
    for doc in &input.documents {
        if doc.is_empty() {
            debug!(origin = %doc.origin, "skipping empty document");
            continue;
        }
        let layer = doc.parse()?;
        if input.strict {
            validate::validate_unknown_keys(doc, &layer, dest)?;
        }
        layers.push(layer);
    }

    // 3: Documents
    if !layers.is_empty() {
        debug!(documents = layers.len(), "decoding document layers");
        document::decode_onto(&layers, dest)?;
    }

    // 4: Environment
    if let Some(env) = input.env {
        debug!("binding environment layer");
        bind::bind_env_from(env, dest)?;
    }

    // 5: Options
    if let Some(options) = input.options {
        debug!(options = options.len(), "binding option layer");
        bind::bind_options(options, dest)?;
    }

    Ok(())
}
