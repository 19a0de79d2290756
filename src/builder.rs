use std::path::PathBuf;

use tracing::debug;

use crate::document::Document;
use crate::env::{EnvSource, ProcessEnv};
use crate::error::ConfbindError;
use crate::resolve::{self, Loadable, ResolveInput};
use crate::types::{Format, Options};

/// Load one JSON document and then the process environment onto `dest`.
///
/// Empty `bytes` skips the document layer. Environment variables always
/// override document values for fields annotated with an env key.
///
/// ```ignore
/// let mut config = AppConfig::default();
/// confbind::load_configuration(br#"{"host": "127.0.0.1"}"#, &mut config)?;
/// ```
pub fn load_configuration<T: Loadable>(bytes: &[u8], dest: &mut T) -> Result<(), ConfbindError> {
    Loader::new().document(bytes).load_into(dest)
}

enum PendingDocument {
    Loaded(Document),
    File(PathBuf),
}

enum EnvLayer<'a> {
    Process,
    Source(&'a dyn EnvSource),
    Disabled,
}

/// Builder for layered loading.
///
/// Layers apply in a fixed order, lowest precedence first:
///
/// ```text
/// Documents      .document() / .file(), in call order
///        ↑ overridden by
/// Environment    process env, or .env_source()
///        ↑ overridden by
/// Options        .options(), opt-in
/// ```
///
/// Documents are sparse overlays: keys they omit keep the record's current
/// values. Environment and option layers only touch fields their source
/// supplies.
pub struct Loader<'a> {
    documents: Vec<PendingDocument>,
    env: EnvLayer<'a>,
    options: Option<Options>,
    strict: bool,
}

impl Default for Loader<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Loader<'a> {
    pub fn new() -> Self {
        Self {
            documents: Vec::new(),
            env: EnvLayer::Process,
            options: None,
            strict: false,
        }
    }

    /// Add a JSON document layer.
    pub fn document(self, bytes: impl Into<Vec<u8>>) -> Self {
        self.document_with_format(bytes, Format::Json)
    }

    /// Add a document layer in an explicit format.
    pub fn document_with_format(mut self, bytes: impl Into<Vec<u8>>, format: Format) -> Self {
        let index = self.documents.len();
        self.documents.push(PendingDocument::Loaded(Document::new(
            format!("<document #{index}>"),
            format,
            bytes,
        )));
        self
    }

    /// Add a file layer, read at load time. The format follows the extension
    /// (`.toml` is TOML, anything else JSON). A missing file is an error.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.documents.push(PendingDocument::File(path.into()));
        self
    }

    /// Read environment variables from `source` instead of the process.
    pub fn env_source(mut self, source: &'a dyn EnvSource) -> Self {
        self.env = EnvLayer::Source(source);
        self
    }

    /// Disable the environment layer entirely.
    pub fn no_env(mut self) -> Self {
        self.env = EnvLayer::Disabled;
        self
    }

    /// Bind `options` after the environment, at the highest precedence.
    /// Calling this again merges into the existing options; later keys win.
    pub fn options(mut self, options: Options) -> Self {
        match &mut self.options {
            Some(existing) => {
                for (key, value) in options.iter() {
                    existing.insert(key.clone(), value.clone());
                }
            }
            None => self.options = Some(options),
        }
        self
    }

    /// In strict mode, document keys the record does not consume are errors.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    fn build_input(&self) -> Result<ResolveInput<'_>, ConfbindError> {
        let documents = self
            .documents
            .iter()
            .map(|pending| match pending {
                PendingDocument::Loaded(doc) => Ok(doc.clone()),
                PendingDocument::File(path) => Document::read(path),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let env: Option<&dyn EnvSource> = match &self.env {
            EnvLayer::Process => Some(&ProcessEnv),
            EnvLayer::Source(source) => Some(*source),
            EnvLayer::Disabled => None,
        };

        debug!(
            documents = documents.len(),
            env = env.is_some(),
            options = self.options.is_some(),
            strict = self.strict,
            "resolving configuration layers"
        );

        Ok(ResolveInput {
            documents,
            env,
            options: self.options.as_ref(),
            strict: self.strict,
        })
    }

    /// Apply every layer onto `dest`.
    ///
    /// Not transactional: if a later layer fails, earlier layers stay
    /// applied. See [`load_into_atomic`](Self::load_into_atomic).
    pub fn load_into<T: Loadable>(&self, dest: &mut T) -> Result<(), ConfbindError> {
        let input = self.build_input()?;
        resolve::resolve_into(input, dest)
    }

    /// Apply every layer onto a copy of `dest`, replacing `dest` only when
    /// all of them succeed.
    pub fn load_into_atomic<T: Loadable + Clone>(&self, dest: &mut T) -> Result<(), ConfbindError> {
        let mut scratch = dest.clone();
        self.load_into(&mut scratch)?;
        *dest = scratch;
        Ok(())
    }

    /// Apply every layer onto `T::default()`.
    pub fn load<T: Loadable>(&self) -> Result<T, ConfbindError> {
        let mut config = T::default();
        self.load_into(&mut config)?;
        Ok(config)
    }
}
