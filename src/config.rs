use crate::discriminator::DEFAULT_NAMESPACE;
use crate::header::HeaderFormat;
use crate::schema::Schema;

/// Coder construction options.
///
/// The defaults reproduce what the schema alone implies: the `"account"`
/// namespace and a header format picked from the schema's layout version
/// marker.
///
/// ```rust,ignore
/// let config = CoderConfig::default().namespace("state");
/// let coder = AccountsCoder::with_config(&schema, config)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoderConfig {
    namespace: String,
    format: Option<HeaderFormat>,
}

impl Default for CoderConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_owned(),
            format: None,
        }
    }
}

impl CoderConfig {
    /// Discriminator namespace for every type this coder handles.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Force a header format instead of deriving it from the schema.
    pub fn format(mut self, format: HeaderFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn namespace_str(&self) -> &str {
        &self.namespace
    }

    /// The header format this config resolves to for `schema`.
    pub fn resolve_format(&self, schema: &Schema) -> HeaderFormat {
        self.format
            .unwrap_or_else(|| HeaderFormat::from_layout_version(schema.layout_version))
    }
}
