//! Code transformation
//!
//! Wraps non-JS modules so they can live in the module registry alongside
//! plain JavaScript.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::bundler::ModuleType;
use crate::config::Config;

/// Code transformer
pub struct Transformer {
    /// Project configuration
    #[allow(dead_code)]
    config: Arc<Config>,
}

impl Transformer {
    /// Create a new transformer
    pub fn new(config: Arc<Config>) -> Result<Self> {
        Ok(Self { config })
    }

    /// Transform source code based on module type
    pub fn transform(
        &self,
        source: &str,
        path: &Path,
        module_type: &ModuleType,
    ) -> Result<String> {
        match module_type {
            ModuleType::Css => self.transform_css(source, path),
            ModuleType::Json => self.transform_json(source, path),
            _ => Ok(source.to_string()),
        }
    }

    /// Transform CSS (wrap as JS module that injects a style tag)
    fn transform_css(&self, source: &str, path: &Path) -> Result<String> {
        debug!("Transforming CSS: {}", path.display());

        let escaped = source
            .replace('\\', "\\\\")
            .replace('`', "\\`")
            .replace("${", "\\${");

        let js_module = format!(
            r#"(function() {{
  var style = document.createElement('style');
  style.textContent = `{}`;
  document.head.appendChild(style);
}})();
module.exports = {{}};
"#,
            escaped
        );

        Ok(js_module)
    }

    /// Transform JSON to an ES module
    fn transform_json(&self, source: &str, path: &Path) -> Result<String> {
        debug!("Transforming JSON: {}", path.display());

        // Validate JSON before embedding it
        serde_json::from_str::<serde_json::Value>(source)
            .with_context(|| format!("invalid JSON module: {}", path.display()))?;

        Ok(format!("module.exports = {};\n", source.trim_end()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn transformer() -> Transformer {
        Transformer::new(Arc::new(Config::default_config())).unwrap()
    }

    #[test]
    fn test_js_passes_through() {
        let out = transformer()
            .transform("const a = 1;", Path::new("/a.js"), &ModuleType::JavaScript)
            .unwrap();
        assert_eq!(out, "const a = 1;");
    }

    #[test]
    fn test_css_is_wrapped() {
        let out = transformer()
            .transform("body { color: red }", Path::new("/a.css"), &ModuleType::Css)
            .unwrap();
        assert!(out.contains("createElement('style')"));
        assert!(out.contains("body { color: red }"));
    }

    #[test]
    fn test_css_escapes_template_syntax() {
        let out = transformer()
            .transform("a::before { content: '`${x}`' }", Path::new("/a.css"), &ModuleType::Css)
            .unwrap();
        assert!(out.contains("\\`\\${x}\\`"));
    }

    #[test]
    fn test_json_is_validated_and_wrapped() {
        let out = transformer()
            .transform(r#"{"a": 1}"#, Path::new("/a.json"), &ModuleType::Json)
            .unwrap();
        assert_eq!(out, "module.exports = {\"a\": 1};\n");

        let err = transformer().transform("not json", Path::new("/b.json"), &ModuleType::Json);
        assert!(err.is_err());
    }
}
