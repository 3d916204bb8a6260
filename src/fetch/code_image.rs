//! Code-snippet image rendering: heuristic language detection plus an
//! external rendering collaborator.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeLanguage {
    Python,
    Javascript,
    Java,
    Cpp,
    Php,
    Sql,
    Html,
    Css,
}

impl CodeLanguage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Javascript => "javascript",
            Self::Java => "java",
            Self::Cpp => "cpp",
            Self::Php => "php",
            Self::Sql => "sql",
            Self::Html => "html",
            Self::Css => "css",
        }
    }
}

/// Best-effort language classification. Advisory only: a misclassification
/// changes syntax highlighting, never the render outcome.
pub trait LanguageDetector: Send + Sync {
    fn detect(&self, code: &str) -> CodeLanguage;
}

/// Substring token matching, first match wins, javascript on ambiguity.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokenHeuristics;

impl LanguageDetector for TokenHeuristics {
    fn detect(&self, code: &str) -> CodeLanguage {
        if code.contains("def ") || code.contains("import ") || code.contains("print(") {
            CodeLanguage::Python
        } else if code.contains("function ") || code.contains("const ") || code.contains("let ") {
            CodeLanguage::Javascript
        } else if code.contains("public class") || code.contains("System.out") {
            CodeLanguage::Java
        } else if code.contains("#include") || code.contains("int main") {
            CodeLanguage::Cpp
        } else if code.contains("<?php") {
            CodeLanguage::Php
        } else if code.contains("SELECT") || code.contains("FROM") {
            CodeLanguage::Sql
        } else if code.contains("<html") || code.contains("<div") {
            CodeLanguage::Html
        } else if code.contains("body {") || code.contains(".class") {
            CodeLanguage::Css
        } else {
            CodeLanguage::Javascript
        }
    }
}

/// External collaborator producing a screenshot-style image of syntax
/// highlighted code with the title as a caption.
#[async_trait]
pub trait CodeRenderer: Send + Sync {
    async fn render(&self, code: &str, language: CodeLanguage, title: &str) -> Result<Bytes>;
}

/// HTTP rendering service: POST the snippet, receive raster image bytes.
pub struct HttpCodeRenderer {
    client: Client,
    endpoint: String,
}

impl HttpCodeRenderer {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl CodeRenderer for HttpCodeRenderer {
    async fn render(&self, code: &str, language: CodeLanguage, title: &str) -> Result<Bytes> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&json!({
                "code": code,
                "language": language.as_str(),
                "title": title,
                "theme": "dark",
                "padding": 16,
            }))
            .send()
            .await
            .context("Code image render request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("Code image renderer returned {status}: {body}");
        }

        resp.bytes()
            .await
            .context("Failed to read rendered code image bytes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_common_languages() {
        let d = TokenHeuristics;
        assert_eq!(d.detect("import os\ndef main():\n    pass"), CodeLanguage::Python);
        assert_eq!(d.detect("const x = 1;"), CodeLanguage::Javascript);
        assert_eq!(
            d.detect("public class Main { System.out.println(); }"),
            CodeLanguage::Java
        );
        assert_eq!(d.detect("#include <stdio.h>\nint main() {}"), CodeLanguage::Cpp);
        assert_eq!(d.detect("<?php echo 1; ?>"), CodeLanguage::Php);
        assert_eq!(d.detect("SELECT * FROM users"), CodeLanguage::Sql);
        assert_eq!(d.detect("<div>hi</div>"), CodeLanguage::Html);
        assert_eq!(d.detect("body { margin: 0; }"), CodeLanguage::Css);
    }

    #[test]
    fn ambiguous_code_defaults_to_javascript() {
        assert_eq!(TokenHeuristics.detect("x = 1"), CodeLanguage::Javascript);
    }

    #[test]
    fn python_tokens_win_over_javascript_tokens() {
        // "import " appears first in the heuristic chain.
        assert_eq!(
            TokenHeuristics.detect("import { thing } from 'mod'; const x = 1;"),
            CodeLanguage::Python
        );
    }
}
