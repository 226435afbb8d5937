//! Token extraction from source text.
//!
//! Extractors turn a file's contents into candidate tokens. The engine only
//! defines the seam and ships [`SplitExtractor`]; template-aware extractors
//! live with the host.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use atomcss_syntax::split::split_code;

use crate::error::{AtomError, HandlerError, Result};

/// Input handed to an extractor.
#[derive(Debug, Clone, Copy)]
pub struct ExtractorContext<'a> {
    pub code: &'a str,
    /// Identifier of the source, usually a file path.
    pub id: Option<&'a str>,
}

/// Finds candidate tokens in source text.
#[async_trait]
pub trait Extractor: Send + Sync {
    fn name(&self) -> &str;

    /// Returns the tokens found, or `None` to leave the source to other
    /// extractors.
    async fn extract(
        &self,
        ctx: &ExtractorContext<'_>,
    ) -> std::result::Result<Option<BTreeSet<String>>, HandlerError>;
}

/// Splits source text on whitespace, quotes and braces.
#[derive(Debug, Clone, Copy, Default)]
pub struct SplitExtractor;

#[async_trait]
impl Extractor for SplitExtractor {
    fn name(&self) -> &str {
        "split"
    }

    async fn extract(
        &self,
        ctx: &ExtractorContext<'_>,
    ) -> std::result::Result<Option<BTreeSet<String>>, HandlerError> {
        Ok(Some(
            split_code(ctx.code).into_iter().map(str::to_string).collect(),
        ))
    }
}

/// Runs every extractor over `code` and unions their results.
pub(crate) async fn apply_extractors(
    extractors: &[Arc<dyn Extractor>],
    code: &str,
    id: Option<&str>,
) -> Result<BTreeSet<String>> {
    let ctx = ExtractorContext { code, id };
    let mut tokens = BTreeSet::new();
    for extractor in extractors {
        let found = extractor
            .extract(&ctx)
            .await
            .map_err(|err| AtomError::Extractor {
                name: extractor.name().to_string(),
                message: err.message,
            })?;
        if let Some(found) = found {
            log::debug!(
                "extractor `{}` found {} tokens in {}",
                extractor.name(),
                found.len(),
                id.unwrap_or("<inline>")
            );
            tokens.extend(found);
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    #[async_trait]
    impl Extractor for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn extract(
            &self,
            _ctx: &ExtractorContext<'_>,
        ) -> std::result::Result<Option<BTreeSet<String>>, HandlerError> {
            Err(HandlerError::new("parse error"))
        }
    }

    struct Skip;

    #[async_trait]
    impl Extractor for Skip {
        fn name(&self) -> &str {
            "skip"
        }

        async fn extract(
            &self,
            _ctx: &ExtractorContext<'_>,
        ) -> std::result::Result<Option<BTreeSet<String>>, HandlerError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn split_extractor_dedups() {
        let extractors: Vec<Arc<dyn Extractor>> = vec![Arc::new(SplitExtractor), Arc::new(Skip)];
        let tokens = apply_extractors(&extractors, "<a class=\"p-2 m-1 p-2\">", None)
            .await
            .unwrap();
        assert!(tokens.contains("p-2"));
        assert!(tokens.contains("m-1"));
        assert_eq!(tokens.iter().filter(|t| *t == "p-2").count(), 1);
    }

    #[tokio::test]
    async fn extractor_failure_names_the_extractor() {
        let extractors: Vec<Arc<dyn Extractor>> = vec![Arc::new(Failing)];
        let err = apply_extractors(&extractors, "x", Some("a.html"))
            .await
            .unwrap_err();
        assert!(matches!(err, AtomError::Extractor { name, .. } if name == "failing"));
    }
}
