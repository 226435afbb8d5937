//! Per-generator memo cache.
//!
//! Each distinct token is resolved at most once per generator. The cache
//! stores a shared future per token: the first caller inserts it, every
//! later or concurrent caller clones the handle and awaits the same
//! computation. Not-found and blocked outcomes are cached too.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};

use crate::resolver::{Resolver, TokenOutcome};

type PendingOutcome = Shared<BoxFuture<'static, Arc<TokenOutcome>>>;

#[derive(Default)]
pub(crate) struct TokenCache {
    entries: Mutex<HashMap<String, PendingOutcome>>,
}

impl TokenCache {
    /// Returns the cached outcome for `token`, starting the resolution if
    /// nobody has yet.
    pub(crate) async fn get_or_resolve(&self, token: &str, resolver: &Resolver) -> Arc<TokenOutcome> {
        let pending = {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            entries
                .entry(token.to_string())
                .or_insert_with(|| {
                    let resolver = resolver.clone();
                    let token = token.to_string();
                    async move { Arc::new(resolver.resolve(&token).await) }
                        .boxed()
                        .shared()
                })
                .clone()
        };
        pending.await
    }

    /// The outcome for `token` if it has already completed.
    pub(crate) fn peek(&self, token: &str) -> Option<Arc<TokenOutcome>> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(token)
            .and_then(|pending| pending.peek().cloned())
    }

    /// Cached tokens, sorted.
    pub(crate) fn tokens(&self) -> Vec<String> {
        let mut tokens: Vec<String> = self
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        tokens.sort();
        tokens
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub(crate) fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{UserConfig, resolve_config};
    use crate::diagnostics::Diagnostics;
    use crate::rule::{CssBatch, Rule};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn concurrent_callers_share_one_resolution() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let config = UserConfig::new().rule(Rule::dynamic("^x$", move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            vec![CssBatch::from_pairs(&[("a", "b")])]
        }));
        let resolver = Resolver::new(
            Arc::new(resolve_config(config).await.unwrap()),
            Arc::new(Diagnostics::default()),
        );
        let cache = TokenCache::default();

        let (a, b) = futures::join!(
            cache.get_or_resolve("x", &resolver),
            cache.get_or_resolve("x", &resolver)
        );
        assert_eq!(a, b);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.peek("x").is_some());
        assert_eq!(cache.len(), 1);

        cache.clear();
        cache.get_or_resolve("x", &resolver).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.tokens(), vec!["x"]);
    }
}
