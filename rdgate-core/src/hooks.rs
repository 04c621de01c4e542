//! Pluggable verification hooks.
//!
//! Each hook receives the string extracted from the corresponding request
//! (PAA cookie, client machine name, or target `host:port`) and resolves
//! to `true` to allow the step. An absent hook allows unconditionally.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

/// A single async predicate over a protocol-supplied string.
#[derive(Clone)]
pub struct VerifyHook {
    f: Arc<dyn Fn(String) -> BoxFuture<'static, bool> + Send + Sync>,
}

impl VerifyHook {
    /// Wrap an async predicate.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        Self {
            f: Arc::new(move |arg| Box::pin(f(arg))),
        }
    }

    /// Evaluate the predicate.
    pub async fn check(&self, arg: impl Into<String>) -> bool {
        (self.f)(arg.into()).await
    }
}

impl fmt::Debug for VerifyHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VerifyHook")
    }
}

/// The three optional verification points of the handshake.
#[derive(Clone, Debug, Default)]
pub struct VerifyHooks {
    /// Validates the PAA cookie from TUNNEL_CREATE.
    pub tunnel_create: Option<VerifyHook>,
    /// Validates the client machine name from TUNNEL_AUTH.
    pub tunnel_auth: Option<VerifyHook>,
    /// Validates the resolved target `host:port` from CHANNEL_CREATE.
    pub server: Option<VerifyHook>,
}

/// Evaluate an optional hook; `None` allows.
pub(crate) async fn allowed(hook: &Option<VerifyHook>, arg: &str) -> bool {
    match hook {
        Some(hook) => hook.check(arg).await,
        None => true,
    }
}

// ── Tests ────────────────────────────────────────────────────────
