//! Script-supplied callbacks
//!
//! The engine awaits every callback, whether it finishes immediately or not.
//! Plain closures implement the traits directly; closures returning a future
//! are wrapped in [`Deferred`].

use crate::answers::ChatContext;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use thiserror::Error;

/// Failure reported by a script callback
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CallbackError {
    pub message: String,
}

impl CallbackError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<&str> for CallbackError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for CallbackError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Which collaborator callback was running, for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackKind {
    Text,
    Condition,
    Validation,
    Hook,
}

impl fmt::Display for CallbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallbackKind::Text => "text",
            CallbackKind::Condition => "condition",
            CallbackKind::Validation => "validation",
            CallbackKind::Hook => "completion hook",
        };
        f.write_str(name)
    }
}

/// Produces the text of an output step or a validation error
#[async_trait]
pub trait TextProducer: Send + Sync {
    async fn produce(&self, ctx: &ChatContext) -> Result<String, CallbackError>;
}

/// Decides whether an `if` block is entered or a `while` block repeats
#[async_trait]
pub trait Condition: Send + Sync {
    async fn check(&self, ctx: &ChatContext) -> Result<bool, CallbackError>;
}

/// Accepts or rejects a submitted answer
#[async_trait]
pub trait Validator: Send + Sync {
    async fn validate(&self, value: &str, ctx: &ChatContext) -> Result<bool, CallbackError>;
}

/// Runs after a step (or the whole form) completes
#[async_trait]
pub trait CompletionHook: Send + Sync {
    async fn complete(&self, ctx: &ChatContext) -> Result<(), CallbackError>;
}

#[async_trait]
impl<F> TextProducer for F
where
    F: Fn(&ChatContext) -> String + Send + Sync,
{
    async fn produce(&self, ctx: &ChatContext) -> Result<String, CallbackError> {
        Ok(self(ctx))
    }
}

#[async_trait]
impl<F> Condition for F
where
    F: Fn(&ChatContext) -> bool + Send + Sync,
{
    async fn check(&self, ctx: &ChatContext) -> Result<bool, CallbackError> {
        Ok(self(ctx))
    }
}

#[async_trait]
impl<F> Validator for F
where
    F: Fn(&str, &ChatContext) -> bool + Send + Sync,
{
    async fn validate(&self, value: &str, ctx: &ChatContext) -> Result<bool, CallbackError> {
        Ok(self(value, ctx))
    }
}

#[async_trait]
impl<F> CompletionHook for F
where
    F: Fn(&ChatContext) + Send + Sync,
{
    async fn complete(&self, ctx: &ChatContext) -> Result<(), CallbackError> {
        self(ctx);
        Ok(())
    }
}

/// Adapter for callbacks that return a future.
///
/// The wrapped closure receives an owned snapshot of the context, so the
/// future it returns does not borrow from the engine.
///
/// ```ignore
/// let check = Deferred(|ctx: ChatContext| async move {
///     Ok(lookup_remote(ctx.last("email")).await)
/// });
/// ```
#[derive(Clone)]
pub struct Deferred<F>(pub F);

#[async_trait]
impl<F, Fut> TextProducer for Deferred<F>
where
    F: Fn(ChatContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, CallbackError>> + Send,
{
    async fn produce(&self, ctx: &ChatContext) -> Result<String, CallbackError> {
        (self.0)(ctx.clone()).await
    }
}

#[async_trait]
impl<F, Fut> Condition for Deferred<F>
where
    F: Fn(ChatContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<bool, CallbackError>> + Send,
{
    async fn check(&self, ctx: &ChatContext) -> Result<bool, CallbackError> {
        (self.0)(ctx.clone()).await
    }
}

#[async_trait]
impl<F, Fut> Validator for Deferred<F>
where
    F: Fn(String, ChatContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<bool, CallbackError>> + Send,
{
    async fn validate(&self, value: &str, ctx: &ChatContext) -> Result<bool, CallbackError> {
        (self.0)(value.to_string(), ctx.clone()).await
    }
}

#[async_trait]
impl<F, Fut> CompletionHook for Deferred<F>
where
    F: Fn(ChatContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), CallbackError>> + Send,
{
    async fn complete(&self, ctx: &ChatContext) -> Result<(), CallbackError> {
        (self.0)(ctx.clone()).await
    }
}
