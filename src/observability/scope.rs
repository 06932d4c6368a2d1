//! Scoped span ownership.
//!
//! A [`ScopedSpan`] starts a span as a child of an explicit parent
//! [`Context`], hands out the derived context for callees, and ends the span
//! when it goes out of scope. Every exit path of the owning function,
//! including early returns and failure branches, therefore closes the span
//! exactly once and only after all calls made under it have returned.

use opentelemetry::trace::{SpanBuilder, TraceContextExt, Tracer};
use opentelemetry::trace::SpanRef;
use opentelemetry::Context;

/// A span that ends when dropped.
#[derive(Debug)]
pub struct ScopedSpan {
    cx: Context,
}

impl ScopedSpan {
    /// Start `builder` under `parent` and take ownership of the new span.
    pub fn start<T>(tracer: &T, parent: &Context, builder: SpanBuilder) -> Self
    where
        T: Tracer,
        T::Span: Send + Sync + 'static,
    {
        let span = builder.start_with_context(tracer, parent);
        Self {
            cx: parent.with_span(span),
        }
    }

    /// Context carrying this span as the active span, to pass to callees.
    pub fn context(&self) -> &Context {
        &self.cx
    }

    /// Handle for setting status, attributes and events.
    pub fn span(&self) -> SpanRef<'_> {
        self.cx.span()
    }
}

impl Drop for ScopedSpan {
    fn drop(&mut self) {
        self.cx.span().end();
    }
}
