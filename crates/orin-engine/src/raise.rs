//! Exception raise pipeline
//!
//! All failures funnel through [`raise`]: the argument is normalized into a
//! concrete exception record, the record is decorated exactly once (scope,
//! backtrace, cause), the in-flight slot is updated, and control transfers by
//! returning the [`Raised`] unwind token. Handler search is plain `Result`
//! propagation; [`rescue`] and [`rescue_matching`] are the handler side.

use crate::backtrace::Frame;
use crate::context::ThreadContext;
use crate::exception::{Exception, ExceptionKind};
use crate::state::RuntimeState;
use crate::value::Value;
use crate::{EngineResult, Raised};
use std::sync::Arc;

/// Normalized raise argument
///
/// The raise operation accepts a closed set of argument shapes; anything else
/// is rejected before any state mutation occurs.
#[derive(Debug, Clone)]
pub enum RaiseRequest {
    /// No argument: re-raise the in-flight exception, or synthesize a
    /// generic failure with an empty message when none is in flight
    ReRaise,

    /// A bare message, wrapped into a generic runtime failure
    Message(String),

    /// An existing exception instance, propagated or re-derived
    Instance(Arc<Exception>),

    /// An exception kind, constructed fresh
    Kind(ExceptionKind),
}

impl RaiseRequest {
    /// Classify an optional raise argument into the request set
    ///
    /// Returns the rejected value when it is not an acceptable argument.
    pub fn classify(value: Option<Value>) -> Result<RaiseRequest, Value> {
        match value {
            None => Ok(RaiseRequest::ReRaise),
            Some(Value::Str(message)) => Ok(RaiseRequest::Message(message)),
            Some(Value::Exception(exc)) => Ok(RaiseRequest::Instance(exc)),
            Some(other) => Err(other),
        }
    }
}

/// Raise an exception
///
/// Resolves `request` into a concrete record, then applies the once-per-raise
/// side effects: attaches `scope` if given and unset, captures a backtrace
/// unless one is already carried, and links the cause to the previously
/// in-flight exception (never to the record itself). A bare re-raise of the
/// in-flight exception skips decoration entirely. When the debug variable is
/// truthy a diagnostic line goes to the error sink before control transfers.
pub fn raise(
    state: &RuntimeState,
    ctx: &ThreadContext,
    request: RaiseRequest,
    message: Option<String>,
    scope: Option<Frame>,
) -> Raised {
    let active = ctx.current_exception();

    let (exc, decorate) = match request {
        RaiseRequest::ReRaise => match active.clone() {
            Some(active) => (active, false),
            None => (Arc::new(Exception::new(ExceptionKind::Runtime, "")), true),
        },
        RaiseRequest::Message(text) => {
            (Arc::new(Exception::new(ExceptionKind::Runtime, text)), true)
        }
        RaiseRequest::Instance(instance) => match message {
            Some(text) => (Arc::new(instance.derive(text)), true),
            None => (instance, true),
        },
        RaiseRequest::Kind(kind) => {
            let text = message.unwrap_or_else(|| kind.name().to_string());
            (Arc::new(Exception::new(kind, text)), true)
        }
    };

    if decorate {
        if let Some(scope) = scope {
            exc.attach_scope(scope);
        }
        if !exc.has_backtrace() {
            exc.capture_backtrace(ctx, 0);
        }
        if let Some(active) = active {
            if !Arc::ptr_eq(&exc, &active) {
                exc.link_cause(active);
            }
        }
    }

    if state.debug_enabled() {
        let site = ctx
            .innermost_frame()
            .map(|frame| frame.to_string())
            .unwrap_or_else(|| "<top>".to_string());
        state.write_error(&format!(
            "Exception: `{}' {} - {}\n",
            exc.kind().name(),
            site,
            exc.message()
        ));
    }

    ctx.set_exception(exc.clone());
    Raised(exc)
}

/// Raise from a dynamic value argument
///
/// Classifies `value` first; a value outside the accepted set is itself
/// raised as a type-mismatch failure through the same pipeline.
pub fn raise_value(
    state: &RuntimeState,
    ctx: &ThreadContext,
    value: Option<Value>,
    message: Option<String>,
    scope: Option<Frame>,
) -> Raised {
    match RaiseRequest::classify(value) {
        Ok(request) => raise(state, ctx, request, message, scope),
        Err(_rejected) => raise(
            state,
            ctx,
            RaiseRequest::Kind(ExceptionKind::TypeMismatch),
            Some("exception class/object expected".to_string()),
            None,
        ),
    }
}

/// Run `body`, handling an unwind with `handler`
///
/// The handler runs with the exception in-flight, so a bare re-raise inside
/// it propagates the same instance and a new raise links its cause. The
/// previously in-flight exception is restored once the handler returns
/// normally.
pub fn rescue<T, B, H>(ctx: &ThreadContext, body: B, handler: H) -> EngineResult<T>
where
    B: FnOnce() -> EngineResult<T>,
    H: FnOnce(&Arc<Exception>) -> EngineResult<T>,
{
    let saved = ctx.current_exception();
    match body() {
        Ok(value) => Ok(value),
        Err(Raised(exc)) => {
            ctx.set_exception(exc.clone());
            let outcome = handler(&exc);
            if outcome.is_ok() {
                match saved {
                    Some(prior) => ctx.set_exception(prior),
                    None => ctx.clear_exception(),
                }
            }
            outcome
        }
    }
}

/// Like [`rescue`], but only handles the listed kinds
///
/// Unwinds of other kinds propagate to the next enclosing handler untouched.
pub fn rescue_matching<T, B, H>(
    ctx: &ThreadContext,
    kinds: &[ExceptionKind],
    body: B,
    handler: H,
) -> EngineResult<T>
where
    B: FnOnce() -> EngineResult<T>,
    H: FnOnce(&Arc<Exception>) -> EngineResult<T>,
{
    let saved = ctx.current_exception();
    match body() {
        Ok(value) => Ok(value),
        Err(Raised(exc)) if kinds.contains(&exc.kind()) => {
            ctx.set_exception(exc.clone());
            let outcome = handler(&exc);
            if outcome.is_ok() {
                match saved {
                    Some(prior) => ctx.set_exception(prior),
                    None => ctx.clear_exception(),
                }
            }
            outcome
        }
        Err(raised) => Err(raised),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::io::Write;

    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl SharedSink {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().clone()).unwrap()
        }
    }

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_bare_raise_without_in_flight() {
        let state = RuntimeState::new();
        let ctx = ThreadContext::new();

        let Raised(exc) = raise(&state, &ctx, RaiseRequest::ReRaise, None, None);
        assert_eq!(exc.kind(), ExceptionKind::Runtime);
        assert_eq!(exc.message(), "");
        assert!(exc.has_backtrace());
    }

    #[test]
    fn test_bare_raise_propagates_in_flight_untouched() {
        let state = RuntimeState::new();
        let ctx = ThreadContext::new();
        ctx.push_frame(Frame::new("original", 1, 1));

        let Raised(first) = raise(
            &state,
            &ctx,
            RaiseRequest::Message("boom".to_string()),
            None,
            None,
        );
        let original_trace = first.backtrace().unwrap().clone();

        // Deeper stack at re-raise time must not replace the snapshot
        ctx.push_frame(Frame::new("deeper", 7, 1));
        let Raised(second) = raise(&state, &ctx, RaiseRequest::ReRaise, None, None);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.backtrace().unwrap(), &original_trace);
        assert!(second.cause().is_none());
    }

    #[test]
    fn test_message_wraps_into_runtime_failure() {
        let state = RuntimeState::new();
        let ctx = ThreadContext::new();

        let Raised(exc) = raise(
            &state,
            &ctx,
            RaiseRequest::Message("went wrong".to_string()),
            None,
            None,
        );
        assert_eq!(exc.kind(), ExceptionKind::Runtime);
        assert_eq!(exc.message(), "went wrong");
    }

    #[test]
    fn test_instance_without_message_propagates_as_is() {
        let state = RuntimeState::new();
        let ctx = ThreadContext::new();

        let instance = Arc::new(Exception::new(ExceptionKind::TypeMismatch, "orig"));
        let Raised(exc) = raise(
            &state,
            &ctx,
            RaiseRequest::Instance(instance.clone()),
            None,
            None,
        );
        assert!(Arc::ptr_eq(&exc, &instance));
    }

    #[test]
    fn test_instance_with_message_derives() {
        let state = RuntimeState::new();
        let ctx = ThreadContext::new();

        let instance = Arc::new(Exception::new(ExceptionKind::TypeMismatch, "orig"));
        let Raised(exc) = raise(
            &state,
            &ctx,
            RaiseRequest::Instance(instance.clone()),
            Some("replaced".to_string()),
            None,
        );
        assert!(!Arc::ptr_eq(&exc, &instance));
        assert_eq!(exc.kind(), ExceptionKind::TypeMismatch);
        assert_eq!(exc.message(), "replaced");
        assert_eq!(instance.message(), "orig");
    }

    #[test]
    fn test_kind_without_message_uses_kind_name() {
        let state = RuntimeState::new();
        let ctx = ThreadContext::new();

        let Raised(exc) = raise(
            &state,
            &ctx,
            RaiseRequest::Kind(ExceptionKind::InvalidArgument),
            None,
            None,
        );
        assert_eq!(exc.message(), "InvalidArgument");
    }

    #[test]
    fn test_non_exception_value_rejected_through_pipeline() {
        let state = RuntimeState::new();
        let ctx = ThreadContext::new();

        let Raised(exc) = raise_value(&state, &ctx, Some(Value::Int(5)), None, None);
        assert_eq!(exc.kind(), ExceptionKind::TypeMismatch);
        assert_eq!(exc.message(), "exception class/object expected");
        // The rejection is a real raise: it is now in flight
        assert!(Arc::ptr_eq(&ctx.current_exception().unwrap(), &exc));
    }

    #[test]
    fn test_scope_attached_once() {
        let state = RuntimeState::new();
        let ctx = ThreadContext::new();

        let instance = Arc::new(Exception::new(ExceptionKind::Runtime, "x"));
        instance.attach_scope(Frame::new("already", 1, 1));

        let Raised(exc) = raise(
            &state,
            &ctx,
            RaiseRequest::Instance(instance),
            None,
            Some(Frame::new("late", 9, 9)),
        );
        assert_eq!(exc.scope().unwrap().function, "already");
    }

    #[test]
    fn test_backtrace_not_replaced_on_reraise_of_instance() {
        let state = RuntimeState::new();
        let ctx = ThreadContext::new();
        ctx.push_frame(Frame::new("first", 1, 1));

        let Raised(exc) = raise(
            &state,
            &ctx,
            RaiseRequest::Message("boom".to_string()),
            None,
            None,
        );
        ctx.clear_exception();

        ctx.push_frame(Frame::new("second", 2, 2));
        let Raised(again) = raise(&state, &ctx, RaiseRequest::Instance(exc.clone()), None, None);
        assert!(Arc::ptr_eq(&again, &exc));
        assert_eq!(again.backtrace().unwrap().frames()[0].function, "first");
    }

    #[test]
    fn test_rescue_handles_and_restores_slot() {
        let state = RuntimeState::new();
        let ctx = ThreadContext::new();

        let result = rescue(
            &ctx,
            || {
                Err(raise(
                    &state,
                    &ctx,
                    RaiseRequest::Message("inner".to_string()),
                    None,
                    None,
                ))
            },
            |exc| {
                assert!(ctx.has_exception());
                Ok(exc.message().to_string())
            },
        );

        assert_eq!(result.unwrap(), "inner");
        assert!(!ctx.has_exception());
    }

    #[test]
    fn test_nested_raise_links_cause() {
        let state = RuntimeState::new();
        let ctx = ThreadContext::new();

        let result: EngineResult<()> = rescue(
            &ctx,
            || {
                Err(raise(
                    &state,
                    &ctx,
                    RaiseRequest::Message("first".to_string()),
                    None,
                    None,
                ))
            },
            |first| {
                let second = Arc::new(Exception::new(ExceptionKind::Runtime, "second"));
                let raised = raise(&state, &ctx, RaiseRequest::Instance(second), None, None);
                assert!(Arc::ptr_eq(raised.0.cause().unwrap(), first));
                Err(raised)
            },
        );

        let Raised(second) = result.unwrap_err();
        assert_eq!(second.message(), "second");
        assert_eq!(second.cause().unwrap().message(), "first");
    }

    #[test]
    fn test_cause_never_links_to_self() {
        let state = RuntimeState::new();
        let ctx = ThreadContext::new();

        let Raised(exc) = raise(
            &state,
            &ctx,
            RaiseRequest::Message("only".to_string()),
            None,
            None,
        );
        // Raising the identical in-flight instance again must not self-link
        let Raised(again) = raise(&state, &ctx, RaiseRequest::Instance(exc.clone()), None, None);
        assert!(Arc::ptr_eq(&again, &exc));
        assert!(again.cause().is_none());
    }

    #[test]
    fn test_bare_reraise_inside_handler() {
        let state = RuntimeState::new();
        let ctx = ThreadContext::new();

        let result: EngineResult<()> = rescue(
            &ctx,
            || {
                Err(raise(
                    &state,
                    &ctx,
                    RaiseRequest::Message("original".to_string()),
                    None,
                    None,
                ))
            },
            |_exc| Err(raise(&state, &ctx, RaiseRequest::ReRaise, None, None)),
        );

        let Raised(exc) = result.unwrap_err();
        assert_eq!(exc.message(), "original");
    }

    #[test]
    fn test_rescue_matching_filters_kinds() {
        let state = RuntimeState::new();
        let ctx = ThreadContext::new();

        let handled = rescue_matching(
            &ctx,
            &[ExceptionKind::TypeMismatch],
            || -> EngineResult<i64> {
                Err(raise(
                    &state,
                    &ctx,
                    RaiseRequest::Kind(ExceptionKind::TypeMismatch),
                    Some("bad".to_string()),
                    None,
                ))
            },
            |_exc| Ok(1),
        );
        assert_eq!(handled.unwrap(), 1);

        let unhandled = rescue_matching(
            &ctx,
            &[ExceptionKind::TypeMismatch],
            || -> EngineResult<i64> {
                Err(raise(
                    &state,
                    &ctx,
                    RaiseRequest::Kind(ExceptionKind::ReadOnly),
                    Some("nope".to_string()),
                    None,
                ))
            },
            |_exc| Ok(1),
        );
        let Raised(exc) = unhandled.unwrap_err();
        assert_eq!(exc.kind(), ExceptionKind::ReadOnly);
    }

    #[test]
    fn test_debug_diagnostic_line() {
        let sink = SharedSink::default();
        let state = RuntimeState::with_sink(Box::new(sink.clone()));
        let ctx = ThreadContext::new();

        state
            .globals()
            .register_value(crate::state::DEBUG_VARIABLE, Value::Bool(true));
        ctx.push_frame(Frame::new("worker", 12, 3));

        let _ = raise(
            &state,
            &ctx,
            RaiseRequest::Message("tracked".to_string()),
            None,
            None,
        );
        assert_eq!(
            sink.contents(),
            "Exception: `RuntimeError' worker (line 12:3) - tracked\n"
        );
    }

    #[test]
    fn test_no_diagnostic_when_debug_unset() {
        let sink = SharedSink::default();
        let state = RuntimeState::with_sink(Box::new(sink.clone()));
        let ctx = ThreadContext::new();

        let _ = raise(
            &state,
            &ctx,
            RaiseRequest::Message("silent".to_string()),
            None,
            None,
        );
        assert!(sink.contents().is_empty());
    }
}
