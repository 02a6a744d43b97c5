//! Warning emission.
//!
//! Warnings flow to the shared error sink. [`emit`] is the validated
//! emission boundary; [`warn`] is the user-facing operation with
//! suppression and call-site prefixing on top.

use crate::bootstrap::VERBOSE;
use orin_engine::raise::{raise, RaiseRequest};
use orin_engine::{EngineResult, ExceptionKind, RuntimeState, ThreadContext, Value};

/// Emit one warning message to the error sink
///
/// The message must be a string; anything else is a type-mismatch failure.
/// A trailing newline is ensured. Emission is unconditional; suppression
/// policy lives in [`warn`].
pub fn emit(state: &RuntimeState, ctx: &ThreadContext, message: &Value) -> EngineResult<()> {
    match message.as_str() {
        Some(text) => {
            if text.ends_with('\n') {
                state.write_error(text);
            } else {
                state.write_error(&format!("{}\n", text));
            }
            Ok(())
        }
        None => Err(raise(
            state,
            ctx,
            RaiseRequest::Kind(ExceptionKind::TypeMismatch),
            Some(format!(
                "wrong argument type {} (expected String)",
                message.type_name()
            )),
            None,
        )),
    }
}

/// Warn with the given messages, one per line
///
/// Does nothing while the verbosity variable reads nil, or when no messages
/// are given. With `uplevel`, the selected caller frame prefixes the first
/// line; a negative level is an invalid-argument failure.
pub fn warn(
    state: &RuntimeState,
    ctx: &ThreadContext,
    messages: &[Value],
    uplevel: Option<i64>,
) -> EngineResult<()> {
    if state.globals().read(VERBOSE).is_nil() || messages.is_empty() {
        return Ok(());
    }

    let prefix = match uplevel {
        None => String::new(),
        Some(level) if level < 0 => {
            return Err(raise(
                state,
                ctx,
                RaiseRequest::Kind(ExceptionKind::InvalidArgument),
                Some(format!("negative level ({})", level)),
                None,
            ));
        }
        Some(level) => match ctx.caller_frames(state, level as usize, Some(1))?.first() {
            Some(frame) => format!("{}:{}: warning: ", frame.function, frame.line),
            None => "warning: ".to_string(),
        },
    };

    let mut text = prefix;
    for (i, message) in messages.iter().enumerate() {
        if i > 0 {
            text.push('\n');
        }
        text.push_str(&message.to_string());
    }
    emit(state, ctx, &Value::Str(text))
}
