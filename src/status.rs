//! Per-thread last-error channel.
//!
//! Every entry point ([`probe`](crate::probe), [`decode_frame_into`](crate::decode_frame_into),
//! [`DecodeRequest`](crate::DecodeRequest) terminals) clears the message for the
//! calling thread when it starts and records one message when it fails. The
//! message lives until the next entry-point call on the same thread.

use alloc::borrow::Cow;
use alloc::string::{String, ToString};
use core::cell::RefCell;

use crate::error::{DecodeError, Status};

std::thread_local! {
    static LAST_ERROR: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Run one entry-point call with the error channel reset before and
/// populated after.
pub(crate) fn track<T>(call: impl FnOnce() -> Result<T, DecodeError>) -> Result<T, DecodeError> {
    clear_last_error();
    let result = call();
    if let Err(e) = &result {
        LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(e.to_string()));
    }
    result
}

fn clear_last_error() {
    LAST_ERROR.with(|slot| slot.borrow_mut().take());
}

/// Message recorded by the most recent failing call on this thread, if any.
pub fn last_error_message() -> Option<String> {
    LAST_ERROR.with(|slot| slot.borrow().clone())
}

/// Diagnostic text for a status code.
///
/// `0` always yields `"ok"`. Any other code yields the message recorded by the
/// most recent call on this thread when there is one, otherwise a fixed
/// description of the code's class.
pub fn error_message(code: i32) -> Cow<'static, str> {
    let Some(status) = Status::from_code(code) else {
        return last_error_message().map_or(Cow::Borrowed("unknown error"), Cow::Owned);
    };
    if status == Status::Ok {
        return Cow::Borrowed(status.default_message());
    }
    match last_error_message() {
        Some(msg) => Cow::Owned(msg),
        None => Cow::Borrowed(status.default_message()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::ImageFormat;

    #[test]
    fn ok_ignores_recorded_message() {
        let _ = track::<()>(|| Err(DecodeError::InvalidArgument("empty input")));
        assert_eq!(error_message(0), "ok");
    }

    #[test]
    fn failure_records_message() {
        let _ = track::<()>(|| Err(DecodeError::UnsupportedFormat(ImageFormat::Gif)));
        assert_eq!(
            error_message(Status::UnsupportedFormat.code()),
            "unsupported format: no decoder for GIF"
        );
    }

    #[test]
    fn success_clears_previous_message() {
        let _ = track::<()>(|| Err(DecodeError::OutOfMemory));
        assert!(last_error_message().is_some());
        let _ = track(|| Ok(()));
        assert!(last_error_message().is_none());
        assert_eq!(error_message(Status::CodecError.code()), "codec error");
    }

    #[test]
    fn unknown_code_without_message() {
        let _ = track(|| Ok(()));
        assert_eq!(error_message(42), "unknown error");
    }

    #[test]
    fn messages_are_per_thread() {
        let _ = track::<()>(|| Err(DecodeError::NotImplemented("multi-frame decoding")));

        std::thread::spawn(|| {
            assert!(last_error_message().is_none());
            let _ = track::<()>(|| Err(DecodeError::OutOfMemory));
            assert_eq!(error_message(Status::CodecError.code()), "out of memory");
        })
        .join()
        .unwrap();

        assert_eq!(
            error_message(Status::NotImplemented.code()),
            "not implemented: multi-frame decoding"
        );
    }
}
