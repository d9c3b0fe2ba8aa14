//! Error message slot shared with the host.
//!
//! On a FailureWithMessage result the host reads output slot 0 as the address
//! of a NUL-terminated string instead of as a number. The string lives in this
//! channel and stays valid until the next call on the same session; the host
//! never owns it.

use std::ffi::{CStr, c_char};

/// Buffer capacity in bytes, terminator included.
pub const ERROR_BUFFER_LEN: usize = 200;

/// One reusable message buffer, overwritten on every failure.
#[derive(Debug)]
pub struct ErrorChannel {
    // Heap storage keeps the address stable if the owning session moves.
    buf: Box<[u8; ERROR_BUFFER_LEN]>,
}

impl Default for ErrorChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorChannel {
    pub fn new() -> Self {
        Self {
            buf: Box::new([0; ERROR_BUFFER_LEN]),
        }
    }

    /// Overwrite the buffer with `message`, truncated on a character boundary
    /// so that the terminator always fits. Returns the stored text.
    pub fn publish(&mut self, message: &str) -> &str {
        let mut len = message.len().min(ERROR_BUFFER_LEN - 1);
        while !message.is_char_boundary(len) {
            len -= 1;
        }
        // Interior NULs would cut the host's view short; store them as spaces.
        for (dst, src) in self.buf.iter_mut().zip(message.as_bytes()[..len].iter()) {
            *dst = if *src == 0 { b' ' } else { *src };
        }
        self.buf[len..].fill(0);
        self.message()
    }

    /// Current contents up to the terminator.
    pub fn message(&self) -> &str {
        let end = self
            .buf
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(ERROR_BUFFER_LEN - 1);
        // `publish` only ever stores a prefix of valid UTF-8 ending on a boundary.
        std::str::from_utf8(&self.buf[..end]).unwrap_or_default()
    }

    pub fn as_ptr(&self) -> *const c_char {
        self.buf.as_ptr().cast()
    }

    /// The buffer address packed into a scalar output slot.
    ///
    /// The host reinterprets the slot's bytes as a pointer, so this is a bit
    /// copy, not a numeric conversion.
    pub fn address_slot(&self) -> f64 {
        f64::from_bits(self.as_ptr() as usize as u64)
    }
}

/// Host-side view of a message slot written by [`ErrorChannel::address_slot`].
///
/// # Safety
///
/// `slot` must come from `address_slot` of a channel that is still alive and
/// has not been written to since.
pub unsafe fn read_address_slot(slot: f64) -> String {
    let ptr = slot.to_bits() as usize as *const c_char;
    // SAFETY: guaranteed by the caller; the channel is always NUL-terminated.
    unsafe { CStr::from_ptr(ptr) }
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_and_read_back() {
        let mut channel = ErrorChannel::new();
        assert_eq!(channel.publish("Storage node ST2 not found"), "Storage node ST2 not found");
        assert_eq!(channel.message(), "Storage node ST2 not found");
    }

    #[test]
    fn long_message_is_truncated_and_terminated() {
        let mut channel = ErrorChannel::new();
        let long = "x".repeat(500);
        let stored = channel.publish(&long).len();
        assert_eq!(stored, ERROR_BUFFER_LEN - 1);
        assert_eq!(channel.buf[ERROR_BUFFER_LEN - 1], 0);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let mut channel = ErrorChannel::new();
        let text = "é".repeat(150);
        let stored = channel.publish(&text).to_string();
        assert!(stored.len() <= ERROR_BUFFER_LEN - 1);
        assert!(stored.chars().all(|c| c == 'é'));
    }

    #[test]
    fn shorter_message_overwrites_longer_one() {
        let mut channel = ErrorChannel::new();
        channel.publish("a fairly long first message");
        channel.publish("short");
        assert_eq!(channel.message(), "short");
    }

    #[test]
    fn address_slot_points_at_buffer() {
        let mut channel = ErrorChannel::new();
        channel.publish("engine exploded");
        let slot = channel.address_slot();
        assert_eq!(slot.to_bits() as usize, channel.as_ptr() as usize);
        let text = unsafe { read_address_slot(slot) };
        assert_eq!(text, "engine exploded");
    }

    #[test]
    fn address_is_stable_across_moves() {
        let mut channel = ErrorChannel::new();
        let before = channel.as_ptr();
        channel.publish("first");
        let moved = channel;
        assert_eq!(moved.as_ptr(), before);
    }
}
