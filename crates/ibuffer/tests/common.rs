#![allow(missing_docs, dead_code)]

/// A short mail-like message mixing CRLF, LF and a lone CR.
pub const MESSAGE: &[u8] = b"From: alice@example.org\r\n\
To: bob@example.org\r\n\
Subject: status\n\
\r\n\
first line\rsecond line\n\
no newline at end";

/// Captures the crate's log output in test runs.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
