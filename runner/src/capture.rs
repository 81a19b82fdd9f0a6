//! Capturing what a step writes to standard output.
//!
//! Standard output is process-wide, so captures are serialized through a
//! global lock and never nest. While a capture is active, file descriptor 1
//! points at a pipe drained by a relay thread. The descriptor is restored on
//! `finish` or, failing that, on drop.

use std::io;
use std::sync::{Mutex, MutexGuard, PoisonError};

static STDOUT_LOCK: Mutex<()> = Mutex::new(());

/// An active redirect of standard output.
pub struct OutputCapture {
    inner: imp::Capture,
    _lock: MutexGuard<'static, ()>,
}

impl OutputCapture {
    /// Start capturing. Blocks while another capture is active.
    pub fn begin() -> io::Result<Self> {
        let lock = STDOUT_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let inner = imp::Capture::begin()?;
        Ok(OutputCapture { inner, _lock: lock })
    }

    /// Restore standard output and return everything written meanwhile.
    pub fn finish(self) -> io::Result<String> {
        let OutputCapture { inner, _lock } = self;
        let bytes = inner.finish()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(unix)]
mod imp {
    use std::fs::File;
    use std::io::{self, Read, Write};
    use std::os::fd::{FromRawFd, RawFd};
    use std::thread::{self, JoinHandle};

    pub(super) struct Capture {
        saved: RawFd,
        restored: bool,
        relay: Option<JoinHandle<io::Result<Vec<u8>>>>,
    }

    fn check(ret: libc::c_int) -> io::Result<libc::c_int> {
        if ret < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(ret)
        }
    }

    impl Capture {
        pub(super) fn begin() -> io::Result<Self> {
            io::stdout().flush()?;

            let mut fds: [libc::c_int; 2] = [0; 2];
            check(unsafe { libc::pipe(fds.as_mut_ptr()) })?;
            let [read_fd, write_fd] = fds;

            let saved = match check(unsafe { libc::dup(libc::STDOUT_FILENO) }) {
                Ok(fd) => fd,
                Err(err) => {
                    unsafe {
                        libc::close(read_fd);
                        libc::close(write_fd);
                    }
                    return Err(err);
                }
            };
            if let Err(err) = check(unsafe { libc::dup2(write_fd, libc::STDOUT_FILENO) }) {
                unsafe {
                    libc::close(read_fd);
                    libc::close(write_fd);
                    libc::close(saved);
                }
                return Err(err);
            }
            // fd 1 now holds the only write end.
            unsafe { libc::close(write_fd) };

            let mut reader = unsafe { File::from_raw_fd(read_fd) };
            let relay = thread::spawn(move || {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf)?;
                Ok(buf)
            });

            Ok(Capture {
                saved,
                restored: false,
                relay: Some(relay),
            })
        }

        pub(super) fn finish(mut self) -> io::Result<Vec<u8>> {
            let flushed = io::stdout().flush();
            self.restore()?;
            flushed?;
            match self.relay.take() {
                Some(relay) => relay
                    .join()
                    .map_err(|_| io::Error::other("output relay thread panicked"))?,
                None => Ok(Vec::new()),
            }
        }

        /// Point fd 1 back at the saved stream. This closes the last
        /// write end of the pipe, which ends the relay.
        fn restore(&mut self) -> io::Result<()> {
            if self.restored {
                return Ok(());
            }
            self.restored = true;
            let result = check(unsafe { libc::dup2(self.saved, libc::STDOUT_FILENO) });
            unsafe { libc::close(self.saved) };
            result.map(|_| ())
        }
    }

    impl Drop for Capture {
        fn drop(&mut self) {
            let _ = io::stdout().flush();
            if let Err(err) = self.restore() {
                tracing::error!(%err, "failed to restore standard output");
            }
        }
    }
}

#[cfg(not(unix))]
mod imp {
    use std::io;

    /// Output is not captured on this platform.
    pub(super) struct Capture;

    impl Capture {
        pub(super) fn begin() -> io::Result<Self> {
            Ok(Capture)
        }

        pub(super) fn finish(self) -> io::Result<Vec<u8>> {
            Ok(Vec::new())
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::io::Write;

    use super::*;

    // `println!` is intercepted by the test harness before it reaches fd 1,
    // so these write to the handle directly.

    #[test]
    fn captures_direct_writes() {
        let capture = OutputCapture::begin().unwrap();
        std::io::stdout().write_all(b"hello from a step\n").unwrap();
        let output = capture.finish().unwrap();
        assert!(output.contains("hello from a step"));
    }

    #[test]
    fn captures_more_than_a_pipe_buffer() {
        let capture = OutputCapture::begin().unwrap();
        let line = "x".repeat(1023) + "\n";
        for _ in 0..256 {
            std::io::stdout().write_all(line.as_bytes()).unwrap();
        }
        let output = capture.finish().unwrap();
        assert!(output.len() >= 256 * 1024);
    }

    #[test]
    fn dropping_restores_the_stream() {
        {
            let _capture = OutputCapture::begin().unwrap();
            std::io::stdout().write_all(b"discarded\n").unwrap();
        }
        let capture = OutputCapture::begin().unwrap();
        std::io::stdout().write_all(b"second\n").unwrap();
        let output = capture.finish().unwrap();
        assert!(output.contains("second"));
        assert!(!output.contains("discarded"));
    }
}
