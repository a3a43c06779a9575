//! RAII guard that points stdout at stderr while the external library runs.
//!
//! Stdout carries exactly one report line. While a guard is alive, anything
//! written to fd 1 (by this process or by children inheriting it) lands on
//! stderr instead. Guards are counted process-wide: the first one redirects,
//! the last one to drop restores the saved descriptor.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

struct Redirect {
    saved: sys::SavedFd,
    holders: usize,
}

static STATE: Mutex<Option<Redirect>> = Mutex::new(None);

/// Keeps stdout redirected to stderr until dropped.
#[must_use = "stdout is restored as soon as the guard is dropped"]
pub struct StdoutGuard {
    _private: (),
}

impl StdoutGuard {
    pub fn acquire() -> io::Result<Self> {
        let mut state = STATE.lock().unwrap_or_else(PoisonError::into_inner);
        match state.as_mut() {
            Some(redirect) => redirect.holders += 1,
            None => {
                io::stdout().flush()?;
                let saved = sys::redirect_stdout_to_stderr()?;
                *state = Some(Redirect { saved, holders: 1 });
            }
        }
        Ok(Self { _private: () })
    }

    /// True while at least one guard is alive.
    pub fn is_active() -> bool {
        STATE
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl Drop for StdoutGuard {
    fn drop(&mut self) {
        let mut state = STATE.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(redirect) = state.as_mut() else { return };
        redirect.holders -= 1;
        if redirect.holders == 0 {
            let _ = io::stdout().flush();
            if let Some(redirect) = state.take() {
                sys::restore_stdout(redirect.saved);
            }
        }
    }
}

#[cfg(unix)]
mod sys {
    use std::io;

    pub(super) type SavedFd = libc::c_int;

    pub(super) fn redirect_stdout_to_stderr() -> io::Result<SavedFd> {
        let saved = unsafe { libc::dup(libc::STDOUT_FILENO) };
        if saved < 0 {
            return Err(io::Error::last_os_error());
        }
        if unsafe { libc::dup2(libc::STDERR_FILENO, libc::STDOUT_FILENO) } < 0 {
            let err = io::Error::last_os_error();
            unsafe { libc::close(saved) };
            return Err(err);
        }
        Ok(saved)
    }

    pub(super) fn restore_stdout(saved: SavedFd) {
        unsafe {
            libc::dup2(saved, libc::STDOUT_FILENO);
            libc::close(saved);
        }
    }
}

#[cfg(not(unix))]
mod sys {
    use std::io;

    pub(super) type SavedFd = ();

    pub(super) fn redirect_stdout_to_stderr() -> io::Result<SavedFd> {
        Ok(())
    }

    pub(super) fn restore_stdout(_saved: SavedFd) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    fn fd_identity(fd: libc::c_int) -> (u64, u64) {
        let mut st: libc::stat = unsafe { std::mem::zeroed() };
        let r = unsafe { libc::fstat(fd, &mut st) };
        assert_eq!(r, 0);
        (st.st_dev as u64, st.st_ino as u64)
    }

    #[cfg(unix)]
    fn stdout_identity() -> (u64, u64) {
        fd_identity(libc::STDOUT_FILENO)
    }

    #[test]
    fn nested_guards_restore_once() {
        #[cfg(unix)]
        let before = stdout_identity();

        let outer = StdoutGuard::acquire().unwrap();
        assert!(StdoutGuard::is_active());
        #[cfg(unix)]
        assert_eq!(stdout_identity(), fd_identity(libc::STDERR_FILENO));
        {
            let _inner = StdoutGuard::acquire().unwrap();
            assert!(StdoutGuard::is_active());
        }
        assert!(StdoutGuard::is_active());
        #[cfg(unix)]
        assert_eq!(stdout_identity(), fd_identity(libc::STDERR_FILENO));
        drop(outer);
        assert!(!StdoutGuard::is_active());

        #[cfg(unix)]
        assert_eq!(stdout_identity(), before);
    }
}
