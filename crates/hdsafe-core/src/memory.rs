//! Process and page hardening for key buffers
//!
//! - **Core dumps**: `RLIMIT_CORE` is dropped to zero so a crash never
//!   writes key material to disk.
//! - **Page locking**: pages holding key buffers are `mlock`ed so scalars
//!   are not swapped out.
//!
//! `mlock` works on whole pages and does not nest: one `munlock` releases a
//! page no matter how many buffers share it. Locks are therefore counted per
//! page, and a page is only unlocked when the last key buffer on it goes.
//!
//! Everything here is best-effort. Containers and unprivileged users often
//! refuse both calls; failures are logged and the caller carries on.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

static CORE_DUMPS_DISABLED: AtomicBool = AtomicBool::new(false);

/// Page start address -> number of live key buffers on that page.
static LOCKED_PAGES: Mutex<BTreeMap<usize, usize>> = Mutex::new(BTreeMap::new());

/// Disable core dumps for the current process.
///
/// Returns `true` if core dumps are disabled after the call. A failed
/// attempt is not remembered, so a later call tries again.
///
/// # Example
/// ```
/// hdsafe_core::memory::disable_core_dumps();
/// ```
pub fn disable_core_dumps() -> bool {
    if CORE_DUMPS_DISABLED.load(Ordering::SeqCst) {
        return true;
    }
    let disabled = sys::zero_core_limit();
    if disabled {
        CORE_DUMPS_DISABLED.store(true, Ordering::SeqCst);
        log::debug!("Core dumps disabled");
    }
    disabled
}

fn locked_pages() -> MutexGuard<'static, BTreeMap<usize, usize>> {
    LOCKED_PAGES.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Start addresses of every page `buf` touches (a 32-byte buffer can
/// straddle a page boundary).
fn pages_of(buf: &[u8; 32]) -> impl Iterator<Item = usize> {
    let size = sys::page_size();
    let first = buf.as_ptr() as usize & !(size - 1);
    let last = (buf.as_ptr() as usize + buf.len() - 1) & !(size - 1);
    (first..=last).step_by(size)
}

/// Lock the pages backing a key buffer.
///
/// The buffer must stay at the same address until [`unlock_key_buffer`] is
/// called with it; callers keep it behind a `Box`.
pub(crate) fn lock_key_buffer(buf: &[u8; 32]) -> bool {
    let mut pages = locked_pages();

    let mut fresh = Vec::new();
    for page in pages_of(buf) {
        if pages.contains_key(&page) {
            continue;
        }
        if !sys::lock_page(page) {
            for done in fresh {
                sys::unlock_page(done);
            }
            return false;
        }
        fresh.push(page);
    }

    for page in pages_of(buf) {
        *pages.entry(page).or_insert(0) += 1;
    }
    true
}

/// Release a buffer locked by [`lock_key_buffer`]. Pages still holding
/// another locked key buffer stay locked.
pub(crate) fn unlock_key_buffer(buf: &[u8; 32]) {
    let mut pages = locked_pages();
    for page in pages_of(buf) {
        let Some(count) = pages.get_mut(&page) else {
            continue;
        };
        *count -= 1;
        if *count == 0 {
            pages.remove(&page);
            sys::unlock_page(page);
        }
    }
}

/// Whether every page under `buf` is currently held locked.
pub(crate) fn is_buffer_locked(buf: &[u8; 32]) -> bool {
    let pages = locked_pages();
    pages_of(buf).all(|page| pages.contains_key(&page))
}

#[cfg(unix)]
mod sys {
    use std::io;

    pub fn page_size() -> usize {
        // SAFETY: sysconf has no memory-safety preconditions
        let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        if size > 0 {
            size as usize
        } else {
            4096
        }
    }

    pub fn zero_core_limit() -> bool {
        let limit = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        // SAFETY: `limit` is a valid rlimit for the duration of the call
        if unsafe { libc::setrlimit(libc::RLIMIT_CORE, &limit) } == 0 {
            return true;
        }
        log::warn!(
            "setrlimit(RLIMIT_CORE, 0) refused: {}",
            io::Error::last_os_error()
        );
        false
    }

    pub fn lock_page(page: usize) -> bool {
        // SAFETY: `page` is the page-aligned start of a mapped page that
        // holds a live key buffer
        if unsafe { libc::mlock(page as *const libc::c_void, page_size()) } == 0 {
            return true;
        }
        log::warn!(
            "mlock refused for key page {:#x}: {}",
            page,
            io::Error::last_os_error()
        );
        false
    }

    pub fn unlock_page(page: usize) {
        // SAFETY: same page that was passed to `lock_page`
        if unsafe { libc::munlock(page as *const libc::c_void, page_size()) } != 0 {
            log::debug!("munlock failed for key page {:#x}", page);
        }
    }
}

#[cfg(not(unix))]
mod sys {
    pub fn page_size() -> usize {
        4096
    }

    pub fn zero_core_limit() -> bool {
        log::warn!("Core dump prevention not supported on this platform");
        false
    }

    pub fn lock_page(_page: usize) -> bool {
        false
    }

    pub fn unlock_page(_page: usize) {}
}
