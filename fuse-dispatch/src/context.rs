//! The context of a dispatched call

use crate::session::SessionHandle;

use std::cell::RefCell;

thread_local! {
    static CURRENT: RefCell<Option<CallContext>> = RefCell::new(None);
}

/// The caller of the operation being handled
#[derive(Debug, Clone)]
pub struct CallContext {
    uid: u32,
    gid: u32,
    pid: i32,
    session: SessionHandle,
}

impl CallContext {
    pub(crate) fn new(uid: u32, gid: u32, pid: i32, session: SessionHandle) -> Self {
        Self {
            uid,
            gid,
            pid,
            session,
        }
    }

    /// Returns the context of the operation running on this thread
    ///
    /// Returns `None` outside of a file system operation.
    #[must_use]
    #[inline]
    pub fn current() -> Option<Self> {
        CURRENT.with(|cx| cx.borrow().clone())
    }

    /// user id of the calling process
    #[must_use]
    #[inline]
    pub const fn uid(&self) -> u32 {
        self.uid
    }

    /// group id of the calling process
    #[must_use]
    #[inline]
    pub const fn gid(&self) -> u32 {
        self.gid
    }

    /// process id of the calling process
    #[must_use]
    #[inline]
    pub const fn pid(&self) -> i32 {
        self.pid
    }

    /// The running session, which can be asked to stop
    #[must_use]
    #[inline]
    pub const fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub(crate) fn enter(self) -> ContextGuard {
        let prev = CURRENT.with(|cx| cx.replace(Some(self)));
        ContextGuard { prev }
    }
}

/// Restores the previous context when dropped
pub(crate) struct ContextGuard {
    prev: Option<CallContext>,
}

impl Drop for ContextGuard {
    #[inline]
    fn drop(&mut self) {
        let prev = self.prev.take();
        let _ = CURRENT.try_with(|cx| *cx.borrow_mut() = prev);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoped() {
        assert!(CallContext::current().is_none());
        {
            let _guard = CallContext::new(1, 2, 3, SessionHandle::detached()).enter();
            let cx = CallContext::current().unwrap();
            assert_eq!((cx.uid(), cx.gid(), cx.pid()), (1, 2, 3));
            {
                let _inner = CallContext::new(4, 5, 6, SessionHandle::detached()).enter();
                assert_eq!(CallContext::current().unwrap().uid(), 4);
            }
            assert_eq!(CallContext::current().unwrap().uid(), 1);
        }
        assert!(CallContext::current().is_none());
    }
}
