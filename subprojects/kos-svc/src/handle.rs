//! Handle newtypes.
//!
//! Grounded on the teacher's `nx-svc::handle` macro: every kernel object is
//! a distinct Rust type wrapping the same raw `u64`, so a port handle can
//! never be passed where a task handle is expected.

use crate::raw::Handle;

/// A trait for handle types that can be the target of `thread_wait`-style
/// blocking waits (§6.1).
pub trait Waitable: _priv::Sealed {
    /// Returns the raw handle of the waitable object.
    fn raw_handle(&self) -> Handle;
}

macro_rules! define_handle_type {
    {
        $(#[$meta:meta])* $vis:vis struct $name:ident
    } => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        $vis struct $name($crate::raw::Handle);

        impl $name {
            /// Wraps a raw handle returned by a syscall.
            ///
            /// # Safety
            ///
            /// Caller must guarantee the raw handle was produced by the
            /// kernel for this object kind.
            pub unsafe fn from_raw(raw: $crate::raw::Handle) -> Self {
                Self(raw)
            }

            /// Returns `true` if this is not the reserved invalid handle.
            pub fn is_valid(&self) -> bool {
                self.0 != $crate::raw::INVALID_HANDLE
            }

            /// Returns the raw handle for passing back into a syscall.
            pub fn to_raw(&self) -> $crate::raw::Handle {
                self.0
            }
        }

        impl ::core::cmp::PartialEq<$crate::raw::Handle> for $name {
            fn eq(&self, other: &$crate::raw::Handle) -> bool {
                &self.0 == other
            }
        }
    };
}

macro_rules! define_waitable_handle_type {
    {
        $(#[$meta:meta])* $vis:vis struct $name:ident
    } => {
        define_handle_type! {
            $(#[$meta])* $vis struct $name
        }

        impl $crate::handle::Waitable for $name {
            #[inline]
            fn raw_handle(&self) -> $crate::raw::Handle {
                self.0
            }
        }

        impl $crate::handle::_priv::Sealed for $name {}
    };
}

define_handle_type! {
    /// Handle to a task created via `task_create` (§6.1).
    pub struct TaskHandle
}

define_waitable_handle_type! {
    /// Handle to a thread created via `thread_create` (§6.1).
    pub struct ThreadHandle
}

define_waitable_handle_type! {
    /// Handle to a port created via `port_create` (§6.1).
    pub struct PortHandle
}

define_handle_type! {
    /// Handle to an anonymous virtual memory region (§6.1).
    pub struct RegionHandle
}

pub(crate) mod _priv {
    pub trait Sealed {}
}
