//! Dense identifiers handed out by one environment.
//!
//! Processes and resources are numbered in registration order and index the
//! environment's registries directly.  Events and requests are numbered in
//! creation order, which also makes them usable as a stable tiebreak.

use std::fmt;

macro_rules! dense_id {
    ($(#[$attr:meta])* $name:ident($inner:ty), $tag:literal) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(pub $inner);

        impl $name {
            /// Position in the owning registry.
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            /// The id allocated right after `self`.
            #[inline]
            pub fn next(self) -> $name {
                $name(self.0 + 1)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($tag, "#{}"), self.0)
            }
        }

        /// Fails once a registry outgrows the id width.
        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

dense_id! {
    /// A registered process.
    ProcessId(u32), "process"
}

dense_id! {
    /// A resource in the environment's pool.
    ResourceId(u32), "resource"
}

dense_id! {
    /// Something a process can wait on.
    ///
    /// A queued resource request gets its id when the request is made, long
    /// before its grant is scheduled.
    EventId(u64), "event"
}

dense_id! {
    /// One acquisition attempt on a resource.
    RequestId(u64), "request"
}
