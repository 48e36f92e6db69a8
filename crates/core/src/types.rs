//! Identifier types for traced entities
//!
//! This module defines the keys the detector tracks state under:
//! - ThreadId: a logical thread of the traced program
//! - ThreadHandle: the token a Fork binds and a Join resolves
//! - Location: a tracked memory location (variable)
//! - Lock: a tracked lock

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identifier of a logical thread in the traced program
///
/// Thread ids are never retired: a joined thread's clock must stay
/// comparable against every later access.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ThreadId(u32);

impl ThreadId {
    /// Create a ThreadId from its raw index
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw index of this thread
    pub const fn get(self) -> u32 {
        self.0
    }

}

impl From<u32> for ThreadId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// Token naming a spawned thread object
///
/// A capture layer usually hands out the address of the thread object.
/// Fork binds the handle to a freshly allocated [`ThreadId`]; Join resolves it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ThreadHandle(u64);

impl ThreadHandle {
    /// Create a handle from its raw value
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw value of this handle
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for ThreadHandle {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ThreadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! named_entity {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub struct $name(Arc<str>);

        impl $name {
            /// Create from a symbolic name
            pub fn new(name: impl AsRef<str>) -> Self {
                Self(Arc::from(name.as_ref()))
            }

            /// Name an entity by the memory address it lives at
            pub fn from_addr(addr: u64) -> Self {
                Self::new(format!("{:#x}", addr))
            }

            /// The entity's name
            pub fn name(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(name: &str) -> Self {
                Self::new(name)
            }
        }

        impl From<String> for $name {
            fn from(name: String) -> Self {
                Self(Arc::from(name))
            }
        }

        impl From<$name> for String {
            fn from(entity: $name) -> Self {
                entity.0.to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

named_entity! {
    /// A tracked memory location (a shared variable)
    ///
    /// Cloning is cheap: the name is reference counted.
    Location
}

named_entity! {
    /// A tracked lock
    ///
    /// Cloning is cheap: the name is reference counted.
    Lock
}
