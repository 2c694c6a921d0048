//! Optional backends resolved once per run.

use std::sync::Arc;

/// A backend that may or may not be usable in this process
#[derive(Debug)]
pub enum Capability<B: ?Sized> {
    Available(Arc<B>),
    Unavailable { reason: String },
}

impl<B: ?Sized> Capability<B> {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Capability::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Capability::Available(_))
    }

    /// The backend, when present
    pub fn backend(&self) -> Option<&B> {
        match self {
            Capability::Available(backend) => Some(backend.as_ref()),
            Capability::Unavailable { .. } => None,
        }
    }

    /// Why the backend cannot be used
    pub fn reason(&self) -> Option<&str> {
        match self {
            Capability::Available(_) => None,
            Capability::Unavailable { reason } => Some(reason),
        }
    }
}

impl<B: ?Sized> Clone for Capability<B> {
    fn clone(&self) -> Self {
        match self {
            Capability::Available(backend) => Capability::Available(Arc::clone(backend)),
            Capability::Unavailable { reason } => Capability::Unavailable {
                reason: reason.clone(),
            },
        }
    }
}
