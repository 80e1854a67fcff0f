//! User-facing notifications.
//!
//! Every failed cart operation hands exactly one [`Notice`] to the configured
//! [`Notifier`]. Notices are fire-and-forget: the store never looks at what
//! the sink does with them. All notices are error-severity.

use std::sync::{Mutex, PoisonError};

use rocketshoes_core::ProductId;

/// What went wrong, from the shopper's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    /// The product could not be added.
    AddFailed,
    /// The product could not be removed.
    RemoveFailed,
    /// The quantity could not be changed.
    UpdateFailed,
    /// The requested quantity is not available.
    OutOfStock,
}

/// A single user-facing error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub product_id: ProductId,
}

impl Notice {
    #[must_use]
    pub const fn new(kind: NoticeKind, product_id: ProductId) -> Self {
        Self { kind, product_id }
    }

    /// Text shown to the shopper.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self.kind {
            NoticeKind::AddFailed => "Failed to add product",
            NoticeKind::RemoveFailed => "Failed to remove product",
            NoticeKind::UpdateFailed => "Failed to update product quantity",
            NoticeKind::OutOfStock => "Requested quantity is out of stock",
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Sink for user-facing notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Emits notices as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        tracing::error!(
            target: "rocketshoes_cart::notice",
            kind = ?notice.kind,
            product_id = %notice.product_id,
            "{}",
            notice.message()
        );
    }
}

/// Collects notices so a UI layer can drain and display them.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl MemoryNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every pending notice, oldest first.
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Take every pending notice, oldest first.
    pub fn drain(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_messages() {
        let id = ProductId::new(1);
        assert_eq!(
            Notice::new(NoticeKind::AddFailed, id).to_string(),
            "Failed to add product"
        );
        assert_eq!(
            Notice::new(NoticeKind::RemoveFailed, id).message(),
            "Failed to remove product"
        );
        assert_eq!(
            Notice::new(NoticeKind::UpdateFailed, id).message(),
            "Failed to update product quantity"
        );
        assert_eq!(
            Notice::new(NoticeKind::OutOfStock, id).message(),
            "Requested quantity is out of stock"
        );
    }

    #[test]
    fn test_memory_notifier_drain() {
        let notifier = MemoryNotifier::new();
        notifier.notify(Notice::new(NoticeKind::AddFailed, ProductId::new(1)));
        notifier.notify(Notice::new(NoticeKind::OutOfStock, ProductId::new(2)));

        assert_eq!(notifier.notices().len(), 2);

        let drained = notifier.drain();
        assert_eq!(drained[0].kind, NoticeKind::AddFailed);
        assert_eq!(drained[1].product_id, ProductId::new(2));
        assert!(notifier.notices().is_empty());
    }
}
