//! Shared identifiers for modal host instances.
#![warn(missing_docs)]
#![warn(unsafe_op_in_unsafe_fn)]

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Identity of a modal node as assigned by the declarative-tree reconciler.
///
/// The reconciler hands out one identity per mounted modal node. An identity
/// is unique among live instances and may be reused once the previous holder
/// has been fully destroyed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModalId {
    /// Reconciler tag for the modal node.
    tag: u64,
}

impl ModalId {
    /// Construct an identifier from a reconciler tag.
    #[must_use]
    pub const fn new(tag: u64) -> Self {
        Self { tag }
    }

    /// Reconciler tag for this modal.
    #[must_use]
    pub const fn tag(self) -> u64 {
        self.tag
    }
}

impl Display for ModalId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "#{}", self.tag)
    }
}

impl From<u64> for ModalId {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl From<ModalId> for u64 {
    fn from(value: ModalId) -> Self {
        value.tag()
    }
}

#[cfg(test)]
mod tests {
    use super::ModalId;

    #[test]
    fn display_uses_tag() {
        assert_eq!(ModalId::new(42).to_string(), "#42");
    }

    #[test]
    fn converts_to_and_from_tag() {
        let id: ModalId = 7.into();
        assert_eq!(u64::from(id), 7);
        assert!(ModalId::new(1) < ModalId::new(2));
    }
}
