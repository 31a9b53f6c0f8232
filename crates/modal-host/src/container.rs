//! Native surface ownership for one modal.

use std::{fmt, rc::Rc};

use crate::{ModalProps, NativePlatform};

/// One modal's native presentation surface and the content mounted into it.
///
/// The container is a passive target for interaction hooks. It owns its
/// surface exclusively: [`ModalHostContainer::teardown`] (or dropping the
/// container) unmounts the content and releases the surface exactly once.
pub struct ModalHostContainer<P: NativePlatform> {
    /// Platform adapter that allocated the surface.
    platform: Rc<P>,
    /// Mounted surface; `None` after teardown.
    surface: Option<P::Surface>,
    /// Props last applied to the surface.
    props: ModalProps,
}

impl<P: NativePlatform> ModalHostContainer<P> {
    /// Allocate a surface and mount `content` as its body.
    pub fn create(platform: Rc<P>, content: P::Content, props: ModalProps) -> Self {
        let surface = platform.allocate_surface(&props);
        platform.mount(&surface, content);
        Self {
            platform,
            surface: Some(surface),
            props,
        }
    }

    /// The mounted surface, or `None` after teardown.
    pub fn surface(&self) -> Option<&P::Surface> {
        self.surface.as_ref()
    }

    /// True until teardown.
    pub fn is_mounted(&self) -> bool {
        self.surface.is_some()
    }

    /// Props last applied to the surface.
    pub fn props(&self) -> &ModalProps {
        &self.props
    }

    /// Forward new props to the surface. No-op after teardown.
    pub fn update_props(&mut self, props: ModalProps) {
        let Some(surface) = &self.surface else {
            return;
        };
        if props != self.props {
            self.platform.apply_props(surface, &props);
            self.props = props;
        }
    }

    /// Unmount the content and release the surface. Idempotent.
    pub fn teardown(&mut self) {
        if let Some(surface) = self.surface.take() {
            self.platform.unmount(&surface);
            self.platform.release(surface);
        }
    }
}

impl<P: NativePlatform> Drop for ModalHostContainer<P> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<P: NativePlatform> fmt::Debug for ModalHostContainer<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalHostContainer")
            .field("mounted", &self.is_mounted())
            .field("props", &self.props)
            .finish_non_exhaustive()
    }
}
