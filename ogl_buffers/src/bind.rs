/// Bind bracket - save the current binding, bind, restore on drop
///
/// Legacy (non-direct) entry points act on whatever buffer is bound to a
/// target. The bracket binds a buffer for the duration of one operation and
/// puts the previous binding back afterwards, so no global state leaks to
/// unrelated code.
///
/// Brackets do not nest: opening a second one on the same slot while the
/// first guard is alive fails instead of overwriting the saved binding.

use std::cell::Cell;
use crate::driver::{BufferId, BufferTarget, Driver};
use crate::error::{Error, Result};
use crate::ogl_bail;

/// Holds the "previously bound" identity while a bracket is open
#[derive(Debug, Default)]
pub struct BindSlot {
    /// `Some` while a guard is alive
    previous: Cell<Option<BufferId>>,
}

impl BindSlot {
    pub fn new() -> Self {
        Self { previous: Cell::new(None) }
    }

    /// Whether a bracket is currently open on this slot
    pub fn is_bound(&self) -> bool {
        self.previous.get().is_some()
    }

    /// Open a bracket: remember what `target` is bound to, then bind `id`.
    ///
    /// Targets without a binding query remember "no buffer".
    ///
    /// # Errors
    ///
    /// - `InvalidResource` if `target` has no binding point
    /// - `UnboundOperation` if a bracket is already open on this slot
    pub fn bind<'a>(
        &'a self,
        driver: &'a dyn Driver,
        target: BufferTarget,
        id: BufferId,
    ) -> Result<BindGuard<'a>> {
        if !target.has_binding_point() {
            ogl_bail!(
                "ogl::bind",
                Error::InvalidResource(format!("target {:?} has no binding point", target))
            );
        }
        if self.is_bound() {
            ogl_bail!(
                "ogl::bind",
                Error::UnboundOperation(format!("buffer {} is already bound to {:?}", id, target))
            );
        }

        let previous = match target.binding_query() {
            Some(pname) => BufferId(driver.get_integer(pname).max(0) as u32),
            None => BufferId::NONE,
        };
        self.previous.set(Some(previous));
        driver.bind_buffer(target, id);

        crate::ogl_trace!("ogl::bind", "bind {} to {:?} (previous {})", id, target, previous);

        Ok(BindGuard { slot: self, driver, target })
    }
}

/// Open bracket. Dropping it restores the saved binding.
#[must_use = "dropping the guard immediately closes the bracket"]
pub struct BindGuard<'a> {
    slot: &'a BindSlot,
    driver: &'a dyn Driver,
    target: BufferTarget,
}

impl BindGuard<'_> {
    /// Target this bracket is bound to
    pub fn target(&self) -> BufferTarget {
        self.target
    }

    /// Binding that will be restored
    pub fn previous(&self) -> BufferId {
        self.slot.previous.get().unwrap_or(BufferId::NONE)
    }
}

impl Drop for BindGuard<'_> {
    fn drop(&mut self) {
        let previous = self.slot.previous.take().unwrap_or(BufferId::NONE);
        self.driver.bind_buffer(self.target, previous);
    }
}

#[cfg(test)]
#[path = "bind_tests.rs"]
mod tests;
