//! Colour-coded picking
//!
//! Every selectable element (scene items and manipulator handles) owns a
//! unique 32-bit id. The pick pass draws each element flat in the colour
//! that encodes its id; a readback decodes pixels back to ids.
//!
//! ## Architecture
//!
//! `PickSurface` abstracts the off-screen render target. `SoftwareSurface`
//! rasterises into an `image::RgbaImage`; a GPU backend implements the same
//! trait with a framebuffer and a blocking readback. `PickBuffer` owns a
//! surface, runs the pass and answers point/region queries, transferring
//! the image only on the first query after a render.

mod buffer;
mod surface;

pub use buffer::PickBuffer;
pub use surface::{PickSurface, SoftwareSurface};

use crate::camera::ViewContext;
use crate::draw::{DrawList, Rgba};

/// Pick id; 0 is reserved for "nothing".
pub type PickId = i32;

pub const NO_PICK: PickId = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PickError {
    #[error("all pick ids are in use")]
    Exhausted,
}

// ========================================================================
// id <-> colour
// ========================================================================

/// R = bits 0-7, G = bits 8-15, B = bits 16-23, A = bits 24-31.
pub fn id_to_rgba(id: PickId) -> Rgba {
    id.to_le_bytes()
}

pub fn rgba_to_id(rgba: Rgba) -> PickId {
    let [r, g, b, a] = rgba.map(|c| c as u32);
    ((a << 24) | (b << 16) | (g << 8) | r) as PickId
}

// ========================================================================
// PickIdAllocator: unique ids with reuse
// ========================================================================

#[derive(Debug, Clone)]
pub struct PickIdAllocator {
    /// Next never-used id; past `PickId::MAX` only released ids remain.
    next: i64,
    free: Vec<PickId>,
}

impl Default for PickIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl PickIdAllocator {
    pub fn new() -> Self {
        Self {
            next: 1,
            free: Vec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn starting_at(next: PickId) -> Self {
        Self {
            next: i64::from(next),
            free: Vec::new(),
        }
    }

    /// Next id, preferring released ones.
    pub fn allocate(&mut self) -> Result<PickId, PickError> {
        if let Some(id) = self.free.pop() {
            return Ok(id);
        }
        let id = PickId::try_from(self.next).map_err(|_| PickError::Exhausted)?;
        self.next += 1;
        Ok(id)
    }

    /// Return `id` for reuse. Unknown or already-free ids are ignored.
    pub fn release(&mut self, id: PickId) {
        if id <= NO_PICK || i64::from(id) >= self.next || self.free.contains(&id) {
            return;
        }
        self.free.push(id);
    }

    pub fn in_use(&self) -> usize {
        (self.next - 1) as usize - self.free.len()
    }
}

// ========================================================================
// Selectable: anything drawn into the pick pass
// ========================================================================

pub trait Selectable {
    fn is_selectable(&self) -> bool {
        true
    }

    fn is_visible(&self) -> bool {
        true
    }

    /// Emit flat geometry already coloured with [`id_to_rgba`].
    fn selection_draw(&self, ctx: &ViewContext, out: &mut DrawList);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba_byte_order() {
        assert_eq!(id_to_rgba(0x0403_0201), [1, 2, 3, 4]);
        assert_eq!(rgba_to_id([1, 2, 3, 4]), 0x0403_0201);
    }

    #[test]
    fn rgba_round_trip_edges() {
        for id in [0, 1, -1, 255, 256, 65_535, 1 << 24, i32::MAX, i32::MIN, -123_456_789] {
            assert_eq!(rgba_to_id(id_to_rgba(id)), id, "{id}");
        }
    }

    #[test]
    fn rgba_round_trip_sweep() {
        let mut id: i64 = i32::MIN as i64;
        while id <= i32::MAX as i64 {
            let v = id as i32;
            assert_eq!(rgba_to_id(id_to_rgba(v)), v);
            id += 65_521;
        }
    }

    #[test]
    fn allocator_never_hands_out_zero_and_reuses() {
        let mut ids = PickIdAllocator::new();
        let a = ids.allocate().unwrap();
        let b = ids.allocate().unwrap();
        let c = ids.allocate().unwrap();
        assert_eq!((a, b, c), (1, 2, 3));
        ids.release(b);
        ids.release(b);
        assert_eq!(ids.in_use(), 2);
        assert_eq!(ids.allocate(), Ok(b));
        assert_eq!(ids.allocate(), Ok(4));
    }

    #[test]
    fn allocator_ignores_foreign_ids() {
        let mut ids = PickIdAllocator::new();
        ids.allocate().unwrap();
        ids.release(0);
        ids.release(-5);
        ids.release(99);
        assert_eq!(ids.allocate(), Ok(2));
    }

    #[test]
    fn allocator_refuses_when_exhausted() {
        let mut ids = PickIdAllocator::starting_at(PickId::MAX);
        assert_eq!(ids.allocate(), Ok(PickId::MAX));
        assert_eq!(ids.allocate(), Err(PickError::Exhausted));
        assert_eq!(ids.allocate(), Err(PickError::Exhausted));
        ids.release(7);
        assert_eq!(ids.allocate(), Ok(7));
        assert_eq!(ids.allocate(), Err(PickError::Exhausted));
    }
}
