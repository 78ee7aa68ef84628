use super::{rgba_to_id, PickId, PickSurface, Selectable, SoftwareSurface, NO_PICK};
use crate::camera::ViewContext;
use crate::draw::DrawList;
use crate::math::Viewport;
use glam::Vec2;
use image::RgbaImage;
use std::collections::HashSet;

/// Off-screen id buffer plus the point and region queries over it.
///
/// The surface is rendered on demand; the colour image is only transferred
/// back on the first query after a render.
pub struct PickBuffer<S = SoftwareSurface> {
    surface: S,
    viewport: Viewport,
    image: Option<RgbaImage>,
    rendered: bool,
    dirty: bool,
    transfers: usize,
}

impl PickBuffer<SoftwareSurface> {
    pub fn software(viewport: Viewport) -> Self {
        let (w, h) = pixel_size(&viewport);
        Self::new(SoftwareSurface::new(w, h), viewport)
    }
}

impl<S: PickSurface> PickBuffer<S> {
    pub fn new(mut surface: S, viewport: Viewport) -> Self {
        let (w, h) = pixel_size(&viewport);
        surface.resize(w, h);
        log::info!("PickBuffer initialized ({}×{})", w, h);
        Self {
            surface,
            viewport,
            image: None,
            rendered: false,
            dirty: false,
            transfers: 0,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Reallocate for a new viewport. Previous contents are discarded.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        let (w, h) = pixel_size(&viewport);
        if self.surface.size() == (w, h) {
            return;
        }
        self.surface.resize(w, h);
        self.image = None;
        self.rendered = false;
        self.dirty = false;
        log::info!("PickBuffer resized to {}×{}", w, h);
    }

    /// Number of colour-buffer transfers performed so far.
    pub fn transfer_count(&self) -> usize {
        self.transfers
    }

    /// Run the pick pass: visible selectable items depth tested, then the
    /// manipulator on top with depth testing off.
    pub fn render<'a, I>(
        &mut self,
        ctx: &ViewContext,
        items: I,
        manipulator: Option<&dyn Selectable>,
    ) where
        I: IntoIterator<Item = &'a dyn Selectable>,
    {
        if self.viewport.is_empty() {
            return;
        }
        let view_proj = ctx.view_projection();
        self.surface.clear();

        let mut list = DrawList::new();
        for item in items {
            if item.is_visible() && item.is_selectable() {
                item.selection_draw(ctx, &mut list);
            }
        }
        if let Some(manip) = manipulator {
            if manip.is_visible() {
                list.set_depth_test(false);
                manip.selection_draw(ctx, &mut list);
            }
        }
        for batch in list.batches() {
            self.surface.draw(batch, &view_proj);
        }

        self.rendered = true;
        self.dirty = true;
    }

    fn image(&mut self) -> Option<&RgbaImage> {
        if !self.rendered {
            return None;
        }
        if self.dirty || self.image.is_none() {
            self.image = Some(self.surface.read_pixels());
            self.transfers += 1;
            self.dirty = false;
        }
        self.image.as_ref()
    }

    /// Id under a window position, or [`NO_PICK`].
    pub fn pick_point(&mut self, mx: f32, my: f32) -> PickId {
        let viewport = self.viewport;
        let Some(image) = self.image() else {
            return NO_PICK;
        };
        let Some((x, row)) = to_pixel(image, &viewport, mx, my) else {
            return NO_PICK;
        };
        let id = rgba_to_id(image.get_pixel(x, row).0);
        if id > NO_PICK {
            id
        } else {
            NO_PICK
        }
    }

    /// All positive ids inside the window rectangle spanned by `a` and `b`.
    pub fn pick_region(&mut self, a: Vec2, b: Vec2) -> HashSet<PickId> {
        let viewport = self.viewport;
        let mut ids = HashSet::new();
        let Some(image) = self.image() else {
            return ids;
        };
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            return ids;
        }
        let lo = a.min(b) - Vec2::new(viewport.x, viewport.y);
        let hi = a.max(b) - Vec2::new(viewport.x, viewport.y);
        let x0 = lo.x.floor().max(0.0) as u32;
        let y0 = lo.y.floor().max(0.0) as u32;
        let x1 = hi.x.ceil().min(w as f32);
        let y1 = hi.y.ceil().min(h as f32);
        if x1 <= 0.0 || y1 <= 0.0 {
            return ids;
        }
        let (x1, y1) = (x1 as u32, y1 as u32);

        for y in y0..y1 {
            let row = h - 1 - y;
            for x in x0..x1 {
                let id = rgba_to_id(image.get_pixel(x, row).0);
                if id > NO_PICK {
                    ids.insert(id);
                }
            }
        }
        ids
    }
}

fn pixel_size(viewport: &Viewport) -> (u32, u32) {
    if viewport.is_empty() {
        (0, 0)
    } else {
        (viewport.width.round() as u32, viewport.height.round() as u32)
    }
}

/// Window position to (column, image row); image row 0 is the bottom.
fn to_pixel(image: &RgbaImage, viewport: &Viewport, mx: f32, my: f32) -> Option<(u32, u32)> {
    let (w, h) = image.dimensions();
    let x = (mx - viewport.x).floor();
    let y = (my - viewport.y).floor();
    if x < 0.0 || y < 0.0 || x >= w as f32 || y >= h as f32 {
        return None;
    }
    Some((x as u32, h - 1 - y as u32))
}
