use crate::draw::{DrawBatch, Primitive, Rgba};
use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};
use image::{Rgba as Pixel, RgbaImage};

/// Off-screen colour target for the pick pass.
///
/// Row 0 of the image returned by `read_pixels` is the bottom row, as in a
/// GL framebuffer.
pub trait PickSurface {
    fn resize(&mut self, width: u32, height: u32);
    fn size(&self) -> (u32, u32);
    /// Clear colour to (0,0,0,0) and depth to far.
    fn clear(&mut self);
    fn draw(&mut self, batch: &DrawBatch, view_proj: &Mat4);
    /// Blocking transfer of the colour buffer.
    fn read_pixels(&mut self) -> RgbaImage;
}

/// CPU rasteriser implementing [`PickSurface`].
#[derive(Debug, Clone)]
pub struct SoftwareSurface {
    color: RgbaImage,
    depth: Vec<f32>,
}

impl SoftwareSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            color: RgbaImage::new(width, height),
            depth: vec![1.0; (width as usize) * (height as usize)],
        }
    }

    fn to_window(&self, p: Vec3, view_proj: &Mat4) -> Option<Vec3> {
        let clip = *view_proj * p.extend(1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        let (w, h) = self.size();
        Some(Vec3::new(
            (ndc.x + 1.0) * 0.5 * w as f32,
            (ndc.y + 1.0) * 0.5 * h as f32,
            (ndc.z + 1.0) * 0.5,
        ))
    }

    fn fill_triangle(&mut self, tri: [Vec3; 3], color: Rgba, depth_test: bool) {
        let (w, h) = self.size();
        if w == 0 || h == 0 {
            return;
        }
        let [a, b, c] = tri;
        let area = edge(a.truncate(), b.truncate(), c.truncate());
        if area.abs() <= f32::EPSILON {
            return;
        }
        let min_x = a.x.min(b.x).min(c.x).floor().max(0.0) as u32;
        let min_y = a.y.min(b.y).min(c.y).floor().max(0.0) as u32;
        let max_x = a.x.max(b.x).max(c.x).ceil().min(w as f32 - 1.0);
        let max_y = a.y.max(b.y).max(c.y).ceil().min(h as f32 - 1.0);
        if max_x < 0.0 || max_y < 0.0 {
            return;
        }
        let (max_x, max_y) = (max_x as u32, max_y as u32);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let w0 = edge(b.truncate(), c.truncate(), p) / area;
                let w1 = edge(c.truncate(), a.truncate(), p) / area;
                let w2 = edge(a.truncate(), b.truncate(), p) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }
                let z = w0 * a.z + w1 * b.z + w2 * c.z;
                if !(0.0..=1.0).contains(&z) {
                    continue;
                }
                let idx = (y as usize) * (w as usize) + x as usize;
                if depth_test {
                    if z > self.depth[idx] {
                        continue;
                    }
                    self.depth[idx] = z;
                }
                self.color.put_pixel(x, y, Pixel(color));
            }
        }
    }

    fn fill_line(&mut self, a: Vec3, b: Vec3, width: f32, color: Rgba, depth_test: bool) {
        let half = width.max(1.0) * 0.5;
        let d = (b - a).truncate();
        let dir = if d.length() > f32::EPSILON {
            d.normalize()
        } else {
            Vec2::X
        };
        let n = Vec2::new(-dir.y, dir.x) * half;
        let ext = dir * half;
        let corner = |p: Vec3, offset: Vec2| Vec3::new(p.x + offset.x, p.y + offset.y, p.z);
        let q = [
            corner(a, -ext + n),
            corner(a, -ext - n),
            corner(b, ext - n),
            corner(b, ext + n),
        ];
        self.fill_triangle([q[0], q[1], q[2]], color, depth_test);
        self.fill_triangle([q[0], q[2], q[3]], color, depth_test);
    }
}

/// Twice the signed area of (a, b, p); the sign follows winding.
fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

impl PickSurface for SoftwareSurface {
    fn resize(&mut self, width: u32, height: u32) {
        if self.size() == (width, height) {
            return;
        }
        *self = Self::new(width, height);
    }

    fn size(&self) -> (u32, u32) {
        self.color.dimensions()
    }

    fn clear(&mut self) {
        for px in self.color.pixels_mut() {
            *px = Pixel([0, 0, 0, 0]);
        }
        self.depth.fill(1.0);
    }

    fn draw(&mut self, batch: &DrawBatch, view_proj: &Mat4) {
        match batch.primitive {
            Primitive::Triangles => {
                for tri in batch.vertices.chunks_exact(3) {
                    let (Some(a), Some(b), Some(c)) = (
                        self.to_window(tri[0], view_proj),
                        self.to_window(tri[1], view_proj),
                        self.to_window(tri[2], view_proj),
                    ) else {
                        continue;
                    };
                    self.fill_triangle([a, b, c], batch.color, batch.depth_test);
                }
            }
            Primitive::Lines => {
                for seg in batch.vertices.chunks_exact(2) {
                    let (Some(a), Some(b)) = (
                        self.to_window(seg[0], view_proj),
                        self.to_window(seg[1], view_proj),
                    ) else {
                        continue;
                    };
                    self.fill_line(a, b, batch.line_width, batch.color, batch.depth_test);
                }
            }
        }
    }

    fn read_pixels(&mut self) -> RgbaImage {
        self.color.clone()
    }
}
