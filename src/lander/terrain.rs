//! Procedural terrain generation
//!
//! One pass at level start, immutable afterwards. The profile is layered
//! sine relief plus seeded feature bumps, smoothed, stitched at the wrap
//! seam, then carved flat where pads go. Buildings and the antenna mast are
//! attached as axis-aligned rectangles.

use glam::Vec2;
use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::geom::{lerp, smoothstep, wrap};
use crate::tuning::LanderTuning;

/// Gameplay role of a flat zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PadRole {
    /// Cargo arrives here by delivery rocket
    Freight,
    Methane,
    Geothermal,
    Nuclear,
}

/// An axis-aligned obstacle standing on the terrain
///
/// `base_y` is the ground line; the rectangle extends `height` upward
/// (screen coordinates, y grows downward).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Structure {
    pub x: f32,
    pub width: f32,
    pub base_y: f32,
    pub height: f32,
}

impl Structure {
    /// Inclusive-bounds containment test with world wrap applied to x
    pub fn contains(&self, p: Vec2, world_width: f32) -> bool {
        let px = wrap(p.x, world_width);
        let sx = wrap(self.x, world_width);
        px >= sx && px <= sx + self.width && p.y >= self.base_y - self.height && p.y <= self.base_y
    }
}

/// A flat landing zone carved into the profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pad {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub role: PadRole,
}

impl Pad {
    /// Whether the horizontal span [left, right] overlaps this pad
    pub fn spans(&self, left: f32, right: f32, world_width: f32) -> bool {
        let px = wrap(self.x, world_width);
        wrap(right, world_width) >= px && wrap(left, world_width) <= px + self.width
    }
}

/// The generated world: wrapped height profile, pads, obstacles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Terrain {
    pub width: f32,
    pub height: f32,
    pub points: Vec<Vec2>,
    pub pads: Vec<Pad>,
    pub structures: Vec<Structure>,
}

impl Terrain {
    /// Generate a terrain deterministically from `seed`
    pub fn generate(seed: u64, t: &LanderTuning) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let width = t.world_width();
        let height = t.view_height;
        let segment = t.segment_size;
        let num_points = (width / segment).ceil() as usize;

        let mut ys = Vec::with_capacity(num_points);
        for i in 0..num_points {
            let x = i as f32 * segment;

            // Macro relief: three sine layers of decreasing amplitude
            let noise1 = (x * 0.0005).sin() * height * 0.35;
            let noise2 = (x * 0.002).sin() * height * 0.15;
            let noise3 = (x * 0.008).sin() * height * 0.05;

            // Micro relief: phase-shifted sines averaged together
            let micro = ((x * 0.015 + std::f32::consts::FRAC_PI_3).sin()
                + (x * 0.023 + std::f32::consts::PI / 5.0).sin()
                + (x * 0.031 + std::f32::consts::PI / 7.0).sin())
                / 3.0
                * height
                * 0.1;

            let mut y = height * 0.6 + noise1 + noise2 + noise3 + micro;

            // Occasional seeded feature bump blended into preceding points
            if rng.random::<f32>() < 0.03 && !ys.is_empty() {
                let feature_height = (rng.random::<f32>() - 0.5) * height * 0.4;
                let feature_width = rng.random_range(4..12usize);
                let start = ys.len().saturating_sub(feature_width);
                for (j, yj) in ys.iter_mut().enumerate().skip(start) {
                    let tt = (j - start) as f32 / feature_width as f32;
                    *yj += feature_height * smoothstep(tt);
                }
                y += feature_height;
            }

            ys.push(y);
        }

        // Two passes of 3-point weighted smoothing
        for _ in 0..2 {
            for i in 1..ys.len() - 1 {
                ys[i] = ys[i - 1] * 0.25 + ys[i] * 0.5 + ys[i + 1] * 0.25;
            }
        }

        // Stitch trailing points to the leading heights so the wrap seam is
        // continuous
        let to_match = num_points / 10;
        for i in 0..to_match {
            let last = ys.len() - 1 - i;
            ys[last] = ys[i];
        }

        let mut pads = Vec::new();
        let mut structures = Vec::new();

        // Freight pad: fixed position, wider than the delivery pads, with a
        // warehouse building on its right
        let freight_x = 350.0;
        let freight_width = 300.0;
        let building_space = 20.0;
        let freight_building_width = 200.0;
        let freight_y = height * 0.6;
        carve_flat(
            &mut ys,
            segment,
            freight_x,
            freight_x + freight_width + building_space + freight_building_width,
            freight_y,
        );
        pads.push(Pad {
            x: freight_x,
            y: freight_y,
            width: freight_width,
            role: PadRole::Freight,
        });
        structures.push(Structure {
            x: freight_x + freight_width + building_space,
            width: freight_building_width,
            base_y: freight_y,
            height: 80.0,
        });

        // Three delivery pads spread across the world
        let roles = [PadRole::Methane, PadRole::Geothermal, PadRole::Nuclear];
        for (i, (rel, role)) in [0.25f32, 0.5, 0.75].iter().zip(roles).enumerate() {
            let pad_x = width * rel;
            let pad_width = 120.0;
            let building_width = 60.0;
            let pad_y = height * (0.5 + rng.random::<f32>() * 0.2);

            // The middle pad also carries a low antenna array on its right
            let has_antenna = i == 1;
            let antenna_width = if has_antenna { 80.0 } else { 0.0 };
            let antenna_space = if has_antenna { 20.0 } else { 0.0 };

            let flat_end =
                pad_x + pad_width + building_space + building_width + antenna_space + antenna_width;
            carve_flat(&mut ys, segment, pad_x, flat_end, pad_y);

            pads.push(Pad {
                x: pad_x,
                y: pad_y,
                width: pad_width,
                role,
            });
            structures.push(Structure {
                x: pad_x + pad_width + building_space,
                width: building_width,
                base_y: pad_y,
                height: 120.0,
            });
            if has_antenna {
                structures.push(Structure {
                    x: pad_x + pad_width + building_space + building_width + antenna_space,
                    width: antenna_width,
                    base_y: pad_y,
                    height: 40.0,
                });
            }
        }

        // Antenna mast on a flattened platform left of the last pad
        let last_pad = &pads[pads.len() - 1];
        let mast_x = last_pad.x - 200.0;
        let mast_y = last_pad.y;
        let platform_width = 160.0;
        carve_flat(
            &mut ys,
            segment,
            mast_x - platform_width / 2.0,
            mast_x + platform_width / 2.0,
            mast_y,
        );
        structures.push(Structure {
            x: mast_x - 50.0,
            width: 100.0,
            base_y: mast_y,
            height: 300.0,
        });
        structures.push(Structure {
            x: mast_x - platform_width / 2.0,
            width: platform_width,
            base_y: mast_y,
            height: 40.0,
        });

        // Closing point at x = width shares the first point's height
        let mut points: Vec<Vec2> = ys
            .iter()
            .enumerate()
            .map(|(i, &y)| Vec2::new(i as f32 * segment, y))
            .collect();
        points.push(Vec2::new(width, points[0].y));

        Self {
            width,
            height,
            points,
            pads,
            structures,
        }
    }

    /// Interpolated terrain height at `x` (wrapped into the world)
    pub fn height_at(&self, x: f32) -> f32 {
        let wx = wrap(x, self.width);
        for pair in self.points.windows(2) {
            let (p1, p2) = (pair[0], pair[1]);
            if wx >= p1.x && wx <= p2.x {
                if (p2.x - p1.x).abs() <= f32::EPSILON {
                    return p1.y;
                }
                let t = (wx - p1.x) / (p2.x - p1.x);
                return lerp(p1.y, p2.y, t);
            }
        }
        self.height
    }

    /// Pad overlapped by the horizontal span [left, right], if any
    pub fn pad_spanning(&self, left: f32, right: f32) -> Option<&Pad> {
        self.pads.iter().find(|p| p.spans(left, right, self.width))
    }

    /// Pad directly under `x`, if any
    pub fn pad_at(&self, x: f32) -> Option<&Pad> {
        self.pads.iter().find(|p| p.spans(x, x, self.width))
    }

    /// Vertical distance from `(x, y)` down to the terrain surface
    pub fn distance_below(&self, x: f32, y: f32) -> f32 {
        (self.height_at(x) - y).max(0.0)
    }
}

/// Overwrite the index range covering [start_x, end_x] to `y`, blending a
/// smoothstep transition region on each side so no step remains
fn carve_flat(ys: &mut [f32], segment: f32, start_x: f32, end_x: f32, y: f32) {
    let start = (start_x / segment).floor() as isize;
    let end = (end_x / segment).floor() as isize;
    let transition = 8isize;

    for i in (start - transition)..start {
        if let Some(yi) = index_mut(ys, i) {
            let t = (i - (start - transition)) as f32 / transition as f32;
            *yi = lerp(*yi, y, smoothstep(t));
        }
    }
    for i in start..=end {
        if let Some(yi) = index_mut(ys, i) {
            *yi = y;
        }
    }
    for i in (end + 1)..=(end + transition) {
        if let Some(yi) = index_mut(ys, i) {
            let t = 1.0 - (i - (end + 1)) as f32 / transition as f32;
            *yi = lerp(*yi, y, smoothstep(t));
        }
    }
}

fn index_mut(ys: &mut [f32], i: isize) -> Option<&mut f32> {
    if i >= 0 && (i as usize) < ys.len() {
        Some(&mut ys[i as usize])
    } else {
        None
    }
}
