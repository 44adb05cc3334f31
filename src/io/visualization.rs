//! Occupancy-snapshot PNG export
//!
//! Renders every enabled layer's occupied cells through the map's geometry
//! into a small composited image: each cell becomes a colored square at its
//! projected world position, tinted by the layer's modulate color. Meant for
//! debugging and CLI inspection, not for engine rendering.

use image::RgbaImage;
use ndarray::Array2;
use std::path::Path;

use crate::io::configuration::{SNAPSHOT_CELL_PIXELS, SOURCE_PALETTE};
use crate::io::error::{MapError, Result};
use crate::map::map::GridMap;

/// Render the map's occupancy as an image
///
/// # Errors
///
/// Returns [`MapError::MissingCatalog`] without a catalog and
/// [`MapError::InvalidParameter`] when no enabled layer has any cell.
pub fn render_occupancy(map: &GridMap) -> Result<RgbaImage> {
    map.geometry().ok_or(MapError::MissingCatalog {
        operation: "render an occupancy snapshot",
    })?;

    // Project every visible cell up front to find the world bounds.
    let mut stamps: Vec<([f64; 2], [f32; 4])> = Vec::new();
    for layer in 0..map.layer_count() {
        let Some(settings) = map.layer_settings(layer) else {
            continue;
        };
        if !settings.enabled {
            continue;
        }
        let modulate = settings.modulate;
        for coords in map.get_used_cells(layer) {
            let cell = map.get_cell(layer, coords, true);
            let palette_index = cell.source_id.rem_euclid(SOURCE_PALETTE.len() as i32) as usize;
            let base = SOURCE_PALETTE
                .get(palette_index)
                .copied()
                .unwrap_or([128, 128, 128, 255]);
            let color = [
                f32::from(base[0]) / 255.0 * modulate[0],
                f32::from(base[1]) / 255.0 * modulate[1],
                f32::from(base[2]) / 255.0 * modulate[2],
                f32::from(base[3]) / 255.0 * modulate[3],
            ];
            stamps.push((map.cell_to_world(coords), color));
        }
    }

    if stamps.is_empty() {
        return Err(MapError::InvalidParameter {
            parameter: "map",
            value: "empty".to_string(),
            reason: "no enabled layer has any cell to render".to_string(),
        });
    }

    let cell_size = map.geometry().map_or([16.0, 16.0], |g| g.cell_size);
    let scale = f64::from(SNAPSHOT_CELL_PIXELS);
    let mut min = [f64::INFINITY, f64::INFINITY];
    let mut max = [f64::NEG_INFINITY, f64::NEG_INFINITY];
    for (world, _) in &stamps {
        min = [min[0].min(world[0]), min[1].min(world[1])];
        max = [max[0].max(world[0]), max[1].max(world[1])];
    }

    let width = (((max[0] - min[0]) / cell_size[0] + 2.0) * scale).ceil() as usize;
    let height = (((max[1] - min[1]) / cell_size[1] + 2.0) * scale).ceil() as usize;
    let mut canvas = Array2::<[f32; 4]>::from_elem((height, width), [0.0; 4]);

    let half = SNAPSHOT_CELL_PIXELS as i64 / 2;
    for (world, color) in &stamps {
        let center_x = (((world[0] - min[0]) / cell_size[0] + 1.0) * scale) as i64;
        let center_y = (((world[1] - min[1]) / cell_size[1] + 1.0) * scale) as i64;
        for dy in -half..=half {
            for dx in -half..=half {
                let (row, col) = (center_y + dy, center_x + dx);
                if row < 0 || col < 0 {
                    continue;
                }
                if let Some(pixel) = canvas.get_mut([row as usize, col as usize]) {
                    *pixel = blend_over(*color, *pixel);
                }
            }
        }
    }

    Ok(RgbaImage::from_fn(width as u32, height as u32, |x, y| {
        let pixel = canvas
            .get([y as usize, x as usize])
            .copied()
            .unwrap_or([0.0; 4]);
        image::Rgba(pixel.map(|channel| (channel.clamp(0.0, 1.0) * 255.0) as u8))
    }))
}

/// Render and save the occupancy snapshot as a PNG
///
/// # Errors
///
/// As [`render_occupancy`], plus [`MapError::ImageExport`] on save failure.
pub fn export_occupancy_png(map: &GridMap, path: &Path) -> Result<()> {
    let snapshot = render_occupancy(map)?;
    snapshot.save(path).map_err(|source| MapError::ImageExport {
        path: path.to_path_buf(),
        source,
    })
}

// Premultiplied-free source-over blend; later layers draw on top.
fn blend_over(source: [f32; 4], destination: [f32; 4]) -> [f32; 4] {
    let alpha = source[3];
    let keep = destination[3] * (1.0 - alpha);
    let out_alpha = alpha + keep;
    if out_alpha <= f32::EPSILON {
        return [0.0; 4];
    }
    [
        source[0].mul_add(alpha, destination[0] * keep) / out_alpha,
        source[1].mul_add(alpha, destination[1] * keep) / out_alpha,
        source[2].mul_add(alpha, destination[2] * keep) / out_alpha,
        out_alpha,
    ]
}
