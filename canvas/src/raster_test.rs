#![allow(clippy::float_cmp)]

use image::{GrayImage, Luma};

use super::*;
use crate::doc::{CanvasModel, wall_id};

fn gradient(width: u32, height: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        #[allow(clippy::cast_possible_truncation)]
        let v = ((x * 37 + y * 11) % 256) as u8;
        Luma([v])
    })
}

fn white(width: u32, height: u32) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([255]))
}

fn model_with_wall(start: Point, end: Point) -> CanvasModel {
    let mut doc = CanvasModel::new(white(20, 20));
    doc.add_wall(wall_id(0), start);
    if let Some(wall) = doc.wall_mut("wall_0") {
        wall.end = end;
    }
    doc
}

fn cell(grid: &OccupancyGrid, x: u32, y: u32) -> u8 {
    grid.cells[(y * grid.width + x) as usize]
}

// =============================================================
// occupancy
// =============================================================

#[test]
fn white_is_free_and_black_is_occupied() {
    assert_eq!(occupancy(255), 0);
    assert_eq!(occupancy(0), 100);
}

#[test]
fn mid_gray_truncates() {
    // 100 - 128/255*100 = 49.8...
    assert_eq!(occupancy(128), 49);
}

#[test]
fn occupancy_stays_in_range() {
    for p in 0..=255u8 {
        assert!(occupancy(p) <= 100);
    }
}

// =============================================================
// rasterize
// =============================================================

#[test]
fn no_walls_maps_every_pixel() {
    let background = gradient(13, 7);
    let grid = rasterize(&background, std::iter::empty(), 0.05);
    assert_eq!((grid.width, grid.height), (13, 7));
    let expected: Vec<u8> = background.pixels().map(|p| occupancy(p.0[0])).collect();
    assert_eq!(grid.cells, expected);
}

#[test]
fn grid_is_row_major() {
    let mut background = white(3, 2);
    background.put_pixel(2, 0, Luma([0]));
    let grid = rasterize(&background, std::iter::empty(), 1.0);
    assert_eq!(grid.cells, vec![0, 0, 100, 0, 0, 0]);
}

#[test]
fn origin_is_top_row_height_in_metres() {
    let grid = rasterize(&white(10, 40), std::iter::empty(), 0.25);
    assert_eq!(grid.origin, Point::new(0.0, 10.0));
    assert_eq!(grid.resolution, 0.25);
}

#[test]
fn rasterize_is_idempotent() {
    let doc = model_with_wall(Point::new(2.0, 2.0), Point::new(17.0, 12.0));
    let a = rasterize(doc.background(), doc.walls_in_draw_order(), 0.1);
    let b = rasterize(doc.background(), doc.walls_in_draw_order(), 0.1);
    assert_eq!(a, b);
}

#[test]
fn wall_cells_become_occupied() {
    let doc = model_with_wall(Point::new(3.0, 10.0), Point::new(16.0, 10.0));
    let grid = rasterize(doc.background(), doc.walls_in_draw_order(), 0.1);
    assert_eq!(cell(&grid, 10, 10), 100);
    assert_eq!(cell(&grid, 10, 2), 0);
    assert_eq!(cell(&grid, 0, 0), 0);
}

#[test]
fn zero_length_wall_marks_its_anchor() {
    let doc = model_with_wall(Point::new(10.0, 10.0), Point::new(10.0, 10.0));
    let grid = rasterize(doc.background(), doc.walls_in_draw_order(), 0.1);
    assert_eq!(cell(&grid, 10, 10), 100);
    assert_eq!(cell(&grid, 15, 15), 0);
}

#[test]
fn background_is_not_modified() {
    let doc = model_with_wall(Point::new(3.0, 10.0), Point::new(16.0, 10.0));
    let before = doc.background().clone();
    let drawn = draw_walls(doc.background(), doc.walls_in_draw_order());
    assert_eq!(doc.background(), &before);
    assert_ne!(&drawn, &before);
}

#[test]
fn non_finite_walls_are_skipped() {
    for end in [
        Point::new(f64::NAN, f64::NAN),
        Point::new(f64::INFINITY, 10.0),
        Point::new(10.0, f64::NEG_INFINITY),
    ] {
        let doc = model_with_wall(Point::new(10.0, 10.0), end);
        let grid = rasterize(doc.background(), doc.walls_in_draw_order(), 0.1);
        assert_eq!(grid.cells.len(), 20 * 20);
        assert!(grid.cells.iter().all(|&c| c == 0), "wall to {end:?} left marks");
    }
}

#[test]
fn huge_wall_crossing_the_image_is_clipped() {
    let doc = model_with_wall(Point::new(-1e15, 10.0), Point::new(1e15, 10.0));
    let grid = rasterize(doc.background(), doc.walls_in_draw_order(), 0.1);
    assert_eq!(cell(&grid, 0, 10), 100);
    assert_eq!(cell(&grid, 19, 10), 100);
    assert_eq!(cell(&grid, 10, 2), 0);
}

#[test]
fn wall_far_off_canvas_draws_nothing() {
    for (start, end) in [
        (Point::new(1e15, 1e15), Point::new(1e15 + 40.0, 1e15)),
        (Point::new(-1e15, 5.0), Point::new(-1e15, 5.0)),
        (Point::new(-500.0, -500.0), Point::new(500.0, -500.0)),
    ] {
        let doc = model_with_wall(start, end);
        let grid = rasterize(doc.background(), doc.walls_in_draw_order(), 0.1);
        assert!(grid.cells.iter().all(|&c| c == 0), "wall {start:?}-{end:?} left marks");
    }
}

#[test]
fn wall_leaving_the_image_keeps_its_visible_part() {
    let doc = model_with_wall(Point::new(5.0, 5.0), Point::new(5.0e6, 5.0e6));
    let grid = rasterize(doc.background(), doc.walls_in_draw_order(), 0.1);
    assert_eq!(cell(&grid, 5, 5), 100);
    assert_eq!(cell(&grid, 15, 15), 100);
    assert_eq!(cell(&grid, 15, 5), 0);
}

// =============================================================
// blank_arena
// =============================================================

#[test]
fn blank_arena_adds_margin_on_every_side() {
    let arena = blank_arena(10, 6, 3);
    assert_eq!(arena.dimensions(), (16, 12));
}

#[test]
fn blank_arena_border_is_black_and_floor_is_white() {
    let arena = blank_arena(10, 6, 3);
    assert_eq!(arena.get_pixel(0, 0).0[0], 0);
    assert_eq!(arena.get_pixel(2, 5).0[0], 0);
    assert_eq!(arena.get_pixel(15, 11).0[0], 0);
    assert_eq!(arena.get_pixel(3, 3).0[0], 255);
    assert_eq!(arena.get_pixel(12, 8).0[0], 255);
    assert_eq!(arena.get_pixel(13, 8).0[0], 0);
}

#[test]
fn blank_arena_without_margin_is_all_floor() {
    let arena = blank_arena(4, 4, 0);
    assert!(arena.pixels().all(|p| p.0[0] == 255));
}
