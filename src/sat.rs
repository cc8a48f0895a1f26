use image::{GrayImage, Luma};
use nanorand::{Rng, WyRand};

use crate::{mask::Mask, text};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

/// Occupied pixels of the canvas plus their summed-area table.
///
/// The table is padded with a leading zero row and column, so entry
/// `(y, x)` holds the sum of all pixels above and left of `(x, y)`.
pub struct OccupancyMap {
    buffer: GrayImage,
    table: Vec<u32>,
}

impl OccupancyMap {
    /// Everything outside the mask's drawable region starts occupied.
    pub fn from_mask(mask: &Mask) -> Self {
        let buffer = GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
            if mask.is_drawable(x, y) {
                Luma([0])
            } else {
                Luma([1])
            }
        });

        let mut table = vec![0; (buffer.width() as usize + 1) * (buffer.height() as usize + 1)];
        to_summed_area_table(&buffer, &mut table, 0);

        OccupancyMap { buffer, table }
    }

    #[cfg(test)]
    pub fn region_is_empty(&self, x: u32, y: u32, rect: &Rect) -> bool {
        region_is_empty(
            &self.table,
            self.buffer.width() as usize + 1,
            x as usize,
            y as usize,
            rect.width as usize,
            rect.height as usize,
        )
    }

    /// 在图片寻找位置写字
    pub fn find_space_for_rect(&self, rect: &Rect, rng: &mut WyRand) -> Option<Point> {
        find_space_for_rect(
            &self.table,
            self.buffer.width(),
            self.buffer.height(),
            rect,
            rng,
        )
    }

    /// Marks the covered pixels of a placed word and refreshes the table
    /// from its first row down.
    pub fn occupy(&mut self, coverage: &GrayImage, x: u32, y: u32) {
        text::draw_coverage_to_gray_buffer(&mut self.buffer, coverage, x, y);
        to_summed_area_table(&self.buffer, &mut self.table, y as usize);
    }
}

pub fn region_is_empty(
    table: &[u32],
    table_width: usize,
    x: usize,
    y: usize,
    width: usize,
    height: usize,
) -> bool {
    let tl = table[y * table_width + x];
    let tr = table[y * table_width + x + width];

    let bl = table[(y + height) * table_width + x];
    let br = table[(y + height) * table_width + x + width];

    tl as i64 + br as i64 - tr as i64 - bl as i64 == 0
}

/// Picks uniformly among every free position, by reservoir sampling.
pub fn find_space_for_rect(
    table: &[u32],
    width: u32,
    height: u32,
    rect: &Rect,
    rng: &mut WyRand,
) -> Option<Point> {
    if rect.width == 0 || rect.height == 0 || rect.width > width || rect.height > height {
        return None;
    }

    let table_width = width as usize + 1;
    let max_x = width - rect.width;
    let max_y = height - rect.height;

    let mut available_points: u32 = 0;
    let mut random_point = None;

    for y in 0..=max_y {
        for x in 0..=max_x {
            let empty = region_is_empty(
                table,
                table_width,
                x as usize,
                y as usize,
                rect.width as usize,
                rect.height as usize,
            );
            if empty {
                let random_num = rng.generate_range(0..=available_points);
                if random_num == available_points {
                    random_point = Some(Point { x, y });
                }
                available_points += 1;
            }
        }
    }

    random_point
}

/// https://blog.demofox.org/2018/04/16/prefix-sums-and-summed-area-tables/
pub fn to_summed_area_table(buffer: &GrayImage, table: &mut [u32], start_row: usize) {
    let width = buffer.width() as usize;
    let stride = width + 1;

    buffer
        .as_raw()
        .chunks_exact(width.max(1))
        .enumerate()
        .skip(start_row)
        .for_each(|(y, row)| {
            let mut sum = 0;
            for (x, value) in row.iter().enumerate() {
                sum += *value as u32;
                table[(y + 1) * stride + x + 1] = table[y * stride + x + 1] + sum;
            }
        });
}

#[cfg(test)]
mod tests {
    use image::{DynamicImage, GrayImage, Luma};
    use nanorand::WyRand;

    use super::{OccupancyMap, Point, Rect};
    use crate::mask;

    fn open_mask(width: u32, height: u32) -> mask::Mask {
        // left half dark (drawable), right half light
        let img = GrayImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Luma([0])
            } else {
                Luma([255])
            }
        });
        mask::binarize(&DynamicImage::ImageLuma8(img), width, height).unwrap()
    }

    #[test]
    fn placements_stay_inside_the_mask() {
        let map = OccupancyMap::from_mask(&open_mask(40, 20));
        let rect = Rect {
            width: 5,
            height: 5,
        };
        let mut rng = WyRand::new_seed(42);

        for _ in 0..50 {
            let Point { x, y } = map.find_space_for_rect(&rect, &mut rng).unwrap();
            assert!(x + rect.width <= 20);
            assert!(y + rect.height <= 20);
        }
    }

    #[test]
    fn occupied_regions_are_avoided() {
        let mut map = OccupancyMap::from_mask(&open_mask(20, 10));
        let block = GrayImage::from_pixel(10, 10, Luma([255]));
        map.occupy(&block, 0, 0);

        let rect = Rect {
            width: 1,
            height: 1,
        };
        assert!(!map.region_is_empty(3, 3, &rect));
        assert!(map
            .find_space_for_rect(&rect, &mut WyRand::new_seed(1))
            .is_none());
    }

    #[test]
    fn oversized_rect_has_no_space() {
        let map = OccupancyMap::from_mask(&open_mask(20, 10));
        let rect = Rect {
            width: 30,
            height: 2,
        };

        assert!(map
            .find_space_for_rect(&rect, &mut WyRand::new_seed(1))
            .is_none());
    }

    #[test]
    fn partial_occupation_leaves_the_rest_free() {
        let mut map = OccupancyMap::from_mask(&open_mask(20, 10));
        let strip = GrayImage::from_pixel(10, 5, Luma([255]));
        map.occupy(&strip, 0, 0);

        let rect = Rect {
            width: 10,
            height: 5,
        };
        assert!(map.region_is_empty(0, 5, &rect));
        assert_eq!(
            map.find_space_for_rect(&rect, &mut WyRand::new_seed(9)),
            Some(Point { x: 0, y: 5 })
        );
    }
}
