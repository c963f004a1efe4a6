//! Turning boxes into palette entries and pixels into indices.

use crate::{error::try_zeroed_vec, pixel::Pixel, ApngResult};

use super::{
  cube::ColorCube,
  histogram::ColorData,
  moments::{cell_index, TABLE_LEN},
};

/// The mean color of one non-empty box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Lookup {
  pub color: Pixel,
}

/// Box means plus a per-bucket tag saying which lookup each bucket started
/// out in.
#[derive(Debug, Clone)]
pub struct Lookups {
  pub lookups: Vec<Lookup>,
  /// Indexed like a moment table; only the `min+1..=max` cells of each box
  /// are written.
  pub tags: Vec<u16>,
}

/// One lookup per box with positive weight, in box order.
///
/// Every bucket inside a box is tagged with the number of lookups produced
/// before it, so an empty box leaves its cells pointing at whatever lookup
/// comes next.
pub fn build_lookups(cubes: &[ColorCube], data: &ColorData) -> ApngResult<Lookups> {
  let mut tags: Vec<u16> = try_zeroed_vec(TABLE_LEN)?;
  let mut lookups = Vec::new();
  lookups.try_reserve_exact(cubes.len())?;
  for cube in cubes {
    let tag = lookups.len() as u16;
    for a in cube.min[0] + 1..=cube.max[0] {
      for r in cube.min[1] + 1..=cube.max[1] {
        for g in cube.min[2] + 1..=cube.max[2] {
          for b in cube.min[3] + 1..=cube.max[3] {
            tags[cell_index([a, r, g, b])] = tag;
          }
        }
      }
    }
    let m = data.volume(cube);
    if m.weight <= 0 {
      continue;
    }
    let mean = |sum: i64| (sum / m.weight) as u8;
    lookups.push(Lookup { color: Pixel::new(mean(m.alpha), mean(m.red), mean(m.green), mean(m.blue)) });
  }
  Ok(Lookups { lookups, tags })
}

/// The final palette and each pixel's entry in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizedPalette {
  /// `color_count` entries followed by the transparent sentinel.
  pub colors: Vec<Pixel>,
  /// `None` for pixels at or below the alpha threshold.
  pub assignments: Vec<Option<u8>>,
}
impl QuantizedPalette {
  /// Index of the transparent sentinel, always the last entry.
  #[inline]
  #[must_use]
  pub fn transparent_index(&self) -> u8 {
    (self.colors.len() - 1) as u8
  }

  /// Each pixel's palette index, with transparent pixels on the sentinel.
  pub fn indices(&self) -> impl Iterator<Item = u8> + '_ {
    let t = self.transparent_index();
    self.assignments.iter().map(move |a| a.unwrap_or(t))
  }
}

/// Assigns every pixel to its nearest lookup and refines each entry to the
/// mean of the pixels it got.
///
/// Entries that got no pixels keep their box mean (or stay transparent black
/// when their box was empty). `color_count` must be at most 255.
pub fn quantized_palette(
  color_count: usize, data: &ColorData, lookups: &Lookups,
) -> ApngResult<QuantizedPalette> {
  let mut sums: Vec<[u64; 4]> = try_zeroed_vec(color_count)?;
  let mut counts: Vec<u64> = try_zeroed_vec(color_count)?;
  let mut assignments = Vec::new();
  assignments.try_reserve_exact(data.pixels.len())?;

  for (&p, q) in data.pixels.iter().zip(&data.quantized) {
    let q = match q {
      Some(q) if !lookups.lookups.is_empty() => q,
      _ => {
        assignments.push(None);
        continue;
      }
    };
    let mut best = usize::from(lookups.tags[cell_index(q.0)]);
    let mut best_distance = u32::MAX;
    for (i, l) in lookups.lookups.iter().enumerate() {
      let d = p.distance_squared(l.color);
      if d < best_distance {
        best_distance = d;
        best = i;
      }
    }
    let s = &mut sums[best];
    s[0] += u64::from(p.a);
    s[1] += u64::from(p.r);
    s[2] += u64::from(p.g);
    s[3] += u64::from(p.b);
    counts[best] += 1;
    assignments.push(Some(best as u8));
  }

  let mut colors = Vec::new();
  colors.try_reserve_exact(color_count + 1)?;
  for i in 0..color_count {
    let color = if counts[i] > 0 {
      let [a, r, g, b] = sums[i].map(|s| (s / counts[i]) as u8);
      Pixel::new(a, r, g, b)
    } else {
      lookups.lookups.get(i).map_or(Pixel::TRANSPARENT, |l| l.color)
    };
    colors.push(color);
  }
  colors.push(Pixel::TRANSPARENT);
  Ok(QuantizedPalette { colors, assignments })
}
