//! Recursive variance-driven splitting of the bucket space.

use log::trace;

use super::{histogram::ColorData, moments::Moments, Channel, MAX_SIDE_INDEX};

/// An axis-aligned box of buckets covering `min+1..=max` on each axis.
///
/// Axes are stored in [`Channel`] order: alpha, red, green, blue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ColorCube {
  pub min: [u8; 4],
  pub max: [u8; 4],
  /// Number of bucket cells inside.
  pub size: u32,
}
impl ColorCube {
  #[inline]
  #[must_use]
  pub fn new(min: [u8; 4], max: [u8; 4]) -> Self {
    let mut cube = Self { min, max, size: 0 };
    cube.update_size();
    cube
  }

  /// The box spanning all of color space.
  #[inline]
  #[must_use]
  pub fn whole() -> Self {
    Self::new([0; 4], [MAX_SIDE_INDEX; 4])
  }

  fn update_size(&mut self) {
    self.size = (0..4).map(|i| u32::from(self.max[i] - self.min[i])).product();
  }
}

/// Where to cut along one channel and how good that cut is.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct CubeCut {
  position: Option<u8>,
  value: f64,
}

/// Scans upper bounds `first..last` along `direction` for the split that
/// maximizes the summed `distance / weight` of both halves.
fn maximize(
  data: &ColorData, cube: &ColorCube, direction: Channel, first: u8, last: u8, whole: Moments,
) -> CubeCut {
  let bottom = data.bottom(cube, direction);
  let mut best = CubeCut::default();
  for position in first..last {
    let half = bottom + data.top(cube, direction, position);
    if half.weight == 0 {
      continue;
    }
    let rest = whole - half;
    if rest.weight == 0 {
      continue;
    }
    let score = half.distance() / i128::from(half.weight) + rest.distance() / i128::from(rest.weight);
    let score = score as f64;
    if score > best.value {
      best = CubeCut { position: Some(position), value: score };
    }
  }
  best
}

/// Splits `first` in two, shrinking it in place and writing the upper part
/// to `second`.
///
/// Returns `false` when no cut leaves weight on both sides.
pub fn cut(data: &ColorData, first: &mut ColorCube, second: &mut ColorCube) -> bool {
  let whole = data.volume(first);
  let cuts = Channel::ALL.map(|c| {
    let axis = c as usize;
    maximize(data, first, c, first.min[axis] + 1, first.max[axis], whole)
  });
  let [alpha, red, green, blue] = cuts;
  let direction = if alpha.value >= red.value && alpha.value >= green.value && alpha.value >= blue.value {
    Channel::Alpha
  } else if red.value >= alpha.value && red.value >= green.value && red.value >= blue.value {
    Channel::Red
  } else if green.value >= alpha.value && green.value >= red.value && green.value >= blue.value {
    Channel::Green
  } else {
    Channel::Blue
  };
  let axis = direction as usize;
  let Some(position) = cuts[axis].position else {
    return false;
  };

  second.max = first.max;
  second.min = first.min;
  first.max[axis] = position;
  second.min[axis] = position;
  first.update_size();
  second.update_size();
  true
}

/// How much the pixels in `cube` deviate from their mean, as a sum of squared
/// distances. Empty boxes and numerically degenerate results give 0.
#[must_use]
pub fn calculate_variance(data: &ColorData, cube: &ColorCube) -> f64 {
  let m = data.volume(cube);
  let sq = |v: i64| (v as f64) * (v as f64);
  let distance = sq(m.alpha) + sq(m.red) + sq(m.green) + sq(m.blue);
  let result = data.moments.volume(cube) - distance / m.weight as f64;
  if result.is_nan() || result < 0.0 {
    0.0
  } else {
    result
  }
}

/// Splits color space into at most `max_boxes` boxes, always cutting the box
/// with the largest variance next.
#[must_use]
pub fn split_cubes(data: &ColorData, max_boxes: usize) -> Vec<ColorCube> {
  let max_boxes = max_boxes.max(1);
  let mut cubes = Vec::with_capacity(max_boxes);
  let mut variance = vec![0.0_f64; max_boxes];
  cubes.push(ColorCube::whole());
  let mut next = 0;
  while cubes.len() < max_boxes {
    let mut second = ColorCube::default();
    if cut(data, &mut cubes[next], &mut second) {
      let i = cubes.len();
      cubes.push(second);
      variance[next] = if cubes[next].size > 1 { calculate_variance(data, &cubes[next]) } else { 0.0 };
      variance[i] = if second.size > 1 { calculate_variance(data, &second) } else { 0.0 };
    } else {
      // retry with the next-worst box
      variance[next] = 0.0;
    }

    next = 0;
    let mut worst = variance[0];
    for (i, &v) in variance.iter().enumerate().take(cubes.len()).skip(1) {
      if v > worst {
        worst = v;
        next = i;
      }
    }
    if worst <= 0.0 {
      break;
    }
  }
  trace!("split color space into {} boxes", cubes.len());
  cubes
}
