use crate::bitmap::BitmapView;

/// A rectangle of pixels, offset from some image's top left.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
  pub x: u32,
  pub y: u32,
  pub width: u32,
  pub height: u32,
}

/// The bounding box of every pixel with nonzero alpha.
///
/// A frame with no visible pixels still needs some area, so it gives the
/// single pixel at the origin.
#[must_use]
pub fn dirty_rect(image: &BitmapView<'_>) -> Rect {
  let mut bounds: Option<(u32, u32, u32, u32)> = None;
  for (y, row) in (0..image.height()).zip(image.rows()) {
    let mut visible = row.iter().enumerate().filter(|(_, p)| p.a != 0).map(|(x, _)| x as u32);
    let Some(first) = visible.next() else {
      continue;
    };
    let last = visible.last().unwrap_or(first);
    bounds = Some(match bounds {
      None => (first, y, last, y),
      Some((x_min, y_min, x_max, _)) => (x_min.min(first), y_min, x_max.max(last), y),
    });
  }
  match bounds {
    Some((x_min, y_min, x_max, y_max)) => {
      Rect { x: x_min, y: y_min, width: x_max - x_min + 1, height: y_max - y_min + 1 }
    }
    None => Rect { x: 0, y: 0, width: 1, height: 1 },
  }
}
