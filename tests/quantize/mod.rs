use apngkit::{
  quantize::{
    cube::{calculate_variance, split_cubes, ColorCube},
    histogram::build_histogram,
    moments::MomentTable,
    quantize, ALPHA_THRESHOLD, SIDE_SIZE,
  },
  quantize_image, BitmapView, IndexedBitmapMut, Pixel, QuantizeOptions,
};

fn quantize_pixels(width: u32, height: u32, px: &[Pixel]) -> (Vec<u8>, Vec<Pixel>) {
  let src = BitmapView::from_pixels(width, height, px).unwrap();
  let mut idx = vec![0_u8; px.len()];
  let mut pal = vec![Pixel::default(); 257];
  let mut dst = IndexedBitmapMut::new(width, height, width as isize, &mut idx, &mut pal).unwrap();
  let n = quantize_image(&src, &mut dst).unwrap();
  pal.truncate(n);
  (idx, pal)
}

#[test]
fn test_four_opaque_colors_round_trip() {
  let px = [
    Pixel::new(255, 255, 0, 0),
    Pixel::new(255, 0, 255, 0),
    Pixel::new(255, 0, 0, 255),
    Pixel::new(255, 10, 20, 30),
  ];
  let (idx, pal) = quantize_pixels(2, 2, &px);
  assert_eq!(pal.len(), 5);
  assert_eq!(pal.last(), Some(&Pixel::TRANSPARENT));
  for (p, &i) in px.iter().zip(&idx) {
    assert_eq!(pal[usize::from(i)], *p);
  }
  let mut sorted = idx.clone();
  sorted.sort_unstable();
  assert_eq!(sorted, [0, 1, 2, 3]);
}

#[test]
fn test_transparent_pixel_maps_to_sentinel() {
  let (idx, pal) = quantize_pixels(1, 1, &[Pixel::new(0, 50, 60, 70)]);
  assert_eq!(usize::from(idx[0]), pal.len() - 1);
  assert_eq!(pal[usize::from(idx[0])], Pixel::TRANSPARENT);
}

#[test]
fn test_random_image_palette_and_indices_are_valid() {
  let px = super::rand_pixels(64 * 48);
  let (idx, pal) = quantize_pixels(64, 48, &px);
  assert!(pal.len() <= 257);
  assert!(pal.len() <= 256, "one sentinel plus at most 255 boxes");
  assert_eq!(pal.last(), Some(&Pixel::TRANSPARENT));
  let sentinel = (pal.len() - 1) as u8;
  for (p, &i) in px.iter().zip(&idx) {
    assert!(usize::from(i) < pal.len());
    if p.a <= ALPHA_THRESHOLD {
      assert_eq!(i, sentinel);
    }
  }
}

#[test]
fn test_quantizing_is_deterministic() {
  let px = super::rand_pixels(40 * 40);
  let a = quantize_pixels(40, 40, &px);
  let b = quantize_pixels(40, 40, &px);
  assert_eq!(a, b);
}

#[test]
fn test_requantizing_palette_output_reproduces_it() {
  let px = super::rand_pixels(32 * 32);
  let first = quantize(&BitmapView::from_pixels(32, 32, &px).unwrap(), &QuantizeOptions::default()).unwrap();
  let expanded = first.expand().unwrap();
  let second =
    quantize(&BitmapView::from_pixels(32, 32, &expanded).unwrap(), &QuantizeOptions::default()).unwrap();
  let again = second.expand().unwrap();
  for (a, b) in expanded.iter().zip(&again) {
    if a.a <= ALPHA_THRESHOLD {
      assert_eq!(*b, Pixel::TRANSPARENT);
    } else {
      // refined alphas can sit between rounding steps, and get rounded again
      let d = a.distance_squared(*b);
      assert!(d <= 64, "{a:?} became {b:?}");
    }
  }
}

#[test]
fn test_requantizing_opaque_palette_output_is_exact() {
  // 16 opaque colors, all in different buckets
  let colors: Vec<Pixel> =
    (0..16_u8).map(|i| Pixel::new(255, (i & 3) * 64 + 16, (i >> 2) * 64 + 16, 128 - i * 4)).collect();
  let noise = super::rand_bytes(40 * 40);
  let px: Vec<Pixel> = noise.iter().map(|&n| colors[usize::from(n & 15)]).collect();
  let first = quantize(&BitmapView::from_pixels(40, 40, &px).unwrap(), &QuantizeOptions::default()).unwrap();
  let expanded = first.expand().unwrap();
  assert_eq!(expanded, px);
  let second =
    quantize(&BitmapView::from_pixels(40, 40, &expanded).unwrap(), &QuantizeOptions::default()).unwrap();
  assert_eq!(second.expand().unwrap(), expanded);
  assert_eq!(second.palette.len(), first.palette.len());
}

#[test]
fn test_few_colors_need_few_entries() {
  let colors = [Pixel::new(255, 0, 0, 0), Pixel::new(255, 255, 255, 255), Pixel::new(128, 0, 128, 255)];
  let px: Vec<Pixel> = (0..100).map(|i| colors[i % 3]).collect();
  let (idx, pal) = quantize_pixels(10, 10, &px);
  assert_eq!(pal.len(), 4);
  for (p, &i) in px.iter().zip(&idx) {
    assert_eq!(pal[usize::from(i)], *p);
  }
}

#[test]
fn test_max_colors_option_limits_palette() {
  let px = super::rand_pixels(32 * 32);
  let opts = QuantizeOptions { max_colors: 16, ..Default::default() };
  let q = quantize(&BitmapView::from_pixels(32, 32, &px).unwrap(), &opts).unwrap();
  assert!(q.palette.len() <= 16);
  assert!(q.indices.iter().all(|&i| usize::from(i) < q.palette.len()));
}

#[test]
fn test_high_alpha_threshold_keeps_faint_pixels_visible() {
  let px = [Pixel::new(21, 200, 100, 50), Pixel::new(255, 0, 0, 0), Pixel::new(20, 1, 2, 3)];
  let opts = QuantizeOptions { alpha_threshold: 20, ..Default::default() };
  let q = quantize(&BitmapView::from_pixels(3, 1, &px).unwrap(), &opts).unwrap();
  assert_eq!(q.palette.len(), 3);
  let sentinel = (q.palette.len() - 1) as u8;
  assert_ne!(q.indices[0], sentinel);
  assert_eq!(q.palette[usize::from(q.indices[0])], Pixel::new(16, 200, 100, 50));
  assert_eq!(q.palette[usize::from(q.indices[1])], px[1]);
  assert_eq!(q.indices[2], sentinel);
  // every real entry is used by some pixel
  for i in 0..sentinel {
    assert!(q.indices.contains(&i));
  }
}

fn assert_monotone(table: &MomentTable<i64>) {
  for a in 1..SIDE_SIZE {
    for r in 1..SIDE_SIZE {
      for g in 1..SIDE_SIZE {
        for b in 1..SIDE_SIZE {
          let here = table.get([a, r, g, b]);
          assert!(here >= table.get([a - 1, r, g, b]));
          assert!(here >= table.get([a, r - 1, g, b]));
          assert!(here >= table.get([a, r, g - 1, b]));
          assert!(here >= table.get([a, r, g, b - 1]));
        }
      }
    }
  }
}

#[test]
fn test_cumulative_tables_are_monotone() {
  let px = super::rand_pixels(50 * 50);
  let mut data = build_histogram(&BitmapView::from_pixels(50, 50, &px).unwrap(), ALPHA_THRESHOLD).unwrap();
  data.calculate_moments().unwrap();
  assert_monotone(&data.weights);
  assert_monotone(&data.moments_alpha);
  assert_monotone(&data.moments_red);
  assert_monotone(&data.moments_green);
  assert_monotone(&data.moments_blue);
  let opaque = px.iter().filter(|p| p.a > ALPHA_THRESHOLD).count() as i64;
  assert_eq!(data.volume(&ColorCube::whole()).weight, opaque);
}

#[test]
fn test_variance_is_finite_and_non_negative() {
  let px = super::rand_pixels(30 * 30);
  let mut data = build_histogram(&BitmapView::from_pixels(30, 30, &px).unwrap(), ALPHA_THRESHOLD).unwrap();
  data.calculate_moments().unwrap();
  for cube in split_cubes(&data, 255) {
    let v = calculate_variance(&data, &cube);
    assert!(v.is_finite() && v >= 0.0, "{v}");
    if data.volume(&cube).weight == 0 {
      assert_eq!(v, 0.0);
    }
  }
}

#[test]
fn test_padded_and_bottom_up_sources_match_packed() {
  let px = super::rand_pixels(7 * 5);
  let (packed_idx, packed_pal) = quantize_pixels(7, 5, &px);

  // same image, rows stored bottom-up with 4 bytes of padding each
  let stride = 7 * 4 + 4;
  let mut bytes = vec![0_u8; stride * 5];
  for (y, row) in px.chunks_exact(7).enumerate() {
    let start = (4 - y) * stride;
    bytes[start..start + 28].copy_from_slice(bytemuck::cast_slice(row));
  }
  let src = BitmapView::new(7, 5, -(stride as isize), &bytes).unwrap();
  let mut idx = vec![0_u8; 35];
  let mut pal = vec![Pixel::default(); 257];
  let mut dst = IndexedBitmapMut::new(7, 5, 7, &mut idx, &mut pal).unwrap();
  let n = quantize_image(&src, &mut dst).unwrap();
  assert_eq!(&pal[..n], &packed_pal[..]);
  assert_eq!(idx, packed_idx);
}
