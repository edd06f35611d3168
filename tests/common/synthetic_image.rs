//! Synthetic H&E-like RGBA tiles for integration tests.

/// Eosin-dominated stroma background.
pub const BACKGROUND: [u8; 3] = [240, 180, 210];
/// Hematoxylin-dominated nucleus colour.
pub const NUCLEUS: [u8; 3] = [90, 50, 140];

/// A tile where every pixel has the same colour, alpha 255.
pub fn uniform_rgba(width: usize, height: usize, rgb: [u8; 3]) -> Vec<u8> {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    let mut img = Vec::with_capacity(width * height * 4);
    for _ in 0..width * height {
        img.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
    }
    img
}

/// Pink background with a lattice of purple "nuclei".
///
/// Nuclei sit on a `spacing`-pixel grid, are jittered by up to two pixels
/// and have radii between `min_radius` and `max_radius`. The jitter comes
/// from a fixed linear congruential sequence seeded with `seed`, so equal
/// arguments always give equal bytes.
pub fn nuclei_tile(
    width: usize,
    height: usize,
    spacing: usize,
    min_radius: usize,
    max_radius: usize,
    seed: u32,
) -> Vec<u8> {
    assert!(spacing >= 2 * max_radius + 8, "nuclei must not touch");
    assert!(min_radius > 0 && min_radius <= max_radius, "invalid radii");
    let mut img = uniform_rgba(width, height, BACKGROUND);
    let mut state = seed;
    let mut next = |modulus: usize| {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        (state >> 16) as usize % modulus
    };

    let half = spacing / 2;
    for gy in 0..height / spacing {
        for gx in 0..width / spacing {
            let cx = (gx * spacing + half + next(5)) as isize - 2;
            let cy = (gy * spacing + half + next(5)) as isize - 2;
            let r = (min_radius + next(max_radius - min_radius + 1)) as isize;
            for y in (cy - r).max(0)..=(cy + r).min(height as isize - 1) {
                for x in (cx - r).max(0)..=(cx + r).min(width as isize - 1) {
                    let (dx, dy) = (x - cx, y - cy);
                    if dx * dx + dy * dy <= r * r {
                        let idx = (y as usize * width + x as usize) * 4;
                        img[idx..idx + 3].copy_from_slice(&NUCLEUS);
                    }
                }
            }
        }
    }
    img
}
