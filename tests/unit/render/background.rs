use super::*;

fn spec(noise: f32, seed: u64) -> BackgroundSpec {
    BackgroundSpec {
        colors: [[200, 0, 0], [0, 200, 0], [0, 0, 200], [200, 200, 200]],
        noise,
        seed,
    }
}

fn close(a: [u8; 3], b: [u8; 3], tol: u8) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| x.abs_diff(*y) <= tol)
}

#[test]
fn same_seed_is_reproducible() {
    let a = Background::generate(&spec(8.0, 42), 64, 36).unwrap();
    let b = Background::generate(&spec(8.0, 42), 64, 36).unwrap();
    assert_eq!(a.rgba().as_raw(), b.rgba().as_raw());
}

#[test]
fn different_seeds_give_different_noise() {
    let a = Background::generate(&spec(8.0, 1), 64, 36).unwrap();
    let b = Background::generate(&spec(8.0, 2), 64, 36).unwrap();
    assert_ne!(a.rgba().as_raw(), b.rgba().as_raw());
}

#[test]
fn output_is_full_size_and_opaque() {
    let bg = Background::generate(&spec(8.0, 3), 100, 50).unwrap();
    assert_eq!(bg.dimensions(), (100, 50));
    assert_eq!(bg.opaque().dimensions(), (100, 50));
    assert!(bg.rgba().pixels().all(|p| p.0[3] == 255));

    let Rgba([r, g, b, _]) = *bg.rgba().get_pixel(17, 9);
    assert_eq!(bg.opaque().get_pixel(17, 9).0, [r, g, b]);
}

#[test]
fn noiseless_gradient_keeps_corner_colors() {
    let s = spec(0.0, 0);
    let bg = Background::generate(&s, 64, 64).unwrap();
    let img = bg.opaque();
    assert!(close(img.get_pixel(0, 0).0, s.colors[0], 2));
    assert!(close(img.get_pixel(63, 0).0, s.colors[1], 2));
    assert!(close(img.get_pixel(0, 63).0, s.colors[2], 2));
    assert!(close(img.get_pixel(63, 63).0, s.colors[3], 2));
}

#[test]
fn zero_sized_background_is_rejected() {
    assert!(Background::generate(&spec(1.0, 0), 0, 10).is_err());
}

#[test]
fn noise_on_a_flat_background_has_the_configured_spread() {
    let flat = BackgroundSpec {
        colors: [[128, 128, 128]; 4],
        noise: 10.0,
        seed: 9,
    };
    let bg = Background::generate(&flat, 200, 100).unwrap();
    let samples: Vec<f64> = bg
        .opaque()
        .pixels()
        .flat_map(|p| p.0)
        .map(f64::from)
        .collect();
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let std = (samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n).sqrt();
    assert!((mean - 128.0).abs() < 0.5, "mean {mean}");
    assert!((std - 10.0).abs() < 0.5, "std {std}");
}
