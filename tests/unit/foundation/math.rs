use super::*;

#[test]
fn lcg_is_reproducible_per_seed() {
    let mut a = Lcg::new(42);
    let mut b = Lcg::new(42);
    let xs: Vec<u32> = (0..8).map(|_| a.next_u32()).collect();
    let ys: Vec<u32> = (0..8).map(|_| b.next_u32()).collect();
    assert_eq!(xs, ys);

    let mut c = Lcg::new(43);
    assert_ne!(xs[0], c.next_u32());
}

#[test]
fn lcg_ranges_hold() {
    let mut rng = Lcg::new(7);
    for _ in 0..1000 {
        let f = rng.next_f64();
        assert!((0.0..1.0).contains(&f));
        let s = rng.next_signed();
        assert!((-1.0..1.0).contains(&s));
        assert!(rng.next_index(5) < 5);
    }
}

#[test]
fn tolerance_compare_ties_near_values() {
    assert_eq!(cmp_with_tolerance(1.0, 1.0 + 5e-7, 1e-6), Ordering::Equal);
    assert_eq!(cmp_with_tolerance(1.0, 1.0 + 2e-6, 1e-6), Ordering::Less);
    assert_eq!(cmp_with_tolerance(2.0, 1.0, 1e-6), Ordering::Greater);
}

#[test]
fn millisecond_deltas_are_rescaled() {
    assert_eq!(normalize_delta_secs(16.0), 0.016);
    assert_eq!(normalize_delta_secs(0.016), 0.016);
    assert_eq!(normalize_delta_secs(-1.0), 0.0);
    assert_eq!(normalize_delta_secs(f64::NAN), 0.0);
}
