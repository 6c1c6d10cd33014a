use pwaint::*;

use assert_approx_eq::assert_approx_eq;
use num_complex::Complex64;
use rand::Rng;
use rand_pcg::Pcg64;

fn rng() -> Pcg64 {
    Pcg64::new(0xcafef00dd15ea5e5, 0xa02bdbf7bb3c0a7ac28fa16a64abf96)
}

/// Events `(bin, weight)` with random weights in `[0, 1)` and bins in `[1, num_bins]`.
fn random_events(n_pts: usize, num_bins: usize) -> Vec<Vec<f64>> {
    let mut rng = rng();

    (0..n_pts)
        .map(|_| {
            let bin = rng.gen_range(1, num_bins + 1);
            vec![bin as f64, rng.gen::<f64>()]
        })
        .collect()
}

#[test]
fn weighted_histogram() {
    let events = vec![vec![1.0, 1.0], vec![2.0, 2.0], vec![1.0, 3.0]];
    let batch = PointBatch::from_events(events, 3, 1.0).unwrap();
    let classifier = FnIntegrand::new(2, |x: &[f64]| Ok(x[0] as usize));
    let weight = FnIntegrand::new(2, |x: &[f64]| Ok(x[1]));

    let estimate = Integrator::new(())
        .integral_b_w_pts(&classifier, &weight, 2, &batch)
        .unwrap();

    let halves = estimate.halves();
    assert_eq!(halves[0].calls(), 1);
    assert_eq!(halves[1].calls(), 2);

    let totals = halves[0]
        .sum()
        .iter()
        .zip(halves[1].sum())
        .map(|(a, b)| a + b)
        .collect::<Vec<_>>();
    assert_eq!(totals, vec![4.0, 2.0]);

    // each half is scaled with 2 / n_pts
    assert_approx_eq!(estimate.value()[0], 4.0 / 3.0);
    assert_approx_eq!(estimate.value()[1], 2.0 / 3.0);
    assert_approx_eq!(estimate.error()[0], 2.0 / 3.0);
    assert_approx_eq!(estimate.error()[1], 2.0 / 3.0);
}

#[test]
fn histogram_conserves_weights() {
    const N_PTS: usize = 1_001;
    const NUM_BINS: usize = 7;

    let events = random_events(N_PTS, NUM_BINS);
    let total_weight: f64 = events.iter().map(|event| event[1]).sum();
    let batch = PointBatch::from_events(events, N_PTS, 2.5).unwrap();

    let classifier = FnIntegrand::new(2, |x: &[f64]| Ok(x[0] as usize));
    let weight = FnIntegrand::new(2, |x: &[f64]| Ok(x[1]));

    let estimate = Integrator::new(())
        .with_cores(3)
        .integral_b_w_pts(&classifier, &weight, NUM_BINS, &batch)
        .unwrap();

    let binned_total: f64 = estimate
        .halves()
        .iter()
        .flat_map(|half| half.sum().iter())
        .sum();
    assert_approx_eq!(binned_total, total_weight, 1e-9);

    // the bins add up to the unbinned integral
    let unbinned = Integrator::new(())
        .integral_w_pts(&weight, &batch)
        .unwrap();
    assert_approx_eq!(
        estimate.value().iter().sum::<f64>(),
        *unbinned.value(),
        1e-9
    );
}

#[test]
fn tensor_product_of_events() {
    // events on a regular grid of [0, 1), which integrate the waves exactly
    const N_PTS: u32 = 1_000;

    let events = (0..N_PTS)
        .map(|i| vec![(f64::from(i) + 0.5) / f64::from(N_PTS)])
        .collect();
    let batch = PointBatch::from_events(events, N_PTS as usize, 1.0).unwrap();
    let amplitudes = FnIntegrand::new(1, |x: &[f64]| {
        Ok(vec![
            Complex64::new(1.0, 0.0),
            Complex64::from_polar(1.0, 2.0 * std::f64::consts::PI * x[0]),
        ])
    });

    let estimate = Integrator::new(())
        .integral_of_tensor_product_w_pts(&amplitudes, &batch)
        .unwrap();
    let value = estimate.value();

    assert_approx_eq!(value[(0, 0)].re, 1.0, 1e-12);
    assert_approx_eq!(value[(1, 1)].re, 1.0, 1e-12);
    assert_approx_eq!(value[(0, 1)].norm(), 0.0, 1e-12);
    assert_eq!(value[(0, 1)], value[(1, 0)].conj());
}

#[test]
fn binned_function_times_amplitudes() {
    const N_PTS: usize = 500;
    const NUM_BINS: usize = 4;

    let events = random_events(N_PTS, NUM_BINS);
    let batch = PointBatch::from_rows(
        vec![
            events.iter().map(|event| event[0]).collect(),
            events.iter().map(|event| event[1]).collect(),
        ],
        N_PTS,
        1.0,
    )
    .unwrap();

    let classifier = FnIntegrand::new(2, |x: &[f64]| Ok(x[0] as usize));
    let binned_value = FnIntegrand::new(2, |x: &[f64]| Ok(Complex64::new(0.0, x[0])));
    let amplitudes = FnIntegrand::new(2, |x: &[f64]| {
        Ok(vec![Complex64::new(x[1], 0.0), Complex64::new(1.0, 1.0)])
    });

    let estimate = Integrator::new(())
        .integral_b_tensor_func_w_pts(&classifier, &binned_value, NUM_BINS, &amplitudes, &batch)
        .unwrap();

    assert_eq!(estimate.value().shape(), (2, NUM_BINS));

    // compute the expected matrix directly from the events
    let mut expected = vec![vec![Complex64::new(0.0, 0.0); NUM_BINS]; 2];
    for event in &events {
        let bin = event[0] as usize;
        let g = Complex64::new(0.0, event[0]).conj();
        expected[0][bin - 1] += g * event[1];
        expected[1][bin - 1] += g * Complex64::new(1.0, 1.0);
    }

    for (r, row) in expected.iter().enumerate() {
        for (b, sum) in row.iter().enumerate() {
            let value = estimate.value()[(r, b)];
            assert_approx_eq!(value.re, sum.re / N_PTS as f64, 1e-12);
            assert_approx_eq!(value.im, sum.im / N_PTS as f64, 1e-12);
        }
    }
}

#[test]
fn two_binned_functions() {
    let events = vec![
        vec![1.0, 2.0],
        vec![2.0, 1.0],
        vec![1.0, 1.0],
        vec![1.0, 2.0],
    ];
    let batch = PointBatch::from_events(events, 4, 1.0).unwrap();

    let first = FnIntegrand::new(2, |x: &[f64]| Ok(x[0] as usize));
    let second = FnIntegrand::new(2, |x: &[f64]| Ok(x[1] as usize));
    let g = FnIntegrand::new(2, |_: &[f64]| Ok(Complex64::new(0.0, 1.0)));
    let h = FnIntegrand::new(2, |_: &[f64]| Ok(Complex64::new(2.0, 0.0)));

    let estimate = Integrator::new(())
        .integral_b_tensor_b_w_pts((&first, &g, 2), (&second, &h, 3), &batch)
        .unwrap();
    let value = estimate.value();

    assert_eq!(value.shape(), (2, 3));

    // conj(i) * 2 = -2i per event, scaled with 1 / n_pts
    assert_eq!(value[(0, 1)], Complex64::new(0.0, -1.0));
    assert_eq!(value[(0, 0)], Complex64::new(0.0, -0.5));
    assert_eq!(value[(1, 0)], Complex64::new(0.0, -0.5));
    assert_eq!(value[(1, 1)], Complex64::new(0.0, 0.0));
    assert_eq!(value[(0, 2)], Complex64::new(0.0, 0.0));
}

#[test]
fn classifier_out_of_range() {
    let batch = PointBatch::from_events(vec![vec![0.5]; 4], 4, 1.0).unwrap();
    let classifier = FnIntegrand::new(1, |_: &[f64]| Ok(5));
    let weight = FnIntegrand::new(1, |_: &[f64]| Ok(1.0));

    let result = Integrator::new(()).integral_b_w_pts(&classifier, &weight, 4, &batch);

    assert!(matches!(
        result,
        Err(Error::BinIndex {
            bin: 5,
            num_bins: 4
        })
    ));
}
