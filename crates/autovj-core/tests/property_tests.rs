use autovj_core::bands::{band_for_bin, cutoff_bins};
use autovj_core::{
    impact_delta, remap, BandAggregator, BandConfig, BandEnergies, OnePole, StrobeTimer,
};
use proptest::prelude::*;

proptest! {
    #[test]
    fn cutoffs_are_in_range_and_partition_bins(
        sample_rate in 1.0f32..400_000.0,
        bin_count in 1usize..4096,
    ) {
        let crossovers = BandConfig::default().crossovers_hz;
        let cutoffs = cutoff_bins(&crossovers, sample_rate, bin_count);

        for cutoff in cutoffs {
            prop_assert!(cutoff < bin_count);
        }
        for pair in cutoffs.windows(2) {
            prop_assert!(pair[0] <= pair[1]);
        }

        // Every bin maps to exactly one band and bands never go backwards
        let mut previous = 0;
        for i in 0..bin_count {
            let band = band_for_bin(i, &cutoffs).index();
            prop_assert!(band >= previous);
            previous = band;
        }
    }

    #[test]
    fn silent_spectrum_gives_zero_energy(
        sample_rate in 1.0f32..200_000.0,
        bin_count in 1usize..2048,
        gain in 0.0f32..5.0,
        tilt in 0.0f32..50.0,
    ) {
        let aggregator = BandAggregator::new(BandConfig {
            tilt,
            ..BandConfig::default()
        });
        let bins = vec![0.0; bin_count];
        prop_assert_eq!(aggregator.aggregate(&bins, sample_rate, gain), BandEnergies::ZERO);
    }

    #[test]
    fn band_energies_are_finite_and_non_negative(
        bins in prop::collection::vec(prop::num::f32::ANY, 1..1024),
        sample_rate in prop::num::f32::ANY,
        gain in prop::num::f32::ANY,
    ) {
        let energies = BandAggregator::default().aggregate(&bins, sample_rate, gain);
        for value in energies.to_array() {
            prop_assert!(value.is_finite());
            prop_assert!(value >= 0.0);
        }
    }

    #[test]
    fn impact_delta_is_never_negative(
        fast in prop::num::f32::ANY,
        baseline in prop::num::f32::ANY,
        margin in prop::num::f32::ANY,
    ) {
        let delta = impact_delta(fast, baseline, margin);
        prop_assert!(delta >= 0.0);
        prop_assert!(!delta.is_nan());
    }

    #[test]
    fn smoothing_converges_without_overshoot(
        target in 0.0f32..100.0,
        alpha in 0.01f32..=1.0,
    ) {
        let mut pole = OnePole::new(0.0, alpha);
        let mut previous = 0.0;
        for _ in 0..2000 {
            let value = pole.step(target);
            let slack = 1e-6 * target.max(1.0);
            prop_assert!(value >= previous - slack);
            prop_assert!(value <= target + slack);
            previous = value;
        }
        prop_assert!((previous - target).abs() <= 1e-3 * target.max(1.0));
    }

    #[test]
    fn strobe_lasts_exactly_ceil_of_inverse_step(step in 0.01f32..=1.0) {
        let mut timer = StrobeTimer::new(step);
        timer.trigger();
        let ticks = (1.0 / step).ceil() as u32;
        for _ in 1..ticks {
            prop_assert!(timer.tick() > 0.0);
        }
        prop_assert_eq!(timer.tick(), 0.0);
        for _ in 0..5 {
            prop_assert_eq!(timer.tick(), 0.0);
        }
    }

    #[test]
    fn remap_hits_endpoints_and_is_monotonic(
        in_lo in -100.0f32..100.0,
        width in 0.01f32..100.0,
        out_lo in -1000.0f32..1000.0,
        out_hi in -1000.0f32..1000.0,
        a in -500.0f32..500.0,
        b in -500.0f32..500.0,
    ) {
        let in_hi = in_lo + width;
        prop_assert_eq!(remap(in_lo - 1.0, in_lo, in_hi, out_lo, out_hi), out_lo);
        prop_assert_eq!(remap(in_lo, in_lo, in_hi, out_lo, out_hi), out_lo);
        prop_assert_eq!(remap(in_hi, in_lo, in_hi, out_lo, out_hi), out_hi);
        prop_assert_eq!(remap(in_hi + 1.0, in_lo, in_hi, out_lo, out_hi), out_hi);

        let (x, y) = if a <= b { (a, b) } else { (b, a) };
        let rx = remap(x, in_lo, in_hi, out_lo, out_hi);
        let ry = remap(y, in_lo, in_hi, out_lo, out_hi);
        if out_lo <= out_hi {
            prop_assert!(rx <= ry);
        } else {
            prop_assert!(rx >= ry);
        }
        let (lo, hi) = if out_lo <= out_hi { (out_lo, out_hi) } else { (out_hi, out_lo) };
        prop_assert!(rx >= lo && rx <= hi);
    }
}
