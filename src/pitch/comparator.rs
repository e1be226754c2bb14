/// Returned when a cents error cannot be computed (non-positive or non-finite input).
pub const NO_SIGNAL_CENTS: f64 = 1e9;

const OCTAVE_CENTS: f64 = 1200.0;
const HALF_OCTAVE_CENTS: f64 = 600.0;

/// Convert a frequency to a fractional MIDI number (A4 = 440 Hz = 69).
/// Callers must filter `hz <= 0` first; the result is meaningless there.
pub fn hz_to_midi(hz: f64) -> f64 {
    69.0 + 12.0 * (hz / 440.0).log2()
}

/// Signed distance in cents from `hz` to `target`, without octave folding.
pub fn raw_cents_error(hz: f64, target: i32) -> f64 {
    if hz <= 0.0 {
        return NO_SIGNAL_CENTS;
    }
    100.0 * (hz_to_midi(hz) - target as f64)
}

/// Fold any cents value into `[-600, 600)`.
///   +1200 -> 0, +700 -> -500, -1300 -> -100
pub fn fold_to_octave_window(cents: f64) -> f64 {
    if !cents.is_finite() {
        return NO_SIGNAL_CENTS;
    }
    let folded = ((cents + HALF_OCTAVE_CENTS) % OCTAVE_CENTS + OCTAVE_CENTS) % OCTAVE_CENTS
        - HALF_OCTAVE_CENTS;
    // Float rounding can land exactly on the open upper bound.
    if folded >= HALF_OCTAVE_CENTS {
        folded - OCTAVE_CENTS
    } else {
        folded
    }
}

/// Octave-agnostic cents error used for scoring: a note played one or more octaves
/// away from `target` reads as its deviation from the nearest octave-equivalent.
pub fn cents_error(hz: f64, target: i32) -> f64 {
    fold_to_octave_window(raw_cents_error(hz, target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hz_to_midi_reference_points() {
        assert!((hz_to_midi(440.0) - 69.0).abs() < 1e-9);
        assert!((hz_to_midi(261.6256) - 60.0).abs() < 1e-4);
        // Bass low E
        assert!((hz_to_midi(41.2034) - 28.0).abs() < 1e-4);
    }

    #[test]
    fn test_fold_examples() {
        assert_eq!(fold_to_octave_window(1200.0), 0.0);
        assert_eq!(fold_to_octave_window(700.0), -500.0);
        assert_eq!(fold_to_octave_window(-1300.0), -100.0);
        assert_eq!(fold_to_octave_window(600.0), -600.0);
        assert_eq!(fold_to_octave_window(-600.0), -600.0);
        assert_eq!(fold_to_octave_window(599.0), 599.0);
    }

    #[test]
    fn test_fold_non_finite() {
        assert_eq!(fold_to_octave_window(f64::NAN), NO_SIGNAL_CENTS);
        assert_eq!(fold_to_octave_window(f64::INFINITY), NO_SIGNAL_CENTS);
    }

    #[test]
    fn test_octave_invariance() {
        assert_eq!(cents_error(440.0, 69), 0.0);
        assert!(cents_error(880.0, 69).abs() < 1e-9);
        assert!(cents_error(220.0, 69).abs() < 1e-9);
        assert!(cents_error(110.0, 81).abs() < 1e-9);
    }

    #[test]
    fn test_signed_error() {
        // One semitone above A4 is +100 cents from A
        let sharp = cents_error(466.1638, 69);
        assert!((sharp - 100.0).abs() < 0.01, "got {}", sharp);
        let flat = cents_error(415.3047, 69);
        assert!((flat + 100.0).abs() < 0.01, "got {}", flat);
    }

    #[test]
    fn test_tritone_reads_as_lower_bound() {
        // Exactly six semitones away folds to -600, never +600.
        let err = cents_error(440.0, 63);
        assert!(err >= -600.0 && err < 600.0);
        assert!((err.abs() - 600.0).abs() < 1e-6);
    }

    #[test]
    fn test_non_positive_hz_is_sentinel() {
        assert_eq!(raw_cents_error(0.0, 60), NO_SIGNAL_CENTS);
        assert_eq!(raw_cents_error(-5.0, 60), NO_SIGNAL_CENTS);
    }

    proptest! {
        #[test]
        fn prop_cents_error_in_window(hz in 1.0f64..20_000.0, target in 0i32..128) {
            let err = cents_error(hz, target);
            prop_assert!(err >= -600.0 && err < 600.0, "err {} out of range", err);
        }

        #[test]
        fn prop_cents_error_octave_invariant(hz in 20.0f64..5_000.0, target in 20i32..100) {
            let a = cents_error(hz, target);
            let b = cents_error(hz * 2.0, target);
            // Equal up to float noise, or on opposite sides of the fold seam.
            let diff = (a - b).abs();
            prop_assert!(diff < 1e-6 || (diff - 1200.0).abs() < 1e-6, "{} vs {}", a, b);
        }
    }
}
