use crate::error::GenerateError;

/// Lower bound on the fall time derived from note motion.
pub const MIN_FALL_TIME: f64 = 0.001;

/// Upper bound on grid slots the count-in may fill.
pub const MAX_COUNT_IN_NOTES: f64 = 100_000.0;

/// Every knob of one generation call. The generator assumes no defaults;
/// callers build this from their own configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationParams {
    /// Analysis frame length in samples (power of two)
    pub fft_size: usize,
    /// Stride between analysis frames in samples
    pub hop_size: usize,
    /// Minimum onset-to-onset distance between main notes (seconds)
    pub min_note_spacing: f64,
    /// Accepted and validated, but detection uses a fixed threshold scale
    pub peak_threshold_multiplier: f64,
    /// Probability of dropping an onset that looks sustained
    pub sustained_suppress_factor: f64,
    /// Window centered on an onset used for the sustain score (seconds)
    pub sustained_energy_window: f64,
    pub bpm: f64,
    /// Grid subdivisions per beat
    pub quantize_divisions: f64,
    /// Count-in length before the song starts (seconds)
    pub count_in_time: f64,
    pub lane_count: usize,
    /// Time for a note to travel from spawn to the judgment line (seconds)
    pub fall_time: f64,
    pub enable_double_notes: bool,
    pub double_note_probability: f64,
    /// Onset energy a note must exceed to get a double
    pub min_energy_for_double_notes: f64,
    pub enable_end_filter: bool,
    pub seconds_before_end_to_stop: f64,
    /// Notes removed from the head of the finished beatmap
    pub early_notes_to_drop: usize,
}

impl GenerationParams {
    /// Spacing of the quantization grid in seconds.
    pub fn beat_interval(&self) -> f64 {
        60.0 / self.bpm / self.quantize_divisions
    }

    pub fn validate(&self) -> Result<(), GenerateError> {
        if !self.bpm.is_finite() || self.bpm <= 0.0 {
            return Err(GenerateError::InvalidBpm(self.bpm));
        }
        if self.fft_size < 2 || !self.fft_size.is_power_of_two() {
            return Err(GenerateError::InvalidFftSize(self.fft_size));
        }
        if self.hop_size == 0 {
            return Err(GenerateError::InvalidHopSize);
        }
        if self.lane_count == 0 {
            return Err(GenerateError::NoLanes);
        }
        if !self.quantize_divisions.is_finite() || self.quantize_divisions <= 0.0 {
            return Err(GenerateError::InvalidQuantizeDivisions(self.quantize_divisions));
        }

        non_negative("min_note_spacing", self.min_note_spacing)?;
        non_negative("count_in_time", self.count_in_time)?;
        non_negative("fall_time", self.fall_time)?;
        let count_in_slots = (self.count_in_time - self.fall_time).max(0.0) / self.beat_interval();
        if count_in_slots > MAX_COUNT_IN_NOTES {
            return Err(GenerateError::CountInTooDense(count_in_slots));
        }
        non_negative("sustained_energy_window", self.sustained_energy_window)?;
        non_negative("seconds_before_end_to_stop", self.seconds_before_end_to_stop)?;
        non_negative("peak_threshold_multiplier", self.peak_threshold_multiplier)?;
        non_negative("min_energy_for_double_notes", self.min_energy_for_double_notes)?;
        probability("sustained_suppress_factor", self.sustained_suppress_factor)?;
        probability("double_note_probability", self.double_note_probability)?;
        Ok(())
    }
}

/// Fall time of a note that travels `distance` at `speed` units per second.
pub fn fall_time_from_motion(distance: f64, speed: f64) -> f64 {
    if speed <= 0.0 {
        return MIN_FALL_TIME;
    }
    (distance / speed).max(MIN_FALL_TIME)
}

fn non_negative(name: &'static str, value: f64) -> Result<(), GenerateError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(GenerateError::InvalidParameter { name, value })
    }
}

fn probability(name: &'static str, value: f64) -> Result<(), GenerateError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(GenerateError::InvalidParameter { name, value })
    }
}

#[cfg(test)]
pub(crate) fn test_params(bpm: f64) -> GenerationParams {
    GenerationParams {
        fft_size: 1024,
        hop_size: 512,
        min_note_spacing: 0.08,
        peak_threshold_multiplier: 1.4,
        sustained_suppress_factor: 0.0,
        sustained_energy_window: 0.25,
        bpm,
        quantize_divisions: 4.0,
        count_in_time: 0.0,
        lane_count: 4,
        fall_time: 0.0,
        enable_double_notes: false,
        double_note_probability: 0.0,
        min_energy_for_double_notes: 0.1,
        enable_end_filter: false,
        seconds_before_end_to_stop: 0.0,
        early_notes_to_drop: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beat_interval_at_128() {
        let params = test_params(128.0);
        assert!((params.beat_interval() - 0.1171875).abs() < 1e-12);
    }

    #[test]
    fn rejects_invalid_core_values() {
        let mut p = test_params(0.0);
        assert_eq!(p.validate(), Err(GenerateError::InvalidBpm(0.0)));

        p = test_params(-3.0);
        assert_eq!(p.validate(), Err(GenerateError::InvalidBpm(-3.0)));

        p = test_params(120.0);
        p.fft_size = 1000;
        assert_eq!(p.validate(), Err(GenerateError::InvalidFftSize(1000)));

        p = test_params(120.0);
        p.lane_count = 0;
        assert_eq!(p.validate(), Err(GenerateError::NoLanes));

        p = test_params(120.0);
        p.hop_size = 0;
        assert_eq!(p.validate(), Err(GenerateError::InvalidHopSize));

        p = test_params(120.0);
        p.double_note_probability = 1.5;
        assert_eq!(
            p.validate(),
            Err(GenerateError::InvalidParameter {
                name: "double_note_probability",
                value: 1.5
            })
        );

        assert!(test_params(120.0).validate().is_ok());
    }

    #[test]
    fn rejects_runaway_count_in() {
        let mut p = test_params(120.0);
        p.count_in_time = 2.0;
        p.quantize_divisions = 1e9;
        assert!(matches!(p.validate(), Err(GenerateError::CountInTooDense(_))));

        p = test_params(1e300);
        p.count_in_time = 2.0;
        assert!(matches!(p.validate(), Err(GenerateError::CountInTooDense(_))));

        // A dense grid is fine when the fall time swallows the count-in.
        p = test_params(120.0);
        p.count_in_time = 2.0;
        p.fall_time = 2.0;
        p.quantize_divisions = 1e9;
        assert!(p.validate().is_ok());
    }

    #[test]
    fn fall_time_has_floor() {
        assert_eq!(fall_time_from_motion(10.0, 5.0), 2.0);
        assert_eq!(fall_time_from_motion(0.0, 5.0), MIN_FALL_TIME);
        assert_eq!(fall_time_from_motion(10.0, 0.0), MIN_FALL_TIME);
    }
}
