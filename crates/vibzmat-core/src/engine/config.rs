use thiserror::Error;

/// Frequencies with an absolute value at or below this (cm⁻¹) count as zero.
pub const DEFAULT_ZERO_THRESHOLD: f64 = 1e-8;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Options for building a Cartesian mode set from a Molden file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VibrationConfig {
    /// Index assigned to the first mode in `[FREQ]`.
    pub start_index: usize,
    /// Drop modes whose frequency is zero (translations and rotations).
    pub exclude_trans_rot: bool,
    pub zero_threshold: f64,
}

impl Default for VibrationConfig {
    fn default() -> Self {
        Self {
            start_index: 0,
            exclude_trans_rot: true,
            zero_threshold: DEFAULT_ZERO_THRESHOLD,
        }
    }
}

#[derive(Default)]
pub struct VibrationConfigBuilder {
    start_index: Option<usize>,
    exclude_trans_rot: Option<bool>,
    zero_threshold: Option<f64>,
}

impl VibrationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_index(mut self, index: usize) -> Self {
        self.start_index = Some(index);
        self
    }
    pub fn exclude_trans_rot(mut self, exclude: bool) -> Self {
        self.exclude_trans_rot = Some(exclude);
        self
    }
    pub fn zero_threshold(mut self, threshold: f64) -> Self {
        self.zero_threshold = Some(threshold);
        self
    }

    pub fn build(self) -> Result<VibrationConfig, ConfigError> {
        let defaults = VibrationConfig::default();
        let zero_threshold = self.zero_threshold.unwrap_or(defaults.zero_threshold);
        if !zero_threshold.is_finite() || zero_threshold < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "zero_threshold",
                reason: format!("must be a finite non-negative number, got {}", zero_threshold),
            });
        }
        Ok(VibrationConfig {
            start_index: self.start_index.unwrap_or(defaults.start_index),
            exclude_trans_rot: self.exclude_trans_rot.unwrap_or(defaults.exclude_trans_rot),
            zero_threshold,
        })
    }
}

/// Coordinate frame in which a mode is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationFrame {
    /// Reference plus the scaled Cartesian displacement.
    #[default]
    Cartesian,
    /// Reference Z-matrix plus the scaled internal displacement, rebuilt in Cartesians.
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationConfig {
    pub mode: usize,
    pub max_amplitude: f64,
    pub steps: usize,
    pub frame: AnimationFrame,
}

#[derive(Default)]
pub struct AnimationConfigBuilder {
    mode: Option<usize>,
    max_amplitude: Option<f64>,
    steps: Option<usize>,
    frame: Option<AnimationFrame>,
}

impl AnimationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: usize) -> Self {
        self.mode = Some(mode);
        self
    }
    pub fn max_amplitude(mut self, amplitude: f64) -> Self {
        self.max_amplitude = Some(amplitude);
        self
    }
    pub fn steps(mut self, steps: usize) -> Self {
        self.steps = Some(steps);
        self
    }
    pub fn frame(mut self, frame: AnimationFrame) -> Self {
        self.frame = Some(frame);
        self
    }

    pub fn build(self) -> Result<AnimationConfig, ConfigError> {
        let max_amplitude = self
            .max_amplitude
            .ok_or(ConfigError::MissingParameter("max_amplitude"))?;
        if !max_amplitude.is_finite() || max_amplitude < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "max_amplitude",
                reason: format!("must be a finite non-negative number, got {}", max_amplitude),
            });
        }
        let steps = self.steps.ok_or(ConfigError::MissingParameter("steps"))?;
        if steps == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "steps",
                reason: "at least one frame is required".to_string(),
            });
        }
        Ok(AnimationConfig {
            mode: self.mode.ok_or(ConfigError::MissingParameter("mode"))?,
            max_amplitude,
            steps,
            frame: self.frame.unwrap_or_default(),
        })
    }
}
