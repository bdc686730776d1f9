//! Engine configuration file format.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use wavestack_core::{TableBank, Waveshape};
use wavestack_synth::{
    DEFAULT_BASE_FREQUENCY, DEFAULT_MASTER_AMPLITUDE, DEFAULT_STACK_AMPLITUDE, StackSettings,
    Synth,
};

use crate::error::ConfigError;
use crate::validation::{ValidationResult, validate_config};

/// Lowest accepted sample rate, in Hz.
pub const MIN_SAMPLE_RATE: u32 = 8000;
/// Highest accepted sample rate, in Hz.
pub const MAX_SAMPLE_RATE: u32 = 192_000;
/// Lowest accepted base frequency, in Hz.
pub const MIN_BASE_FREQUENCY: f64 = 1.0;
/// Highest accepted base frequency, in Hz.
pub const MAX_BASE_FREQUENCY: f64 = 1000.0;

/// Waveshape names as written in configuration files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveshapeName {
    /// `"sine"`
    #[default]
    Sine,
    /// `"triangle"` (or `"tri"`)
    #[serde(alias = "tri")]
    Triangle,
    /// `"sawtooth"` (or `"saw"`)
    #[serde(alias = "saw")]
    Sawtooth,
    /// `"square"`
    Square,
}

impl From<WaveshapeName> for Waveshape {
    fn from(name: WaveshapeName) -> Self {
        match name {
            WaveshapeName::Sine => Waveshape::Sine,
            WaveshapeName::Triangle => Waveshape::Triangle,
            WaveshapeName::Sawtooth => Waveshape::Sawtooth,
            WaveshapeName::Square => Waveshape::Square,
        }
    }
}

impl From<Waveshape> for WaveshapeName {
    fn from(shape: Waveshape) -> Self {
        match shape {
            Waveshape::Sine => WaveshapeName::Sine,
            Waveshape::Triangle => WaveshapeName::Triangle,
            Waveshape::Sawtooth => WaveshapeName::Sawtooth,
            Waveshape::Square => WaveshapeName::Square,
        }
    }
}

/// One voice stack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StackConfig {
    /// Disabled stacks stay silent.
    pub enabled: bool,
    /// Oscillator waveshape.
    pub waveshape: WaveshapeName,
    /// Unison voices, 1 to 8.
    pub voices: usize,
    /// Detune, 0 to 100 percent of a ±1 semitone spread.
    pub detune: f32,
    /// Stack gain, 0 to 1.
    pub amplitude: f32,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            waveshape: WaveshapeName::Sine,
            voices: 1,
            detune: 0.0,
            amplitude: DEFAULT_STACK_AMPLITUDE,
        }
    }
}

impl StackConfig {
    /// Engine settings for this stack.
    pub fn to_settings(&self) -> StackSettings {
        StackSettings {
            enabled: self.enabled,
            waveshape: self.waveshape.into(),
            voices: self.voices,
            detune: self.detune,
            amplitude: self.amplitude,
        }
    }
}

impl From<&StackSettings> for StackConfig {
    fn from(settings: &StackSettings) -> Self {
        Self {
            enabled: settings.enabled,
            waveshape: settings.waveshape.into(),
            voices: settings.voices,
            detune: settings.detune,
            amplitude: settings.amplitude,
        }
    }
}

/// Synthesizer engine configuration.
///
/// Holds the global parameters and one entry per active voice stack. The
/// number of entries is the number of stacks mixed (1 to 3).
///
/// # TOML Format
///
/// ```toml
/// sample_rate = 44100
/// base_frequency = 20.0
/// master_amplitude = 0.02
///
/// [[stacks]]
/// waveshape = "saw"
/// voices = 4
/// detune = 25.0
/// amplitude = 0.5
///
/// [[stacks]]
/// waveshape = "square"
/// enabled = false
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SynthConfig {
    /// Output sample rate in Hz.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Lowest pitch the wavetables keep every harmonic for, in Hz.
    #[serde(default = "default_base_frequency")]
    pub base_frequency: f64,

    /// Gain applied to the mixed stacks, 0 to 0.1.
    #[serde(default = "default_master_amplitude")]
    pub master_amplitude: f32,

    /// Voice stacks, mixed in order.
    #[serde(default = "default_stacks")]
    pub stacks: Vec<StackConfig>,
}

fn default_sample_rate() -> u32 {
    44100
}

fn default_base_frequency() -> f64 {
    DEFAULT_BASE_FREQUENCY
}

fn default_master_amplitude() -> f32 {
    DEFAULT_MASTER_AMPLITUDE
}

fn default_stacks() -> Vec<StackConfig> {
    vec![StackConfig::default()]
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            base_frequency: default_base_frequency(),
            master_amplitude: default_master_amplitude(),
            stacks: default_stacks(),
        }
    }
}

impl SynthConfig {
    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), stacks = config.stacks.len(), "loaded config");
        Ok(config)
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the configuration to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every field against its valid range.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_config(self)
    }

    /// Build the wavetables for this configuration's rates.
    pub fn build_bank(&self) -> Result<TableBank, ConfigError> {
        Ok(TableBank::build(
            self.base_frequency,
            f64::from(self.sample_rate),
        )?)
    }

    /// Validate, build tables, and return a fully configured engine.
    pub fn build_synth<const N: usize>(&self) -> Result<Synth<N>, ConfigError> {
        self.validate()?;
        let bank = self.build_bank()?;
        let mut synth = Synth::new(Arc::new(bank));
        self.apply_to(&mut synth);
        tracing::debug!(
            sample_rate = self.sample_rate,
            stacks = self.stacks.len(),
            "built synth from config"
        );
        Ok(synth)
    }

    /// Apply the stack and global parameters to an existing engine.
    ///
    /// Values are clamped by the engine; the table bank is left alone.
    pub fn apply_to<const N: usize>(&self, synth: &mut Synth<N>) {
        synth.set_stack_count(self.stacks.len());
        synth.set_master_amplitude(self.master_amplitude);
        for (i, stack) in self.stacks.iter().enumerate() {
            synth.apply_stack_settings(i, &stack.to_settings());
        }
    }

    /// Capture the current parameters of `synth`.
    pub fn from_synth<const N: usize>(synth: &Synth<N>) -> Self {
        let stacks = (0..synth.stack_count())
            .filter_map(|i| synth.stack_settings(i))
            .map(|s| StackConfig::from(&s))
            .collect();

        Self {
            sample_rate: synth.sample_rate() as u32,
            base_frequency: synth.bank().base_frequency(),
            master_amplitude: synth.master_amplitude(),
            stacks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SynthConfig::default();
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.base_frequency, 20.0);
        assert_eq!(config.master_amplitude, 0.02);
        assert_eq!(config.stacks, vec![StackConfig::default()]);
        assert_eq!(config.stacks[0].amplitude, 0.5);
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = SynthConfig::from_toml("").unwrap();
        assert_eq!(config, SynthConfig::default());
    }

    #[test]
    fn test_partial_stack_fills_defaults() {
        let config = SynthConfig::from_toml(
            r#"
            master_amplitude = 0.05

            [[stacks]]
            waveshape = "saw"
            voices = 3

            [[stacks]]
            waveshape = "tri"
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.master_amplitude, 0.05);
        assert_eq!(config.stacks.len(), 2);
        assert_eq!(config.stacks[0].waveshape, WaveshapeName::Sawtooth);
        assert_eq!(config.stacks[0].voices, 3);
        assert_eq!(config.stacks[0].amplitude, 0.5);
        assert_eq!(config.stacks[1].waveshape, WaveshapeName::Triangle);
        assert!(!config.stacks[1].enabled);
    }

    #[test]
    fn test_unknown_waveshape_rejected() {
        let err = SynthConfig::from_toml("[[stacks]]\nwaveshape = \"noise\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn test_to_toml_writes_canonical_names() {
        let mut config = SynthConfig::default();
        config.stacks[0].waveshape = WaveshapeName::Sawtooth;
        let text = config.to_toml().unwrap();
        assert!(text.contains("waveshape = \"sawtooth\""), "got:\n{text}");
        assert_eq!(SynthConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_build_synth_applies_stacks() {
        let config = SynthConfig {
            master_amplitude: 0.08,
            stacks: vec![
                StackConfig {
                    waveshape: WaveshapeName::Square,
                    voices: 4,
                    detune: 40.0,
                    ..StackConfig::default()
                },
                StackConfig {
                    enabled: false,
                    ..StackConfig::default()
                },
            ],
            ..SynthConfig::default()
        };

        let synth: Synth = config.build_synth().unwrap();
        assert_eq!(synth.stack_count(), 2);
        assert_eq!(synth.master_amplitude(), 0.08);
        let first = synth.stack_settings(0).unwrap();
        assert_eq!(first.waveshape, Waveshape::Square);
        assert_eq!(first.voices, 4);
        assert_eq!(first.detune, 40.0);
        assert!(!synth.stack_settings(1).unwrap().enabled);
    }

    #[test]
    fn test_build_synth_rejects_invalid() {
        let config = SynthConfig {
            stacks: vec![],
            ..SynthConfig::default()
        };
        assert!(matches!(
            config.build_synth::<8>(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_from_synth_roundtrip() {
        let config = SynthConfig {
            stacks: vec![
                StackConfig {
                    waveshape: WaveshapeName::Triangle,
                    voices: 2,
                    detune: 10.0,
                    amplitude: 0.3,
                    enabled: true,
                },
                StackConfig::default(),
            ],
            ..SynthConfig::default()
        };
        let synth: Synth = config.build_synth().unwrap();
        assert_eq!(SynthConfig::from_synth(&synth), config);
    }
}
