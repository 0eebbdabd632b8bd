use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One channel's dominant-bin criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelCriterion {
    pub channel: usize,
    pub bins: usize,
    pub top_k: usize,
}

impl ChannelCriterion {
    pub fn new(channel: usize, bins: usize, top_k: usize) -> Self {
        Self { channel, bins, top_k }
    }

    pub fn validate(&self, n_channels: usize) -> Result<()> {
        if self.bins == 0 {
            return Err(Error::invalid("bins", self.bins));
        }
        if self.top_k == 0 {
            return Err(Error::invalid("top_k", self.top_k));
        }
        if self.channel >= n_channels {
            return Err(Error::invalid(
                "channel",
                format!("{} (stack has {} channels)", self.channel, n_channels),
            ));
        }
        Ok(())
    }
}

/// Co-filter over several channels. `bins`/`top_k` are shared unless a channel has an override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntersectionParams {
    pub channels: Vec<usize>,
    pub bins: usize,
    pub top_k: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<ChannelCriterion>,
}

impl IntersectionParams {
    pub fn criteria(&self) -> Vec<ChannelCriterion> {
        self.channels
            .iter()
            .map(|&channel| {
                self.overrides
                    .iter()
                    .find(|o| o.channel == channel)
                    .copied()
                    .unwrap_or(ChannelCriterion::new(channel, self.bins, self.top_k))
            })
            .collect()
    }
}

/// Single diagnostic-channel filter feeding the coverage half of the blend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorParams {
    pub channel: usize,
    pub bins: usize,
    pub top_k: usize,
}

impl PriorParams {
    pub fn criterion(&self) -> ChannelCriterion {
        ChannelCriterion::new(self.channel, self.bins, self.top_k)
    }
}

/// Share of each population drawn into the final dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendParams {
    pub intersection_fraction: f64,
    pub prior_fraction: f64,
}

/// Per-region dataset build parameters suitable for config files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetParams {
    /// Target values marking missing ground truth
    #[serde(default)]
    pub sentinels: Vec<f64>,
    pub intersection: IntersectionParams,
    pub prior: PriorParams,
    pub blend: BlendParams,
    /// Standard deviation of the Gaussian noise added to the blended targets
    pub noise_std: f64,
    /// Single seed governing every random draw of the run
    pub seed: u64,
}

impl Default for DatasetParams {
    fn default() -> Self {
        Self {
            sentinels: Vec::new(),
            intersection: IntersectionParams {
                channels: vec![7, 9, 10],
                bins: 30,
                top_k: 5,
                overrides: Vec::new(),
            },
            prior: PriorParams {
                channel: 9,
                bins: 100,
                top_k: 7,
            },
            blend: BlendParams {
                intersection_fraction: 0.9,
                prior_fraction: 0.1,
            },
            noise_std: 1.75,
            seed: 42,
        }
    }
}

fn check_fraction(field: &'static str, value: f64) -> Result<()> {
    if !(value > 0.0 && value <= 1.0) {
        return Err(Error::invalid(field, value));
    }
    Ok(())
}

impl DatasetParams {
    /// Check every field against a stack of `n_channels` channels.
    pub fn validate(&self, n_channels: usize) -> Result<()> {
        if self.intersection.channels.is_empty() {
            return Err(Error::invalid("intersection.channels", "[]"));
        }
        for o in &self.intersection.overrides {
            if !self.intersection.channels.contains(&o.channel) {
                return Err(Error::invalid(
                    "intersection.overrides",
                    format!("channel {} is not filtered", o.channel),
                ));
            }
        }
        for criterion in self.intersection.criteria() {
            criterion.validate(n_channels)?;
        }
        self.prior.criterion().validate(n_channels)?;

        check_fraction("blend.intersection_fraction", self.blend.intersection_fraction)?;
        check_fraction("blend.prior_fraction", self.blend.prior_fraction)?;

        if !self.noise_std.is_finite() || self.noise_std < 0.0 {
            return Err(Error::invalid("noise_std", self.noise_std));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn default_params_fit_twelve_channel_stack() {
        DatasetParams::default().validate(12).unwrap();
    }

    #[test]
    fn unknown_channel_is_rejected() {
        let err = DatasetParams::default().validate(9).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn fractions_must_lie_in_unit_interval() {
        let mut params = DatasetParams::default();
        params.blend.prior_fraction = 0.0;
        assert!(params.validate(12).is_err());

        params.blend.prior_fraction = 1.0;
        params.blend.intersection_fraction = 1.2;
        assert!(params.validate(12).is_err());

        params.blend.intersection_fraction = 1.0;
        params.validate(12).unwrap();
    }

    #[test]
    fn negative_noise_and_zero_bins_are_rejected() {
        let mut params = DatasetParams::default();
        params.noise_std = -0.1;
        assert!(params.validate(12).is_err());

        let mut params = DatasetParams::default();
        params.prior.bins = 0;
        assert!(params.validate(12).is_err());

        let mut params = DatasetParams::default();
        params.intersection.top_k = 0;
        assert!(params.validate(12).is_err());
    }

    #[test]
    fn overrides_replace_shared_settings() {
        let mut params = DatasetParams::default();
        params.intersection.overrides = vec![ChannelCriterion::new(9, 100, 8)];
        let criteria = params.intersection.criteria();
        assert_eq!(criteria[0], ChannelCriterion::new(7, 30, 5));
        assert_eq!(criteria[1], ChannelCriterion::new(9, 100, 8));
        params.validate(12).unwrap();

        params.intersection.overrides = vec![ChannelCriterion::new(3, 10, 2)];
        assert!(params.validate(12).is_err());
    }

    #[test]
    fn params_deserialize_without_optional_fields() {
        let json = r#"{
            "intersection": { "channels": [8, 9, 11], "bins": 100, "top_k": 5 },
            "prior": { "channel": 9, "bins": 100, "top_k": 7 },
            "blend": { "intersection_fraction": 0.9, "prior_fraction": 0.1 },
            "noise_std": 0.5,
            "seed": 7
        }"#;
        let params: DatasetParams = serde_json::from_str(json).unwrap();
        assert!(params.sentinels.is_empty());
        assert!(params.intersection.overrides.is_empty());
        params.validate(12).unwrap();
    }
}
