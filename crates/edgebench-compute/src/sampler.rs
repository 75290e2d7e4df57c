//! Sampler policy for kernel image reads.
//!
//! The default matches what a 3x3 neighbourhood kernel needs at the image
//! border: clamp-to-edge addressing, nearest filtering, integer pixel
//! coordinates. Other policies can be selected through [`crate::RunConfig`].

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::{ComputeError, ComputeResult};

/// Out-of-range coordinate handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AddressingMode {
    /// Out-of-range reads are undefined.
    None,
    /// Out-of-range reads return the nearest edge pixel.
    #[default]
    ClampToEdge,
    /// Out-of-range reads return the border colour.
    Clamp,
    /// Coordinates wrap. Requires normalized coordinates.
    Repeat,
}

/// Texel filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterMode {
    #[default]
    Nearest,
    Linear,
}

/// Sampler created once per execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SamplerConfig {
    pub normalized_coords: bool,
    pub addressing: AddressingMode,
    pub filter: FilterMode,
}

impl SamplerConfig {
    /// Rejects combinations OpenCL refuses at sampler creation.
    pub fn validate(&self) -> ComputeResult<()> {
        if self.addressing == AddressingMode::Repeat && !self.normalized_coords {
            return Err(ComputeError::Config(
                "repeat addressing requires normalized coordinates".into(),
            ));
        }
        Ok(())
    }

    /// Settings that make `read_imagef` with integer coordinates undefined.
    ///
    /// OpenCL only defines integer-coordinate reads for nearest filtering
    /// with unnormalized coordinates. Sampler creation still succeeds, so
    /// these are reported rather than rejected.
    pub fn integer_read_conflicts(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.filter == FilterMode::Linear {
            out.push("linear filtering is undefined for integer-coordinate image reads");
        }
        if self.normalized_coords {
            out.push("normalized coordinates are undefined for integer-coordinate image reads");
        }
        out
    }
}

impl FromStr for AddressingMode {
    type Err = ComputeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "none" => Ok(Self::None),
            "clamp-to-edge" | "edge" => Ok(Self::ClampToEdge),
            "clamp" | "border" => Ok(Self::Clamp),
            "repeat" | "wrap" => Ok(Self::Repeat),
            other => Err(ComputeError::Config(format!(
                "unknown addressing mode '{other}' (expected none, clamp-to-edge, clamp, repeat)"
            ))),
        }
    }
}

impl FromStr for FilterMode {
    type Err = ComputeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" | "point" => Ok(Self::Nearest),
            "linear" | "bilinear" => Ok(Self::Linear),
            other => Err(ComputeError::Config(format!(
                "unknown filter mode '{other}' (expected nearest, linear)"
            ))),
        }
    }
}

impl fmt::Display for AddressingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::ClampToEdge => "clamp-to-edge",
            Self::Clamp => "clamp",
            Self::Repeat => "repeat",
        })
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Nearest => "nearest",
            Self::Linear => "linear",
        })
    }
}
