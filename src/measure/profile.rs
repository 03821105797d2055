//! Emulation profile for a measurement
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Emulated device class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Device {
    #[default]
    Desktop,
    Mobile,
}

impl Device {
    /// User agent sent by HTTP-level capabilities for this device
    pub fn user_agent(&self) -> &'static str {
        match self {
            Self::Desktop => {
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36"
            }
            Self::Mobile => {
                "Mozilla/5.0 (Linux; Android 13; Pixel 7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Mobile Safari/537.36"
            }
        }
    }

    /// Viewport size in CSS pixels (width, height)
    pub fn viewport(&self) -> (u32, u32) {
        match self {
            Self::Desktop => (1350, 940),
            Self::Mobile => (412, 823),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Mobile => "mobile",
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Device {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "desktop" => Ok(Self::Desktop),
            "mobile" => Ok(Self::Mobile),
            other => Err(format!("unknown device '{}' (expected desktop or mobile)", other)),
        }
    }
}

/// Emulated network conditions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkProfile {
    #[default]
    #[serde(rename = "unthrottled")]
    Unthrottled,
    #[serde(rename = "cable")]
    Cable,
    #[serde(rename = "fast-3g")]
    Fast3g,
    #[serde(rename = "slow-3g")]
    Slow3g,
}

impl NetworkProfile {
    /// Added round-trip latency in milliseconds
    pub fn latency_ms(&self) -> u32 {
        match self {
            Self::Unthrottled => 0,
            Self::Cable => 28,
            Self::Fast3g => 150,
            Self::Slow3g => 400,
        }
    }

    /// Download throughput cap in kbit/s, `None` when unthrottled
    pub fn download_kbps(&self) -> Option<u32> {
        match self {
            Self::Unthrottled => None,
            Self::Cable => Some(5_000),
            Self::Fast3g => Some(1_600),
            Self::Slow3g => Some(400),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Unthrottled => "unthrottled",
            Self::Cable => "cable",
            Self::Fast3g => "fast-3g",
            Self::Slow3g => "slow-3g",
        }
    }
}

impl fmt::Display for NetworkProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NetworkProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unthrottled" | "none" => Ok(Self::Unthrottled),
            "cable" => Ok(Self::Cable),
            "fast-3g" | "fast3g" => Ok(Self::Fast3g),
            "slow-3g" | "slow3g" => Ok(Self::Slow3g),
            other => Err(format!(
                "unknown network profile '{}' (expected unthrottled, cable, fast-3g or slow-3g)",
                other
            )),
        }
    }
}

/// Device, network and CPU emulation applied to one page load
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasurementProfile {
    pub device: Device,
    pub network: NetworkProfile,
    /// CPU slowdown multiplier; 1.0 means no throttling
    pub cpu_throttle: f64,
}

impl Default for MeasurementProfile {
    fn default() -> Self {
        Self {
            device: Device::Desktop,
            network: NetworkProfile::Unthrottled,
            cpu_throttle: 1.0,
        }
    }
}

impl fmt::Display for MeasurementProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {} / {}x CPU",
            self.device, self.network, self.cpu_throttle
        )
    }
}
