//! # Unit Types
//!
//! Type-safe wrappers for the SI units used in ground engineering. They are
//! plain f64 newtypes so JSON stays clean (just numbers) while the arithmetic
//! inside the stress and rock-mass calculations cannot mix kPa with MPa.
//!
//! ## Units
//!
//! - Length: metres (m)
//! - Stress: kilopascals (kPa), megapascals (MPa), gigapascals (GPa)
//! - Unit weight: kilonewtons per cubic metre (kN/m³)
//! - Angles: degrees, radians
//!
//! Unit weight times thickness gives stress:
//!
//! ```rust
//! use ground_core::units::{KnPerM3, Kpa, Metres};
//!
//! let sigma: Kpa = KnPerM3(19.0) * Metres(2.0);
//! assert_eq!(sigma.0, 38.0);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

// ============================================================================
// Length
// ============================================================================

/// Length or depth in metres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metres(pub f64);

// ============================================================================
// Stress
// ============================================================================

/// Stress in kilopascals (kPa)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kpa(pub f64);

/// Stress in megapascals (MPa)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mpa(pub f64);

/// Modulus in gigapascals (GPa)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Gpa(pub f64);

impl From<Mpa> for Kpa {
    fn from(mpa: Mpa) -> Self {
        Kpa(mpa.0 * 1000.0)
    }
}

impl From<Kpa> for Mpa {
    fn from(kpa: Kpa) -> Self {
        Mpa(kpa.0 / 1000.0)
    }
}

impl From<Gpa> for Mpa {
    fn from(gpa: Gpa) -> Self {
        Mpa(gpa.0 * 1000.0)
    }
}

impl From<Mpa> for Gpa {
    fn from(mpa: Mpa) -> Self {
        Gpa(mpa.0 / 1000.0)
    }
}

// ============================================================================
// Unit Weight
// ============================================================================

/// Unit weight in kN/m³
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KnPerM3(pub f64);

impl Mul<Metres> for KnPerM3 {
    type Output = Kpa;
    fn mul(self, rhs: Metres) -> Kpa {
        Kpa(self.0 * rhs.0)
    }
}

// ============================================================================
// Angles
// ============================================================================

/// Angle in degrees
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Degrees(pub f64);

/// Angle in radians
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Radians(pub f64);

impl From<Degrees> for Radians {
    fn from(deg: Degrees) -> Self {
        Radians(deg.0.to_radians())
    }
}

impl From<Radians> for Degrees {
    fn from(rad: Radians) -> Self {
        Degrees(rad.0.to_degrees())
    }
}

impl Radians {
    pub fn sin(self) -> f64 {
        self.0.sin()
    }

    pub fn cos(self) -> f64 {
        self.0.cos()
    }

    pub fn tan(self) -> f64 {
        self.0.tan()
    }
}

// ============================================================================
// Arithmetic Implementations (macro to reduce boilerplate)
// ============================================================================

macro_rules! impl_arithmetic {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl $type {
            /// Get the raw f64 value
            pub fn value(self) -> f64 {
                self.0
            }
        }
    };
}

impl_arithmetic!(Metres);
impl_arithmetic!(Kpa);
impl_arithmetic!(Mpa);
impl_arithmetic!(Gpa);
impl_arithmetic!(KnPerM3);
impl_arithmetic!(Degrees);
impl_arithmetic!(Radians);
