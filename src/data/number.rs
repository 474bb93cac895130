use num_traits::{Float, FromPrimitive, ToPrimitive};
use std::fmt::{Debug, Display};

/// Floating point value an attribute can evaluate to.
///
/// Implemented for every `Float` that can round-trip through `f64`, which in
/// practice means `f32` and `f64`.
pub trait RealNumber:
    Debug + Display + Copy + Float + FromPrimitive + ToPrimitive + 'static
{
    /// Lossy conversion used when storing split thresholds.
    fn as_f64(self) -> f64 {
        self.to_f64().unwrap_or(f64::NAN)
    }

    /// Inverse of [`RealNumber::as_f64`].
    fn from_f64_lossy(value: f64) -> Self {
        <Self as FromPrimitive>::from_f64(value).unwrap_or_else(Self::nan)
    }
}

impl<T> RealNumber for T where
    T: Debug + Display + Copy + Float + FromPrimitive + ToPrimitive + 'static
{
}
