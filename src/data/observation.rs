use nalgebra::DVector;
use std::fmt::{self, Display, Formatter};

/// Observation made of a single real value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObservationReal {
    pub value: f64,
}

impl ObservationReal {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

/// Observation made of a non-negative integer, as emitted by discrete
/// distributions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObservationInteger {
    pub value: usize,
}

impl ObservationInteger {
    pub fn new(value: usize) -> Self {
        Self { value }
    }
}

/// Observation made of a real vector.
#[derive(Clone, Debug, PartialEq)]
pub struct ObservationVector {
    pub value: DVector<f64>,
}

impl ObservationVector {
    pub fn new(value: DVector<f64>) -> Self {
        Self { value }
    }

    pub fn from_slice(values: &[f64]) -> Self {
        Self {
            value: DVector::from_column_slice(values),
        }
    }

    pub fn dimension(&self) -> usize {
        self.value.len()
    }
}

impl From<Vec<f64>> for ObservationVector {
    fn from(values: Vec<f64>) -> Self {
        Self::new(DVector::from_vec(values))
    }
}

impl Display for ObservationReal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl Display for ObservationInteger {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl Display for ObservationVector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for value in self.value.iter() {
            write!(f, " {}", value)?;
        }
        write!(f, " ]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_dimension() {
        let o = ObservationVector::from_slice(&[1.0, 2.0, 3.0]);
        assert_eq!(o.dimension(), 3);
        assert_eq!(o, ObservationVector::from(vec![1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_formatting() {
        let o = ObservationVector::from_slice(&[1.0, 2.5]);
        assert_eq!(format!("{}", o), "[ 1 2.5 ]");
        assert_eq!(format!("{}", ObservationInteger::new(4)), "4");
        assert_eq!(format!("{}", ObservationReal::new(0.5)), "0.5");
    }
}
