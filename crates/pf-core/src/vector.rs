//! Fixed-length numeric vectors tagged with their role.
//!
//! A `NamedVector<R>` holds only its values. Names live in the `NameList`
//! owned by the model definition, and the role marker `R` keeps state, input,
//! output and predicted-output vectors from being passed in each other's place.
//! Length is fixed at construction; every mutating operation preserves it.

use core::fmt;
use core::marker::PhantomData;
use core::ops::{Index, IndexMut};

use crate::error::{PfError, PfResult};
use crate::names::NameList;

mod sealed {
    pub trait Sealed {}
}

/// Marker trait for vector roles.
pub trait VectorRole: sealed::Sealed {
    /// Human-readable role name used in errors.
    const ROLE: &'static str;
}

macro_rules! vector_role {
    ($(#[$meta:meta])* $name:ident, $role:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {}

        impl sealed::Sealed for $name {}

        impl VectorRole for $name {
            const ROLE: &'static str = $role;
        }
    };
}

vector_role!(
    /// Internal variables describing the component's condition.
    State,
    "state"
);
vector_role!(
    /// External/control variables driving the state transition.
    Input,
    "input"
);
vector_role!(
    /// Directly measurable quantities.
    Output,
    "output"
);
vector_role!(
    /// Derived, non-measured diagnostic quantities.
    PredictedOutput,
    "predicted output"
);

pub type StateVector = NamedVector<State>;
pub type InputVector = NamedVector<Input>;
pub type OutputVector = NamedVector<Output>;
pub type PredictedOutputVector = NamedVector<PredictedOutput>;

pub struct NamedVector<R: VectorRole> {
    values: Vec<f64>,
    // fn() -> R keeps the vector Send + Sync for every role
    role: PhantomData<fn() -> R>,
}

impl<R: VectorRole> NamedVector<R> {
    /// A vector of `len` zeros.
    pub fn zeros(len: usize) -> Self {
        Self::from_vec(vec![0.0; len])
    }

    pub fn from_vec(values: Vec<f64>) -> Self {
        Self {
            values,
            role: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> PfResult<f64> {
        self.values
            .get(index)
            .copied()
            .ok_or(PfError::IndexOob {
                what: R::ROLE,
                index,
                len: self.values.len(),
            })
    }

    pub fn set(&mut self, index: usize, value: f64) -> PfResult<()> {
        let len = self.values.len();
        let slot = self.values.get_mut(index).ok_or(PfError::IndexOob {
            what: R::ROLE,
            index,
            len,
        })?;
        *slot = value;
        Ok(())
    }

    /// Read a slot by symbolic name.
    ///
    /// `names` must be the list this vector is bound to.
    pub fn value_of(&self, names: &NameList, name: &str) -> PfResult<f64> {
        PfError::check_len(R::ROLE, names.len(), self.len())?;
        self.get(names.index_of(name)?)
    }

    /// Write a slot by symbolic name.
    pub fn set_value_of(&mut self, names: &NameList, name: &str, value: f64) -> PfResult<()> {
        PfError::check_len(R::ROLE, names.len(), self.len())?;
        self.set(names.index_of(name)?, value)
    }

    /// Overwrite all values in place from `other`.
    pub fn assign(&mut self, other: &Self) -> PfResult<()> {
        PfError::check_len(R::ROLE, self.len(), other.len())?;
        self.values.copy_from_slice(&other.values);
        Ok(())
    }

    /// Fail unless the vector has exactly `expected` slots.
    pub fn ensure_len(&self, expected: usize) -> PfResult<()> {
        PfError::check_len(R::ROLE, expected, self.len())
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Mutable view of the values. A slice cannot grow or shrink.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn iter(&self) -> core::slice::Iter<'_, f64> {
        self.values.iter()
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }
}

impl<R: VectorRole> Clone for NamedVector<R> {
    fn clone(&self) -> Self {
        Self::from_vec(self.values.clone())
    }
}

impl<R: VectorRole> PartialEq for NamedVector<R> {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl<R: VectorRole> fmt::Debug for NamedVector<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:?}", R::ROLE, self.values)
    }
}

impl<R: VectorRole> From<Vec<f64>> for NamedVector<R> {
    fn from(values: Vec<f64>) -> Self {
        Self::from_vec(values)
    }
}

impl<R: VectorRole> AsRef<[f64]> for NamedVector<R> {
    fn as_ref(&self) -> &[f64] {
        &self.values
    }
}

impl<R: VectorRole> Index<usize> for NamedVector<R> {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.values[index]
    }
}

impl<R: VectorRole> IndexMut<usize> for NamedVector<R> {
    fn index_mut(&mut self, index: usize) -> &mut f64 {
        &mut self.values[index]
    }
}

impl<'a, R: VectorRole> IntoIterator for &'a NamedVector<R> {
    type Item = &'a f64;
    type IntoIter = core::slice::Iter<'a, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeros_has_requested_length() {
        let x = StateVector::zeros(4);
        assert_eq!(x.len(), 4);
        assert!(x.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn out_of_range_access_fails() {
        let mut u = InputVector::from_vec(vec![1.0, 2.0]);
        assert_eq!(u.get(1).unwrap(), 2.0);
        assert_eq!(
            u.get(2),
            Err(PfError::IndexOob {
                what: "input",
                index: 2,
                len: 2
            })
        );
        assert!(u.set(5, 1.0).is_err());
        assert_eq!(u.len(), 2);
    }

    #[test]
    fn clone_is_independent() {
        let a = OutputVector::from_vec(vec![1.0, 2.0]);
        let mut b = a.clone();
        b[0] = 10.0;
        assert_eq!(a[0], 1.0);
        assert_eq!(b[0], 10.0);
    }

    #[test]
    fn assign_requires_matching_length() {
        let mut a = StateVector::zeros(2);
        a.assign(&StateVector::from_vec(vec![3.0, 4.0])).unwrap();
        assert_eq!(a.as_slice(), &[3.0, 4.0]);

        let err = a.assign(&StateVector::zeros(3)).unwrap_err();
        assert!(matches!(err, PfError::Precondition { .. }));
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn named_access_uses_bound_list() {
        let names = NameList::new(["temperature", "voltage"], "outputs").unwrap();
        let mut z = OutputVector::zeros(2);
        z.set_value_of(&names, "voltage", 4.2).unwrap();
        assert_eq!(z[1], 4.2);
        assert_eq!(z.value_of(&names, "voltage").unwrap(), 4.2);
        assert!(z.value_of(&names, "current").is_err());

        let wrong = NameList::new(["voltage"], "outputs").unwrap();
        assert!(matches!(
            z.value_of(&wrong, "voltage"),
            Err(PfError::Precondition { .. })
        ));
    }

    #[test]
    #[should_panic]
    fn index_operator_panics_out_of_range() {
        let x = StateVector::zeros(1);
        let _ = x[1];
    }

    #[test]
    fn debug_shows_role() {
        let z = PredictedOutputVector::from_vec(vec![0.5]);
        assert_eq!(format!("{z:?}"), "predicted output[0.5]");
    }
}
