use crate::PfError;

/// Floating point type used throughout system
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, PfError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(PfError::NonFinite { what, value: v })
    }
}

/// Fails on the first non-finite element.
pub fn ensure_all_finite(values: &[Real], what: &'static str) -> Result<(), PfError> {
    values
        .iter()
        .try_for_each(|v| ensure_finite(*v, what).map(|_| ()))
}

/// Clamp a normalized quantity (event state, state of charge) to [0, 1].
///
/// NaN is mapped to 0.0 so that a broken state reads as failed.
pub fn clamp_unit(v: Real) -> Real {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
        assert_eq!(ensure_finite(2.5, "test").unwrap(), 2.5);
    }

    #[test]
    fn ensure_all_finite_reports_first_bad_value() {
        assert!(ensure_all_finite(&[1.0, 2.0], "load").is_ok());
        assert!(ensure_all_finite(&[], "load").is_ok());
        let err = ensure_all_finite(&[1.0, Real::INFINITY, Real::NAN], "load").unwrap_err();
        assert!(matches!(
            err,
            PfError::NonFinite { what: "load", value } if value.is_infinite()
        ));
    }

    #[test]
    fn clamp_unit_bounds() {
        assert_eq!(clamp_unit(1.5), 1.0);
        assert_eq!(clamp_unit(-0.2), 0.0);
        assert_eq!(clamp_unit(0.25), 0.25);
        assert_eq!(clamp_unit(Real::NAN), 0.0);
    }
}
