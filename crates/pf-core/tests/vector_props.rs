//! Property tests for vectors and name lists.

use pf_core::{NameList, PfError, StateVector};
use proptest::prelude::*;

proptest! {
    #[test]
    fn length_never_changes(values in prop::collection::vec(-1e6_f64..1e6, 0..16), idx in 0_usize..32, v in -1.0_f64..1.0) {
        let mut x = StateVector::from_vec(values);
        let len = x.len();

        let result = x.set(idx, v);
        prop_assert_eq!(result.is_ok(), idx < len);
        prop_assert_eq!(x.len(), len);

        for slot in x.as_mut_slice() {
            *slot *= 2.0;
        }
        prop_assert_eq!(x.len(), len);
    }

    #[test]
    fn get_fails_exactly_past_the_end(len in 0_usize..16, idx in 0_usize..32) {
        let x = StateVector::zeros(len);
        match x.get(idx) {
            Ok(v) => {
                prop_assert!(idx < len);
                prop_assert_eq!(v, 0.0);
            }
            Err(PfError::IndexOob { index, len: reported, .. }) => {
                prop_assert!(idx >= len);
                prop_assert_eq!(index, idx);
                prop_assert_eq!(reported, len);
            }
            Err(other) => prop_assert!(false, "unexpected error {other}"),
        }
    }

    #[test]
    fn distinct_names_index_by_position(n in 0_usize..12) {
        let raw: Vec<String> = (0..n).map(|i| format!("n{i}")).collect();
        let names = NameList::new(raw.clone(), "test").unwrap();
        prop_assert_eq!(names.len(), n);
        for (i, name) in raw.iter().enumerate() {
            prop_assert_eq!(names.index_of(name).unwrap(), i);
        }
    }
}
