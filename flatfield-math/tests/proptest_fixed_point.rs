use proptest::prelude::*;
use std::cmp::Ordering;
use flatfield_math::{
    add, compare, divide, multiply, subtract, Fixed, FixedResult, FP32_FWL, FP32_MAX, FP32_MIN,
    FP32_ONE,
};

fn valid_raw() -> impl Strategy<Value = i32> {
    FP32_MIN..=FP32_MAX
}

fn fx(raw: i32) -> Fixed {
    Fixed::from_raw(raw).unwrap()
}

// Property 1: every grid value survives fixed -> double -> fixed exactly
proptest! {
    #[test]
    fn prop_grid_roundtrip(raw in valid_raw()) {
        let v = fx(raw);
        prop_assert_eq!(Fixed::from_f64(v.to_f64()), FixedResult::Value(v));
        prop_assert_eq!(Fixed::from_f64_rounded(v.to_f64()), FixedResult::Value(v));
    }
}

// Property 2: compare is antisymmetric and reflexive
proptest! {
    #[test]
    fn prop_compare_antisymmetric(a in any::<i32>(), b in any::<i32>()) {
        prop_assert_eq!(compare(a, b), compare(b, a).reverse());
        prop_assert_eq!(compare(a, a), Ordering::Equal);
    }
}

// Property 3: results are either in range or Overflow, never wrapped
proptest! {
    #[test]
    fn prop_results_never_wrap(a in valid_raw(), b in valid_raw()) {
        let wide_sum = a as i64 + b as i64;
        let sum = add(fx(a), fx(b));
        if wide_sum < FP32_MIN as i64 || wide_sum > FP32_MAX as i64 {
            prop_assert_eq!(sum, FixedResult::Overflow);
        } else {
            prop_assert_eq!(sum.to_raw() as i64, wide_sum);
        }

        let wide_diff = a as i64 - b as i64;
        let diff = subtract(fx(a), fx(b));
        if wide_diff < FP32_MIN as i64 || wide_diff > FP32_MAX as i64 {
            prop_assert_eq!(diff, FixedResult::Overflow);
        } else {
            prop_assert_eq!(diff.to_raw() as i64, wide_diff);
        }

        let wide_product = (a as i64 * b as i64) >> FP32_FWL;
        let product = multiply(fx(a), fx(b), FP32_FWL);
        if wide_product < FP32_MIN as i64 || wide_product > FP32_MAX as i64 {
            prop_assert_eq!(product, FixedResult::Overflow);
        } else {
            prop_assert_eq!(product.to_raw() as i64, wide_product);
        }
    }
}

// Property 4: addition is commutative and subtraction undoes it
proptest! {
    #[test]
    fn prop_add_commutative_and_invertible(
        a in -(1i32 << 29)..(1i32 << 29),
        b in -(1i32 << 29)..(1i32 << 29)
    ) {
        let ab = add(fx(a), fx(b));
        prop_assert_eq!(ab, add(fx(b), fx(a)));
        prop_assert_eq!(ab.and_then(|s| subtract(s, fx(b))), FixedResult::Value(fx(a)));
    }
}

// Property 5: degenerate shifts and zero divisors always overflow
proptest! {
    #[test]
    fn prop_degenerate_arguments_overflow(a in valid_raw(), b in valid_raw(), fwl in 31u32..64) {
        prop_assert_eq!(multiply(fx(a), fx(b), fwl), FixedResult::Overflow);
        prop_assert_eq!(divide(fx(a), fx(b), fwl), FixedResult::Overflow);
        prop_assert_eq!(divide(fx(a), Fixed::ZERO, FP32_FWL), FixedResult::Overflow);
    }
}

// Property 6: dividing by 1.0 is exact while the dividend has headroom
proptest! {
    #[test]
    fn prop_divide_by_one_identity(a in -(1i32 << 23)..(1i32 << 23)) {
        prop_assert_eq!(divide(fx(a), Fixed::ONE, FP32_FWL), FixedResult::Value(fx(a)));
    }
}

// Property 7: divide agrees with exact rational division to one step
proptest! {
    #[test]
    fn prop_divide_close_to_exact(
        a in -(1i32 << 20)..(1i32 << 20),
        b in prop_oneof![-(1i32 << 16)..-FP32_ONE, FP32_ONE..(1i32 << 16)]
    ) {
        let q = divide(fx(a), fx(b), FP32_FWL).value().unwrap();
        let exact = a as f64 / b as f64;
        prop_assert!((q.to_f64() - exact).abs() <= 1.0 / 256.0,
            "{} / {} gave {} expected {}", a, b, q, exact);
    }
}
