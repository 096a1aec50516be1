//! Fixtures for tests

use crate::parameters::Parameters;
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// One standard wine limited by a single resource.
///
/// The unconstrained optimum is X = (A - C) / (2B) = 40, so the resource is not binding.
#[fixture]
pub fn single_wine() -> Parameters {
    Parameters {
        num_standard: 1,
        num_premium: 0,
        revenue: vec![10.0],
        saturation: vec![0.1],
        variable_cost: vec![2.0],
        fixed_cost: Vec::new(),
        availability: vec![100.0],
        consumption: vec![vec![1.0]],
        big_m: 1000.0,
    }
}

/// Two standard wines and one premium wine sharing two resources
#[fixture]
pub fn wine_portfolio() -> Parameters {
    Parameters {
        num_standard: 2,
        num_premium: 1,
        revenue: vec![10.0, 12.0, 30.0],
        saturation: vec![0.1, 0.2, 0.5],
        variable_cost: vec![2.0, 4.0, 5.0],
        fixed_cost: vec![50.0],
        availability: vec![100.0, 60.0],
        consumption: vec![vec![1.0, 1.0, 2.0], vec![0.5, 1.0, 1.0]],
        big_m: 1000.0,
    }
}
