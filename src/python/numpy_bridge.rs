//! numpy and date conversions at the Python boundary.

use numpy::{PyArray1, PyReadonlyArray1};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::core::types::Date;
use crate::io::csv::parse_date;

/// Copy a numpy array into a Vec<f64>. Strided views are accepted.
pub fn numpy_to_vec_f64(arr: PyReadonlyArray1<f64>) -> Vec<f64> {
    arr.as_array().iter().copied().collect()
}

/// Convert Vec<f64> to numpy array.
pub fn vec_to_numpy_f64<'py>(py: Python<'py>, vec: Vec<f64>) -> &'py PyArray1<f64> {
    PyArray1::from_vec(py, vec)
}

/// Convert Vec<bool> to numpy array.
pub fn vec_to_numpy_bool<'py>(py: Python<'py>, vec: Vec<bool>) -> &'py PyArray1<bool> {
    PyArray1::from_vec(py, vec)
}

/// Parse ISO date strings.
pub fn parse_dates(dates: &[String]) -> PyResult<Vec<Date>> {
    dates
        .iter()
        .map(|d| parse_date(d).map_err(|e| PyValueError::new_err(e.to_string())))
        .collect()
}

/// Format dates as ISO strings.
pub fn format_dates(dates: impl IntoIterator<Item = Date>) -> Vec<String> {
    dates.into_iter().map(|d| d.to_string()).collect()
}
