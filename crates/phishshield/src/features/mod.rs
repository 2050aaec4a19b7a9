//! The 22-column feature vector and its assembly from analyzer outputs.

pub mod assembler;
pub mod vector;

pub use assembler::{assemble, letter_to_digit_ratio, redirect_one_hot, LETTER_DIGIT_EPSILON};
pub use vector::{FeatureVector, FEATURE_COLUMNS, FEATURE_COUNT};
