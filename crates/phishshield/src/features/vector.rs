//! The feature vector shared by the assembler, the scaler and the ensemble.
//!
//! Column order is fixed by training. It lives in exactly one place, the
//! `COL_*` constants below, and [`FeatureVector::to_array`] is the only way
//! to turn the named record into the positional form the model consumes.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// Number of columns the scaler and ensemble were fitted on.
pub const FEATURE_COUNT: usize = 22;

// ── Column indices ──────────────────────────────────────────────────────────

pub const COL_URL_LENGTH: usize = 0;
pub const COL_DOMAIN_LENGTH: usize = 1;
pub const COL_TLD_LENGTH: usize = 2;
pub const COL_IMAGE_COUNT: usize = 3;
pub const COL_SCRIPT_COUNT: usize = 4;
pub const COL_STYLESHEET_COUNT: usize = 5;
pub const COL_SELF_REF_COUNT: usize = 6;
pub const COL_EXTERNAL_REF_COUNT: usize = 7;
pub const COL_IS_HTTPS: usize = 8;
pub const COL_HAS_OBFUSCATION: usize = 9;
pub const COL_HAS_TITLE: usize = 10;
pub const COL_HAS_DESCRIPTION: usize = 11;
pub const COL_HAS_SUBMIT_BUTTON: usize = 12;
pub const COL_HAS_SOCIAL_NET: usize = 13;
pub const COL_HAS_FAVICON: usize = 14;
pub const COL_HAS_COPYRIGHT_INFO: usize = 15;
pub const COL_POPUP_WINDOW: usize = 16;
pub const COL_IFRAME: usize = 17;
pub const COL_ABNORMAL_URL: usize = 18;
pub const COL_LETTER_TO_DIGIT_RATIO: usize = 19;
pub const COL_REDIRECT_0: usize = 20;
pub const COL_REDIRECT_1: usize = 21;

/// Training-time column names, indexed by the `COL_*` constants.
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "URLLength",
    "DomainLength",
    "TLDLength",
    "NoOfImage",
    "NoOfJS",
    "NoOfCSS",
    "NoOfSelfRef",
    "NoOfExternalRef",
    "IsHTTPS",
    "HasObfuscation",
    "HasTitle",
    "HasDescription",
    "HasSubmitButton",
    "HasSocialNet",
    "HasFavicon",
    "HasCopyrightInfo",
    "popUpWindow",
    "Iframe",
    "Abnormal_URL",
    "LetterToDigitRatio",
    "Redirect_0",
    "Redirect_1",
];

/// Columns that must hold 0 or 1.
const FLAG_COLUMNS: [usize; 13] = [
    COL_IS_HTTPS,
    COL_HAS_OBFUSCATION,
    COL_HAS_TITLE,
    COL_HAS_DESCRIPTION,
    COL_HAS_SUBMIT_BUTTON,
    COL_HAS_SOCIAL_NET,
    COL_HAS_FAVICON,
    COL_HAS_COPYRIGHT_INFO,
    COL_POPUP_WINDOW,
    COL_IFRAME,
    COL_ABNORMAL_URL,
    COL_REDIRECT_0,
    COL_REDIRECT_1,
];

/// One row of classifier input. Serialized field names are the training
/// column names, so this is also the wire format for direct submissions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    #[serde(rename = "URLLength")]
    pub url_length: u32,
    #[serde(rename = "DomainLength")]
    pub domain_length: u32,
    #[serde(rename = "TLDLength")]
    pub tld_length: u32,
    #[serde(rename = "NoOfImage")]
    pub image_count: u32,
    #[serde(rename = "NoOfJS")]
    pub script_count: u32,
    #[serde(rename = "NoOfCSS")]
    pub stylesheet_count: u32,
    #[serde(rename = "NoOfSelfRef")]
    pub self_ref_count: u32,
    #[serde(rename = "NoOfExternalRef")]
    pub external_ref_count: u32,
    #[serde(rename = "IsHTTPS")]
    pub is_https: u32,
    #[serde(rename = "HasObfuscation")]
    pub has_obfuscation: u32,
    #[serde(rename = "HasTitle")]
    pub has_title: u32,
    #[serde(rename = "HasDescription")]
    pub has_description: u32,
    #[serde(rename = "HasSubmitButton")]
    pub has_submit_button: u32,
    #[serde(rename = "HasSocialNet")]
    pub has_social_net: u32,
    #[serde(rename = "HasFavicon")]
    pub has_favicon: u32,
    #[serde(rename = "HasCopyrightInfo")]
    pub has_copyright_info: u32,
    #[serde(rename = "popUpWindow")]
    pub popup_window: u32,
    #[serde(rename = "Iframe")]
    pub iframe: u32,
    #[serde(rename = "Abnormal_URL")]
    pub abnormal_url: u32,
    #[serde(rename = "LetterToDigitRatio")]
    pub letter_to_digit_ratio: f64,
    #[serde(rename = "Redirect_0")]
    pub redirect_0: u32,
    #[serde(rename = "Redirect_1")]
    pub redirect_1: u32,
}

impl FeatureVector {
    /// Positional form in training column order.
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        let mut cols = [0.0f64; FEATURE_COUNT];
        cols[COL_URL_LENGTH] = f64::from(self.url_length);
        cols[COL_DOMAIN_LENGTH] = f64::from(self.domain_length);
        cols[COL_TLD_LENGTH] = f64::from(self.tld_length);
        cols[COL_IMAGE_COUNT] = f64::from(self.image_count);
        cols[COL_SCRIPT_COUNT] = f64::from(self.script_count);
        cols[COL_STYLESHEET_COUNT] = f64::from(self.stylesheet_count);
        cols[COL_SELF_REF_COUNT] = f64::from(self.self_ref_count);
        cols[COL_EXTERNAL_REF_COUNT] = f64::from(self.external_ref_count);
        cols[COL_IS_HTTPS] = f64::from(self.is_https);
        cols[COL_HAS_OBFUSCATION] = f64::from(self.has_obfuscation);
        cols[COL_HAS_TITLE] = f64::from(self.has_title);
        cols[COL_HAS_DESCRIPTION] = f64::from(self.has_description);
        cols[COL_HAS_SUBMIT_BUTTON] = f64::from(self.has_submit_button);
        cols[COL_HAS_SOCIAL_NET] = f64::from(self.has_social_net);
        cols[COL_HAS_FAVICON] = f64::from(self.has_favicon);
        cols[COL_HAS_COPYRIGHT_INFO] = f64::from(self.has_copyright_info);
        cols[COL_POPUP_WINDOW] = f64::from(self.popup_window);
        cols[COL_IFRAME] = f64::from(self.iframe);
        cols[COL_ABNORMAL_URL] = f64::from(self.abnormal_url);
        cols[COL_LETTER_TO_DIGIT_RATIO] = self.letter_to_digit_ratio;
        cols[COL_REDIRECT_0] = f64::from(self.redirect_0);
        cols[COL_REDIRECT_1] = f64::from(self.redirect_1);
        cols
    }

    /// Redirect one-hot pair `(Redirect_0, Redirect_1)`.
    pub fn redirect_pair(&self) -> (u32, u32) {
        (self.redirect_0, self.redirect_1)
    }

    /// Parse and validate a direct submission.
    pub fn from_json(value: serde_json::Value) -> Result<Self, ValidationError> {
        let vector: FeatureVector = serde_json::from_value(value)
            .map_err(|e| ValidationError::Malformed(e.to_string()))?;
        vector.validate()?;
        Ok(vector)
    }

    /// Check the constraints a vector produced by the assembler always meets.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let cols = self.to_array();
        for col in FLAG_COLUMNS {
            let value = cols[col] as u32;
            if value > 1 {
                return Err(ValidationError::NotAFlag {
                    column: FEATURE_COLUMNS[col],
                    value,
                });
            }
        }
        if self.redirect_0 == 1 && self.redirect_1 == 1 {
            return Err(ValidationError::RedirectConflict);
        }
        let ratio = self.letter_to_digit_ratio;
        if !ratio.is_finite() || ratio < 0.0 {
            return Err(ValidationError::InvalidRatio(ratio));
        }
        Ok(())
    }
}
