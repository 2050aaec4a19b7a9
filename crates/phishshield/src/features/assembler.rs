//! Combine analyzer outputs into the training-order feature vector.

use crate::acquisition::RedirectState;
use crate::analysis::{ContentFeatures, UrlStructure};
use crate::features::vector::FeatureVector;

/// Guard added to the digit ratio so digit-free URLs stay finite.
pub const LETTER_DIGIT_EPSILON: f64 = 1e-5;

/// Encode the redirect state as `(Redirect_0, Redirect_1)`.
///
/// `(0, 0)` means no response was obtained; it never stands for any other
/// state, and `(1, 1)` cannot be produced.
pub fn redirect_one_hot(state: RedirectState) -> (u32, u32) {
    match state {
        RedirectState::NoResponse => (0, 0),
        RedirectState::NoRedirects => (1, 0),
        RedirectState::HadRedirects => (0, 1),
    }
}

/// Ratio of ratios: letter share over (digit share + ε).
pub fn letter_to_digit_ratio(letter_ratio: f64, digit_ratio: f64) -> f64 {
    letter_ratio / (digit_ratio + LETTER_DIGIT_EPSILON)
}

/// Build the full 22-column vector. Total: every input combination yields a
/// complete vector.
pub fn assemble(
    structure: &UrlStructure,
    redirect: RedirectState,
    content: &ContentFeatures,
) -> FeatureVector {
    let (redirect_0, redirect_1) = redirect_one_hot(redirect);

    FeatureVector {
        url_length: structure.url_length,
        domain_length: structure.domain_length,
        tld_length: structure.tld_length,
        image_count: content.image_count,
        script_count: content.script_count,
        stylesheet_count: content.stylesheet_count,
        self_ref_count: content.self_ref_count,
        external_ref_count: content.external_ref_count,
        is_https: structure.is_https,
        has_obfuscation: content.has_obfuscation,
        has_title: content.has_title,
        has_description: content.has_description,
        has_submit_button: content.has_submit_button,
        has_social_net: content.has_social_net,
        has_favicon: content.has_favicon,
        has_copyright_info: content.has_copyright_info,
        popup_window: content.has_popup,
        iframe: content.has_iframe,
        abnormal_url: structure.is_abnormal,
        letter_to_digit_ratio: letter_to_digit_ratio(structure.letter_ratio, structure.digit_ratio),
        redirect_0,
        redirect_1,
    }
}
