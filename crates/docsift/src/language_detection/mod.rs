//! Language guessing for summaries.
//!
//! Hints from the URL (country TLD, leading path segment) are tried before
//! statistical detection with whatlang. Tags use ISO 639-1 codes when one
//! exists and fall back to ISO 639-3.

use crate::core::config::LanguageDetectionConfig;
use crate::types::LanguageTag;
use url::Url;

/// Characters of text handed to the statistical detector.
#[cfg(feature = "language-detection")]
const SAMPLE_CHARS: usize = 4096;

/// Collaborator that guesses the language of a document.
pub trait LanguageGuesser: Send + Sync {
    /// Guess from a text sample, using `hint_url` for cheap hints first.
    fn guess(&self, sample: &str, hint_url: Option<&Url>) -> Option<LanguageTag>;
}

/// URL hints followed by whatlang detection over a bounded sample.
#[derive(Debug, Clone, Default)]
pub struct DefaultLanguageGuesser {
    config: LanguageDetectionConfig,
}

impl DefaultLanguageGuesser {
    pub fn new(config: LanguageDetectionConfig) -> Self {
        Self { config }
    }
}

impl LanguageGuesser for DefaultLanguageGuesser {
    fn guess(&self, sample: &str, hint_url: Option<&Url>) -> Option<LanguageTag> {
        if let Some(tag) = hint_url.and_then(language_from_url) {
            return Some(tag);
        }
        if !self.config.enabled {
            return None;
        }
        detect_language(sample, self.config.min_confidence)
    }
}

/// Language implied by the URL: a two-letter leading path segment naming a
/// language, else a country-code TLD.
pub fn language_from_url(url: &Url) -> Option<LanguageTag> {
    if let Some(first) = url.path_segments().and_then(|mut segments| segments.next()) {
        let first = first.to_ascii_lowercase();
        let primary = first.split(['-', '_']).next().unwrap_or_default();
        if primary.len() == 2 && KNOWN_ISO639_1.contains(&primary) {
            return LanguageTag::parse(primary);
        }
    }

    let host = url.host_str()?;
    let tld = host.rsplit('.').next()?.to_ascii_lowercase();
    tld_language(&tld).and_then(LanguageTag::parse)
}

/// Language implied by a legacy charset declaration.
pub fn language_from_charset(charset: &str) -> Option<LanguageTag> {
    let charset = charset.trim().to_ascii_lowercase();
    let code = match charset.as_str() {
        "shift_jis" | "shift-jis" | "sjis" | "euc-jp" | "iso-2022-jp" => "ja",
        "euc-kr" | "ks_c_5601-1987" | "iso-2022-kr" => "ko",
        "gb2312" | "gbk" | "gb18030" | "big5" | "big5-hkscs" | "hz-gb-2312" => "zh",
        "koi8-r" | "windows-1251" | "cp1251" | "iso-8859-5" => "ru",
        "koi8-u" => "uk",
        "iso-8859-7" | "windows-1253" => "el",
        "iso-8859-8" | "windows-1255" => "he",
        "iso-8859-6" | "windows-1256" => "ar",
        "iso-8859-9" | "windows-1254" => "tr",
        "tis-620" | "windows-874" | "iso-8859-11" => "th",
        "windows-1258" => "vi",
        _ => return None,
    };
    LanguageTag::parse(code)
}

/// Statistical detection with whatlang.
#[cfg(feature = "language-detection")]
pub fn detect_language(text: &str, min_confidence: f64) -> Option<LanguageTag> {
    let sample: String = text.chars().take(SAMPLE_CHARS).collect();
    if sample.trim().is_empty() {
        return None;
    }

    let info = whatlang::detect(&sample)?;
    if info.confidence() < min_confidence {
        return None;
    }

    let code = info.lang().code();
    LanguageTag::parse(iso639_3_to_1(code).unwrap_or(code))
}

#[cfg(not(feature = "language-detection"))]
pub fn detect_language(_text: &str, _min_confidence: f64) -> Option<LanguageTag> {
    None
}

const KNOWN_ISO639_1: &[&str] = &[
    "ar", "bg", "ca", "cs", "da", "de", "el", "en", "eo", "es", "et", "fa", "fi", "fr", "he", "hi", "hr", "hu", "id",
    "it", "ja", "ko", "lt", "lv", "nl", "no", "pl", "pt", "ro", "ru", "sk", "sl", "sr", "sv", "th", "tr", "uk", "vi",
    "zh",
];

fn tld_language(tld: &str) -> Option<&'static str> {
    Some(match tld {
        "de" | "at" => "de",
        "fr" => "fr",
        "es" | "mx" | "ar" | "cl" | "co" => "es",
        "it" => "it",
        "nl" => "nl",
        "pt" | "br" => "pt",
        "pl" => "pl",
        "ru" | "su" => "ru",
        "ua" => "uk",
        "jp" => "ja",
        "kr" => "ko",
        "cn" | "tw" => "zh",
        "se" => "sv",
        "dk" => "da",
        "no" => "no",
        "fi" => "fi",
        "cz" => "cs",
        "sk" => "sk",
        "hu" => "hu",
        "gr" => "el",
        "tr" => "tr",
        "il" => "he",
        "ro" => "ro",
        "bg" => "bg",
        "hr" => "hr",
        "si" => "sl",
        "rs" => "sr",
        "lt" => "lt",
        "lv" => "lv",
        "ee" => "et",
        "th" => "th",
        "vn" => "vi",
        "uk" | "ie" | "au" | "nz" => "en",
        _ => return None,
    })
}

fn iso639_3_to_1(code: &str) -> Option<&'static str> {
    Some(match code {
        "eng" => "en",
        "rus" => "ru",
        "cmn" => "zh",
        "spa" => "es",
        "por" => "pt",
        "ita" => "it",
        "fra" => "fr",
        "deu" => "de",
        "ukr" => "uk",
        "kat" => "ka",
        "ara" => "ar",
        "hin" => "hi",
        "jpn" => "ja",
        "heb" => "he",
        "yid" => "yi",
        "pol" => "pl",
        "amh" => "am",
        "jav" => "jv",
        "kor" => "ko",
        "nob" => "nb",
        "dan" => "da",
        "swe" => "sv",
        "fin" => "fi",
        "tur" => "tr",
        "nld" => "nl",
        "hun" => "hu",
        "ces" => "cs",
        "ell" => "el",
        "bul" => "bg",
        "bel" => "be",
        "mar" => "mr",
        "kan" => "kn",
        "ron" => "ro",
        "slv" => "sl",
        "hrv" => "hr",
        "srp" => "sr",
        "mkd" => "mk",
        "lit" => "lt",
        "lav" => "lv",
        "est" => "et",
        "tam" => "ta",
        "vie" => "vi",
        "urd" => "ur",
        "tha" => "th",
        "guj" => "gu",
        "uzb" => "uz",
        "pan" => "pa",
        "aze" => "az",
        "ind" => "id",
        "tel" => "te",
        "pes" => "fa",
        "mal" => "ml",
        "ori" => "or",
        "mya" => "my",
        "nep" => "ne",
        "sin" => "si",
        "khm" => "km",
        "tuk" => "tk",
        "aka" => "ak",
        "zul" => "zu",
        "sna" => "sn",
        "afr" => "af",
        "lat" => "la",
        "slk" => "sk",
        "cat" => "ca",
        "tgl" => "tl",
        "hye" => "hy",
        "epo" => "eo",
        "ben" => "bn",
        "cym" => "cy",
        _ => return None,
    })
}
