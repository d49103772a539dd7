//! Static synthesizer voice catalog.
//!
//! Pure data plus pure filter/sort/group helpers; the speech client
//! wraps these into [`VoiceGroup`]s for display.

use read_aloud_domain::Voice;

/// Fallback voice when nothing else resolves.
pub const DEFAULT_VOICE_ID: &str = "en-US-AriaNeural";

/// Region codes ranked first when sorting voices; all other regions
/// rank equally below, ties broken by name.
const REGION_PRIORITY: &[&str] = &["CN", "TW", "HK", "US", "GB"];

const VOICES: &[(&str, &str, &str)] = &[
    ("zh-CN-XiaoxiaoNeural", "Xiaoxiao", "zh-CN"),
    ("zh-CN-YunxiNeural", "Yunxi", "zh-CN"),
    ("zh-TW-HsiaoChenNeural", "HsiaoChen", "zh-TW"),
    ("zh-HK-HiuMaanNeural", "HiuMaan", "zh-HK"),
    ("en-US-AriaNeural", "Aria", "en-US"),
    ("en-US-GuyNeural", "Guy", "en-US"),
    ("en-US-JennyNeural", "Jenny", "en-US"),
    ("en-GB-SoniaNeural", "Sonia", "en-GB"),
    ("en-GB-RyanNeural", "Ryan", "en-GB"),
    ("ja-JP-NanamiNeural", "Nanami", "ja-JP"),
    ("ja-JP-KeitaNeural", "Keita", "ja-JP"),
    ("ko-KR-SunHiNeural", "SunHi", "ko-KR"),
    ("fr-FR-DeniseNeural", "Denise", "fr-FR"),
    ("de-DE-KatjaNeural", "Katja", "de-DE"),
    ("es-ES-ElviraNeural", "Elvira", "es-ES"),
    ("it-IT-ElsaNeural", "Elsa", "it-IT"),
    ("pt-BR-FranciscaNeural", "Francisca", "pt-BR"),
    ("ru-RU-SvetlanaNeural", "Svetlana", "ru-RU"),
    ("ar-SA-ZariyahNeural", "Zariyah", "ar-SA"),
];

/// All catalog voices, in table order.
pub fn all_voices() -> Vec<Voice> {
    VOICES
        .iter()
        .map(|(id, name, lang)| Voice::new(*id, *name, *lang))
        .collect()
}

/// Voices matching a language request.
///
/// An exact locale request (`"en-US"`) matches that region; when the
/// region has no voices, or the request carries no region (`"en"`),
/// the match falls back to the primary subtag, so `"en"` covers both
/// `en-US` and `en-GB`.
pub fn voices_for_lang(lang: &str) -> Vec<Voice> {
    let all = all_voices();
    if lang.contains(['-', '_']) {
        let exact: Vec<Voice> = all
            .iter()
            .filter(|v| v.lang.eq_ignore_ascii_case(lang))
            .cloned()
            .collect();
        if !exact.is_empty() {
            return exact;
        }
    }
    let primary = lang.split(['-', '_']).next().unwrap_or(lang);
    all.into_iter()
        .filter(|v| v.primary_lang().eq_ignore_ascii_case(primary))
        .collect()
}

/// First enabled voice for a language, used for voice resolution.
pub fn first_enabled_for(lang: &str) -> Option<String> {
    let mut voices = voices_for_lang(lang);
    sort_voices(&mut voices);
    voices.into_iter().find(|v| !v.disabled).map(|v| v.id)
}

/// Sort voices for display: region rank `CN, TW, HK, US, GB` first
/// (first match wins), everything else equal below, ties broken by
/// case-sensitive name comparison.
pub fn sort_voices(voices: &mut [Voice]) {
    voices.sort_by(|a, b| {
        region_rank(a.region())
            .cmp(&region_rank(b.region()))
            .then_with(|| a.name.cmp(&b.name))
    });
}

fn region_rank(region: Option<&str>) -> usize {
    region
        .and_then(|r| REGION_PRIORITY.iter().position(|p| p.eq_ignore_ascii_case(r)))
        .unwrap_or(REGION_PRIORITY.len())
}
