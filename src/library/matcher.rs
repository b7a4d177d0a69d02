use crate::constants::SCENE_TAG_SUFFIX;

fn split_extension(name: &str) -> (&str, &str) {
    name.rfind('.')
        .map_or((name, ""), |idx| (&name[..idx], &name[idx..]))
}

/// Whether two file names denote the same release, ignoring case and a
/// trailing `[eztv]` tag before the extension. Different extensions never match.
#[must_use]
pub fn fuzzy_match(a: &str, b: &str) -> bool {
    fuzzy_match_lower(&a.to_lowercase(), &b.to_lowercase())
}

fn fuzzy_match_lower(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }

    let (stem_a, ext_a) = split_extension(a);
    let (stem_b, ext_b) = split_extension(b);
    if ext_a != ext_b {
        return false;
    }

    if let Some(stripped) = stem_a.strip_suffix(SCENE_TAG_SUFFIX)
        && fuzzy_match_lower(&format!("{stripped}{ext_a}"), b)
    {
        return true;
    }

    if let Some(stripped) = stem_b.strip_suffix(SCENE_TAG_SUFFIX)
        && fuzzy_match_lower(a, &format!("{stripped}{ext_b}"))
    {
        return true;
    }

    false
}
