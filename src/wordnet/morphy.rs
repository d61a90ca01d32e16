use super::Pos;

const NOUN_RULES: &[(&str, &str)] = &[
    ("s", ""),
    ("ses", "s"),
    ("ves", "f"),
    ("xes", "x"),
    ("zes", "z"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("men", "man"),
    ("ies", "y"),
];

const VERB_RULES: &[(&str, &str)] = &[
    ("s", ""),
    ("ies", "y"),
    ("es", "e"),
    ("es", ""),
    ("ed", "e"),
    ("ed", ""),
    ("ing", "e"),
    ("ing", ""),
];

const ADJ_RULES: &[(&str, &str)] = &[("er", ""), ("est", ""), ("er", "e"), ("est", "e")];

/// Detachment rules for a part of speech, in application order.
pub fn detachment_rules(pos: Pos) -> &'static [(&'static str, &'static str)] {
    match pos {
        Pos::Noun => NOUN_RULES,
        Pos::Verb => VERB_RULES,
        Pos::Adjective | Pos::Satellite => ADJ_RULES,
        Pos::Adverb => &[],
    }
}

/// Candidate base forms for `form`, before filtering against the index.
///
/// An exception list entry short-circuits the detachment rules.
pub fn candidates(form: &str, pos: Pos, exceptions: Option<&Vec<String>>) -> Vec<String> {
    let mut forms = vec![form.to_string()];

    if let Some(bases) = exceptions {
        forms.extend(bases.iter().cloned());
        return forms;
    }

    for (suffix, replacement) in detachment_rules(pos) {
        if let Some(stem) = form.strip_suffix(suffix) {
            forms.push(format!("{}{}", stem, replacement));
        }
    }

    forms
}
